// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::address::Address;
use fvm_shared::bigint::BigInt;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::error::ExitCode;
use fvm_shared::sector::SectorNumber;
use fvm_shared::ActorID;

pub type AllocationID = u64;
pub type ClaimID = u64;

/// DataCap is an integer number of bytes.
/// We can introduce policy changes and replace this in the future.
pub type DataCap = BigInt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailCode {
    pub idx: u32,
    pub code: ExitCode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReturn {
    // Total successes in batch
    pub success_count: u32,
    // Failure code and index for each failure in batch
    pub fail_codes: Vec<FailCode>,
}

impl BatchReturn {
    pub const fn empty() -> Self {
        Self { success_count: 0, fail_codes: Vec::new() }
    }

    pub const fn ok(n: u32) -> Self {
        Self { success_count: n, fail_codes: Vec::new() }
    }

    pub fn size(&self) -> usize {
        self.success_count as usize + self.fail_codes.len()
    }

    // Returns a vector of exit codes for each item (including successes).
    pub fn codes(&self) -> Vec<ExitCode> {
        let mut ret = Vec::new();

        for fail in &self.fail_codes {
            for _ in ret.len()..fail.idx as usize {
                ret.push(ExitCode::OK)
            }
            ret.push(fail.code)
        }
        for _ in ret.len()..self.size() {
            ret.push(ExitCode::OK)
        }
        ret
    }
}

/// A verified-data allocation claim, as held in the registry's state.
/// The `data` field carries the content identifier as the raw byte string
/// found on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    pub provider: ActorID,
    pub client: ActorID,
    pub data: Vec<u8>,
    pub size: u64,
    // The min period which the provider must commit to storing data
    pub term_min: ChainEpoch,
    // The max period for which provider can earn QA-power for the data
    pub term_max: ChainEpoch,
    pub term_start: ChainEpoch,
    pub sector: SectorNumber,
}

/// A requested extension to an existing claim's maximum term.
/// Only ever sent, never received, so it has no decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimTerm {
    pub provider: ActorID,
    pub claim_id: ClaimID,
    pub term_max: ChainEpoch,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetClaimsParams {
    pub provider: ActorID,
    pub claim_ids: Vec<ClaimID>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetClaimsReturn {
    pub batch_info: BatchReturn,
    pub claims: Vec<Claim>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddVerifiedClientParams {
    pub address: Address,
    pub allowance: DataCap,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveExpiredAllocationsParams {
    // Client for which to remove expired allocations.
    pub client: ActorID,
    // Optional list of allocation IDs to attempt to remove.
    // Empty means remove all eligible expired allocations.
    pub allocation_ids: Vec<AllocationID>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveExpiredAllocationsReturn {
    // Ids of the allocations that were either specified by the caller or
    // discovered to be expired.
    pub considered: Vec<AllocationID>,
    // Results for each processed allocation.
    pub results: BatchReturn,
    // The amount of datacap reclaimed for the client.
    pub datacap_recovered: DataCap,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveExpiredClaimsParams {
    // Provider to clean up (need not be the caller).
    pub provider: ActorID,
    // Optional list of claim IDs to attempt to remove.
    // Empty means remove all eligible expired claims.
    pub claim_ids: Vec<ClaimID>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveExpiredClaimsReturn {
    // Ids of the claims that were either specified by the caller or
    // discovered to be expired.
    pub considered: Vec<ClaimID>,
    // Results for each processed claim.
    pub results: BatchReturn,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendClaimTermsParams {
    pub terms: Vec<ClaimTerm>,
}

pub type ExtendClaimTermsReturn = BatchReturn;
