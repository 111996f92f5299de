// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Per-message codecs for calls to the verified registry actor.
//!
//! Each parameter shape has a monomorphic serializer paired with a size
//! function that predicts the encoded length, so the output buffer is
//! allocated exactly once. Each return shape has a deserializer that walks
//! the buffer with an explicit cursor and checks every fixed-shape array
//! header against its schema constant, failing on the first mismatch.
//! Trailing bytes after a complete decode are ignored.

use fvm_shared::error::ExitCode;
use fvm_shared::ActorID;

use crate::cbor::{
    actor_id_size, bytes_size, chain_epoch_size, prefix_size, serialize_big_int, CborReader,
    CborWriter,
};
use crate::error::Error;
use crate::types::*;

fn actor_id_seq_size(ids: &[ActorID]) -> usize {
    prefix_size(ids.len() as u64) + ids.iter().map(|id| actor_id_size(*id)).sum::<usize>()
}

fn write_actor_id_seq(w: &mut CborWriter, ids: &[ActorID]) {
    w.start_fixed_array(ids.len() as u64);
    for id in ids {
        w.write_actor_id(*id);
    }
}

fn read_actor_id_seq(r: &mut CborReader) -> Result<Vec<ActorID>, Error> {
    let len = r.read_fixed_array()?;
    let mut ids = Vec::new();
    for _ in 0..len {
        ids.push(r.read_actor_id()?);
    }
    Ok(ids)
}

fn read_fail_code(r: &mut CborReader) -> Result<FailCode, Error> {
    r.expect_fixed_array(2)?;
    let idx = r.read_u32()?;
    let code = ExitCode::new(r.read_u32()?);
    Ok(FailCode { idx, code })
}

fn read_batch_return(r: &mut CborReader) -> Result<BatchReturn, Error> {
    r.expect_fixed_array(2)?;
    let success_count = r.read_u32()?;
    let len = r.read_fixed_array()?;
    let mut fail_codes = Vec::new();
    for _ in 0..len {
        fail_codes.push(read_fail_code(r)?);
    }
    Ok(BatchReturn { success_count, fail_codes })
}

fn read_claim(r: &mut CborReader) -> Result<Claim, Error> {
    r.expect_fixed_array(8)?;
    Ok(Claim {
        provider: r.read_actor_id()?,
        client: r.read_actor_id()?,
        data: r.read_bytes()?,
        size: r.read_u64()?,
        term_min: r.read_chain_epoch()?,
        term_max: r.read_chain_epoch()?,
        term_start: r.read_chain_epoch()?,
        sector: r.read_u64()?,
    })
}

fn get_claims_params_size(params: &GetClaimsParams) -> usize {
    prefix_size(2) + actor_id_size(params.provider) + actor_id_seq_size(&params.claim_ids)
}

pub fn serialize_get_claims_params(params: &GetClaimsParams) -> Vec<u8> {
    let mut w = CborWriter::with_capacity(get_claims_params_size(params));
    w.start_fixed_array(2);
    w.write_actor_id(params.provider);
    write_actor_id_seq(&mut w, &params.claim_ids);
    w.finish()
}

/// Decodes a GetClaims reply. The wire shape carries the (batch_info, claims)
/// pair one array level below the outer header; that nesting comes from the
/// actor's own encoding and is read back exactly as produced.
pub fn deserialize_get_claims_return(bytes: &[u8]) -> Result<GetClaimsReturn, Error> {
    let mut r = CborReader::new(bytes);
    r.expect_fixed_array(2)?;
    let batch_info = read_batch_return(&mut r)?;
    let len = r.read_fixed_array()?;
    let mut claims = Vec::new();
    for _ in 0..len {
        claims.push(read_claim(&mut r)?);
    }
    Ok(GetClaimsReturn { batch_info, claims })
}

pub fn serialize_add_verified_client_params(params: &AddVerifiedClientParams) -> Vec<u8> {
    let address = params.address.to_bytes();
    // The allowance must be serialized up front: its encoded width depends on
    // the value and feeds the capacity sum.
    let allowance = serialize_big_int(&params.allowance);
    let size = prefix_size(2) + bytes_size(&address) + bytes_size(&allowance);
    let mut w = CborWriter::with_capacity(size);
    w.start_fixed_array(2);
    w.write_bytes(&address);
    w.write_bytes(&allowance);
    w.finish()
}

fn remove_expired_allocations_params_size(params: &RemoveExpiredAllocationsParams) -> usize {
    prefix_size(2) + actor_id_size(params.client) + actor_id_seq_size(&params.allocation_ids)
}

pub fn serialize_remove_expired_allocations_params(
    params: &RemoveExpiredAllocationsParams,
) -> Vec<u8> {
    let mut w = CborWriter::with_capacity(remove_expired_allocations_params_size(params));
    w.start_fixed_array(2);
    w.write_actor_id(params.client);
    write_actor_id_seq(&mut w, &params.allocation_ids);
    w.finish()
}

pub fn deserialize_remove_expired_allocations_return(
    bytes: &[u8],
) -> Result<RemoveExpiredAllocationsReturn, Error> {
    let mut r = CborReader::new(bytes);
    r.expect_fixed_array(3)?;
    let considered = read_actor_id_seq(&mut r)?;
    let results = read_batch_return(&mut r)?;
    let datacap_recovered = r.read_big_int()?;
    Ok(RemoveExpiredAllocationsReturn { considered, results, datacap_recovered })
}

fn remove_expired_claims_params_size(params: &RemoveExpiredClaimsParams) -> usize {
    prefix_size(2) + actor_id_size(params.provider) + actor_id_seq_size(&params.claim_ids)
}

pub fn serialize_remove_expired_claims_params(params: &RemoveExpiredClaimsParams) -> Vec<u8> {
    let mut w = CborWriter::with_capacity(remove_expired_claims_params_size(params));
    w.start_fixed_array(2);
    w.write_actor_id(params.provider);
    write_actor_id_seq(&mut w, &params.claim_ids);
    w.finish()
}

pub fn deserialize_remove_expired_claims_return(
    bytes: &[u8],
) -> Result<RemoveExpiredClaimsReturn, Error> {
    let mut r = CborReader::new(bytes);
    r.expect_fixed_array(2)?;
    let considered = read_actor_id_seq(&mut r)?;
    let results = read_batch_return(&mut r)?;
    Ok(RemoveExpiredClaimsReturn { considered, results })
}

fn extend_claim_terms_params_size(params: &ExtendClaimTermsParams) -> usize {
    let mut size = prefix_size(1) + prefix_size(params.terms.len() as u64);
    for term in &params.terms {
        size += prefix_size(3)
            + actor_id_size(term.provider)
            + actor_id_size(term.claim_id)
            + chain_epoch_size(term.term_max);
    }
    size
}

pub fn serialize_extend_claim_terms_params(params: &ExtendClaimTermsParams) -> Vec<u8> {
    let mut w = CborWriter::with_capacity(extend_claim_terms_params_size(params));
    w.start_fixed_array(1);
    w.start_fixed_array(params.terms.len() as u64);
    for term in &params.terms {
        w.start_fixed_array(3);
        w.write_actor_id(term.provider);
        w.write_u64(term.claim_id);
        w.write_chain_epoch(term.term_max);
    }
    w.finish()
}

pub fn deserialize_extend_claim_terms_return(
    bytes: &[u8],
) -> Result<ExtendClaimTermsReturn, Error> {
    read_batch_return(&mut CborReader::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fvm_shared::address::Address;
    use fvm_shared::bigint::BigInt;

    const WIDTH_EDGES: &[u64] =
        &[0, 23, 24, 255, 256, 65535, 65536, u32::MAX as u64, u32::MAX as u64 + 1, u64::MAX];

    #[test]
    fn get_claims_params_size_is_exact() {
        for &provider in WIDTH_EDGES {
            for ids in [vec![], vec![provider], vec![0, 23, 24, u64::MAX]] {
                let params = GetClaimsParams { provider, claim_ids: ids };
                let out = serialize_get_claims_params(&params);
                assert_eq!(out.len(), get_claims_params_size(&params));
            }
        }
    }

    #[test]
    fn remove_expired_params_size_is_exact() {
        for &id in WIDTH_EDGES {
            let allocs = RemoveExpiredAllocationsParams { client: id, allocation_ids: vec![id, 1] };
            let out = serialize_remove_expired_allocations_params(&allocs);
            assert_eq!(out.len(), remove_expired_allocations_params_size(&allocs));

            let claims = RemoveExpiredClaimsParams { provider: 7, claim_ids: vec![id] };
            let out = serialize_remove_expired_claims_params(&claims);
            assert_eq!(out.len(), remove_expired_claims_params_size(&claims));
        }
    }

    #[test]
    fn extend_claim_terms_params_size_is_exact() {
        for terms in [
            vec![],
            vec![ClaimTerm { provider: 1000, claim_id: 24, term_max: -1 }],
            vec![
                ClaimTerm { provider: u64::MAX, claim_id: 0, term_max: i64::MAX },
                ClaimTerm { provider: 1, claim_id: 65536, term_max: i64::MIN },
            ],
        ] {
            let params = ExtendClaimTermsParams { terms };
            let out = serialize_extend_claim_terms_params(&params);
            assert_eq!(out.len(), extend_claim_terms_params_size(&params));
        }
    }

    #[test]
    fn add_verified_client_size_tracks_allowance_width() {
        for allowance in
            [BigInt::from(0), BigInt::from(1), BigInt::from(-1), BigInt::from(1u128 << 100)]
        {
            let params =
                AddVerifiedClientParams { address: Address::new_id(1234), allowance };
            let payload = serialize_big_int(&params.allowance);
            let address = params.address.to_bytes();
            let out = serialize_add_verified_client_params(&params);
            assert_eq!(out.len(), prefix_size(2) + bytes_size(&address) + bytes_size(&payload));
        }
    }

    #[test]
    fn batch_return_codes_fill_in_successes() {
        let batch = BatchReturn {
            success_count: 2,
            fail_codes: vec![FailCode { idx: 1, code: ExitCode::USR_ILLEGAL_ARGUMENT }],
        };
        assert_eq!(batch.size(), 3);
        assert_eq!(
            batch.codes(),
            vec![ExitCode::OK, ExitCode::USR_ILLEGAL_ARGUMENT, ExitCode::OK]
        );
        assert_eq!(BatchReturn::ok(2).codes(), vec![ExitCode::OK, ExitCode::OK]);
        assert_eq!(BatchReturn::empty().codes(), vec![]);
    }
}
