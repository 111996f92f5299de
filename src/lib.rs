// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! CBOR message codec for calling the Filecoin verified registry actor.
//!
//! Serializers turn typed parameter structs into exact-size byte buffers
//! ready to be attached to a cross-actor call; deserializers turn the
//! untrusted reply bytes back into typed return structs, rejecting any
//! buffer whose fixed-shape array headers do not match the message schema.
//! Dispatching the call itself is the caller's concern.

use num_derive::FromPrimitive;

pub use self::error::Error;
pub use self::messages::*;
pub use self::types::*;

mod cbor;
mod error;
mod messages;
mod types;

/// Verified registry actor methods reachable through this codec.
#[derive(FromPrimitive, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Method {
    AddVerifiedClient = 4,
    RemoveExpiredAllocations = 8,
    GetClaims = 10,
    ExtendClaimTerms = 11,
    RemoveExpiredClaims = 12,
}
