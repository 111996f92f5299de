// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// The error type returned when decoding verified registry message bytes.
///
/// `UnexpectedArrayLength` is the only structural check this layer performs
/// itself; the remaining variants originate from the byte-level CBOR reader
/// and are propagated untranslated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A fixed-shape array reported a length other than the schema constant.
    #[error("unexpected cbor array length (expected {expected}, found {found})")]
    UnexpectedArrayLength { expected: u64, found: u64 },
    /// The buffer ended before the current item was fully read.
    #[error("unexpected end of cbor input at byte {at}")]
    UnexpectedEof { at: usize },
    /// The item at the cursor has a different major type than the schema calls for.
    #[error("unexpected cbor major type {found} at byte {at} (expected {expected})")]
    UnexpectedMajorType { expected: u8, found: u8, at: usize },
    /// Reserved or indefinite-length header, outside the supported subset.
    #[error("unsupported cbor header (additional info {0})")]
    UnsupportedHeader(u8),
    /// A decoded integer does not fit the target field's width.
    #[error("cbor integer out of range for {0}")]
    IntegerOverflow(&'static str),
    /// A big int byte string starts with a byte other than 0 or 1.
    #[error("invalid big int sign byte {0:#04x}")]
    InvalidBigIntSign(u8),
}
