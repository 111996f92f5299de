// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Byte-level CBOR reader/writer for the message subset the verified
//! registry actor speaks: definite-length arrays, unsigned and negative
//! integers, and byte strings. No maps, tags, floats, or indefinite-length
//! items.
//!
//! Every writer has a size-prediction twin so message codecs can allocate
//! their output buffer exactly once, at the exact encoded length.

use fvm_shared::bigint::{BigInt, Sign};
use fvm_shared::clock::ChainEpoch;
use fvm_shared::ActorID;

use crate::error::Error;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_ARRAY: u8 = 4;

/// Cursor-threaded reader over an untrusted byte buffer.
pub(crate) struct CborReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> CborReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        let b = *self.buf.get(self.pos).ok_or(Error::UnexpectedEof { at: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    fn read_exact(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(len).ok_or(Error::UnexpectedEof { at: self.pos })?;
        let s = self.buf.get(self.pos..end).ok_or(Error::UnexpectedEof { at: self.pos })?;
        self.pos = end;
        Ok(s)
    }

    /// Reads one header byte plus its argument, whatever the major type.
    fn read_raw_header(&mut self) -> Result<(u8, u64), Error> {
        let b = self.read_byte()?;
        let value = match b & 0x1f {
            info @ 0..=23 => info as u64,
            24 => self.read_byte()? as u64,
            25 => {
                let s = self.read_exact(2)?;
                u16::from_be_bytes([s[0], s[1]]) as u64
            }
            26 => {
                let s = self.read_exact(4)?;
                u32::from_be_bytes([s[0], s[1], s[2], s[3]]) as u64
            }
            27 => {
                let s = self.read_exact(8)?;
                u64::from_be_bytes([s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]])
            }
            info => return Err(Error::UnsupportedHeader(info)),
        };
        Ok((b >> 5, value))
    }

    fn read_header(&mut self, expected_major: u8) -> Result<u64, Error> {
        let at = self.pos;
        let (major, value) = self.read_raw_header()?;
        if major != expected_major {
            return Err(Error::UnexpectedMajorType { expected: expected_major, found: major, at });
        }
        Ok(value)
    }

    /// Reads a fixed-array header and returns the element count.
    pub fn read_fixed_array(&mut self) -> Result<u64, Error> {
        self.read_header(MAJOR_ARRAY)
    }

    /// Reads a fixed-array header and checks the count against a schema constant.
    pub fn expect_fixed_array(&mut self, expected: u64) -> Result<(), Error> {
        let found = self.read_fixed_array()?;
        if found != expected {
            return Err(Error::UnexpectedArrayLength { expected, found });
        }
        Ok(())
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        self.read_header(MAJOR_UNSIGNED)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        u32::try_from(self.read_u64()?).map_err(|_| Error::IntegerOverflow("u32"))
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, Error> {
        let len = self.read_header(MAJOR_BYTES)?;
        let len = usize::try_from(len).map_err(|_| Error::IntegerOverflow("usize"))?;
        Ok(self.read_exact(len)?.to_vec())
    }

    pub fn read_actor_id(&mut self) -> Result<ActorID, Error> {
        self.read_u64()
    }

    pub fn read_chain_epoch(&mut self) -> Result<ChainEpoch, Error> {
        let at = self.pos;
        let (major, value) = self.read_raw_header()?;
        if major != MAJOR_UNSIGNED && major != MAJOR_NEGATIVE {
            return Err(Error::UnexpectedMajorType { expected: MAJOR_UNSIGNED, found: major, at });
        }
        let magnitude =
            i64::try_from(value).map_err(|_| Error::IntegerOverflow("chain epoch"))?;
        if major == MAJOR_NEGATIVE {
            Ok(-1 - magnitude)
        } else {
            Ok(magnitude)
        }
    }

    /// Reads a sign-prefixed big int byte string. The empty string is zero.
    pub fn read_big_int(&mut self) -> Result<BigInt, Error> {
        let bytes = self.read_bytes()?;
        let Some((&sign, magnitude)) = bytes.split_first() else {
            return Ok(BigInt::default());
        };
        let sign = match sign {
            0 => Sign::Plus,
            1 => Sign::Minus,
            other => return Err(Error::InvalidBigIntSign(other)),
        };
        Ok(BigInt::from_bytes_be(sign, magnitude))
    }
}

/// Writer over a buffer pre-sized to the exact encoded length.
///
/// `finish` checks the produced length against the predicted one in debug
/// builds; the two must always agree.
pub(crate) struct CborWriter {
    buf: Vec<u8>,
    predicted: usize,
}

impl CborWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity), predicted: capacity }
    }

    fn write_header(&mut self, major: u8, value: u64) {
        if value < 24 {
            self.buf.push(major << 5 | value as u8);
        } else if value <= u8::MAX as u64 {
            self.buf.push(major << 5 | 24);
            self.buf.push(value as u8);
        } else if value <= u16::MAX as u64 {
            self.buf.push(major << 5 | 25);
            self.buf.extend_from_slice(&(value as u16).to_be_bytes());
        } else if value <= u32::MAX as u64 {
            self.buf.push(major << 5 | 26);
            self.buf.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buf.push(major << 5 | 27);
            self.buf.extend_from_slice(&value.to_be_bytes());
        }
    }

    pub fn start_fixed_array(&mut self, count: u64) {
        self.write_header(MAJOR_ARRAY, count);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_header(MAJOR_UNSIGNED, value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_header(MAJOR_BYTES, bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_actor_id(&mut self, id: ActorID) {
        self.write_u64(id);
    }

    pub fn write_chain_epoch(&mut self, epoch: ChainEpoch) {
        if epoch < 0 {
            self.write_header(MAJOR_NEGATIVE, (-1 - epoch) as u64);
        } else {
            self.write_header(MAJOR_UNSIGNED, epoch as u64);
        }
    }

    pub fn finish(self) -> Vec<u8> {
        debug_assert_eq!(self.buf.len(), self.predicted, "size prediction out of step with writer");
        self.buf
    }
}

/// Encoded size of an integer header and its argument.
pub(crate) fn uint_size(value: u64) -> usize {
    match value {
        0..=23 => 1,
        24..=0xff => 2,
        0x100..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Byte cost of a fixed-array header for `count` elements.
pub(crate) fn prefix_size(count: u64) -> usize {
    uint_size(count)
}

pub(crate) fn bytes_size(bytes: &[u8]) -> usize {
    uint_size(bytes.len() as u64) + bytes.len()
}

pub(crate) fn actor_id_size(id: ActorID) -> usize {
    uint_size(id)
}

pub(crate) fn chain_epoch_size(epoch: ChainEpoch) -> usize {
    if epoch < 0 {
        uint_size((-1 - epoch) as u64)
    } else {
        uint_size(epoch as u64)
    }
}

/// Sign-prefixed big-endian payload: one sign byte (0 non-negative, 1
/// negative) followed by the magnitude. Zero is the single byte 0x00.
pub(crate) fn serialize_big_int(value: &BigInt) -> Vec<u8> {
    let (sign, magnitude) = value.to_bytes_be();
    let mut payload = Vec::with_capacity(1 + magnitude.len());
    payload.push(if sign == Sign::Minus { 1 } else { 0 });
    if sign != Sign::NoSign {
        payload.extend_from_slice(&magnitude);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut CborWriter), size: usize) -> Vec<u8> {
        let mut w = CborWriter::with_capacity(size);
        f(&mut w);
        w.finish()
    }

    #[test]
    fn uint_widths_round_trip() {
        for v in [0, 23, 24, 255, 256, 65535, 65536, u32::MAX as u64, u32::MAX as u64 + 1, u64::MAX]
        {
            let bytes = written(|w| w.write_u64(v), uint_size(v));
            assert_eq!(bytes.len(), uint_size(v));
            assert_eq!(CborReader::new(&bytes).read_u64().unwrap(), v);
        }
    }

    #[test]
    fn chain_epoch_negative_values() {
        assert_eq!(written(|w| w.write_chain_epoch(-1), 1), [0x20]);
        for epoch in [0, -1, 1, -24, -25, i64::MAX, i64::MIN] {
            let bytes = written(|w| w.write_chain_epoch(epoch), chain_epoch_size(epoch));
            assert_eq!(CborReader::new(&bytes).read_chain_epoch().unwrap(), epoch);
        }
    }

    #[test]
    fn chain_epoch_rejects_non_integer_major() {
        // 0x43: 3-byte byte string where an epoch is expected.
        let err = CborReader::new(&[0x43, 1, 2, 3]).read_chain_epoch().unwrap_err();
        assert_eq!(err, Error::UnexpectedMajorType { expected: 0, found: 2, at: 0 });
    }

    #[test]
    fn big_int_sign_prefixed_payloads() {
        assert_eq!(serialize_big_int(&BigInt::from(0)), [0x00]);
        assert_eq!(serialize_big_int(&BigInt::from(255)), [0x00, 0xff]);
        assert_eq!(serialize_big_int(&BigInt::from(-255)), [0x01, 0xff]);
        assert_eq!(serialize_big_int(&BigInt::from(1u128 << 64)), [0, 1, 0, 0, 0, 0, 0, 0, 0, 0]);

        for v in [BigInt::from(0), BigInt::from(1u128 << 100), BigInt::from(-42)] {
            let payload = serialize_big_int(&v);
            let bytes = written(|w| w.write_bytes(&payload), bytes_size(&payload));
            assert_eq!(CborReader::new(&bytes).read_big_int().unwrap(), v);
        }
    }

    #[test]
    fn big_int_empty_string_is_zero() {
        // 0x40: zero-length byte string.
        assert_eq!(CborReader::new(&[0x40]).read_big_int().unwrap(), BigInt::from(0));
    }

    #[test]
    fn big_int_rejects_unknown_sign_byte() {
        let err = CborReader::new(&[0x42, 0x02, 0xff]).read_big_int().unwrap_err();
        assert_eq!(err, Error::InvalidBigIntSign(0x02));
    }

    #[test]
    fn truncated_input_reports_eof_position() {
        assert_eq!(CborReader::new(&[]).read_u64().unwrap_err(), Error::UnexpectedEof { at: 0 });
        // Header claims an 8-byte argument but only 2 follow.
        let err = CborReader::new(&[0x1b, 0, 0]).read_u64().unwrap_err();
        assert_eq!(err, Error::UnexpectedEof { at: 1 });
        // Byte string header claims 4 bytes but only 1 follows.
        let err = CborReader::new(&[0x44, 0xaa]).read_bytes().unwrap_err();
        assert_eq!(err, Error::UnexpectedEof { at: 1 });
    }

    #[test]
    fn indefinite_length_items_rejected() {
        let err = CborReader::new(&[0x9f]).read_fixed_array().unwrap_err();
        assert_eq!(err, Error::UnsupportedHeader(31));
    }

    #[test]
    fn u32_range_checked() {
        let bytes = written(|w| w.write_u64(u32::MAX as u64 + 1), 9);
        assert_eq!(
            CborReader::new(&bytes).read_u32().unwrap_err(),
            Error::IntegerOverflow("u32")
        );
    }
}
