//! # Integer Codec
//!
//! The tiny integer encoding used for every length and counter field on the
//! wire. The default is unsigned LEB128 (seven bits per byte, high bit means
//! "more follows"), which keeps small counters and chunk lengths at one or two
//! bytes. Fixed-width big-endian variants exist for callers who'd rather pay
//! a few bytes for predictable framing.
//!
//! Decoding is incremental: [`IntEncoding::decode`] tells "not enough bytes
//! yet" apart from "these bytes can never be a valid integer". The stream
//! decoder leans on that distinction when length prefixes arrive one byte at
//! a time.

use serde::{Deserialize, Serialize};

use crate::config::VARINT_MAX_LENGTH;
use crate::error::{Error, Result};

/// How an unsigned integer is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntEncoding {
    /// Unsigned LEB128, 1 to 10 bytes.
    #[default]
    Varint,
    /// One byte.
    Fixed1,
    /// Two bytes, big-endian.
    Fixed2,
    /// Four bytes, big-endian.
    Fixed4,
    /// Eight bytes, big-endian.
    Fixed8,
}

impl IntEncoding {
    /// Number of bytes `n` occupies, or `None` if it doesn't fit at all.
    pub fn size(self, n: u64) -> Option<usize> {
        match self {
            IntEncoding::Varint => Some(varint_len(n)),
            IntEncoding::Fixed1 => (n <= u64::from(u8::MAX)).then_some(1),
            IntEncoding::Fixed2 => (n <= u64::from(u16::MAX)).then_some(2),
            IntEncoding::Fixed4 => (n <= u64::from(u32::MAX)).then_some(4),
            IntEncoding::Fixed8 => Some(8),
        }
    }

    /// Largest number of bytes any value can occupy.
    pub fn max_size(self) -> usize {
        match self {
            IntEncoding::Varint => VARINT_MAX_LENGTH,
            IntEncoding::Fixed1 => 1,
            IntEncoding::Fixed2 => 2,
            IntEncoding::Fixed4 => 4,
            IntEncoding::Fixed8 => 8,
        }
    }

    /// Append the encoding of `n` to `out` and return how many bytes were
    /// written. Fails with [`Error::IntEncoding`] when a fixed-width variant
    /// is too narrow for `n`; nothing is appended in that case.
    pub fn encode(self, n: u64, out: &mut Vec<u8>) -> Result<usize> {
        let size = self.size(n).ok_or(Error::IntEncoding)?;
        match self {
            IntEncoding::Varint => {
                let mut rest = n;
                while rest >= 0x80 {
                    out.push((rest as u8) | 0x80);
                    rest >>= 7;
                }
                out.push(rest as u8);
            }
            IntEncoding::Fixed1 => out.push(n as u8),
            IntEncoding::Fixed2 => out.extend_from_slice(&(n as u16).to_be_bytes()),
            IntEncoding::Fixed4 => out.extend_from_slice(&(n as u32).to_be_bytes()),
            IntEncoding::Fixed8 => out.extend_from_slice(&n.to_be_bytes()),
        }
        Ok(size)
    }

    /// Decode a value from the start of `buf`.
    ///
    /// Returns `Ok(Some((value, consumed)))` once a full value is present,
    /// `Ok(None)` if `buf` is a valid but incomplete prefix, and
    /// [`Error::IntEncoding`] if no amount of extra bytes could make it valid
    /// (a varint longer than ten bytes or overflowing 64 bits).
    pub fn decode(self, buf: &[u8]) -> Result<Option<(u64, usize)>> {
        match self {
            IntEncoding::Varint => decode_varint(buf),
            fixed => {
                let width = fixed.max_size();
                if buf.len() < width {
                    return Ok(None);
                }
                let value = buf[..width]
                    .iter()
                    .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
                Ok(Some((value, width)))
            }
        }
    }

    /// Decode a value that must be entirely present in `buf`. An incomplete
    /// prefix is an error here, not a request for more bytes.
    pub fn decode_complete(self, buf: &[u8]) -> Result<(u64, usize)> {
        self.decode(buf)?.ok_or(Error::IntEncoding)
    }
}

fn varint_len(n: u64) -> usize {
    let bits = (u64::BITS - n.leading_zeros()) as usize;
    bits.div_ceil(7).max(1)
}

fn decode_varint(buf: &[u8]) -> Result<Option<(u64, usize)>> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().enumerate() {
        // The tenth byte holds bit 63 only.
        if i == VARINT_MAX_LENGTH - 1 && byte > 1 {
            return Err(Error::IntEncoding);
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte < 0x80 {
            return Ok(Some((value, i + 1)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encoded(encoding: IntEncoding, n: u64) -> Vec<u8> {
        let mut out = Vec::new();
        encoding.encode(n, &mut out).unwrap();
        out
    }

    #[test]
    fn test_varint_known_vectors() {
        assert_eq!(encoded(IntEncoding::Varint, 0), vec![0x00]);
        assert_eq!(encoded(IntEncoding::Varint, 1), vec![0x01]);
        assert_eq!(encoded(IntEncoding::Varint, 127), vec![0x7f]);
        assert_eq!(encoded(IntEncoding::Varint, 128), vec![0x80, 0x01]);
        assert_eq!(encoded(IntEncoding::Varint, 300), vec![0xac, 0x02]);
        assert_eq!(encoded(IntEncoding::Varint, u64::MAX).len(), 10);
    }

    #[test]
    fn test_fixed_widths_are_big_endian() {
        assert_eq!(encoded(IntEncoding::Fixed2, 0x0102), vec![0x01, 0x02]);
        assert_eq!(
            encoded(IntEncoding::Fixed4, 0x0102_0304),
            vec![0x01, 0x02, 0x03, 0x04]
        );
        assert_eq!(encoded(IntEncoding::Fixed8, 1), vec![0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_fixed_width_rejects_values_that_do_not_fit() {
        let mut out = vec![0xaa];
        assert_eq!(
            IntEncoding::Fixed1.encode(256, &mut out),
            Err(Error::IntEncoding)
        );
        // Nothing appended on failure.
        assert_eq!(out, vec![0xaa]);
        assert_eq!(IntEncoding::Fixed2.size(70_000), None);
        assert_eq!(IntEncoding::Fixed4.size(u64::from(u32::MAX)), Some(4));
    }

    #[test]
    fn test_incomplete_prefix_asks_for_more() {
        assert_eq!(IntEncoding::Varint.decode(&[]), Ok(None));
        assert_eq!(IntEncoding::Varint.decode(&[0x80]), Ok(None));
        assert_eq!(IntEncoding::Varint.decode(&[0x80, 0x80]), Ok(None));
        assert_eq!(IntEncoding::Fixed4.decode(&[0, 0, 1]), Ok(None));
    }

    #[test]
    fn test_overlong_varint_is_malformed() {
        let mut overlong = vec![0xff; 9];
        overlong.push(0x02);
        assert_eq!(IntEncoding::Varint.decode(&overlong), Err(Error::IntEncoding));

        let endless = vec![0x80; 12];
        assert_eq!(IntEncoding::Varint.decode(&endless), Err(Error::IntEncoding));
    }

    #[test]
    fn test_decode_complete_rejects_truncation() {
        assert_eq!(
            IntEncoding::Varint.decode_complete(&[0x80]),
            Err(Error::IntEncoding)
        );
        assert_eq!(IntEncoding::Varint.decode_complete(&[0x05, 0xff]), Ok((5, 1)));
    }

    proptest! {
        #[test]
        fn varint_size_matches_encoding(n in any::<u64>()) {
            let bytes = encoded(IntEncoding::Varint, n);
            prop_assert_eq!(Some(bytes.len()), IntEncoding::Varint.size(n));
            prop_assert_eq!(IntEncoding::Varint.decode(&bytes), Ok(Some((n, bytes.len()))));
        }

        /// Feeding a value byte by byte only succeeds on the final byte.
        #[test]
        fn varint_prefixes_are_incomplete(n in any::<u64>(), trailing in proptest::collection::vec(any::<u8>(), 0..4)) {
            let bytes = encoded(IntEncoding::Varint, n);
            for cut in 0..bytes.len() {
                prop_assert_eq!(IntEncoding::Varint.decode(&bytes[..cut]), Ok(None));
            }
            let mut padded = bytes.clone();
            padded.extend_from_slice(&trailing);
            prop_assert_eq!(IntEncoding::Varint.decode(&padded), Ok(Some((n, bytes.len()))));
        }
    }
}
