//! HPACK header compression (RFC 7541)
//!
//! Static table, per-connection dynamic table, integer and string
//! primitive encodings, Huffman coding, and the header-field
//! representation state machine.
//!
//! Encoder ([`HeaderPacker`]) and decoder ([`HeadersParser`]) each keep
//! a private dynamic table; there is no shared mutable state across
//! connections.

pub mod decoder;
pub mod encoder;
pub mod huffman;
pub mod table;

pub use decoder::HeadersParser;
pub use encoder::{HeaderPacker, Indexing};
pub use table::{DynamicTable, TableEntry};

use super::error::{Error, Result};
use super::wire::Tokenizer;

/// Largest decodable HPACK integer.
///
/// Values above this are rejected as overflow rather than wrapped.
pub const MAX_INTEGER: u64 = (1 << 53) - 1;

/// Encode an integer with an N-bit prefix (RFC 7541 Section 5.1).
///
/// `flags` carries the representation's leading bits and is OR-ed into
/// the first octet.
pub(crate) fn encode_integer(out: &mut Vec<u8>, value: u64, prefix_bits: u8, flags: u8) {
    debug_assert!((1..=8).contains(&prefix_bits));
    let max_prefix = (1u64 << prefix_bits) - 1;

    if value < max_prefix {
        out.push(flags | value as u8);
        return;
    }

    out.push(flags | max_prefix as u8);
    let mut remaining = value - max_prefix;
    while remaining >= 128 {
        out.push((remaining & 0x7F) as u8 | 0x80);
        remaining >>= 7;
    }
    out.push(remaining as u8);
}

/// Decode an N-bit-prefix integer, consuming continuation octets.
///
/// Rejects values past [`MAX_INTEGER`] instead of wrapping.
pub(crate) fn decode_integer(tok: &mut Tokenizer, prefix_bits: u8) -> Result<u64> {
    debug_assert!((1..=8).contains(&prefix_bits));
    let max_prefix = (1u64 << prefix_bits) - 1;

    let first = u64::from(tok.u8()?) & max_prefix;
    if first < max_prefix {
        return Ok(first);
    }

    let mut value = max_prefix;
    let mut shift = 0u32;
    loop {
        let byte = tok.u8()?;
        let increment = (u64::from(byte & 0x7F))
            .checked_shl(shift)
            .ok_or(Error::IntegerOverflow)?;
        value = value.checked_add(increment).ok_or(Error::IntegerOverflow)?;
        if value > MAX_INTEGER {
            return Err(Error::IntegerOverflow);
        }
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

/// Encode a string literal: 1-bit Huffman flag, 7-bit-prefixed length,
/// then raw or Huffman-coded octets (RFC 7541 Section 5.2).
pub(crate) fn encode_string(out: &mut Vec<u8>, data: &[u8], use_huffman: bool) {
    if use_huffman {
        let coded = huffman::encode(data);
        encode_integer(out, coded.len() as u64, 7, 0x80);
        out.extend_from_slice(&coded);
    } else {
        encode_integer(out, data.len() as u64, 7, 0x00);
        out.extend_from_slice(data);
    }
}

/// Decode a string literal, handling the Huffman flag.
pub(crate) fn decode_string(tok: &mut Tokenizer) -> Result<Vec<u8>> {
    let huffman_coded = match tok.peek() {
        Some(byte) => byte & 0x80 != 0,
        None => return Err(Error::Incomplete),
    };
    let length = decode_integer(tok, 7)? as usize;
    let data = tok.area(length)?;
    if huffman_coded {
        huffman::decode(data)
    } else {
        Ok(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_int(bytes: &[u8], prefix: u8) -> Result<u64> {
        decode_integer(&mut Tokenizer::from_bytes(bytes), prefix)
    }

    #[test]
    fn test_integer_fits_in_prefix() {
        // RFC 7541 Appendix C.1.1: 10 with a 5-bit prefix.
        let mut out = Vec::new();
        encode_integer(&mut out, 10, 5, 0);
        assert_eq!(out, [0x0a]);
        assert_eq!(decode_int(&out, 5).unwrap(), 10);
    }

    #[test]
    fn test_integer_with_continuation() {
        // RFC 7541 Appendix C.1.2: 1337 with a 5-bit prefix.
        let mut out = Vec::new();
        encode_integer(&mut out, 1337, 5, 0);
        assert_eq!(out, [0x1f, 0x9a, 0x0a]);
        assert_eq!(decode_int(&out, 5).unwrap(), 1337);
    }

    #[test]
    fn test_integer_boundary() {
        // Exactly 2^N - 1 needs a zero continuation octet.
        let mut out = Vec::new();
        encode_integer(&mut out, 31, 5, 0);
        assert_eq!(out, [0x1f, 0x00]);
        assert_eq!(decode_int(&out, 5).unwrap(), 31);
    }

    #[test]
    fn test_integer_flags_preserved() {
        let mut out = Vec::new();
        encode_integer(&mut out, 2, 7, 0x80);
        assert_eq!(out, [0x82]);
    }

    #[test]
    fn test_integer_incomplete() {
        // Continuation bit set but no following octet.
        assert!(matches!(decode_int(&[0x1f, 0x9a], 5), Err(Error::Incomplete)));
    }

    #[test]
    fn test_integer_overflow_rejected() {
        // 11 continuation octets with the high bit set push past 2^53.
        let mut bytes = vec![0x1f];
        bytes.extend_from_slice(&[0xff; 11]);
        bytes.push(0x7f);
        assert!(matches!(
            decode_int(&bytes, 5),
            Err(Error::IntegerOverflow)
        ));
    }

    #[test]
    fn test_string_raw_round_trip() {
        let mut out = Vec::new();
        encode_string(&mut out, b"custom-key", false);
        assert_eq!(out[0], 0x0a);
        let mut tok = Tokenizer::from_bytes(&out);
        assert_eq!(decode_string(&mut tok).unwrap(), b"custom-key");
    }

    #[test]
    fn test_string_huffman_round_trip() {
        let mut out = Vec::new();
        encode_string(&mut out, b"www.example.com", true);
        // Huffman flag set, coded length 12 (RFC 7541 Appendix C.4.1).
        assert_eq!(out[0], 0x8c);
        let mut tok = Tokenizer::from_bytes(&out);
        assert_eq!(decode_string(&mut tok).unwrap(), b"www.example.com");
    }

    #[test]
    fn test_string_truncated_waits() {
        let mut out = Vec::new();
        encode_string(&mut out, b"hello", false);
        let mut tok = Tokenizer::from_bytes(&out[..3]);
        assert!(matches!(decode_string(&mut tok), Err(Error::Incomplete)));
    }
}
