//! Binary tokenizer and packer
//!
//! Primitive big-endian reads/writes over an accumulating byte buffer.
//! Every read either succeeds completely or raises [`Error::Incomplete`]
//! without consuming anything, so a caller can retry the same logical
//! operation after feeding more bytes. `skip_exact` raises the distinct
//! [`Error::UnexpectedBytes`] on a mismatch, letting callers react
//! differently to "wait" and "reject".

use super::error::{Error, Result};
use bytes::Bytes;

/// Cursor-based reader over an accumulating byte buffer.
#[derive(Debug, Default)]
pub struct Tokenizer {
    buf: Vec<u8>,
    pos: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Tokenizer::default()
    }

    /// Create a tokenizer over a complete buffer, for decoding
    /// fully-buffered structures such as HPACK blocks.
    pub fn from_bytes(data: &[u8]) -> Self {
        Tokenizer {
            buf: data.to_vec(),
            pos: 0,
        }
    }

    /// Append raw bytes to the buffer.
    pub fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Current cursor position, for a later [`rollback`].
    ///
    /// [`rollback`]: Tokenizer::rollback
    pub fn checkpoint(&self) -> usize {
        self.pos
    }

    /// Rewind the cursor to an earlier checkpoint.
    pub fn rollback(&mut self, checkpoint: usize) {
        debug_assert!(checkpoint <= self.pos);
        self.pos = checkpoint;
    }

    /// Drop the consumed prefix to keep the buffer bounded.
    pub fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }

    /// Bytes buffered but not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Read exactly `len` bytes.
    pub fn area(&mut self, len: usize) -> Result<&[u8]> {
        if self.remaining() < len {
            return Err(Error::Incomplete);
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.area(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        let bytes = self.area(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn u24(&mut self) -> Result<u32> {
        let bytes = self.area(3)?;
        Ok(((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let bytes = self.area(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read one byte as a leading reserved bit plus a 7-bit value.
    pub fn u1p7(&mut self) -> Result<(bool, u8)> {
        let byte = self.u8()?;
        Ok((byte & 0x80 != 0, byte & 0x7F))
    }

    /// Read four bytes as a leading reserved bit plus a 31-bit value.
    pub fn u1p31(&mut self) -> Result<(bool, u32)> {
        let value = self.u32()?;
        Ok((value & 0x8000_0000 != 0, value & 0x7FFF_FFFF))
    }

    /// Verify and consume the literal `expected`.
    ///
    /// A mismatch within the buffered bytes raises `UnexpectedBytes`
    /// and leaves the cursor untouched; a matching prefix that is
    /// merely shorter than `expected` raises `Incomplete`.
    pub fn skip_exact(&mut self, expected: &[u8]) -> Result<()> {
        let available = self.remaining().min(expected.len());
        let found = &self.buf[self.pos..self.pos + available];
        if found != &expected[..available] {
            return Err(Error::UnexpectedBytes {
                expected: expected.to_vec(),
                found: found.to_vec(),
            });
        }
        if available < expected.len() {
            return Err(Error::Incomplete);
        }
        self.pos += expected.len();
        Ok(())
    }
}

/// Builder appending the same encodings the tokenizer reads.
#[derive(Debug, Default)]
pub struct Packer {
    buf: Vec<u8>,
}

impl Packer {
    pub fn new() -> Self {
        Packer::default()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u24(&mut self, value: u32) -> &mut Self {
        debug_assert!(value <= 0x00FF_FFFF);
        self.buf
            .extend_from_slice(&[(value >> 16) as u8, (value >> 8) as u8, value as u8]);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Write a reserved bit plus a 31-bit value.
    pub fn u1p31(&mut self, reserved: bool, value: u32) -> &mut Self {
        let mut word = value & 0x7FFF_FFFF;
        if reserved {
            word |= 0x8000_0000;
        }
        self.u32(word)
    }

    pub fn area(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buf)
    }
}
