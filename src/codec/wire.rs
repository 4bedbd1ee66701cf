// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Wire primitives shared by every consensus structure.
//!
//! Integers are written as unsigned LEB128 restricted to 63 bits. Byte strings
//! carry a 31-bit varint length prefix. Sub-structures are wrapped in extensible
//! strings: a length prefixed envelope which the reader hands to the sub-structure
//! decoder, silently discarding whatever the decoder did not consume. This lets
//! newer nodes append fields to a sub-structure without breaking older ones.

use std::fmt;

/// Maximum length in bytes of a varint63.
pub const MAX_VARINT63_LEN: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecErr {
    /// Input ended before the structure was complete.
    UnexpectedEof,

    /// Varint is not terminated within 9 bytes, is not minimally
    /// encoded or exceeds 63 bits.
    CorruptVarint,

    /// Value out of the allowed range for its encoding.
    Range,

    /// Unrecognized serialization flag byte.
    UnsupportedSerFlags(u8),

    /// Unrecognized input commitment type.
    UnknownInputType(u8),

    /// Unrecognized output type.
    UnknownOutputType(u8),

    /// Text form is not valid hex.
    InvalidHex,

    /// Bytes left over after a top level structure.
    TrailingBytes,
}

impl fmt::Display for CodecErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected EOF"),
            Self::CorruptVarint => write!(f, "corrupt varint"),
            Self::Range => write!(f, "value out of range"),
            Self::UnsupportedSerFlags(flag) => {
                write!(f, "unsupported serialization flags 0x{flag:02x}")
            }
            Self::UnknownInputType(t) => write!(f, "unknown input type {t}"),
            Self::UnknownOutputType(t) => write!(f, "unknown output type {t}"),
            Self::InvalidHex => write!(f, "invalid hex"),
            Self::TrailingBytes => write!(f, "trailing bytes"),
        }
    }
}

impl std::error::Error for CodecErr {}

/// Cursor over a borrowed byte slice.
pub struct Reader<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    /// Number of bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.off
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.off
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecErr> {
        let v = *self.buf.get(self.off).ok_or(CodecErr::UnexpectedEof)?;
        self.off += 1;
        Ok(v)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecErr> {
        if n > self.remaining() {
            return Err(CodecErr::UnexpectedEof);
        }
        let v = &self.buf[self.off..self.off + n];
        self.off += n;
        Ok(v)
    }

    pub fn read_hash(&mut self) -> Result<[u8; 32], CodecErr> {
        let mut out = [0; 32];
        out.copy_from_slice(self.read_bytes(32)?);
        Ok(out)
    }

    pub fn read_varint63(&mut self) -> Result<u64, CodecErr> {
        let rest = &self.buf[self.off..];
        let window = &rest[..rest.len().min(MAX_VARINT63_LEN)];

        match unsigned_varint::decode::u64(window) {
            Ok((v, tail)) => {
                if v > i64::MAX as u64 {
                    return Err(CodecErr::CorruptVarint);
                }
                self.off += window.len() - tail.len();
                Ok(v)
            }
            Err(unsigned_varint::decode::Error::Insufficient)
                if window.len() < MAX_VARINT63_LEN =>
            {
                Err(CodecErr::UnexpectedEof)
            }
            Err(_) => Err(CodecErr::CorruptVarint),
        }
    }

    pub fn read_varint31(&mut self) -> Result<u32, CodecErr> {
        let v = self.read_varint63()?;
        if v > i32::MAX as u64 {
            return Err(CodecErr::Range);
        }
        Ok(v as u32)
    }

    pub fn read_varstr31(&mut self) -> Result<Vec<u8>, CodecErr> {
        let len = self.read_varint31()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    pub fn read_varstr_list(&mut self) -> Result<Vec<Vec<u8>>, CodecErr> {
        let count = self.read_varint31()? as usize;

        // Every element takes at least one byte
        if count > self.remaining() {
            return Err(CodecErr::UnexpectedEof);
        }

        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read_varstr31()?);
        }
        Ok(out)
    }

    /// Reads a length prefixed envelope and decodes it with `f`. Bytes that `f`
    /// leaves unread inside the envelope are discarded.
    pub fn read_extensible_string<T, F>(&mut self, f: F) -> Result<T, CodecErr>
    where
        F: FnOnce(&mut Reader<'a>) -> Result<T, CodecErr>,
    {
        let len = self.read_varint31()? as usize;
        let body = self.read_bytes(len)?;
        let mut sub = Reader::new(body);
        f(&mut sub)
    }
}

/// Growable output buffer for wire structures.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn write_varint63(&mut self, v: u64) -> Result<(), CodecErr> {
        if v > i64::MAX as u64 {
            return Err(CodecErr::Range);
        }
        let mut scratch = unsigned_varint::encode::u64_buffer();
        self.buf
            .extend_from_slice(unsigned_varint::encode::u64(v, &mut scratch));
        Ok(())
    }

    pub fn write_varint31(&mut self, v: u64) -> Result<(), CodecErr> {
        if v > i32::MAX as u64 {
            return Err(CodecErr::Range);
        }
        self.write_varint63(v)
    }

    pub fn write_varstr31(&mut self, v: &[u8]) -> Result<(), CodecErr> {
        self.write_varint31(v.len() as u64)?;
        self.write_bytes(v);
        Ok(())
    }

    pub fn write_varstr_list(&mut self, list: &[Vec<u8>]) -> Result<(), CodecErr> {
        self.write_varint31(list.len() as u64)?;
        for item in list {
            self.write_varstr31(item)?;
        }
        Ok(())
    }

    /// Writes the output of `f` as a length prefixed envelope.
    pub fn write_extensible_string<F>(&mut self, f: F) -> Result<(), CodecErr>
    where
        F: FnOnce(&mut Writer) -> Result<(), CodecErr>,
    {
        let mut sub = Writer::new();
        f(&mut sub)?;
        self.write_varstr31(sub.as_slice())
    }
}
