//! Little-endian packing primitives for the token wire format.
//!
//! | Primitive | Layout |
//! |-----------|--------|
//! | `u16` | 2 bytes, little-endian |
//! | `u32` | 4 bytes, little-endian |
//! | `string` | `u16` byte length, then the UTF-8 bytes |
//! | `map_u32` | `u16` entry count, then `(u16 key, u32 value)` pairs in ascending key order |

use crate::error::TokenError;
use std::collections::BTreeMap;

/// Narrow a wider integer to `u16`, failing instead of truncating.
pub fn checked_u16(field: &'static str, value: u64) -> Result<u16, TokenError> {
    u16::try_from(value).map_err(|_| TokenError::EncodingOverflow {
        field,
        value,
        max: u64::from(u16::MAX),
    })
}

/// Narrow a wider integer to `u32`, failing instead of truncating.
pub fn checked_u32(field: &'static str, value: u64) -> Result<u32, TokenError> {
    u32::try_from(value).map_err(|_| TokenError::EncodingOverflow {
        field,
        value,
        max: u64::from(u32::MAX),
    })
}

/// Append-only buffer of packed fields.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Length-prefixed byte string.
    pub fn put_bytes(&mut self, field: &'static str, bytes: &[u8]) -> Result<&mut Self, TokenError> {
        let len = checked_u16(field, bytes.len() as u64)?;
        self.put_u16(len);
        self.buf.extend_from_slice(bytes);
        Ok(self)
    }

    /// Length-prefixed UTF-8 string.
    pub fn put_string(&mut self, field: &'static str, value: &str) -> Result<&mut Self, TokenError> {
        self.put_bytes(field, value.as_bytes())
    }

    /// Count-prefixed map. `BTreeMap` iteration gives the ascending key order
    /// the format requires.
    pub fn put_map_u32(
        &mut self,
        field: &'static str,
        map: &BTreeMap<u16, u32>,
    ) -> Result<&mut Self, TokenError> {
        let count = checked_u16(field, map.len() as u64)?;
        self.put_u16(count);
        for (key, value) in map {
            self.put_u16(*key).put_u32(*value);
        }
        Ok(self)
    }

    /// Append already-packed bytes without a prefix.
    pub fn put_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
pub(crate) mod reader {
    //! Minimal decoder used to check what the writer produced.

    use std::collections::BTreeMap;

    pub struct ByteReader<'a> {
        buf: &'a [u8],
        pos: usize,
    }

    impl<'a> ByteReader<'a> {
        pub fn new(buf: &'a [u8]) -> Self {
            Self { buf, pos: 0 }
        }

        fn take(&mut self, n: usize) -> &'a [u8] {
            let buf = self.buf;
            let out = &buf[self.pos..self.pos + n];
            self.pos += n;
            out
        }

        pub fn u16(&mut self) -> u16 {
            u16::from_le_bytes(self.take(2).try_into().unwrap())
        }

        pub fn u32(&mut self) -> u32 {
            u32::from_le_bytes(self.take(4).try_into().unwrap())
        }

        pub fn bytes(&mut self) -> &'a [u8] {
            let len = self.u16() as usize;
            self.take(len)
        }

        pub fn string(&mut self) -> String {
            String::from_utf8(self.bytes().to_vec()).unwrap()
        }

        pub fn map_u32(&mut self) -> BTreeMap<u16, u32> {
            let count = self.u16();
            (0..count).map(|_| (self.u16(), self.u32())).collect()
        }

        pub fn remaining(&self) -> usize {
            self.buf.len() - self.pos
        }
    }
}
