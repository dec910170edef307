// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read/write cursors for the big-endian value encoding.
//!

use super::{CodecError, CodecResult};

/// Generate write methods for fixed-width integers (big-endian, growable buffer)
macro_rules! impl_write_be {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
    };
}

/// Generate read methods for fixed-width integers (big-endian, bounds-checked)
///
/// Each generated method:
/// 1. Checks buffer bounds (returns `CodecError::ReadFailed` if overflow)
/// 2. Reads N bytes from buffer
/// 3. Converts bytes to value via `from_be_bytes()`
/// 4. Advances offset
macro_rules! impl_read_be {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> CodecResult<$type> {
            if self.offset + $size > self.buffer.len() {
                return Err(CodecError::ReadFailed {
                    offset: self.offset,
                    reason: "unexpected end of buffer".into(),
                });
            }
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(&self.buffer[self.offset..self.offset + $size]);
            self.offset += $size;
            Ok(<$type>::from_be_bytes(bytes))
        }
    };
}

/// Append-only sink used by the encoder
#[derive(Default)]
pub struct ByteSink {
    buffer: Vec<u8>,
}

impl ByteSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    impl_write_be!(write_u8, u8);
    impl_write_be!(write_u16, u16);
    impl_write_be!(write_u32, u32);
    impl_write_be!(write_u64, u64);
    impl_write_be!(write_i8, i8);
    impl_write_be!(write_i16, i16);
    impl_write_be!(write_i32, i32);
    impl_write_be!(write_i64, i64);

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Reserve a 4-byte slot to be patched later (list/map sizes).
    pub fn reserve_u32(&mut self) -> usize {
        let at = self.buffer.len();
        self.buffer.extend_from_slice(&[0u8; 4]);
        at
    }

    pub fn patch_u32(&mut self, at: usize, value: u32) {
        self.buffer[at..at + 4].copy_from_slice(&value.to_be_bytes());
    }

    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Immutable cursor for reading (bounds-checked, zero-copy)
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    impl_read_be!(read_u8, u8, 1);
    impl_read_be!(read_u16, u16, 2);
    impl_read_be!(read_u32, u32, 4);
    impl_read_be!(read_u64, u64, 8);
    impl_read_be!(read_i8, i8, 1);
    impl_read_be!(read_i16, i16, 2);
    impl_read_be!(read_i32, i32, 4);
    impl_read_be!(read_i64, i64, 8);

    pub fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.offset + len > self.buffer.len() {
            return Err(CodecError::ReadFailed {
                offset: self.offset,
                reason: "unexpected end of buffer".into(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn peek_u8(&self) -> CodecResult<u8> {
        self.buffer
            .get(self.offset)
            .copied()
            .ok_or_else(|| CodecError::ReadFailed {
                offset: self.offset,
                reason: "unexpected end of buffer".into(),
            })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    /// Bytes not consumed yet.
    pub fn rest(&self) -> &'a [u8] {
        &self.buffer[self.offset.min(self.buffer.len())..]
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_U16: u16 = 0xCDEF;
    const TEST_U32: u32 = 0x1234_5678;
    const TEST_U64: u64 = 0x1122_3344_5566_7788;

    #[test]
    fn test_cursor_read_overflow_reports_offset() {
        let buffer = [0u8; 1];
        let mut cursor = Cursor::new(&buffer);
        assert_eq!(cursor.read_u8().expect("Read u8 should succeed"), 0);

        let err = cursor.read_u8().unwrap_err();
        match err {
            CodecError::ReadFailed { offset, reason } => {
                assert_eq!(offset, 1);
                assert_eq!(reason, "unexpected end of buffer");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_cursor_roundtrip_across_numeric_types() {
        let mut sink = ByteSink::new();
        sink.write_u8(0xAB);
        sink.write_u16(TEST_U16);
        sink.write_u32(TEST_U32);
        sink.write_u64(TEST_U64);
        sink.write_i32(-42);
        sink.write_bytes(&[1, 2, 3, 4]);
        let bytes = sink.into_bytes();

        let mut reader = Cursor::new(&bytes);
        assert_eq!(reader.read_u8().expect("u8"), 0xAB);
        assert_eq!(reader.read_u16().expect("u16"), TEST_U16);
        assert_eq!(reader.read_u32().expect("u32"), TEST_U32);
        assert_eq!(reader.read_u64().expect("u64"), TEST_U64);
        assert_eq!(reader.read_i32().expect("i32"), -42);
        assert_eq!(reader.read_bytes(4).expect("bytes"), &[1, 2, 3, 4]);
        assert!(reader.is_eof());
    }

    #[test]
    fn test_big_endian_layout() {
        let mut sink = ByteSink::new();
        sink.write_u32(0x0A0B_0C0D);
        assert_eq!(sink.into_bytes(), vec![0x0A, 0x0B, 0x0C, 0x0D]);
    }

    #[test]
    fn test_patch_reserved_slot() {
        let mut sink = ByteSink::with_capacity(8);
        let at = sink.reserve_u32();
        sink.write_u8(7);
        sink.patch_u32(at, 1);
        assert_eq!(sink.into_bytes(), vec![0, 0, 0, 1, 7]);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let buffer = [9u8, 8];
        let cursor = Cursor::new(&buffer);
        assert_eq!(cursor.peek_u8().expect("peek"), 9);
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.rest(), &[9, 8]);
    }
}
