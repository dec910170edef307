// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value decoder.
//!
//! Nesting recurses on the native stack; extremely deep inputs can exhaust it.

use super::{code, CodecError, CodecResult, Cursor, Value};

/// Decode exactly one value spanning the whole input.
pub fn decode(bytes: &[u8]) -> CodecResult<Value> {
    let mut cursor = Cursor::new(bytes);
    let value = read_value(&mut cursor)?;
    if !cursor.is_eof() {
        return Err(CodecError::TrailingBytes {
            offset: cursor.offset(),
            remaining: cursor.remaining(),
        });
    }
    Ok(value)
}

/// Decode one value from the front of the input, returning the bytes consumed.
pub fn decode_prefix(bytes: &[u8]) -> CodecResult<(Value, usize)> {
    let mut cursor = Cursor::new(bytes);
    let value = read_value(&mut cursor)?;
    Ok((value, cursor.offset()))
}

fn read_value(cursor: &mut Cursor<'_>) -> CodecResult<Value> {
    let at = cursor.offset();
    let constructor = cursor.read_u8()?;
    let value = match constructor {
        code::DESCRIBED => {
            let descriptor = read_value(cursor)?;
            let body = read_value(cursor)?;
            Value::described(descriptor, body)
        }
        code::NULL => Value::Null,
        code::TRUE => Value::Bool(true),
        code::FALSE => Value::Bool(false),
        code::UINT0 => Value::UInt(0),
        code::ULONG0 => Value::ULong(0),
        code::LIST0 => Value::List(Vec::new()),
        code::UBYTE => Value::UByte(cursor.read_u8()?),
        code::BYTE => Value::Byte(cursor.read_i8()?),
        code::SMALLUINT => Value::UInt(u32::from(cursor.read_u8()?)),
        code::SMALLULONG => Value::ULong(u64::from(cursor.read_u8()?)),
        code::USHORT => Value::UShort(cursor.read_u16()?),
        code::SHORT => Value::Short(cursor.read_i16()?),
        code::UINT => Value::UInt(cursor.read_u32()?),
        code::INT => Value::Int(cursor.read_i32()?),
        code::FLOAT => Value::Float(f32::from_bits(cursor.read_u32()?)),
        code::CHAR => {
            let raw = cursor.read_u32()?;
            let c = char::from_u32(raw).ok_or_else(|| CodecError::InvalidData {
                offset: at,
                reason: format!("0x{:x} is not a unicode scalar", raw),
            })?;
            Value::Char(c)
        }
        code::ULONG => Value::ULong(cursor.read_u64()?),
        code::LONG => Value::Long(cursor.read_i64()?),
        code::DOUBLE => Value::Double(f64::from_bits(cursor.read_u64()?)),
        code::TIMESTAMP => Value::Timestamp(cursor.read_i64()?),
        code::VBIN8 => {
            let len = usize::from(cursor.read_u8()?);
            Value::Binary(cursor.read_bytes(len)?.to_vec())
        }
        code::VBIN32 => {
            let len = cursor.read_u32()? as usize;
            Value::Binary(cursor.read_bytes(len)?.to_vec())
        }
        code::STR8 | code::SYM8 => {
            let len = usize::from(cursor.read_u8()?);
            text(cursor, at, len, constructor == code::SYM8)?
        }
        code::STR32 | code::SYM32 => {
            let len = cursor.read_u32()? as usize;
            text(cursor, at, len, constructor == code::SYM32)?
        }
        code::LIST32 => {
            let (count, end) = compound_header(cursor)?;
            let mut items = Vec::with_capacity(count.min(cursor.remaining()));
            for _ in 0..count {
                items.push(read_value(cursor)?);
            }
            check_size(cursor, at, end)?;
            Value::List(items)
        }
        code::MAP32 => {
            let (count, end) = compound_header(cursor)?;
            if count % 2 != 0 {
                return Err(CodecError::InvalidData {
                    offset: at,
                    reason: format!("map with odd element count {}", count),
                });
            }
            let mut entries = Vec::with_capacity((count / 2).min(cursor.remaining()));
            for _ in 0..count / 2 {
                let k = read_value(cursor)?;
                let v = read_value(cursor)?;
                entries.push((k, v));
            }
            check_size(cursor, at, end)?;
            Value::Map(entries)
        }
        other => {
            return Err(CodecError::InvalidConstructor {
                offset: at,
                code: other,
            })
        }
    };
    Ok(value)
}

fn text(cursor: &mut Cursor<'_>, at: usize, len: usize, symbol: bool) -> CodecResult<Value> {
    let raw = cursor.read_bytes(len)?;
    let s = std::str::from_utf8(raw).map_err(|e| CodecError::InvalidData {
        offset: at,
        reason: e.to_string(),
    })?;
    Ok(if symbol {
        Value::Symbol(s.to_string())
    } else {
        Value::String(s.to_string())
    })
}

/// Reads `[size][count]`, returns the element count and the expected end offset.
fn compound_header(cursor: &mut Cursor<'_>) -> CodecResult<(usize, usize)> {
    let size = cursor.read_u32()? as usize;
    let end = cursor.offset() + size;
    if size > cursor.remaining() {
        return Err(CodecError::ReadFailed {
            offset: cursor.offset(),
            reason: format!("compound of {} bytes exceeds buffer", size),
        });
    }
    let count = cursor.read_u32()? as usize;
    Ok((count, end))
}

fn check_size(cursor: &Cursor<'_>, at: usize, end: usize) -> CodecResult<()> {
    if cursor.offset() != end {
        return Err(CodecError::SizeMismatch {
            offset: at,
            declared: end.saturating_sub(at + 5),
            actual: cursor.offset().saturating_sub(at + 5),
        });
    }
    Ok(())
}
