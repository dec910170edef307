// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value encoder.

use super::{code, ByteSink, Value};

/// Encode a value into a fresh buffer.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut sink = ByteSink::with_capacity(64);
    encode_into(value, &mut sink);
    sink.into_bytes()
}

/// Encode a value at the end of an existing sink.
pub fn encode_into(value: &Value, sink: &mut ByteSink) {
    match value {
        Value::Null => sink.write_u8(code::NULL),
        Value::Bool(true) => sink.write_u8(code::TRUE),
        Value::Bool(false) => sink.write_u8(code::FALSE),
        Value::UByte(v) => {
            sink.write_u8(code::UBYTE);
            sink.write_u8(*v);
        }
        Value::UShort(v) => {
            sink.write_u8(code::USHORT);
            sink.write_u16(*v);
        }
        Value::UInt(0) => sink.write_u8(code::UINT0),
        Value::UInt(v) if *v <= 0xff => {
            sink.write_u8(code::SMALLUINT);
            sink.write_u8(*v as u8);
        }
        Value::UInt(v) => {
            sink.write_u8(code::UINT);
            sink.write_u32(*v);
        }
        Value::ULong(0) => sink.write_u8(code::ULONG0),
        Value::ULong(v) if *v <= 0xff => {
            sink.write_u8(code::SMALLULONG);
            sink.write_u8(*v as u8);
        }
        Value::ULong(v) => {
            sink.write_u8(code::ULONG);
            sink.write_u64(*v);
        }
        Value::Byte(v) => {
            sink.write_u8(code::BYTE);
            sink.write_i8(*v);
        }
        Value::Short(v) => {
            sink.write_u8(code::SHORT);
            sink.write_i16(*v);
        }
        Value::Int(v) => {
            sink.write_u8(code::INT);
            sink.write_i32(*v);
        }
        Value::Long(v) => {
            sink.write_u8(code::LONG);
            sink.write_i64(*v);
        }
        Value::Float(v) => {
            sink.write_u8(code::FLOAT);
            sink.write_u32(v.to_bits());
        }
        Value::Double(v) => {
            sink.write_u8(code::DOUBLE);
            sink.write_u64(v.to_bits());
        }
        Value::Char(c) => {
            sink.write_u8(code::CHAR);
            sink.write_u32(u32::from(*c));
        }
        Value::Timestamp(ms) => {
            sink.write_u8(code::TIMESTAMP);
            sink.write_i64(*ms);
        }
        Value::Binary(bytes) => write_variable(sink, code::VBIN8, code::VBIN32, bytes),
        Value::String(s) => write_variable(sink, code::STR8, code::STR32, s.as_bytes()),
        Value::Symbol(s) => write_variable(sink, code::SYM8, code::SYM32, s.as_bytes()),
        Value::List(items) if items.is_empty() => sink.write_u8(code::LIST0),
        Value::List(items) => {
            sink.write_u8(code::LIST32);
            let size_at = sink.reserve_u32();
            let start = sink.offset();
            sink.write_u32(items.len() as u32);
            for item in items {
                encode_into(item, sink);
            }
            let size = sink.offset() - start;
            sink.patch_u32(size_at, size as u32);
        }
        Value::Map(entries) => {
            sink.write_u8(code::MAP32);
            let size_at = sink.reserve_u32();
            let start = sink.offset();
            sink.write_u32((entries.len() * 2) as u32);
            for (k, v) in entries {
                encode_into(k, sink);
                encode_into(v, sink);
            }
            let size = sink.offset() - start;
            sink.patch_u32(size_at, size as u32);
        }
        Value::Described(descriptor, body) => {
            sink.write_u8(code::DESCRIBED);
            encode_into(descriptor, sink);
            encode_into(body, sink);
        }
    }
}

fn write_variable(sink: &mut ByteSink, small: u8, large: u8, bytes: &[u8]) {
    if let Ok(len) = u8::try_from(bytes.len()) {
        sink.write_u8(small);
        sink.write_u8(len);
    } else {
        sink.write_u8(large);
        sink.write_u32(bytes.len() as u32);
    }
    sink.write_bytes(bytes);
}
