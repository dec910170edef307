// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Self-describing binary value encoding.
//!
//! A compact, big-endian, constructor-byte prefixed encoding (an AMQP 1.0
//! subset) for scalars, strings, binary blobs, lists, maps and *described*
//! values. The object graph engine sits entirely on top of [`Value`]; it never
//! touches bytes directly.
//!
//! ```text
//! 0x00 <descriptor> <body>      described value
//! 0xd0 <size:u32> <count:u32> .. list32
//! 0xd1 <size:u32> <count:u32> .. map32 (count = 2 x entries)
//! ```

mod cursor;
mod decode;
mod encode;

pub use cursor::{ByteSink, Cursor};
pub use decode::{decode, decode_prefix};
pub use encode::{encode, encode_into};

use std::fmt;

/// Constructor bytes.
pub(crate) mod code {
    pub const DESCRIBED: u8 = 0x00;
    pub const NULL: u8 = 0x40;
    pub const TRUE: u8 = 0x41;
    pub const FALSE: u8 = 0x42;
    pub const UINT0: u8 = 0x43;
    pub const ULONG0: u8 = 0x44;
    pub const LIST0: u8 = 0x45;
    pub const UBYTE: u8 = 0x50;
    pub const BYTE: u8 = 0x51;
    pub const SMALLUINT: u8 = 0x52;
    pub const SMALLULONG: u8 = 0x53;
    pub const USHORT: u8 = 0x60;
    pub const SHORT: u8 = 0x61;
    pub const UINT: u8 = 0x70;
    pub const INT: u8 = 0x71;
    pub const FLOAT: u8 = 0x72;
    pub const CHAR: u8 = 0x73;
    pub const ULONG: u8 = 0x80;
    pub const LONG: u8 = 0x81;
    pub const DOUBLE: u8 = 0x82;
    pub const TIMESTAMP: u8 = 0x83;
    pub const VBIN8: u8 = 0xa0;
    pub const STR8: u8 = 0xa1;
    pub const SYM8: u8 = 0xa3;
    pub const VBIN32: u8 = 0xb0;
    pub const STR32: u8 = 0xb1;
    pub const SYM32: u8 = 0xb3;
    pub const LIST32: u8 = 0xd0;
    pub const MAP32: u8 = 0xd1;
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    UByte(u8),
    UShort(u16),
    UInt(u32),
    ULong(u64),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Binary(Vec<u8>),
    String(String),
    Symbol(String),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Described(Box<Value>, Box<Value>),
}

impl Value {
    pub fn described(descriptor: Value, body: Value) -> Self {
        Self::Described(Box::new(descriptor), Box::new(body))
    }

    pub fn symbol(s: impl Into<String>) -> Self {
        Self::Symbol(s.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// `Null` for `None`, a string otherwise.
    pub fn opt_string(s: Option<&str>) -> Self {
        s.map_or(Self::Null, |s| Self::String(s.to_string()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// String or symbol contents.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any unsigned integer widened to u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UByte(v) => Some(u64::from(*v)),
            Self::UShort(v) => Some(u64::from(*v)),
            Self::UInt(v) => Some(u64::from(*v)),
            Self::ULong(v) => Some(*v),
            _ => None,
        }
    }

    /// Descriptor and body of a described value.
    pub fn as_described(&self) -> Option<(&Value, &Value)> {
        match self {
            Self::Described(d, b) => Some((d, b)),
            _ => None,
        }
    }

    /// Short name of the value's wire kind (diagnostics).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::UByte(_) => "ubyte",
            Self::UShort(_) => "ushort",
            Self::UInt(_) => "uint",
            Self::ULong(_) => "ulong",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Char(_) => "char",
            Self::Timestamp(_) => "timestamp",
            Self::Binary(_) => "binary",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Described(..) => "described",
        }
    }
}

/// Errors raised by the value codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    ReadFailed { offset: usize, reason: String },
    InvalidConstructor { offset: usize, code: u8 },
    SizeMismatch { offset: usize, declared: usize, actual: usize },
    InvalidData { offset: usize, reason: String },
    TrailingBytes { offset: usize, remaining: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { offset, reason } => {
                write!(f, "read failed at offset {}: {}", offset, reason)
            }
            Self::InvalidConstructor { offset, code } => {
                write!(f, "invalid constructor 0x{:02x} at offset {}", code, offset)
            }
            Self::SizeMismatch {
                offset,
                declared,
                actual,
            } => write!(
                f,
                "size mismatch at offset {}: declared {} bytes, consumed {}",
                offset, declared, actual
            ),
            Self::InvalidData { offset, reason } => {
                write!(f, "invalid data at offset {}: {}", offset, reason)
            }
            Self::TrailingBytes { offset, remaining } => {
                write!(f, "{} trailing bytes after offset {}", remaining, offset)
            }
        }
    }
}

impl std::error::Error for CodecError {}

pub type CodecResult<T> = core::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        let v = Value::described(Value::ULong(7), Value::List(vec![Value::string("a")]));
        let (d, b) = v.as_described().expect("described");
        assert_eq!(d.as_u64(), Some(7));
        assert_eq!(b.as_list().map(<[Value]>::len), Some(1));
        assert_eq!(Value::symbol("x").as_str(), Some("x"));
        assert!(Value::opt_string(None).is_null());
        assert_eq!(Value::Int(1).kind_name(), "int");
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::SizeMismatch {
            offset: 4,
            declared: 10,
            actual: 8,
        };
        assert_eq!(
            err.to_string(),
            "size mismatch at offset 4: declared 10 bytes, consumed 8"
        );
        let err = CodecError::InvalidConstructor { offset: 0, code: 0xff };
        assert_eq!(err.to_string(), "invalid constructor 0xff at offset 0");
    }
}
