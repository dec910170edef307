// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Internal structural descriptors.
//!
//! Structural lists of the envelope are tagged with `ULong` descriptors in a
//! fixed domain (`0x7477 << 48 | code`), user types with a symbol token.

use crate::codec::Value;
use crate::error::{Error, Result};

/// Descriptor domain ("tw").
pub const DOMAIN: u64 = 0x7477 << 48;

pub const ENVELOPE: u64 = DOMAIN | 1;
pub const SCHEMA: u64 = DOMAIN | 2;
pub const OBJECT_DESCRIPTOR: u64 = DOMAIN | 3;
pub const FIELD: u64 = DOMAIN | 4;
pub const COMPOSITE_TYPE: u64 = DOMAIN | 5;
pub const RESTRICTED_TYPE: u64 = DOMAIN | 6;
pub const CHOICE: u64 = DOMAIN | 7;
pub const REFERENCED_OBJECT: u64 = DOMAIN | 8;
pub const TRANSFORM_SET: u64 = DOMAIN | 9;
pub const TRANSFORM_ELEMENT: u64 = DOMAIN | 10;

/// Prefix of fingerprint-derived type tokens.
pub const TOKEN_PREFIX: &str = "typewire:";

/// Build the token for a fingerprint.
pub fn token_for(fingerprint: &str) -> String {
    format!("{}{}", TOKEN_PREFIX, fingerprint)
}

/// Human name of an internal descriptor (diagnostics).
pub fn describe(code: u64) -> Option<&'static str> {
    Some(match code {
        ENVELOPE => "envelope",
        SCHEMA => "schema",
        OBJECT_DESCRIPTOR => "descriptor",
        FIELD => "field",
        COMPOSITE_TYPE => "composite",
        RESTRICTED_TYPE => "restricted",
        CHOICE => "choice",
        REFERENCED_OBJECT => "reference",
        TRANSFORM_SET => "transforms",
        TRANSFORM_ELEMENT => "transform",
        _ => return None,
    })
}

/// Wrap `body` in an internal descriptor.
pub fn tagged(code: u64, body: Value) -> Value {
    Value::described(Value::ULong(code), body)
}

/// Internal descriptor code of a described value, if it carries one.
pub fn code_of(value: &Value) -> Option<u64> {
    match value.as_described() {
        Some((Value::ULong(code), _)) => Some(*code),
        _ => None,
    }
}

/// Back-reference index carried by `value`, if it is one.
pub fn reference_index(value: &Value) -> Option<u32> {
    match value.as_described() {
        Some((Value::ULong(REFERENCED_OBJECT), body)) => {
            body.as_u64().and_then(|i| u32::try_from(i).ok())
        }
        _ => None,
    }
}

/// Back-reference to history slot `index`.
pub fn reference(index: u32) -> Value {
    tagged(REFERENCED_OBJECT, Value::UInt(index))
}

/// Type token of a user described value.
pub fn token_of(value: &Value) -> Option<&str> {
    match value.as_described() {
        Some((Value::Symbol(token), _)) => Some(token),
        _ => None,
    }
}

/// Unwrap a structural list tagged with `code`.
pub(crate) fn expect_list<'a>(value: &'a Value, code: u64, what: &str) -> Result<&'a [Value]> {
    match value.as_described() {
        Some((Value::ULong(found), body)) if *found == code => body
            .as_list()
            .ok_or_else(|| Error::malformed(format!("{} body is {}, not a list", what, body.kind_name()))),
        _ => Err(Error::malformed(format!(
            "expected {} descriptor, found {}",
            what,
            value.kind_name()
        ))),
    }
}

static NULL: Value = Value::Null;

/// Positional accessors over a structural list.
pub(crate) struct Fields<'a> {
    items: &'a [Value],
    what: &'static str,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(items: &'a [Value], what: &'static str, min: usize) -> Result<Self> {
        if items.len() < min {
            return Err(Error::malformed(format!(
                "{} has {} elements, expected at least {}",
                what,
                items.len(),
                min
            )));
        }
        Ok(Self { items, what })
    }

    pub(crate) fn get(&self, index: usize) -> &'a Value {
        self.items.get(index).unwrap_or(&NULL)
    }

    pub(crate) fn string(&self, index: usize) -> Result<String> {
        self.get(index)
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::malformed(format!("{}[{}] is not a string", self.what, index)))
    }

    pub(crate) fn opt_string(&self, index: usize) -> Option<String> {
        self.get(index).as_str().map(str::to_string)
    }

    pub(crate) fn bool(&self, index: usize) -> Result<bool> {
        self.get(index)
            .as_bool()
            .ok_or_else(|| Error::malformed(format!("{}[{}] is not a boolean", self.what, index)))
    }

    pub(crate) fn strings(&self, index: usize) -> Result<Vec<String>> {
        let value = self.get(index);
        if value.is_null() {
            return Ok(Vec::new());
        }
        let list = value
            .as_list()
            .ok_or_else(|| Error::malformed(format!("{}[{}] is not a list", self.what, index)))?;
        list.iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::malformed(format!("{}[{}] holds a non-string", self.what, index)))
            })
            .collect()
    }

    pub(crate) fn list(&self, index: usize) -> Result<&'a [Value]> {
        let value = self.get(index);
        if value.is_null() {
            return Ok(&[]);
        }
        value
            .as_list()
            .ok_or_else(|| Error::malformed(format!("{}[{}] is not a list", self.what, index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_roundtrip() {
        let v = reference(12);
        assert_eq!(reference_index(&v), Some(12));
        assert_eq!(code_of(&v), Some(REFERENCED_OBJECT));
        assert_eq!(describe(REFERENCED_OBJECT), Some("reference"));
    }

    #[test]
    fn test_token_of_user_value() {
        let v = Value::described(Value::symbol(token_for("abc")), Value::Null);
        assert_eq!(token_of(&v), Some("typewire:abc"));
        assert_eq!(reference_index(&v), None);
    }

    #[test]
    fn test_expect_list_rejects_wrong_code() {
        let v = tagged(SCHEMA, Value::List(vec![]));
        assert!(expect_list(&v, SCHEMA, "schema").is_ok());
        let err = expect_list(&v, ENVELOPE, "envelope").unwrap_err();
        assert_eq!(err.category(), "malformed-envelope");
    }

    #[test]
    fn test_fields_short_list() {
        let items = vec![Value::string("a")];
        assert!(Fields::new(&items, "field", 2).is_err());
        let fields = Fields::new(&items, "field", 1).expect("fields");
        assert_eq!(fields.string(0).expect("name"), "a");
        assert!(fields.get(5).is_null());
    }
}
