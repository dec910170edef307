// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Evolution transforms (renames and enum defaults) keyed by type name.

use super::descriptors::{self, tagged, Fields};
use crate::codec::Value;
use crate::error::{Error, Result};
use std::collections::BTreeMap;

const KIND_RENAME: &str = "rename";
const KIND_ENUM_DEFAULT: &str = "enum-default";

/// One evolution rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transform {
    /// Property or enum constant renamed from `from` to `to`.
    Rename { from: String, to: String },
    /// Enum constant `old` is read as `new`.
    EnumDefault { old: String, new: String },
}

impl Transform {
    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Rename {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn enum_default(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self::EnumDefault {
            old: old.into(),
            new: new.into(),
        }
    }

    /// Target of this rule when applied to `name`.
    pub fn apply(&self, name: &str) -> Option<&str> {
        match self {
            Self::Rename { from, to } if from == name => Some(to),
            Self::EnumDefault { old, new } if old == name => Some(new),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        let (kind, a, b) = match self {
            Self::Rename { from, to } => (KIND_RENAME, from, to),
            Self::EnumDefault { old, new } => (KIND_ENUM_DEFAULT, old, new),
        };
        tagged(
            descriptors::TRANSFORM_ELEMENT,
            Value::List(vec![
                Value::symbol(kind),
                Value::string(a.clone()),
                Value::string(b.clone()),
            ]),
        )
    }

    /// `None` for kinds this reader does not know.
    fn from_value(value: &Value) -> Result<Option<Self>> {
        let items = descriptors::expect_list(value, descriptors::TRANSFORM_ELEMENT, "transform")?;
        let f = Fields::new(items, "transform", 3)?;
        let kind = f.string(0)?;
        let (a, b) = (f.string(1)?, f.string(2)?);
        Ok(match kind.as_str() {
            KIND_RENAME => Some(Self::Rename { from: a, to: b }),
            KIND_ENUM_DEFAULT => Some(Self::EnumDefault { old: a, new: b }),
            other => {
                log::debug!("[transforms] ignoring unknown transform kind '{}'", other);
                None
            }
        })
    }
}

/// Rules per type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformSet {
    entries: BTreeMap<String, Vec<Transform>>,
}

impl TransformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for `type_name`, ignoring exact duplicates.
    pub fn add(&mut self, type_name: &str, transform: Transform) {
        let rules = self.entries.entry(type_name.to_string()).or_default();
        if !rules.contains(&transform) {
            rules.push(transform);
        }
    }

    pub fn extend(&mut self, type_name: &str, transforms: &[Transform]) {
        for t in transforms {
            self.add(type_name, t.clone());
        }
    }

    pub fn get(&self, type_name: &str) -> &[Transform] {
        self.entries.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Transform])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn to_value(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|(name, rules)| {
                (
                    Value::string(name.clone()),
                    Value::List(rules.iter().map(Transform::to_value).collect()),
                )
            })
            .collect();
        tagged(descriptors::TRANSFORM_SET, Value::Map(map))
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = match value.as_described() {
            Some((Value::ULong(descriptors::TRANSFORM_SET), body)) => body.as_map().ok_or_else(|| {
                Error::malformed(format!("transforms body is {}, not a map", body.kind_name()))
            })?,
            _ => {
                return Err(Error::malformed(format!(
                    "expected transforms descriptor, found {}",
                    value.kind_name()
                )))
            }
        };

        let mut set = Self::new();
        for (key, rules) in entries {
            let type_name = key
                .as_str()
                .ok_or_else(|| Error::malformed("transform key is not a string"))?;
            let rules = rules
                .as_list()
                .ok_or_else(|| Error::malformed("transform rules are not a list"))?;
            for rule in rules {
                if let Some(t) = Transform::from_value(rule)? {
                    set.add(type_name, t);
                }
            }
        }
        Ok(set)
    }
}
