// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire schema: the type descriptors carried inside every envelope.
//!
//! A schema is a flat, dependency-ordered list of [`TypeNotation`]s. Each
//! notation is either a *composite* (named ordered field list) or a
//! *restricted* type (collection, map, enum, singleton or custom scalar)
//! and carries the opaque token its values are described with.
//!
//! ```text
//! schema     = described(SCHEMA, [[notation, ..]])
//! composite  = described(COMPOSITE_TYPE, [name, label?, provides[], descriptor, fields[]])
//! restricted = described(RESTRICTED_TYPE, [name, label?, provides[], source, descriptor, choices[]])
//! field      = described(FIELD, [name, type, requires[], default?, label?, mandatory, multiple])
//! choice     = described(CHOICE, [name, value])
//! descriptor = described(OBJECT_DESCRIPTOR, [symbol, null])
//! ```

pub mod descriptors;
mod envelope;
mod transforms;

pub use envelope::Envelope;
pub use transforms::{Transform, TransformSet};

use crate::codec::Value;
use crate::error::{Error, Result};
use descriptors::{expect_list, tagged, Fields};
use std::fmt;

/// Token a type's values are described with on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub name: String,
}

impl Descriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn to_value(&self) -> Value {
        tagged(
            descriptors::OBJECT_DESCRIPTOR,
            Value::List(vec![Value::symbol(self.name.clone()), Value::Null]),
        )
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let items = expect_list(value, descriptors::OBJECT_DESCRIPTOR, "descriptor")?;
        let fields = Fields::new(items, "descriptor", 1)?;
        Ok(Self {
            name: fields.string(0)?,
        })
    }
}

/// One property of a composite type, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    pub requires: Vec<String>,
    pub default: Option<String>,
    pub label: Option<String>,
    pub mandatory: bool,
    pub multiple: bool,
}

impl Field {
    pub fn to_value(&self) -> Value {
        tagged(
            descriptors::FIELD,
            Value::List(vec![
                Value::string(self.name.clone()),
                Value::string(self.type_name.clone()),
                symbols(&self.requires),
                Value::opt_string(self.default.as_deref()),
                Value::opt_string(self.label.as_deref()),
                Value::Bool(self.mandatory),
                Value::Bool(self.multiple),
            ]),
        )
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let items = expect_list(value, descriptors::FIELD, "field")?;
        let f = Fields::new(items, "field", 7)?;
        Ok(Self {
            name: f.string(0)?,
            type_name: f.string(1)?,
            requires: f.strings(2)?,
            default: f.opt_string(3),
            label: f.opt_string(4),
            mandatory: f.bool(5)?,
            multiple: f.bool(6)?,
        })
    }
}

/// Enum constant (or other restricted choice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

impl Choice {
    pub fn to_value(&self) -> Value {
        tagged(
            descriptors::CHOICE,
            Value::List(vec![
                Value::string(self.name.clone()),
                Value::string(self.value.clone()),
            ]),
        )
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let items = expect_list(value, descriptors::CHOICE, "choice")?;
        let f = Fields::new(items, "choice", 2)?;
        Ok(Self {
            name: f.string(0)?,
            value: f.string(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeType {
    pub name: String,
    pub label: Option<String>,
    pub provides: Vec<String>,
    pub descriptor: Descriptor,
    pub fields: Vec<Field>,
}

/// Category backing a restricted type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RestrictedSource {
    List,
    Set,
    Array,
    Map,
    Enum,
    Singleton,
    /// Custom scalar; the name of its primitive representation.
    Custom(String),
}

impl RestrictedSource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::List => "list",
            Self::Set => "set",
            Self::Array => "array",
            Self::Map => "map",
            Self::Enum => "enum",
            Self::Singleton => "singleton",
            Self::Custom(repr) => repr,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "list" => Self::List,
            "set" => Self::Set,
            "array" => Self::Array,
            "map" => Self::Map,
            "enum" => Self::Enum,
            "singleton" => Self::Singleton,
            other => Self::Custom(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictedType {
    pub name: String,
    pub label: Option<String>,
    pub provides: Vec<String>,
    pub source: RestrictedSource,
    pub descriptor: Descriptor,
    pub choices: Vec<Choice>,
}

/// A type descriptor as carried in the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNotation {
    Composite(CompositeType),
    Restricted(RestrictedType),
}

impl TypeNotation {
    pub fn name(&self) -> &str {
        match self {
            Self::Composite(c) => &c.name,
            Self::Restricted(r) => &r.name,
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        match self {
            Self::Composite(c) => &c.descriptor,
            Self::Restricted(r) => &r.descriptor,
        }
    }

    pub fn provides(&self) -> &[String] {
        match self {
            Self::Composite(c) => &c.provides,
            Self::Restricted(r) => &r.provides,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Composite(c) => tagged(
                descriptors::COMPOSITE_TYPE,
                Value::List(vec![
                    Value::string(c.name.clone()),
                    Value::opt_string(c.label.as_deref()),
                    symbols(&c.provides),
                    c.descriptor.to_value(),
                    Value::List(c.fields.iter().map(Field::to_value).collect()),
                ]),
            ),
            Self::Restricted(r) => tagged(
                descriptors::RESTRICTED_TYPE,
                Value::List(vec![
                    Value::string(r.name.clone()),
                    Value::opt_string(r.label.as_deref()),
                    symbols(&r.provides),
                    Value::string(r.source.as_str()),
                    r.descriptor.to_value(),
                    Value::List(r.choices.iter().map(Choice::to_value).collect()),
                ]),
            ),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        match descriptors::code_of(value) {
            Some(descriptors::COMPOSITE_TYPE) => {
                let items = expect_list(value, descriptors::COMPOSITE_TYPE, "composite")?;
                let f = Fields::new(items, "composite", 5)?;
                let fields = f
                    .list(4)?
                    .iter()
                    .map(Field::from_value)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Composite(CompositeType {
                    name: f.string(0)?,
                    label: f.opt_string(1),
                    provides: f.strings(2)?,
                    descriptor: Descriptor::from_value(f.get(3))?,
                    fields,
                }))
            }
            Some(descriptors::RESTRICTED_TYPE) => {
                let items = expect_list(value, descriptors::RESTRICTED_TYPE, "restricted")?;
                let f = Fields::new(items, "restricted", 6)?;
                let choices = f
                    .list(5)?
                    .iter()
                    .map(Choice::from_value)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Restricted(RestrictedType {
                    name: f.string(0)?,
                    label: f.opt_string(1),
                    provides: f.strings(2)?,
                    source: RestrictedSource::parse(&f.string(3)?),
                    descriptor: Descriptor::from_value(f.get(4))?,
                    choices,
                }))
            }
            _ => Err(Error::malformed(format!(
                "schema entry is {}, not a type notation",
                value.kind_name()
            ))),
        }
    }
}

impl fmt::Display for TypeNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Composite(c) => {
                write!(f, "composite {} [{}]", c.name, c.descriptor.name)?;
                if !c.provides.is_empty() {
                    write!(f, " provides {}", c.provides.join(", "))?;
                }
                for field in &c.fields {
                    write!(
                        f,
                        "\n  {}: {}{}",
                        field.name,
                        field.type_name,
                        if field.mandatory { "" } else { " (nullable)" }
                    )?;
                }
                Ok(())
            }
            Self::Restricted(r) => {
                write!(f, "{} {} [{}]", r.source.as_str(), r.name, r.descriptor.name)?;
                if !r.choices.is_empty() {
                    let names: Vec<&str> = r.choices.iter().map(|c| c.name.as_str()).collect();
                    write!(f, " {{{}}}", names.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// Ordered, deduplicated list of type notations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub types: Vec<TypeNotation>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `notation` unless a type with the same descriptor is present.
    pub fn add(&mut self, notation: TypeNotation) -> bool {
        if self.find(&notation.descriptor().name).is_some() {
            return false;
        }
        self.types.push(notation);
        true
    }

    /// Notation carrying `descriptor`.
    pub fn find(&self, descriptor: &str) -> Option<&TypeNotation> {
        self.types.iter().find(|t| t.descriptor().name == descriptor)
    }

    /// Notation named `name` (first match).
    pub fn by_name(&self, name: &str) -> Option<&TypeNotation> {
        self.types.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn to_value(&self) -> Value {
        tagged(
            descriptors::SCHEMA,
            Value::List(vec![Value::List(
                self.types.iter().map(TypeNotation::to_value).collect(),
            )]),
        )
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let items = expect_list(value, descriptors::SCHEMA, "schema")?;
        let f = Fields::new(items, "schema", 1)?;
        let types = f
            .list(0)?
            .iter()
            .map(TypeNotation::from_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { types })
    }
}

fn symbols(names: &[String]) -> Value {
    Value::List(names.iter().map(|n| Value::symbol(n.clone())).collect())
}
