// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type serializers.
//!
//! A serializer is built once per (type, factory) pair and cached; it holds
//! no per-call state. Everything that changes during a call lives in
//! [`SerializationOutput`] / [`DeserializationInput`].
//!
//! | Serializer | Shape | Wire form |
//! |------------|-------|-----------|
//! | [`PrimitiveSerializer`] | primitive | native value |
//! | [`ObjectSerializer`] | composite | `described(token, [fields..])` |
//! | [`CollectionSerializer`] | list/set/array | `described(token, [items..])` |
//! | [`MapSerializer`] | map | `described(token, {k: v..})` |
//! | [`EnumSerializer`] | enum | `described(token, [name, ordinal])` |
//! | [`SingletonSerializer`] | singleton | `described(token, [])` |
//! | [`CustomScalarSerializer`] | custom | `described(token, repr)` |
//! | wrappers | optional/boxed/shared/dynamic | inner value, null or back-reference |
//!
//! Evolution serializers are read-only.

mod collection;
pub mod custom;
mod enums;
mod evolution;
mod object;
mod primitive;
mod singleton;
mod wrappers;

pub use collection::{CollectionSerializer, MapSerializer};
pub use custom::{CustomScalarSerializer, CustomSerializer, ScalarSerializer};
pub use enums::EnumSerializer;
pub use evolution::{EnumEvolutionSerializer, EvolutionSerializer};
pub use object::ObjectSerializer;
pub use primitive::PrimitiveSerializer;
pub use singleton::SingletonSerializer;
pub use wrappers::{BoxedSerializer, DynamicSerializer, OptionalSerializer, SharedSerializer};

use crate::codec::Value;
use crate::error::{Error, Result};
use crate::input::DeserializationInput;
use crate::model::{LocalType, Object, TypeRef, TypeRegistry};
use crate::output::SerializationOutput;
use std::any::Any;
use std::sync::Arc;

pub trait TypeSerializer: Send + Sync {
    fn local_type(&self) -> &Arc<LocalType>;

    fn type_name(&self) -> &str {
        &self.local_type().name
    }

    /// Token values are described with; `None` for primitives and wrappers,
    /// which never take a history slot.
    fn descriptor(&self) -> Option<&str>;

    /// Contribute this type's notation (dependencies first).
    fn write_class_info(&self, out: &mut SerializationOutput<'_>) -> Result<()>;

    fn write_object(&self, obj: &dyn Any, out: &mut SerializationOutput<'_>) -> Result<Value>;

    fn read_object(&self, value: &Value, input: &mut DeserializationInput<'_>) -> Result<Object>;
}

/// Body of `described(token, body)` when the token is `descriptor`.
pub(crate) fn described_body<'v>(value: &'v Value, descriptor: &str, type_name: &str) -> Result<&'v Value> {
    match value.as_described() {
        Some((Value::Symbol(token), body)) if token == descriptor => Ok(body),
        Some((Value::Symbol(token), _)) => Err(Error::mismatch(type_name, token.clone())),
        _ => Err(Error::mismatch(type_name, value.kind_name())),
    }
}

/// List body of a described value.
pub(crate) fn described_list<'v>(value: &'v Value, descriptor: &str, type_name: &str) -> Result<&'v [Value]> {
    let body = described_body(value, descriptor, type_name)?;
    body.as_list()
        .ok_or_else(|| Error::malformed(format!("{} body is {}, not a list", type_name, body.kind_name())))
}

pub(crate) fn described(descriptor: &str, body: Value) -> Value {
    Value::described(Value::symbol(descriptor), body)
}

/// Local type behind any transparent wrappers.
pub(crate) fn unwrapped(registry: &TypeRegistry, ty: &TypeRef) -> Arc<LocalType> {
    let mut current = registry.resolve(ty);
    while let Some(inner) = current.shape.transparent_inner() {
        let next = registry.resolve(inner);
        current = next;
    }
    current
}

/// `obj` is not a value of the serializer's type.
pub(crate) fn wrong_value(type_name: &str) -> Error {
    Error::mismatch(type_name, "value of another type")
}
