// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read engine state for one `deserialize` call.
//!
//! Holds the envelope's schema and transforms and the read-side object
//! history. Every described, non-reference value takes a history slot after
//! it has been fully read; sharing wrappers (`Arc<T>`, `AnyObject`) upgrade
//! their slot to a handle later back-references can resolve to.

use crate::codec::Value;
use crate::error::{Error, Result};
use crate::factory::SerializerFactory;
use crate::model::{Object, SharedObject, TypeRef};
use crate::schema::{descriptors, Schema, TransformSet};
use crate::serializers::TypeSerializer;
use std::sync::Arc;

enum Slot {
    /// Owned by its parent; cannot be referenced again.
    Owned,
    Shared(SharedObject),
}

pub struct DeserializationInput<'a> {
    factory: &'a SerializerFactory,
    schema: &'a Schema,
    transforms: &'a TransformSet,
    history: Vec<Slot>,
}

impl<'a> DeserializationInput<'a> {
    pub(crate) fn new(factory: &'a SerializerFactory, schema: &'a Schema, transforms: &'a TransformSet) -> Self {
        Self {
            factory,
            schema,
            transforms,
            history: Vec::new(),
        }
    }

    pub fn factory(&self) -> &'a SerializerFactory {
        self.factory
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn transforms(&self) -> &'a TransformSet {
        self.transforms
    }

    /// Read the top-level payload as a `declared`.
    ///
    /// A payload whose type cannot stand in for `declared` is reported as
    /// `NotSerializable`.
    pub(crate) fn read_root(&mut self, value: &Value, declared: &TypeRef) -> Result<Object> {
        let serializer = self
            .factory
            .resolve_for_read(value, declared, self.schema, self.transforms)
            .map_err(|e| match e {
                Error::TypeMismatch { expected, found } => Error::not_serializable(
                    found,
                    format!("payload is not assignable to {}", expected),
                ),
                other => other,
            })?;
        self.read_with(&serializer, value)
    }

    /// Read `value` as an instance of `declared`.
    pub fn read_value(&mut self, value: &Value, declared: &TypeRef) -> Result<Object> {
        let serializer = self
            .factory
            .resolve_for_read(value, declared, self.schema, self.transforms)?;
        self.read_with(&serializer, value)
    }

    /// Read `value` through an already resolved serializer.
    pub fn read_with(&mut self, serializer: &Arc<dyn TypeSerializer>, value: &Value) -> Result<Object> {
        let obj = serializer.read_object(value, self)?;
        if serializer.descriptor().is_some() {
            self.history.push(Slot::Owned);
        }
        Ok(obj)
    }

    /// Walk `value` without decoding it, keeping history indices aligned.
    pub fn skip_value(&mut self, value: &Value) -> Result<()> {
        if let Some(index) = descriptors::reference_index(value) {
            self.check_index(index)?;
            return Ok(());
        }
        match value {
            Value::Described(descriptor, body) => {
                self.skip_value(body)?;
                if matches!(**descriptor, Value::Symbol(_)) {
                    self.history.push(Slot::Owned);
                }
            }
            Value::List(items) => {
                for item in items {
                    self.skip_value(item)?;
                }
            }
            Value::Map(entries) => {
                for (k, v) in entries {
                    self.skip_value(k)?;
                    self.skip_value(v)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn check_index(&self, index: u32) -> Result<usize> {
        let at = index as usize;
        if at >= self.history.len() {
            return Err(Error::malformed(format!(
                "back-reference {} out of range ({} objects read)",
                index,
                self.history.len()
            )));
        }
        Ok(at)
    }

    /// Shareable handle at history slot `index`.
    pub(crate) fn shared_at(&self, index: u32, expected: &str) -> Result<SharedObject> {
        let at = self.check_index(index)?;
        match &self.history[at] {
            Slot::Shared(handle) => Ok(Arc::clone(handle)),
            Slot::Owned => Err(Error::mismatch(
                expected,
                format!("back-reference {} to an unshared object", index),
            )),
        }
    }

    /// Make the slot of the value read last shareable.
    pub(crate) fn share_last(&mut self, handle: SharedObject) {
        if let Some(slot) = self.history.last_mut() {
            *slot = Slot::Shared(handle);
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::descriptors::reference;

    #[test]
    fn test_skip_value_counts_described_post_order() {
        let factory = SerializerFactory::new();
        let schema = Schema::new();
        let transforms = TransformSet::new();
        let mut input = DeserializationInput::new(&factory, &schema, &transforms);

        let inner = Value::described(Value::symbol("typewire:b"), Value::List(vec![Value::Int(1)]));
        let outer = Value::described(
            Value::symbol("typewire:a"),
            Value::List(vec![inner, reference(0), Value::string("x")]),
        );
        input.skip_value(&outer).expect("skip");
        assert_eq!(input.history_len(), 2);
    }

    #[test]
    fn test_reference_checks() {
        let factory = SerializerFactory::new();
        let schema = Schema::new();
        let transforms = TransformSet::new();
        let mut input = DeserializationInput::new(&factory, &schema, &transforms);

        assert!(matches!(
            input.skip_value(&reference(0)),
            Err(Error::MalformedEnvelope { .. })
        ));
        input.history.push(Slot::Owned);
        assert!(matches!(input.shared_at(0, "demo.T"), Err(Error::TypeMismatch { .. })));
        input.share_last(Arc::new(5i32));
        let handle = input.shared_at(0, "demo.T").expect("shared");
        assert_eq!(handle.downcast_ref::<i32>(), Some(&5));
    }
}
