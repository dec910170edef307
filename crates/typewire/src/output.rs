// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Write engine state for one `serialize` call.
//!
//! Tracks the schema and transforms accumulated so far, which serializers
//! have contributed their type notations, and the identity of every shared
//! value already written (for back-references).
//!
//! # History indices
//!
//! Every value written by a serializer that owns a type descriptor takes the
//! next history index *after* it has been fully written (post-order). The
//! read engine appends in the same order, so an index always points to an
//! already materialized object.

use crate::codec::Value;
use crate::error::Result;
use crate::factory::SerializerFactory;
use crate::model::{TypeKey, TypeRef};
use crate::schema::{descriptors, Envelope, Schema, Transform, TransformSet, TypeNotation};
use crate::serializers::TypeSerializer;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Identity of a written value: data address and runtime type.
pub(crate) type ObjectKey = (usize, TypeId);

pub struct SerializationOutput<'f> {
    factory: &'f SerializerFactory,
    objects: HashMap<ObjectKey, u32>,
    next_index: u32,
    written_types: HashSet<TypeKey>,
    schema: Schema,
    transforms: TransformSet,
}

impl<'f> SerializationOutput<'f> {
    /// Fresh per-call state. `serialize` builds one of these; custom
    /// serializers can also drive one directly.
    pub fn new(factory: &'f SerializerFactory) -> Self {
        Self {
            factory,
            objects: HashMap::new(),
            next_index: 0,
            written_types: HashSet::new(),
            schema: Schema::new(),
            transforms: TransformSet::new(),
        }
    }

    pub fn factory(&self) -> &'f SerializerFactory {
        self.factory
    }

    /// Write `obj` as an instance of `declared`.
    pub fn write_value(&mut self, obj: &dyn Any, declared: &TypeRef) -> Result<Value> {
        let serializer = self.factory.resolve_for_write(declared)?;
        self.write_with(&serializer, obj)
    }

    /// Write `obj` through an already resolved serializer.
    pub fn write_with(&mut self, serializer: &Arc<dyn TypeSerializer>, obj: &dyn Any) -> Result<Value> {
        self.write_type_info(serializer)?;
        let value = serializer.write_object(obj, self)?;
        if serializer.descriptor().is_some() && descriptors::token_of(&value).is_some() {
            self.next_index += 1;
        }
        Ok(value)
    }

    /// Let `serializer` contribute its notation(s), once per call.
    pub fn write_type_info(&mut self, serializer: &Arc<dyn TypeSerializer>) -> Result<()> {
        if self.written_types.insert(serializer.local_type().key.clone()) {
            serializer.write_class_info(self)?;
        }
        Ok(())
    }

    /// Contribute the notation of `declared`'s serializer.
    pub fn write_type_info_for(&mut self, declared: &TypeRef) -> Result<()> {
        let serializer = self.factory.resolve_for_write(declared)?;
        self.write_type_info(&serializer)
    }

    pub fn add_notation(&mut self, notation: TypeNotation) {
        if self.schema.add(notation) {
            log::trace!("[output] schema now holds {} types", self.schema.len());
        }
    }

    pub fn add_transforms(&mut self, type_name: &str, transforms: &[Transform]) {
        self.transforms.extend(type_name, transforms);
    }

    /// History index of an already written value.
    pub(crate) fn reference_for(&self, key: &ObjectKey) -> Option<u32> {
        self.objects.get(key).copied()
    }

    /// Bind `key` to the value written last.
    pub(crate) fn remember(&mut self, key: ObjectKey) {
        if let Some(index) = self.next_index.checked_sub(1) {
            self.objects.entry(key).or_insert(index);
        }
    }

    pub(crate) fn finish(self, payload: Value) -> Envelope {
        Envelope {
            payload,
            schema: self.schema,
            transforms: self.transforms,
        }
    }
}

/// Identity key of a value behind a sharing wrapper.
pub(crate) fn object_key(value: &dyn Any) -> ObjectKey {
    (value as *const dyn Any as *const () as usize, value.type_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_distinguishes_type_at_same_address() {
        #[derive(Debug)]
        struct Outer {
            inner: u32,
        }
        let outer = Outer { inner: 7 };
        let a = object_key(&outer);
        let b = object_key(&outer.inner);
        assert_eq!(a.0, b.0);
        assert_ne!(a, b);
    }
}
