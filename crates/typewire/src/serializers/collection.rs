// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{described, described_body, described_list, wrong_value, TypeSerializer};
use crate::codec::Value;
use crate::error::{Error, Result};
use crate::input::DeserializationInput;
use crate::model::{CollectionKind, CollectionShape, LocalType, MapShape, Object};
use crate::output::SerializationOutput;
use crate::schema::{Descriptor, RestrictedSource, RestrictedType, TypeNotation};
use std::any::Any;
use std::sync::Arc;

fn restricted(ty: &LocalType, source: RestrictedSource, descriptor: &str) -> TypeNotation {
    TypeNotation::Restricted(RestrictedType {
        name: ty.name.clone(),
        label: None,
        provides: ty.provides.clone(),
        source,
        descriptor: Descriptor::new(descriptor),
        choices: Vec::new(),
    })
}

/// Lists, ordered sets and fixed-size arrays.
pub struct CollectionSerializer {
    ty: Arc<LocalType>,
    shape: CollectionShape,
    descriptor: String,
}

impl CollectionSerializer {
    pub fn new(ty: Arc<LocalType>, shape: CollectionShape, descriptor: String) -> Self {
        Self { ty, shape, descriptor }
    }

    fn source(&self) -> RestrictedSource {
        match self.shape.kind {
            CollectionKind::Set | CollectionKind::UnorderedSet => RestrictedSource::Set,
            CollectionKind::Array => RestrictedSource::Array,
            CollectionKind::List => RestrictedSource::List,
        }
    }
}

impl TypeSerializer for CollectionSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        Some(&self.descriptor)
    }

    fn write_class_info(&self, out: &mut SerializationOutput<'_>) -> Result<()> {
        out.write_type_info_for(&self.shape.element)?;
        out.add_notation(restricted(&self.ty, self.source(), &self.descriptor));
        Ok(())
    }

    fn write_object(&self, obj: &dyn Any, out: &mut SerializationOutput<'_>) -> Result<Value> {
        let elements = (self.shape.elements)(obj).ok_or_else(|| wrong_value(&self.ty.name))?;
        let mut items = Vec::with_capacity(elements.len());
        for element in elements {
            items.push(out.write_value(element, &self.shape.element)?);
        }
        Ok(described(&self.descriptor, Value::List(items)))
    }

    fn read_object(&self, value: &Value, input: &mut DeserializationInput<'_>) -> Result<Object> {
        let items = described_list(value, &self.descriptor, &self.ty.name)?;
        let mut elements = Vec::with_capacity(items.len());
        for item in items {
            elements.push(input.read_value(item, &self.shape.element)?);
        }
        (self.shape.build)(elements).map_err(|e| Error::mismatch(&self.ty.name, e))
    }
}

/// Ordered maps; entry order is preserved on the wire.
pub struct MapSerializer {
    ty: Arc<LocalType>,
    shape: MapShape,
    descriptor: String,
}

impl MapSerializer {
    pub fn new(ty: Arc<LocalType>, shape: MapShape, descriptor: String) -> Self {
        Self { ty, shape, descriptor }
    }
}

impl TypeSerializer for MapSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        Some(&self.descriptor)
    }

    fn write_class_info(&self, out: &mut SerializationOutput<'_>) -> Result<()> {
        out.write_type_info_for(&self.shape.key)?;
        out.write_type_info_for(&self.shape.value)?;
        out.add_notation(restricted(&self.ty, RestrictedSource::Map, &self.descriptor));
        Ok(())
    }

    fn write_object(&self, obj: &dyn Any, out: &mut SerializationOutput<'_>) -> Result<Value> {
        let entries = (self.shape.entries)(obj).ok_or_else(|| wrong_value(&self.ty.name))?;
        let mut pairs = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            let k = out.write_value(k, &self.shape.key)?;
            let v = out.write_value(v, &self.shape.value)?;
            pairs.push((k, v));
        }
        Ok(described(&self.descriptor, Value::Map(pairs)))
    }

    fn read_object(&self, value: &Value, input: &mut DeserializationInput<'_>) -> Result<Object> {
        let body = described_body(value, &self.descriptor, &self.ty.name)?;
        let pairs = body.as_map().ok_or_else(|| {
            Error::malformed(format!("{} body is {}, not a map", self.ty.name, body.kind_name()))
        })?;
        let mut entries = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            let k = input.read_value(k, &self.shape.key)?;
            let v = input.read_value(v, &self.shape.value)?;
            entries.push((k, v));
        }
        (self.shape.build)(entries).map_err(|e| Error::mismatch(&self.ty.name, e))
    }
}
