// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{described, described_list, wrong_value, TypeSerializer};
use crate::codec::Value;
use crate::error::{Error, Result};
use crate::input::DeserializationInput;
use crate::model::{CompositeShape, LocalType, Object, TypeKey, TypeRegistry};
use crate::output::SerializationOutput;
use crate::schema::{CompositeType, Descriptor, Field, TypeNotation};
use std::any::Any;
use std::sync::Arc;

/// Composite types: one wire field per property, in declared order, read
/// back through the primary constructor.
pub struct ObjectSerializer {
    ty: Arc<LocalType>,
    shape: CompositeShape,
    descriptor: String,
    notation: TypeNotation,
}

impl ObjectSerializer {
    pub fn new(ty: Arc<LocalType>, shape: CompositeShape, descriptor: String, notation: TypeNotation) -> Self {
        Self {
            ty,
            shape,
            descriptor,
            notation,
        }
    }

    /// Schema notation of a composite local type.
    pub fn notation_for(registry: &TypeRegistry, ty: &LocalType, shape: &CompositeShape, descriptor: &str) -> TypeNotation {
        let fields = shape
            .properties
            .iter()
            .map(|p| Field {
                name: p.name.clone(),
                type_name: super::unwrapped(registry, &p.ty).name.clone(),
                requires: p.requires.clone(),
                default: p.default_literal.clone(),
                label: None,
                mandatory: !p.nullable,
                multiple: false,
            })
            .collect();
        TypeNotation::Composite(CompositeType {
            name: ty.name.clone(),
            label: None,
            provides: ty.provides.clone(),
            descriptor: Descriptor::new(descriptor),
            fields,
        })
    }
}

impl TypeSerializer for ObjectSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        Some(&self.descriptor)
    }

    fn write_class_info(&self, out: &mut SerializationOutput<'_>) -> Result<()> {
        for prop in &self.shape.properties {
            out.write_type_info_for(&prop.ty)?;
        }
        out.add_notation(self.notation.clone());
        if !self.ty.transforms.is_empty() {
            out.add_transforms(&self.ty.name, &self.ty.transforms);
        }
        Ok(())
    }

    fn write_object(&self, obj: &dyn Any, out: &mut SerializationOutput<'_>) -> Result<Value> {
        if let TypeKey::Native(id) = &self.ty.key {
            if obj.type_id() != *id {
                return Err(wrong_value(&self.ty.name));
            }
        }
        let mut fields = Vec::with_capacity(self.shape.properties.len());
        for prop in &self.shape.properties {
            let value = (prop.getter)(obj).ok_or_else(|| wrong_value(&self.ty.name))?;
            fields.push(out.write_value(value, &prop.ty)?);
        }
        Ok(described(&self.descriptor, Value::List(fields)))
    }

    fn read_object(&self, value: &Value, input: &mut DeserializationInput<'_>) -> Result<Object> {
        let items = described_list(value, &self.descriptor, &self.ty.name)?;
        if items.len() != self.shape.properties.len() {
            return Err(Error::malformed(format!(
                "{} carries {} fields, expected {}",
                self.ty.name,
                items.len(),
                self.shape.properties.len()
            )));
        }
        let mut args = Vec::with_capacity(items.len());
        for (item, prop) in items.iter().zip(&self.shape.properties) {
            args.push(input.read_value(item, &prop.ty)?);
        }
        (self.shape.constructor.build)(args).map_err(|e| Error::mismatch(&self.ty.name, e))
    }
}
