// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{described, described_list, wrong_value, TypeSerializer};
use crate::codec::Value;
use crate::error::Result;
use crate::input::DeserializationInput;
use crate::model::{LocalType, Object, SingletonShape, TypeKey};
use crate::output::SerializationOutput;
use crate::schema::{Descriptor, RestrictedSource, RestrictedType, TypeNotation};
use std::any::Any;
use std::sync::Arc;

/// Stateless marker types: an empty list tagged with the type token.
pub struct SingletonSerializer {
    ty: Arc<LocalType>,
    shape: SingletonShape,
    descriptor: String,
}

impl SingletonSerializer {
    pub fn new(ty: Arc<LocalType>, shape: SingletonShape, descriptor: String) -> Self {
        Self { ty, shape, descriptor }
    }
}

impl TypeSerializer for SingletonSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        Some(&self.descriptor)
    }

    fn write_class_info(&self, out: &mut SerializationOutput<'_>) -> Result<()> {
        out.add_notation(TypeNotation::Restricted(RestrictedType {
            name: self.ty.name.clone(),
            label: None,
            provides: self.ty.provides.clone(),
            source: RestrictedSource::Singleton,
            descriptor: Descriptor::new(self.descriptor.clone()),
            choices: Vec::new(),
        }));
        Ok(())
    }

    fn write_object(&self, obj: &dyn Any, _out: &mut SerializationOutput<'_>) -> Result<Value> {
        if let TypeKey::Native(id) = &self.ty.key {
            if obj.type_id() != *id {
                return Err(wrong_value(&self.ty.name));
            }
        }
        Ok(described(&self.descriptor, Value::List(Vec::new())))
    }

    fn read_object(&self, value: &Value, _input: &mut DeserializationInput<'_>) -> Result<Object> {
        described_list(value, &self.descriptor, &self.ty.name)?;
        Ok((self.shape.instance)())
    }
}
