// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{described, described_list, wrong_value, TypeSerializer};
use crate::codec::Value;
use crate::error::{Error, Result};
use crate::input::DeserializationInput;
use crate::model::{EnumShape, LocalType, Object};
use crate::output::SerializationOutput;
use crate::schema::{Choice, Descriptor, RestrictedSource, RestrictedType, TypeNotation};
use std::any::Any;
use std::sync::Arc;

/// Wire form of one enum constant: `[name, ordinal]`.
pub(crate) fn constant_name<'v>(items: &'v [Value], type_name: &str) -> Result<&'v str> {
    items
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| Error::malformed(format!("{} constant has no name", type_name)))
}

pub struct EnumSerializer {
    ty: Arc<LocalType>,
    shape: EnumShape,
    descriptor: String,
}

impl EnumSerializer {
    pub fn new(ty: Arc<LocalType>, shape: EnumShape, descriptor: String) -> Self {
        Self { ty, shape, descriptor }
    }

    fn notation(&self) -> TypeNotation {
        TypeNotation::Restricted(RestrictedType {
            name: self.ty.name.clone(),
            label: None,
            provides: self.ty.provides.clone(),
            source: RestrictedSource::Enum,
            descriptor: Descriptor::new(self.descriptor.clone()),
            choices: self
                .shape
                .constants
                .iter()
                .enumerate()
                .map(|(i, name)| Choice {
                    name: name.clone(),
                    value: i.to_string(),
                })
                .collect(),
        })
    }
}

impl TypeSerializer for EnumSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        Some(&self.descriptor)
    }

    fn write_class_info(&self, out: &mut SerializationOutput<'_>) -> Result<()> {
        out.add_notation(self.notation());
        if !self.ty.transforms.is_empty() {
            out.add_transforms(&self.ty.name, &self.ty.transforms);
        }
        Ok(())
    }

    fn write_object(&self, obj: &dyn Any, _out: &mut SerializationOutput<'_>) -> Result<Value> {
        let ordinal = (self.shape.ordinal_of)(obj).ok_or_else(|| wrong_value(&self.ty.name))?;
        let name = self
            .shape
            .constants
            .get(ordinal)
            .ok_or_else(|| Error::not_serializable(&self.ty.name, format!("no constant at ordinal {}", ordinal)))?;
        let ordinal = i32::try_from(ordinal)
            .map_err(|_| Error::not_serializable(&self.ty.name, "ordinal out of range"))?;
        Ok(described(
            &self.descriptor,
            Value::List(vec![Value::string(name.clone()), Value::Int(ordinal)]),
        ))
    }

    fn read_object(&self, value: &Value, _input: &mut DeserializationInput<'_>) -> Result<Object> {
        let items = described_list(value, &self.descriptor, &self.ty.name)?;
        let name = constant_name(items, &self.ty.name)?;
        self.shape
            .ordinal(name)
            .and_then(|ordinal| (self.shape.from_ordinal)(ordinal))
            .ok_or_else(|| Error::mismatch(&self.ty.name, format!("constant {}", name)))
    }
}
