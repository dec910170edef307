// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transparent wrappers (`Option`, `Box`, `Arc`) and runtime-typed values.
//!
//! Wrappers have no descriptor of their own: the wire carries the inner
//! value, a null, or (for sharing wrappers) a back-reference.

use super::{wrong_value, TypeSerializer};
use crate::codec::Value;
use crate::error::{Error, Result};
use crate::input::DeserializationInput;
use crate::model::{AnyObject, BoxedShape, LocalType, Object, OptionalShape, PrimitiveKind, SharedObject, SharedShape};
use crate::output::{object_key, SerializationOutput};
use crate::schema::descriptors;
use std::any::Any;
use std::sync::Arc;

pub struct OptionalSerializer {
    ty: Arc<LocalType>,
    shape: OptionalShape,
}

impl OptionalSerializer {
    pub fn new(ty: Arc<LocalType>, shape: OptionalShape) -> Self {
        Self { ty, shape }
    }
}

impl TypeSerializer for OptionalSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        None
    }

    fn write_class_info(&self, out: &mut SerializationOutput<'_>) -> Result<()> {
        out.write_type_info_for(&self.shape.inner)
    }

    fn write_object(&self, obj: &dyn Any, out: &mut SerializationOutput<'_>) -> Result<Value> {
        match (self.shape.get)(obj) {
            None => Err(wrong_value(&self.ty.name)),
            Some(None) => Ok(Value::Null),
            Some(Some(inner)) => out.write_value(inner, &self.shape.inner),
        }
    }

    fn read_object(&self, value: &Value, input: &mut DeserializationInput<'_>) -> Result<Object> {
        if value.is_null() {
            return Ok((self.shape.none)());
        }
        let inner = input.read_value(value, &self.shape.inner)?;
        (self.shape.some)(inner).map_err(|e| Error::mismatch(&self.ty.name, e))
    }
}

pub struct BoxedSerializer {
    ty: Arc<LocalType>,
    shape: BoxedShape,
}

impl BoxedSerializer {
    pub fn new(ty: Arc<LocalType>, shape: BoxedShape) -> Self {
        Self { ty, shape }
    }
}

impl TypeSerializer for BoxedSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        None
    }

    fn write_class_info(&self, out: &mut SerializationOutput<'_>) -> Result<()> {
        out.write_type_info_for(&self.shape.inner)
    }

    fn write_object(&self, obj: &dyn Any, out: &mut SerializationOutput<'_>) -> Result<Value> {
        let inner = (self.shape.get)(obj).ok_or_else(|| wrong_value(&self.ty.name))?;
        out.write_value(inner, &self.shape.inner)
    }

    fn read_object(&self, value: &Value, input: &mut DeserializationInput<'_>) -> Result<Object> {
        let inner = input.read_value(value, &self.shape.inner)?;
        (self.shape.wrap)(inner).map_err(|e| Error::mismatch(&self.ty.name, e))
    }
}

/// `Arc<T>`: the only typed path that emits and resolves back-references.
pub struct SharedSerializer {
    ty: Arc<LocalType>,
    shape: SharedShape,
}

impl SharedSerializer {
    pub fn new(ty: Arc<LocalType>, shape: SharedShape) -> Self {
        Self { ty, shape }
    }
}

impl TypeSerializer for SharedSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        None
    }

    fn write_class_info(&self, out: &mut SerializationOutput<'_>) -> Result<()> {
        out.write_type_info_for(&self.shape.inner)
    }

    fn write_object(&self, obj: &dyn Any, out: &mut SerializationOutput<'_>) -> Result<Value> {
        let inner = (self.shape.get)(obj).ok_or_else(|| wrong_value(&self.ty.name))?;
        let key = object_key(inner);
        if let Some(index) = out.reference_for(&key) {
            return Ok(descriptors::reference(index));
        }
        let value = out.write_value(inner, &self.shape.inner)?;
        if descriptors::token_of(&value).is_some() {
            out.remember(key);
        }
        Ok(value)
    }

    fn read_object(&self, value: &Value, input: &mut DeserializationInput<'_>) -> Result<Object> {
        if let Some(index) = descriptors::reference_index(value) {
            let handle = input.shared_at(index, &self.ty.name)?;
            return (self.shape.from_shared)(&handle)
                .ok_or_else(|| Error::mismatch(&self.ty.name, "back-reference to another type"));
        }
        let inner = input.read_value(value, &self.shape.inner)?;
        let (wrapped, handle) = (self.shape.wrap)(inner).map_err(|e| Error::mismatch(&self.ty.name, e))?;
        if descriptors::token_of(value).is_some() {
            input.share_last(handle);
        }
        Ok(wrapped)
    }
}

/// [`AnyObject`]: dispatches on the runtime type when writing and on the
/// wire descriptor when reading.
pub struct DynamicSerializer {
    ty: Arc<LocalType>,
}

impl DynamicSerializer {
    pub fn new(ty: Arc<LocalType>) -> Self {
        Self { ty }
    }
}

impl TypeSerializer for DynamicSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        None
    }

    fn write_class_info(&self, _out: &mut SerializationOutput<'_>) -> Result<()> {
        Ok(())
    }

    fn write_object(&self, obj: &dyn Any, out: &mut SerializationOutput<'_>) -> Result<Value> {
        let any = obj
            .downcast_ref::<AnyObject>()
            .ok_or_else(|| wrong_value(&self.ty.name))?;
        let inner = any.as_any();
        let key = object_key(inner);
        if let Some(index) = out.reference_for(&key) {
            return Ok(descriptors::reference(index));
        }
        let serializer = out.factory().serializer_for_runtime(inner)?;
        let value = out.write_with(&serializer, inner)?;
        if descriptors::token_of(&value).is_some() {
            out.remember(key);
        }
        Ok(value)
    }

    fn read_object(&self, value: &Value, input: &mut DeserializationInput<'_>) -> Result<Object> {
        if let Some(index) = descriptors::reference_index(value) {
            let handle = input.shared_at(index, &self.ty.name)?;
            return Ok(Box::new(AnyObject(handle)));
        }
        if let Some(token) = descriptors::token_of(value) {
            let serializer = input.factory().resolve_descriptor(
                token,
                None,
                input.schema(),
                input.transforms(),
            )?;
            let obj = input.read_with(&serializer, value)?;
            let handle: SharedObject = Arc::from(obj);
            if serializer.descriptor().is_some() {
                input.share_last(Arc::clone(&handle));
            }
            return Ok(Box::new(AnyObject(handle)));
        }
        let obj = PrimitiveKind::of_value(value)
            .and_then(|kind| kind.from_value(value))
            .ok_or_else(|| Error::mismatch(&self.ty.name, value.kind_name()))?;
        Ok(Box::new(AnyObject(Arc::from(obj))))
    }
}
