// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{wrong_value, TypeSerializer};
use crate::codec::Value;
use crate::error::{Error, Result};
use crate::input::DeserializationInput;
use crate::model::{LocalType, Object, PrimitiveKind};
use crate::output::SerializationOutput;
use std::any::Any;
use std::sync::Arc;

/// Scalars, strings and binary blobs: written as native values, never
/// described and never tracked in history.
pub struct PrimitiveSerializer {
    ty: Arc<LocalType>,
    kind: PrimitiveKind,
}

impl PrimitiveSerializer {
    pub fn new(ty: Arc<LocalType>, kind: PrimitiveKind) -> Self {
        Self { ty, kind }
    }
}

impl TypeSerializer for PrimitiveSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        None
    }

    fn write_class_info(&self, _out: &mut SerializationOutput<'_>) -> Result<()> {
        Ok(())
    }

    fn write_object(&self, obj: &dyn Any, _out: &mut SerializationOutput<'_>) -> Result<Value> {
        self.kind
            .to_value(obj)
            .ok_or_else(|| wrong_value(self.kind.wire_name()))
    }

    fn read_object(&self, value: &Value, _input: &mut DeserializationInput<'_>) -> Result<Object> {
        self.kind
            .from_value(value)
            .ok_or_else(|| Error::mismatch(self.kind.wire_name(), value.kind_name()))
    }
}
