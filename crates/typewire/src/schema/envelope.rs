// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The payload/schema/transforms triple.

use super::descriptors::{self, expect_list};
use super::{Schema, TransformSet};
use crate::codec::Value;
use crate::error::{Error, Result};

/// Unit of wire transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub payload: Value,
    pub schema: Schema,
    pub transforms: TransformSet,
}

impl Envelope {
    pub fn to_value(&self) -> Value {
        descriptors::tagged(
            descriptors::ENVELOPE,
            Value::List(vec![
                self.payload.clone(),
                self.schema.to_value(),
                self.transforms.to_value(),
            ]),
        )
    }

    /// Accepts `[payload, schema, transforms]` and the older `[payload, schema]`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let items = expect_list(value, descriptors::ENVELOPE, "envelope")?;
        match items {
            [payload, schema] => Ok(Self {
                payload: payload.clone(),
                schema: Schema::from_value(schema)?,
                transforms: TransformSet::new(),
            }),
            [payload, schema, transforms, ..] => Ok(Self {
                payload: payload.clone(),
                schema: Schema::from_value(schema)?,
                transforms: TransformSet::from_value(transforms)?,
            }),
            _ => Err(Error::malformed(format!(
                "envelope has {} elements, expected 2 or 3",
                items.len()
            ))),
        }
    }
}
