// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Custom scalar serializers.
//!
//! A custom serializer turns a value into a primitive representation and
//! back; the engine treats it as terminal. Registered serializers form an
//! ordered list: the first one whose [`CustomSerializer::handles`] accepts a
//! type wins, ahead of the generic object path.
//!
//! Built-ins: `Duration`, `SystemTime`, [`Decimal`], [`RemoteError`].

use super::{described, described_body, TypeSerializer};
use crate::codec::Value;
use crate::error::{Error, Result};
use crate::input::DeserializationInput;
use crate::model::{LocalType, Object, TypeRef, Wire};
use crate::output::SerializationOutput;
use crate::scalars::{Decimal, RemoteError};
use crate::schema::{Descriptor, RestrictedSource, RestrictedType, TypeNotation};
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SCALAR_PREFIX: &str = "typewire:scalar:";

pub trait CustomSerializer: Send + Sync {
    /// Type this serializer was written for.
    fn local_type(&self) -> TypeRef;

    /// Whether this serializer takes over `ty`.
    fn handles(&self, ty: &LocalType) -> bool {
        ty.key == self.local_type().key()
    }

    /// Wire type name.
    fn type_name(&self) -> &str;

    /// Wire token values are described with.
    fn descriptor(&self) -> &str;

    /// Name of the primitive representation (schema `source`).
    fn repr_name(&self) -> &str;

    fn to_repr(&self, value: &dyn Any) -> Result<Value>;

    fn from_repr(&self, repr: &Value) -> Result<Object>;
}

/// A [`CustomSerializer`] built from a pair of conversion functions.
pub struct ScalarSerializer<T> {
    type_name: String,
    descriptor: String,
    repr_name: String,
    to_repr: fn(&T) -> core::result::Result<Value, String>,
    from_repr: fn(&Value) -> core::result::Result<T, String>,
}

impl<T: Wire> ScalarSerializer<T> {
    /// Serializer for `T`, tokened `typewire:scalar:<wire name>`.
    pub fn new(
        repr_name: impl Into<String>,
        to_repr: fn(&T) -> core::result::Result<Value, String>,
        from_repr: fn(&Value) -> core::result::Result<T, String>,
    ) -> Self {
        let type_name = T::wire_name();
        Self {
            descriptor: format!("{}{}", SCALAR_PREFIX, type_name),
            type_name,
            repr_name: repr_name.into(),
            to_repr,
            from_repr,
        }
    }

    /// Override the wire token.
    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = descriptor.into();
        self
    }
}

impl<T: Wire> CustomSerializer for ScalarSerializer<T> {
    fn local_type(&self) -> TypeRef {
        TypeRef::of::<T>()
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn repr_name(&self) -> &str {
        &self.repr_name
    }

    fn to_repr(&self, value: &dyn Any) -> Result<Value> {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| Error::mismatch(&self.type_name, "value of another type"))?;
        (self.to_repr)(value).map_err(|e| Error::not_serializable(&self.type_name, e))
    }

    fn from_repr(&self, repr: &Value) -> Result<Object> {
        (self.from_repr)(repr)
            .map(|v| Box::new(v) as Object)
            .map_err(|e| Error::mismatch(&self.type_name, e))
    }
}

/// Adapts a [`CustomSerializer`] to the engine.
pub struct CustomScalarSerializer {
    ty: Arc<LocalType>,
    custom: Arc<dyn CustomSerializer>,
}

impl CustomScalarSerializer {
    pub fn new(ty: Arc<LocalType>, custom: Arc<dyn CustomSerializer>) -> Self {
        Self { ty, custom }
    }
}

impl TypeSerializer for CustomScalarSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn type_name(&self) -> &str {
        self.custom.type_name()
    }

    fn descriptor(&self) -> Option<&str> {
        Some(self.custom.descriptor())
    }

    fn write_class_info(&self, out: &mut SerializationOutput<'_>) -> Result<()> {
        out.add_notation(TypeNotation::Restricted(RestrictedType {
            name: self.custom.type_name().to_string(),
            label: None,
            provides: Vec::new(),
            source: RestrictedSource::Custom(self.custom.repr_name().to_string()),
            descriptor: Descriptor::new(self.custom.descriptor()),
            choices: Vec::new(),
        }));
        Ok(())
    }

    fn write_object(&self, obj: &dyn Any, _out: &mut SerializationOutput<'_>) -> Result<Value> {
        Ok(described(self.custom.descriptor(), self.custom.to_repr(obj)?))
    }

    fn read_object(&self, value: &Value, _input: &mut DeserializationInput<'_>) -> Result<Object> {
        let body = described_body(value, self.custom.descriptor(), self.custom.type_name())?;
        self.custom.from_repr(body)
    }
}

fn pair(repr: &Value, what: &str) -> core::result::Result<(Value, u32), String> {
    match repr.as_list() {
        Some([secs, Value::UInt(nanos)]) if *nanos < 1_000_000_000 => Ok((secs.clone(), *nanos)),
        _ => Err(format!("{} repr must be [seconds, nanos]", what)),
    }
}

fn duration_to_repr(d: &Duration) -> core::result::Result<Value, String> {
    Ok(Value::List(vec![Value::ULong(d.as_secs()), Value::UInt(d.subsec_nanos())]))
}

fn duration_from_repr(repr: &Value) -> core::result::Result<Duration, String> {
    match pair(repr, "duration")? {
        (Value::ULong(secs), nanos) => Ok(Duration::new(secs, nanos)),
        _ => Err("duration seconds must be a ulong".to_string()),
    }
}

/// Seconds relative to the epoch (negative before it) plus positive nanos.
fn instant_to_repr(t: &SystemTime) -> core::result::Result<Value, String> {
    let (secs, nanos) = match t.duration_since(UNIX_EPOCH) {
        Ok(after) => {
            let secs = i64::try_from(after.as_secs()).map_err(|_| "instant out of range".to_string())?;
            (secs, after.subsec_nanos())
        }
        Err(e) => {
            let before = e.duration();
            let secs = i64::try_from(before.as_secs()).map_err(|_| "instant out of range".to_string())?;
            if before.subsec_nanos() == 0 {
                (-secs, 0)
            } else {
                (-secs - 1, 1_000_000_000 - before.subsec_nanos())
            }
        }
    };
    Ok(Value::List(vec![Value::Long(secs), Value::UInt(nanos)]))
}

fn instant_from_repr(repr: &Value) -> core::result::Result<SystemTime, String> {
    let (secs, nanos) = match pair(repr, "instant")? {
        (Value::Long(secs), nanos) => (secs, nanos),
        _ => return Err("instant seconds must be a long".to_string()),
    };
    let base = if secs >= 0 {
        UNIX_EPOCH.checked_add(Duration::from_secs(secs.unsigned_abs()))
    } else {
        UNIX_EPOCH.checked_sub(Duration::from_secs(secs.unsigned_abs()))
    };
    base.and_then(|t| t.checked_add(Duration::from_nanos(u64::from(nanos))))
        .ok_or_else(|| "instant out of range".to_string())
}

fn decimal_to_repr(d: &Decimal) -> core::result::Result<Value, String> {
    Ok(Value::string(d.to_string()))
}

fn decimal_from_repr(repr: &Value) -> core::result::Result<Decimal, String> {
    let s = repr.as_str().ok_or_else(|| "decimal repr must be a string".to_string())?;
    s.parse::<Decimal>().map_err(|e| e.to_string())
}

fn remote_error_to_repr(e: &RemoteError) -> core::result::Result<Value, String> {
    Ok(Value::List(vec![
        Value::string(e.kind.clone()),
        Value::string(e.message.clone()),
        Value::List(e.causes.iter().cloned().map(Value::String).collect()),
    ]))
}

fn remote_error_from_repr(repr: &Value) -> core::result::Result<RemoteError, String> {
    let malformed = || "error repr must be [kind, message, [causes..]]".to_string();
    let items = repr.as_list().ok_or_else(malformed)?;
    let [kind, message, causes] = items else {
        return Err(malformed());
    };
    let causes = causes
        .as_list()
        .ok_or_else(malformed)?
        .iter()
        .map(|c| c.as_str().map(str::to_string).ok_or_else(malformed))
        .collect::<core::result::Result<Vec<_>, _>>()?;
    Ok(RemoteError {
        kind: kind.as_str().ok_or_else(malformed)?.to_string(),
        message: message.as_str().ok_or_else(malformed)?.to_string(),
        causes,
    })
}

/// Custom serializers registered with every factory unless disabled.
pub fn builtins() -> Vec<Arc<dyn CustomSerializer>> {
    vec![
        Arc::new(ScalarSerializer::<Duration>::new("duration", duration_to_repr, duration_from_repr)),
        Arc::new(ScalarSerializer::<SystemTime>::new("instant", instant_to_repr, instant_from_repr)),
        Arc::new(ScalarSerializer::<Decimal>::new("string", decimal_to_repr, decimal_from_repr)),
        Arc::new(ScalarSerializer::<RemoteError>::new("error", remote_error_to_repr, remote_error_from_repr)),
    ]
}
