// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime-typed values: [`AnyObject`] and the structural records that
//! stand in for wire types with no local definition.

use super::{LocalType, MapKind, MapShape, Object, Shape, SharedObject, TypeKey, TypeRef, Wire};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A shared value whose type is only known at runtime.
///
/// Cloning shares the value; identity survives a round trip.
#[derive(Clone)]
pub struct AnyObject(pub SharedObject);

impl AnyObject {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn from_shared(handle: SharedObject) -> Self {
        Self(handle)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.0).is::<T>()
    }

    /// Runtime type of the held value.
    pub fn value_type_id(&self) -> TypeId {
        (*self.0).type_id()
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.0
    }

    /// Address of the held value.
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Same underlying value (not merely equal).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl fmt::Debug for AnyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(r) = self.downcast_ref::<Record>() {
            return write!(f, "AnyObject({:?})", r);
        }
        if let Some(e) = self.downcast_ref::<RecordEnum>() {
            return write!(f, "AnyObject({:?})", e);
        }
        if let Some(s) = self.downcast_ref::<String>() {
            return write!(f, "AnyObject({:?})", s);
        }
        if let Some(v) = self.downcast_ref::<i64>() {
            return write!(f, "AnyObject({})", v);
        }
        f.write_str("AnyObject(..)")
    }
}

/// One field of a [`Record`].
pub struct RecordField {
    pub name: String,
    pub value: Object,
}

/// Stand-in for a composite type known only from the wire schema.
pub struct Record {
    pub type_name: String,
    pub fields: Vec<RecordField>,
}

impl Record {
    pub fn new(type_name: impl Into<String>, fields: Vec<RecordField>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Borrow field `name`.
    pub fn field(&self, name: &str) -> Option<&dyn Any> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &*f.value as &dyn Any)
    }

    /// Borrow field `name` as a `T`.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.field(name)?.downcast_ref::<T>()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names().collect();
        write!(f, "Record({} {{{}}})", self.type_name, names.join(", "))
    }
}

/// Stand-in for an enum known only from the wire schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEnum {
    pub type_name: String,
    pub constant: String,
    pub ordinal: usize,
}

/// Stand-in for a map type known only from the wire schema.
#[derive(Debug, Clone, Default)]
pub struct RecordMap(pub Vec<(AnyObject, AnyObject)>);

fn record_map_entries(value: &dyn Any) -> Option<Vec<(&dyn Any, &dyn Any)>> {
    let map = value.downcast_ref::<RecordMap>()?;
    Some(map.0.iter().map(|(k, v)| (k as &dyn Any, v as &dyn Any)).collect())
}

fn record_map_build(entries: Vec<(Object, Object)>) -> Result<Object, String> {
    let mut out = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let k = k.downcast::<AnyObject>().map_err(|_| "map key is not dynamic".to_string())?;
        let v = v.downcast::<AnyObject>().map_err(|_| "map value is not dynamic".to_string())?;
        out.push((*k, *v));
    }
    Ok(Box::new(RecordMap(out)))
}

impl Wire for RecordMap {
    fn local_type() -> LocalType {
        LocalType::new(
            Self::wire_name(),
            TypeKey::of::<Self>(),
            Shape::Map(MapShape {
                kind: MapKind::Ordered,
                key: TypeRef::of::<AnyObject>(),
                value: TypeRef::of::<AnyObject>(),
                entries: record_map_entries,
                build: record_map_build,
            }),
        )
        .with_raw_name("map")
    }

    fn wire_name() -> String {
        "map<any,any>".to_string()
    }
}
