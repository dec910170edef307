// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in `Wire` impls: primitives, containers, wrappers.

use super::{
    AnyObject, BoxedShape, CollectionKind, CollectionShape, LocalType, MapKind, MapShape, Object,
    OptionalShape, PrimitiveKind, Shape, SharedObject, SharedShape, TypeKey, TypeRef, Wire,
};
use crate::codec::Value;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

pub(crate) const OPTIONAL_BINARY: &str = "binary?";

/// Generate `Wire` for a primitive type
macro_rules! impl_primitive {
    ($ty:ty, $kind:expr) => {
        impl Wire for $ty {
            fn local_type() -> LocalType {
                LocalType::new($kind.wire_name(), TypeKey::of::<$ty>(), Shape::Primitive($kind))
            }

            fn wire_name() -> String {
                $kind.wire_name().to_string()
            }
        }
    };
}

impl_primitive!(bool, PrimitiveKind::Bool);
impl_primitive!(i8, PrimitiveKind::I8);
impl_primitive!(i16, PrimitiveKind::I16);
impl_primitive!(i32, PrimitiveKind::I32);
impl_primitive!(i64, PrimitiveKind::I64);
impl_primitive!(u8, PrimitiveKind::U8);
impl_primitive!(u16, PrimitiveKind::U16);
impl_primitive!(u32, PrimitiveKind::U32);
impl_primitive!(u64, PrimitiveKind::U64);
impl_primitive!(f32, PrimitiveKind::F32);
impl_primitive!(f64, PrimitiveKind::F64);
impl_primitive!(char, PrimitiveKind::Char);
impl_primitive!(String, PrimitiveKind::String);

/// `Vec<u8>` as a binary blob.
pub fn binary_type() -> LocalType {
    LocalType::new(
        PrimitiveKind::Binary.wire_name(),
        TypeKey::Binary,
        Shape::Primitive(PrimitiveKind::Binary),
    )
}

/// `Option<Vec<u8>>` as a nullable binary blob.
pub fn optional_binary_type() -> LocalType {
    LocalType::new(
        OPTIONAL_BINARY,
        TypeKey::Synthetic(OPTIONAL_BINARY.to_string()),
        Shape::Optional(OptionalShape {
            inner: TypeRef::binary(),
            get: option_get::<Vec<u8>>,
            some: option_some::<Vec<u8>>,
            none: option_none::<Vec<u8>>,
        }),
    )
}

/// Type reference for a primitive, optionally nullable.
pub(crate) fn primitive_ref(kind: PrimitiveKind, nullable: bool) -> TypeRef {
    macro_rules! pick {
        ($ty:ty) => {
            if nullable {
                TypeRef::of::<Option<$ty>>()
            } else {
                TypeRef::of::<$ty>()
            }
        };
    }
    match kind {
        PrimitiveKind::Bool => pick!(bool),
        PrimitiveKind::I8 => pick!(i8),
        PrimitiveKind::I16 => pick!(i16),
        PrimitiveKind::I32 => pick!(i32),
        PrimitiveKind::I64 => pick!(i64),
        PrimitiveKind::U8 => pick!(u8),
        PrimitiveKind::U16 => pick!(u16),
        PrimitiveKind::U32 => pick!(u32),
        PrimitiveKind::U64 => pick!(u64),
        PrimitiveKind::F32 => pick!(f32),
        PrimitiveKind::F64 => pick!(f64),
        PrimitiveKind::Char => pick!(char),
        PrimitiveKind::String => pick!(String),
        PrimitiveKind::Binary if nullable => TypeRef::optional_binary(),
        PrimitiveKind::Binary => TypeRef::binary(),
    }
}

/// Type references registered with every factory.
pub(crate) fn builtin_refs() -> Vec<TypeRef> {
    let mut refs: Vec<TypeRef> = PrimitiveKind::ALL
        .into_iter()
        .flat_map(|k| [primitive_ref(k, false), primitive_ref(k, true)])
        .collect();
    refs.extend([
        TypeRef::of::<AnyObject>(),
        TypeRef::of::<Option<AnyObject>>(),
        TypeRef::of::<Vec<AnyObject>>(),
        TypeRef::of::<super::RecordMap>(),
        TypeRef::of::<Duration>(),
        TypeRef::of::<SystemTime>(),
        TypeRef::of::<crate::scalars::Decimal>(),
        TypeRef::of::<crate::scalars::RemoteError>(),
    ]);
    refs
}

impl PrimitiveKind {
    /// Encode a primitive value; `None` if `value` is not of this kind.
    pub fn to_value(self, value: &dyn Any) -> Option<Value> {
        Some(match self {
            Self::Bool => Value::Bool(*value.downcast_ref::<bool>()?),
            Self::I8 => Value::Byte(*value.downcast_ref::<i8>()?),
            Self::I16 => Value::Short(*value.downcast_ref::<i16>()?),
            Self::I32 => Value::Int(*value.downcast_ref::<i32>()?),
            Self::I64 => Value::Long(*value.downcast_ref::<i64>()?),
            Self::U8 => Value::UByte(*value.downcast_ref::<u8>()?),
            Self::U16 => Value::UShort(*value.downcast_ref::<u16>()?),
            Self::U32 => Value::UInt(*value.downcast_ref::<u32>()?),
            Self::U64 => Value::ULong(*value.downcast_ref::<u64>()?),
            Self::F32 => Value::Float(*value.downcast_ref::<f32>()?),
            Self::F64 => Value::Double(*value.downcast_ref::<f64>()?),
            Self::Char => Value::Char(*value.downcast_ref::<char>()?),
            Self::String => Value::String(value.downcast_ref::<String>()?.clone()),
            Self::Binary => Value::Binary(value.downcast_ref::<Vec<u8>>()?.clone()),
        })
    }

    /// Decode a primitive value; `None` if the wire kind does not match.
    pub fn from_value(self, value: &Value) -> Option<Object> {
        Some(match (self, value) {
            (Self::Bool, Value::Bool(v)) => boxed(*v),
            (Self::I8, Value::Byte(v)) => boxed(*v),
            (Self::I16, Value::Short(v)) => boxed(*v),
            (Self::I32, Value::Int(v)) => boxed(*v),
            (Self::I64, Value::Long(v)) => boxed(*v),
            (Self::U8, Value::UByte(v)) => boxed(*v),
            (Self::U16, Value::UShort(v)) => boxed(*v),
            (Self::U32, Value::UInt(v)) => boxed(*v),
            (Self::U64, Value::ULong(v)) => boxed(*v),
            (Self::F32, Value::Float(v)) => boxed(*v),
            (Self::F64, Value::Double(v)) => boxed(*v),
            (Self::Char, Value::Char(v)) => boxed(*v),
            (Self::String, Value::String(v)) => boxed(v.clone()),
            (Self::Binary, Value::Binary(v)) => boxed(v.clone()),
            _ => return None,
        })
    }

    /// Kind of an undescribed wire value.
    pub fn of_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Bool(_) => Self::Bool,
            Value::Byte(_) => Self::I8,
            Value::Short(_) => Self::I16,
            Value::Int(_) => Self::I32,
            Value::Long(_) => Self::I64,
            Value::UByte(_) => Self::U8,
            Value::UShort(_) => Self::U16,
            Value::UInt(_) => Self::U32,
            Value::ULong(_) => Self::U64,
            Value::Float(_) => Self::F32,
            Value::Double(_) => Self::F64,
            Value::Char(_) => Self::Char,
            Value::String(_) => Self::String,
            Value::Binary(_) => Self::Binary,
            _ => return None,
        })
    }

    /// Parse a default literal (`#[wire(default = "...")]`).
    pub fn parse_literal(self, literal: &str) -> Option<Object> {
        let s = literal.trim();
        Some(match self {
            Self::Bool => boxed(s.parse::<bool>().ok()?),
            Self::I8 => boxed(s.parse::<i8>().ok()?),
            Self::I16 => boxed(s.parse::<i16>().ok()?),
            Self::I32 => boxed(s.parse::<i32>().ok()?),
            Self::I64 => boxed(s.parse::<i64>().ok()?),
            Self::U8 => boxed(s.parse::<u8>().ok()?),
            Self::U16 => boxed(s.parse::<u16>().ok()?),
            Self::U32 => boxed(s.parse::<u32>().ok()?),
            Self::U64 => boxed(s.parse::<u64>().ok()?),
            Self::F32 => boxed(s.parse::<f32>().ok()?),
            Self::F64 => boxed(s.parse::<f64>().ok()?),
            Self::Char => {
                let mut chars = s.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                boxed(c)
            }
            // Strings keep surrounding whitespace.
            Self::String => boxed(literal.to_string()),
            Self::Binary => return None,
        })
    }
}

fn boxed<T: Any + Send + Sync>(value: T) -> Object {
    Box::new(value)
}

fn collect_elements<T: Wire>(items: Vec<Object>) -> Result<Vec<T>, String> {
    items
        .into_iter()
        .map(|item| {
            item.downcast::<T>()
                .map(|v| *v)
                .map_err(|_| format!("element is not a {}", T::wire_name()))
        })
        .collect()
}

fn collect_entries<K: Wire, V: Wire>(entries: Vec<(Object, Object)>) -> Result<Vec<(K, V)>, String> {
    entries
        .into_iter()
        .map(|(k, v)| {
            let k = k
                .downcast::<K>()
                .map_err(|_| format!("key is not a {}", K::wire_name()))?;
            let v = v
                .downcast::<V>()
                .map_err(|_| format!("value is not a {}", V::wire_name()))?;
            Ok((*k, *v))
        })
        .collect()
}

fn vec_elements<T: Wire>(value: &dyn Any) -> Option<Vec<&dyn Any>> {
    let items = value.downcast_ref::<Vec<T>>()?;
    Some(items.iter().map(|i| i as &dyn Any).collect())
}

fn vec_build<T: Wire>(items: Vec<Object>) -> Result<Object, String> {
    collect_elements::<T>(items).map(|v| Box::new(v) as Object)
}

impl<T: Wire> Wire for Vec<T> {
    fn local_type() -> LocalType {
        LocalType::new(
            Self::wire_name(),
            TypeKey::of::<Self>(),
            Shape::Collection(CollectionShape {
                kind: CollectionKind::List,
                element: TypeRef::of::<T>(),
                elements: vec_elements::<T>,
                build: vec_build::<T>,
            }),
        )
        .with_raw_name(CollectionKind::List.raw_name())
    }

    fn wire_name() -> String {
        format!("list<{}>", T::wire_name())
    }
}

fn array_elements<T: Wire, const N: usize>(value: &dyn Any) -> Option<Vec<&dyn Any>> {
    let items = value.downcast_ref::<[T; N]>()?;
    Some(items.iter().map(|i| i as &dyn Any).collect())
}

fn array_build<T: Wire, const N: usize>(items: Vec<Object>) -> Result<Object, String> {
    let items = collect_elements::<T>(items)?;
    <[T; N]>::try_from(items)
        .map(|a| Box::new(a) as Object)
        .map_err(|v| format!("expected {} elements, found {}", N, v.len()))
}

impl<T: Wire, const N: usize> Wire for [T; N] {
    fn local_type() -> LocalType {
        LocalType::new(
            Self::wire_name(),
            TypeKey::of::<Self>(),
            Shape::Collection(CollectionShape {
                kind: CollectionKind::Array,
                element: TypeRef::of::<T>(),
                elements: array_elements::<T, N>,
                build: array_build::<T, N>,
            }),
        )
        .with_raw_name(CollectionKind::Array.raw_name())
    }

    fn wire_name() -> String {
        format!("{}[]", T::wire_name())
    }
}

fn btree_set_elements<T: Wire + Ord>(value: &dyn Any) -> Option<Vec<&dyn Any>> {
    let items = value.downcast_ref::<BTreeSet<T>>()?;
    Some(items.iter().map(|i| i as &dyn Any).collect())
}

fn btree_set_build<T: Wire + Ord>(items: Vec<Object>) -> Result<Object, String> {
    collect_elements::<T>(items).map(|v| Box::new(v.into_iter().collect::<BTreeSet<T>>()) as Object)
}

impl<T: Wire + Ord> Wire for BTreeSet<T> {
    fn local_type() -> LocalType {
        LocalType::new(
            Self::wire_name(),
            TypeKey::of::<Self>(),
            Shape::Collection(CollectionShape {
                kind: CollectionKind::Set,
                element: TypeRef::of::<T>(),
                elements: btree_set_elements::<T>,
                build: btree_set_build::<T>,
            }),
        )
        .with_raw_name(CollectionKind::Set.raw_name())
    }

    fn wire_name() -> String {
        format!("set<{}>", T::wire_name())
    }
}

fn hash_set_elements<T: Wire + Eq + Hash>(value: &dyn Any) -> Option<Vec<&dyn Any>> {
    let items = value.downcast_ref::<HashSet<T>>()?;
    Some(items.iter().map(|i| i as &dyn Any).collect())
}

fn hash_set_build<T: Wire + Eq + Hash>(items: Vec<Object>) -> Result<Object, String> {
    collect_elements::<T>(items).map(|v| Box::new(v.into_iter().collect::<HashSet<T>>()) as Object)
}

impl<T: Wire + Eq + Hash> Wire for HashSet<T> {
    fn local_type() -> LocalType {
        LocalType::new(
            Self::wire_name(),
            TypeKey::of::<Self>(),
            Shape::Collection(CollectionShape {
                kind: CollectionKind::UnorderedSet,
                element: TypeRef::of::<T>(),
                elements: hash_set_elements::<T>,
                build: hash_set_build::<T>,
            }),
        )
        .with_raw_name(CollectionKind::UnorderedSet.raw_name())
    }

    fn wire_name() -> String {
        format!("hashset<{}>", T::wire_name())
    }
}

fn btree_map_entries<K: Wire + Ord, V: Wire>(value: &dyn Any) -> Option<Vec<(&dyn Any, &dyn Any)>> {
    let map = value.downcast_ref::<BTreeMap<K, V>>()?;
    Some(map.iter().map(|(k, v)| (k as &dyn Any, v as &dyn Any)).collect())
}

fn btree_map_build<K: Wire + Ord, V: Wire>(entries: Vec<(Object, Object)>) -> Result<Object, String> {
    collect_entries::<K, V>(entries).map(|v| Box::new(v.into_iter().collect::<BTreeMap<K, V>>()) as Object)
}

impl<K: Wire + Ord, V: Wire> Wire for BTreeMap<K, V> {
    fn local_type() -> LocalType {
        LocalType::new(
            Self::wire_name(),
            TypeKey::of::<Self>(),
            Shape::Map(MapShape {
                kind: MapKind::Ordered,
                key: TypeRef::of::<K>(),
                value: TypeRef::of::<V>(),
                entries: btree_map_entries::<K, V>,
                build: btree_map_build::<K, V>,
            }),
        )
        .with_raw_name("map")
    }

    fn wire_name() -> String {
        format!("map<{},{}>", K::wire_name(), V::wire_name())
    }
}

fn hash_map_entries<K: Wire + Eq + Hash, V: Wire>(value: &dyn Any) -> Option<Vec<(&dyn Any, &dyn Any)>> {
    let map = value.downcast_ref::<HashMap<K, V>>()?;
    Some(map.iter().map(|(k, v)| (k as &dyn Any, v as &dyn Any)).collect())
}

fn hash_map_build<K: Wire + Eq + Hash, V: Wire>(entries: Vec<(Object, Object)>) -> Result<Object, String> {
    collect_entries::<K, V>(entries).map(|v| Box::new(v.into_iter().collect::<HashMap<K, V>>()) as Object)
}

impl<K: Wire + Eq + Hash, V: Wire> Wire for HashMap<K, V> {
    fn local_type() -> LocalType {
        LocalType::new(
            Self::wire_name(),
            TypeKey::of::<Self>(),
            Shape::Map(MapShape {
                kind: MapKind::Unordered,
                key: TypeRef::of::<K>(),
                value: TypeRef::of::<V>(),
                entries: hash_map_entries::<K, V>,
                build: hash_map_build::<K, V>,
            }),
        )
        .with_raw_name("hashmap")
    }

    fn wire_name() -> String {
        format!("hashmap<{},{}>", K::wire_name(), V::wire_name())
    }
}

fn option_get<T: Wire>(value: &dyn Any) -> Option<Option<&dyn Any>> {
    let opt = value.downcast_ref::<Option<T>>()?;
    Some(opt.as_ref().map(|v| v as &dyn Any))
}

fn option_some<T: Wire>(inner: Object) -> Result<Object, String> {
    inner
        .downcast::<T>()
        .map(|v| Box::new(Some(*v)) as Object)
        .map_err(|_| format!("value is not a {}", T::wire_name()))
}

fn option_none<T: Wire>() -> Object {
    Box::new(None::<T>)
}

impl<T: Wire> Wire for Option<T> {
    fn local_type() -> LocalType {
        LocalType::new(
            Self::wire_name(),
            TypeKey::of::<Self>(),
            Shape::Optional(OptionalShape {
                inner: TypeRef::of::<T>(),
                get: option_get::<T>,
                some: option_some::<T>,
                none: option_none::<T>,
            }),
        )
    }

    fn wire_name() -> String {
        format!("{}?", T::wire_name())
    }
}

fn box_get<T: Wire>(value: &dyn Any) -> Option<&dyn Any> {
    value.downcast_ref::<Box<T>>().map(|b| &**b as &dyn Any)
}

fn box_wrap<T: Wire>(inner: Object) -> Result<Object, String> {
    inner
        .downcast::<T>()
        .map(|v| Box::new(v) as Object)
        .map_err(|_| format!("value is not a {}", T::wire_name()))
}

impl<T: Wire> Wire for Box<T> {
    fn local_type() -> LocalType {
        LocalType::new(
            Self::wire_name(),
            TypeKey::of::<Self>(),
            Shape::Boxed(BoxedShape {
                inner: TypeRef::of::<T>(),
                get: box_get::<T>,
                wrap: box_wrap::<T>,
            }),
        )
    }

    fn wire_name() -> String {
        T::wire_name()
    }
}

fn arc_get<T: Wire>(value: &dyn Any) -> Option<&dyn Any> {
    value.downcast_ref::<Arc<T>>().map(|a| &**a as &dyn Any)
}

fn arc_wrap<T: Wire>(inner: Object) -> Result<(Object, SharedObject), String> {
    let value = inner
        .downcast::<T>()
        .map_err(|_| format!("value is not a {}", T::wire_name()))?;
    let shared: Arc<T> = Arc::from(value);
    let handle: SharedObject = shared.clone();
    Ok((Box::new(shared) as Object, handle))
}

fn arc_from_shared<T: Wire>(handle: &SharedObject) -> Option<Object> {
    let shared = Arc::clone(handle).downcast::<T>().ok()?;
    Some(Box::new(shared) as Object)
}

impl<T: Wire> Wire for Arc<T> {
    fn local_type() -> LocalType {
        LocalType::new(
            Self::wire_name(),
            TypeKey::of::<Self>(),
            Shape::Shared(SharedShape {
                inner: TypeRef::of::<T>(),
                get: arc_get::<T>,
                wrap: arc_wrap::<T>,
                from_shared: arc_from_shared::<T>,
            }),
        )
    }

    fn wire_name() -> String {
        T::wire_name()
    }
}

impl Wire for AnyObject {
    fn local_type() -> LocalType {
        LocalType::new("any", TypeKey::of::<Self>(), Shape::Dynamic)
    }

    fn wire_name() -> String {
        "any".to_string()
    }
}

impl Wire for Duration {
    fn local_type() -> LocalType {
        LocalType::new(Self::wire_name(), TypeKey::of::<Self>(), Shape::Opaque)
    }

    fn wire_name() -> String {
        "std.time.Duration".to_string()
    }
}

impl Wire for SystemTime {
    fn local_type() -> LocalType {
        LocalType::new(Self::wire_name(), TypeKey::of::<Self>(), Shape::Opaque)
    }

    fn wire_name() -> String {
        "std.time.SystemTime".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_names() {
        assert_eq!(<Vec<i32>>::wire_name(), "list<int>");
        assert_eq!(<BTreeMap<String, Vec<i64>>>::wire_name(), "map<string,list<long>>");
        assert_eq!(<[u8; 4]>::wire_name(), "ubyte[]");
        assert_eq!(<Option<String>>::wire_name(), "string?");
        assert_eq!(<Arc<Box<i32>>>::wire_name(), "int");
        assert_eq!(<Vec<i32>>::local_type().raw_name, "list");
    }

    #[test]
    fn test_primitive_value_conversions() {
        let v = PrimitiveKind::I64.to_value(&42i64).expect("long");
        assert_eq!(v, Value::Long(42));
        assert!(PrimitiveKind::I32.to_value(&42i64).is_none());

        let back = PrimitiveKind::I64.from_value(&v).expect("object");
        assert_eq!(back.downcast_ref::<i64>(), Some(&42));
        assert!(PrimitiveKind::I32.from_value(&v).is_none());
        assert_eq!(PrimitiveKind::of_value(&Value::Binary(vec![])), Some(PrimitiveKind::Binary));
    }

    #[test]
    fn test_parse_literal() {
        let v = PrimitiveKind::I32.parse_literal(" 12 ").expect("int");
        assert_eq!(v.downcast_ref::<i32>(), Some(&12));
        assert!(PrimitiveKind::Bool.parse_literal("maybe").is_none());
        let c = PrimitiveKind::Char.parse_literal("x").expect("char");
        assert_eq!(c.downcast_ref::<char>(), Some(&'x'));
        assert!(PrimitiveKind::Char.parse_literal("xy").is_none());
    }

    #[test]
    fn test_array_build_checks_length() {
        let items: Vec<Object> = vec![Box::new(1i32), Box::new(2i32)];
        assert!(array_build::<i32, 3>(items).is_err());
        let items: Vec<Object> = vec![Box::new(1i32), Box::new(2i32)];
        let arr = array_build::<i32, 2>(items).expect("array");
        assert_eq!(arr.downcast_ref::<[i32; 2]>(), Some(&[1, 2]));
    }

    #[test]
    fn test_arc_wrap_and_share() {
        let (obj, handle) = arc_wrap::<String>(Box::new("x".to_string())).expect("wrap");
        let arc = obj.downcast::<Arc<String>>().expect("arc");
        let again = arc_from_shared::<String>(&handle).expect("from shared");
        let again = again.downcast::<Arc<String>>().expect("arc");
        assert!(Arc::ptr_eq(&arc, &again));
        assert!(arc_from_shared::<i32>(&handle).is_none());
    }

    #[test]
    fn test_option_accessors() {
        let some: Option<i32> = Some(3);
        let inner = option_get::<i32>(&some).expect("option").expect("some");
        assert_eq!(inner.downcast_ref::<i32>(), Some(&3));
        let none: Option<i32> = None;
        assert!(option_get::<i32>(&none).expect("option").is_none());
        assert!(option_get::<i64>(&some).is_none());
    }
}
