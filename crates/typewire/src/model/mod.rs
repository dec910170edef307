// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Local type model: an explicit per-type descriptor table.
//!
//! Every serializable Rust type describes itself once through [`Wire`] as a
//! [`LocalType`]: its wire name, its [`Shape`] (composite, collection, enum,
//! ...) and the accessor/builder functions the engines use to take values
//! apart and put them back together. `#[derive(Wire)]` generates the table
//! for structs and fieldless enums; the built-in impls cover primitives,
//! containers and wrappers.
//!
//! Values travel through the engines as `&dyn Any` (write) and [`Object`]
//! (read), so one serializer instance can handle every value of its type.

mod builtins;
mod record;
mod registry;

pub use builtins::{binary_type, optional_binary_type};
pub(crate) use builtins::{builtin_refs, primitive_ref};
pub use record::{AnyObject, Record, RecordEnum, RecordField, RecordMap};
pub use registry::TypeRegistry;

use crate::schema::Transform;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// An owned, type-erased value produced by the read engine.
pub type Object = Box<dyn Any + Send + Sync>;

/// A shared, type-erased value (back-reference target).
pub type SharedObject = Arc<dyn Any + Send + Sync>;

/// Borrows one property out of a composite value.
pub type Getter = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

/// Builds a value from constructor arguments (in parameter order).
pub type BuildFn = Arc<dyn Fn(Vec<Object>) -> Result<Object, String> + Send + Sync>;

/// Borrows every element of a collection value.
pub type ElementsFn = for<'a> fn(&'a dyn Any) -> Option<Vec<&'a dyn Any>>;

/// Borrows every entry of a map value.
pub type EntriesFn = for<'a> fn(&'a dyn Any) -> Option<Vec<(&'a dyn Any, &'a dyn Any)>>;

/// A Rust type that can describe itself to the engines.
pub trait Wire: Any + Send + Sync + Sized {
    /// Full descriptor table of the type.
    fn local_type() -> LocalType;

    /// Wire name, without building the whole table.
    fn wire_name() -> String {
        Self::local_type().name
    }
}

/// Identity of a local type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// A compiled Rust type.
    Native(TypeId),
    /// `Vec<u8>` written as a binary blob.
    Binary,
    /// A type with no Rust counterpart of its own (synthesized records, wire overrides).
    Synthetic(String),
}

impl TypeKey {
    pub fn of<T: Any>() -> Self {
        Self::Native(TypeId::of::<T>())
    }
}

/// Lazy or resolved reference to a local type.
#[derive(Clone)]
pub enum TypeRef {
    Static {
        key: TypeKey,
        describe: fn() -> LocalType,
    },
    Resolved(Arc<LocalType>),
}

impl TypeRef {
    pub fn of<T: Wire>() -> Self {
        Self::Static {
            key: TypeKey::of::<T>(),
            describe: T::local_type,
        }
    }

    /// `Vec<u8>` as a binary blob rather than `list<ubyte>`.
    pub fn binary() -> Self {
        Self::Static {
            key: TypeKey::Binary,
            describe: binary_type,
        }
    }

    /// `Option<Vec<u8>>` as a nullable binary blob.
    pub fn optional_binary() -> Self {
        Self::Static {
            key: TypeKey::Synthetic(builtins::OPTIONAL_BINARY.to_string()),
            describe: optional_binary_type,
        }
    }

    pub fn key(&self) -> TypeKey {
        match self {
            Self::Static { key, .. } => key.clone(),
            Self::Resolved(ty) => ty.key.clone(),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static { key, .. } => write!(f, "TypeRef::Static({:?})", key),
            Self::Resolved(ty) => write!(f, "TypeRef::Resolved({})", ty.name),
        }
    }
}

/// Primitive kinds and their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
    Binary,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 14] = [
        Self::Bool,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
        Self::Char,
        Self::String,
        Self::Binary,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::I8 => "byte",
            Self::I16 => "short",
            Self::I32 => "int",
            Self::I64 => "long",
            Self::U8 => "ubyte",
            Self::U16 => "ushort",
            Self::U32 => "uint",
            Self::U64 => "ulong",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::Char => "char",
            Self::String => "string",
            Self::Binary => "binary",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.wire_name() == name)
    }
}

/// Ordered collection flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Set,
    Array,
    /// Hash-ordered; rejected by the factory.
    UnorderedSet,
}

impl CollectionKind {
    pub fn raw_name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Set => "set",
            Self::Array => "array",
            Self::UnorderedSet => "hashset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    Ordered,
    /// Hash-ordered; rejected by the factory.
    Unordered,
}

/// Where a property's declared type mentions a type parameter of its
/// composite. Those positions hash as wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GenericMask {
    /// No type parameter involved.
    #[default]
    Concrete,
    /// The type is a bare type parameter.
    Param,
    /// Type arguments of a container, in declaration order.
    Args(Vec<GenericMask>),
}

impl GenericMask {
    /// Mask of argument `index`; missing arguments are concrete.
    pub fn arg(&self, index: usize) -> &GenericMask {
        const CONCRETE: &GenericMask = &GenericMask::Concrete;
        match self {
            Self::Args(args) => args.get(index).unwrap_or(CONCRETE),
            Self::Param => self,
            Self::Concrete => CONCRETE,
        }
    }
}

/// One serializable property of a composite.
#[derive(Clone)]
pub struct Property {
    pub name: String,
    pub ty: TypeRef,
    pub nullable: bool,
    pub generic: GenericMask,
    pub default_literal: Option<String>,
    pub requires: Vec<String>,
    pub getter: Getter,
}

impl Property {
    pub fn new<F>(name: impl Into<String>, ty: TypeRef, getter: F) -> Self
    where
        F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            generic: GenericMask::Concrete,
            default_literal: None,
            requires: Vec::new(),
            getter: Arc::new(getter),
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn generic(mut self, generic: GenericMask) -> Self {
        self.generic = generic;
        self
    }

    pub fn default_literal(mut self, literal: impl Into<String>) -> Self {
        self.default_literal = Some(literal.into());
        self
    }

    pub fn requires(mut self, names: Vec<String>) -> Self {
        self.requires = names;
        self
    }

    pub fn param(&self) -> Param {
        Param {
            name: self.name.clone(),
            ty: self.ty.clone(),
            nullable: self.nullable,
            default_literal: self.default_literal.clone(),
        }
    }
}

/// Constructor parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    pub nullable: bool,
    pub default_literal: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            default_literal: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn default_literal(mut self, literal: impl Into<String>) -> Self {
        self.default_literal = Some(literal.into());
        self
    }
}

/// Sequential argument reader handed to constructor closures.
pub struct Args {
    values: std::vec::IntoIter<Object>,
}

impl Args {
    pub fn new(values: Vec<Object>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    /// Take the next argument as a `T`.
    pub fn take<T: Any>(&mut self, name: &str) -> Result<T, String> {
        let next = self
            .values
            .next()
            .ok_or_else(|| format!("missing argument '{}'", name))?;
        next.downcast::<T>()
            .map(|v| *v)
            .map_err(|_| format!("argument '{}' is not a {}", name, std::any::type_name::<T>()))
    }
}

/// A way of building a composite from named parameters.
#[derive(Clone)]
pub struct Constructor {
    pub params: Vec<Param>,
    pub build: BuildFn,
}

impl Constructor {
    pub fn new<T, F>(params: Vec<Param>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut Args) -> Result<T, String> + Send + Sync + 'static,
    {
        Self {
            params,
            build: Arc::new(move |values| {
                let mut args = Args::new(values);
                build(&mut args).map(|v| Box::new(v) as Object)
            }),
        }
    }

    /// Constructor taking every property in declared order.
    pub fn from_properties<T, F>(properties: &[Property], build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut Args) -> Result<T, String> + Send + Sync + 'static,
    {
        Self::new(properties.iter().map(Property::param).collect(), build)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        write!(f, "Constructor({})", names.join(", "))
    }
}

#[derive(Clone)]
pub struct CompositeShape {
    pub properties: Vec<Property>,
    /// Takes every property in declared order.
    pub constructor: Constructor,
    /// Extra constructors consulted by evolution, in declared order.
    pub alternates: Vec<Constructor>,
}

#[derive(Clone)]
pub struct CollectionShape {
    pub kind: CollectionKind,
    pub element: TypeRef,
    pub elements: ElementsFn,
    pub build: fn(Vec<Object>) -> Result<Object, String>,
}

#[derive(Clone)]
pub struct MapShape {
    pub kind: MapKind,
    pub key: TypeRef,
    pub value: TypeRef,
    pub entries: EntriesFn,
    pub build: fn(Vec<(Object, Object)>) -> Result<Object, String>,
}

#[derive(Clone)]
pub struct EnumShape {
    pub constants: Vec<String>,
    pub ordinal_of: Arc<dyn Fn(&dyn Any) -> Option<usize> + Send + Sync>,
    pub from_ordinal: Arc<dyn Fn(usize) -> Option<Object> + Send + Sync>,
}

impl EnumShape {
    pub fn new<F, G>(constants: Vec<String>, ordinal_of: F, from_ordinal: G) -> Self
    where
        F: Fn(&dyn Any) -> Option<usize> + Send + Sync + 'static,
        G: Fn(usize) -> Option<Object> + Send + Sync + 'static,
    {
        Self {
            constants,
            ordinal_of: Arc::new(ordinal_of),
            from_ordinal: Arc::new(from_ordinal),
        }
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.constants.iter().position(|c| c == name)
    }
}

#[derive(Clone)]
pub struct SingletonShape {
    pub instance: Arc<dyn Fn() -> Object + Send + Sync>,
}

#[derive(Clone)]
pub struct OptionalShape {
    pub inner: TypeRef,
    /// `None` if the value is not this option type, `Some(None)` for an empty option.
    pub get: for<'a> fn(&'a dyn Any) -> Option<Option<&'a dyn Any>>,
    pub some: fn(Object) -> Result<Object, String>,
    pub none: fn() -> Object,
}

#[derive(Clone)]
pub struct BoxedShape {
    pub inner: TypeRef,
    pub get: for<'a> fn(&'a dyn Any) -> Option<&'a dyn Any>,
    pub wrap: fn(Object) -> Result<Object, String>,
}

#[derive(Clone)]
pub struct SharedShape {
    pub inner: TypeRef,
    pub get: for<'a> fn(&'a dyn Any) -> Option<&'a dyn Any>,
    /// Wraps a freshly read value; also returns the handle kept in read history.
    pub wrap: fn(Object) -> Result<(Object, SharedObject), String>,
    /// Rebuilds the wrapper from a history handle; `None` on a type mismatch.
    pub from_shared: fn(&SharedObject) -> Option<Object>,
}

/// Structural category of a local type.
#[derive(Clone)]
pub enum Shape {
    Primitive(PrimitiveKind),
    Composite(CompositeShape),
    Collection(CollectionShape),
    Map(MapShape),
    Enum(EnumShape),
    Singleton(SingletonShape),
    Optional(OptionalShape),
    Boxed(BoxedShape),
    Shared(SharedShape),
    /// Runtime-typed value ([`AnyObject`]).
    Dynamic,
    /// Needs a custom serializer.
    Opaque,
}

impl Shape {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Composite(_) => "composite",
            Self::Collection(_) => "collection",
            Self::Map(_) => "map",
            Self::Enum(_) => "enum",
            Self::Singleton(_) => "singleton",
            Self::Optional(_) => "optional",
            Self::Boxed(_) => "boxed",
            Self::Shared(_) => "shared",
            Self::Dynamic => "dynamic",
            Self::Opaque => "opaque",
        }
    }

    /// Types this shape refers to.
    pub fn references(&self) -> Vec<&TypeRef> {
        match self {
            Self::Composite(c) => c
                .properties
                .iter()
                .map(|p| &p.ty)
                .chain(c.alternates.iter().flat_map(|k| k.params.iter().map(|p| &p.ty)))
                .collect(),
            Self::Collection(c) => vec![&c.element],
            Self::Map(m) => vec![&m.key, &m.value],
            Self::Optional(o) => vec![&o.inner],
            Self::Boxed(b) => vec![&b.inner],
            Self::Shared(s) => vec![&s.inner],
            _ => Vec::new(),
        }
    }

    /// Wrapped type of a transparent wrapper.
    pub fn transparent_inner(&self) -> Option<&TypeRef> {
        match self {
            Self::Optional(o) => Some(&o.inner),
            Self::Boxed(b) => Some(&b.inner),
            Self::Shared(s) => Some(&s.inner),
            _ => None,
        }
    }
}

/// Descriptor table entry for one local type.
#[derive(Clone)]
pub struct LocalType {
    /// Wire name, generic arguments included.
    pub name: String,
    /// `name` with generic arguments erased.
    pub raw_name: String,
    pub key: TypeKey,
    pub shape: Shape,
    pub provides: Vec<String>,
    /// Evolution rules declared on the type.
    pub transforms: Vec<Transform>,
    /// Bypasses the allow-list.
    pub trusted: bool,
}

impl LocalType {
    pub fn new(name: impl Into<String>, key: TypeKey, shape: Shape) -> Self {
        let name = name.into();
        let raw_name = erase_generics(&name).to_string();
        Self {
            name,
            raw_name,
            key,
            shape,
            provides: Vec::new(),
            transforms: Vec::new(),
            trusted: false,
        }
    }

    pub fn with_raw_name(mut self, raw_name: impl Into<String>) -> Self {
        self.raw_name = raw_name.into();
        self
    }

    pub fn with_provides(mut self, provides: Vec<String>) -> Self {
        self.provides = provides;
        self
    }

    pub fn with_transforms(mut self, transforms: Vec<Transform>) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn trusted(mut self) -> Self {
        self.trusted = true;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.shape.transparent_inner().is_some()
    }

    pub fn composite(&self) -> Option<&CompositeShape> {
        match &self.shape {
            Shape::Composite(c) => Some(c),
            _ => None,
        }
    }

    pub fn enumeration(&self) -> Option<&EnumShape> {
        match &self.shape {
            Shape::Enum(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Debug for LocalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalType")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("shape", &self.shape.label())
            .finish()
    }
}

/// `demo.Box<int>` -> `demo.Box`.
pub fn erase_generics(name: &str) -> &str {
    name.find('<').map_or(name, |at| &name[..at])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erase_generics() {
        assert_eq!(erase_generics("demo.Box<int>"), "demo.Box");
        assert_eq!(erase_generics("demo.Plain"), "demo.Plain");
        assert_eq!(erase_generics("map<string,list<int>>"), "map");
    }

    #[test]
    fn test_generic_mask_args() {
        let mask = GenericMask::Args(vec![GenericMask::Concrete, GenericMask::Param]);
        assert_eq!(mask.arg(1), &GenericMask::Param);
        assert_eq!(mask.arg(2), &GenericMask::Concrete);
        assert_eq!(GenericMask::Concrete.arg(0), &GenericMask::Concrete);
    }

    #[test]
    fn test_primitive_wire_names_roundtrip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_wire_name(kind.wire_name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_wire_name("demo.Order"), None);
    }

    #[test]
    fn test_args_take_in_order() {
        let mut args = Args::new(vec![Box::new(7i64) as Object, Box::new("x".to_string()) as Object]);
        assert_eq!(args.take::<i64>("id"), Ok(7));
        let err = args.take::<i64>("name").unwrap_err();
        assert!(err.contains("argument 'name' is not a i64"));
        assert!(args.take::<i64>("extra").is_err());
    }

    #[test]
    fn test_constructor_boxes_result() {
        let ctor = Constructor::new(vec![Param::new("v", TypeRef::of::<i32>())], |args| {
            args.take::<i32>("v").map(|v| v * 2)
        });
        let out = (ctor.build)(vec![Box::new(21i32) as Object]).expect("build");
        assert_eq!(out.downcast_ref::<i32>(), Some(&42));
        assert_eq!(format!("{:?}", ctor), "Constructor(v)");
    }
}
