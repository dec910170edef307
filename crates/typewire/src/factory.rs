// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializer factory: the one long-lived, shared piece of the engine.
//!
//! Owns the type registry, the fingerprint cache and two serializer caches
//! (by local type key, by wire descriptor). Serializers are constructed
//! first and inserted if absent, so threads racing on the same key converge
//! on a single cached instance.
//!
//! # Write dispatch
//!
//! 1. primitives and transparent wrappers
//! 2. collections and maps (hash-ordered ones are rejected)
//! 3. enums
//! 4. custom serializers, first match wins
//! 5. singletons, composites (after the allow-list check)
//!
//! # Read dispatch
//!
//! Declared type first; otherwise the wire descriptor is resolved through
//! the envelope schema: same token as the local type of that name, an
//! evolution serializer on a token mismatch, or a synthesized stand-in when
//! no local type has that name.

use crate::carpenter::{ClassCarpenter, RecordCarpenter};
use crate::codec::{self, Value};
use crate::config::{ConfigError, SerializationConfig};
use crate::encoding::{self, Encoding};
use crate::error::{Error, Result};
use crate::fingerprint::{Fingerprint, Fingerprinter};
use crate::input::DeserializationInput;
use crate::model::{
    builtin_refs, primitive_ref, AnyObject, CollectionKind, LocalType, MapKind, Object, PrimitiveKind, Record,
    RecordEnum, Shape, TypeKey, TypeRef, TypeRegistry, Wire,
};
use crate::output::SerializationOutput;
use crate::policy::TypePolicy;
use crate::schema::{descriptors, Envelope, Field, RestrictedSource, Schema, TransformSet, TypeNotation};
use crate::serializers::{
    custom, unwrapped, BoxedSerializer, CollectionSerializer, CustomScalarSerializer, CustomSerializer,
    DynamicSerializer, EnumEvolutionSerializer, EnumSerializer, EvolutionSerializer, MapSerializer,
    ObjectSerializer, OptionalSerializer, PrimitiveSerializer, SharedSerializer, SingletonSerializer,
    TypeSerializer,
};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

pub struct SerializerFactory {
    registry: TypeRegistry,
    fingerprints: DashMap<TypeKey, Fingerprint>,
    by_key: DashMap<TypeKey, Arc<dyn TypeSerializer>>,
    by_descriptor: DashMap<String, Arc<dyn TypeSerializer>>,
    customs: RwLock<Vec<Arc<dyn CustomSerializer>>>,
    policy: ArcSwap<Box<dyn TypePolicy>>,
    carpenter: RwLock<Option<Arc<dyn ClassCarpenter>>>,
    builtin_keys: HashSet<TypeKey>,
    config: SerializationConfig,
}

impl Default for SerializerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializerFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::build(SerializationConfig::default())
    }

    /// Factory for a validated `config`. An encoding this build cannot
    /// produce is rejected here rather than on the first `serialize`.
    pub fn with_config(config: SerializationConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SerializationConfig) -> Self {
        let customs = if config.builtin_serializers {
            custom::builtins()
        } else {
            Vec::new()
        };
        let carpenter: Option<Arc<dyn ClassCarpenter>> = if config.carpentry {
            Some(Arc::new(RecordCarpenter))
        } else {
            None
        };

        let refs = builtin_refs();
        let factory = Self {
            registry: TypeRegistry::new(),
            fingerprints: DashMap::new(),
            by_key: DashMap::new(),
            by_descriptor: DashMap::new(),
            customs: RwLock::new(customs),
            policy: ArcSwap::from_pointee(config.build_policy()),
            carpenter: RwLock::new(carpenter),
            builtin_keys: refs.iter().map(TypeRef::key).collect(),
            config,
        };
        // Binary first: it claims the runtime id of Vec<u8>.
        factory.registry.resolve(&TypeRef::binary());
        for r in &refs {
            factory.registry.resolve(r);
        }
        log::debug!(
            "[factory] ready: {} built-in types, encoding {}",
            factory.registry.len(),
            factory.config.encoding
        );
        factory
    }

    pub fn config(&self) -> &SerializationConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Make `T` (and every type it refers to) resolvable by wire name.
    pub fn register<T: Wire>(&self) -> Result<()> {
        let ty = self.registry.resolve(&TypeRef::of::<T>());
        self.serializer_for(&ty).map(|_| ())
    }

    /// Append a custom serializer; earlier registrations take precedence.
    pub fn register_custom(&self, custom: Arc<dyn CustomSerializer>) {
        self.registry.resolve(&custom.local_type());
        log::debug!("[factory] custom serializer {} ({})", custom.type_name(), custom.descriptor());
        self.customs.write().push(custom);
        self.clear_caches();
    }

    /// Swap the allow-list policy; cached serializers are rebuilt on demand.
    pub fn set_policy<P: TypePolicy + 'static>(&self, policy: P) {
        self.policy.store(Arc::new(Box::new(policy)));
        self.clear_caches();
    }

    /// Replace the class synthesis collaborator (`None` disables carpentry).
    pub fn set_carpenter(&self, carpenter: Option<Arc<dyn ClassCarpenter>>) {
        *self.carpenter.write() = carpenter;
    }

    /// Synthesized serializers survive; they carry wire tokens that cannot
    /// be recomputed locally.
    fn clear_caches(&self) {
        self.by_key.retain(|key, _| matches!(key, TypeKey::Synthetic(_)));
        self.by_descriptor
            .retain(|_, s| matches!(s.local_type().key, TypeKey::Synthetic(_)));
    }

    pub fn fingerprint<T: Wire>(&self) -> Fingerprint {
        let ty = self.registry.resolve(&TypeRef::of::<T>());
        self.fingerprint_of(&ty)
    }

    pub fn fingerprint_of(&self, ty: &LocalType) -> Fingerprint {
        if let Some(fp) = self.fingerprints.get(&ty.key) {
            return *fp;
        }
        let fp = Fingerprinter::compute(&self.registry, ty);
        log::trace!("[factory] fingerprint {} = {}", ty.name, fp);
        *self.fingerprints.entry(ty.key.clone()).or_insert(fp)
    }

    // ---- Entry points -------------------------------------------------

    pub fn serialize<T: Wire>(&self, value: &T) -> Result<Vec<u8>> {
        self.serialize_with(value, &TypeRef::of::<T>())
    }

    /// Serialize `value` as an instance of `declared`.
    pub fn serialize_with(&self, value: &dyn Any, declared: &TypeRef) -> Result<Vec<u8>> {
        let envelope = self.write_envelope(value, declared)?;
        let bytes = codec::encode(&envelope.to_value());
        encoding::frame(&bytes, self.config.encoding)
    }

    /// Build the envelope without encoding it.
    pub fn write_envelope(&self, value: &dyn Any, declared: &TypeRef) -> Result<Envelope> {
        let mut out = SerializationOutput::new(self);
        let payload = out.write_value(value, declared)?;
        Ok(out.finish(payload))
    }

    pub fn deserialize<T: Wire>(&self, bytes: &[u8]) -> Result<T> {
        self.deserialize_with_envelope::<T>(bytes).map(|(value, _)| value)
    }

    /// Deserialize and hand back the envelope (schema and transforms included).
    pub fn deserialize_with_envelope<T: Wire>(&self, bytes: &[u8]) -> Result<(T, Envelope)> {
        let envelope = self.read_envelope(bytes)?;
        let obj = self.read_payload(&envelope, &TypeRef::of::<T>())?;
        let value = obj.downcast::<T>().map_err(|_| {
            Error::not_serializable(T::wire_name(), "payload is not assignable to the requested type")
        })?;
        Ok((*value, envelope))
    }

    /// Deserialize a payload whose type is not statically known.
    pub fn deserialize_any(&self, bytes: &[u8]) -> Result<AnyObject> {
        self.deserialize::<AnyObject>(bytes)
    }

    pub fn read_envelope(&self, bytes: &[u8]) -> Result<Envelope> {
        open_envelope(bytes).map(|(_, envelope)| envelope)
    }

    /// Read the payload of an already decoded envelope as a `declared`.
    pub fn read_payload(&self, envelope: &Envelope, declared: &TypeRef) -> Result<Object> {
        let mut input = DeserializationInput::new(self, &envelope.schema, &envelope.transforms);
        input.read_root(&envelope.payload, declared)
    }

    // ---- Write-side resolution ------------------------------------------

    pub fn resolve_for_write(&self, declared: &TypeRef) -> Result<Arc<dyn TypeSerializer>> {
        let ty = self.registry.resolve(declared);
        self.serializer_for(&ty)
    }

    /// Cached serializer of a local type, built on first use.
    pub fn serializer_for(&self, ty: &Arc<LocalType>) -> Result<Arc<dyn TypeSerializer>> {
        if let Some(cached) = self.by_key.get(&ty.key) {
            return Ok(Arc::clone(cached.value()));
        }
        let built = self.build_serializer(ty, None)?;
        let serializer = Arc::clone(self.by_key.entry(ty.key.clone()).or_insert(built).value());
        if let Some(token) = serializer.descriptor() {
            self.by_descriptor
                .entry(token.to_string())
                .or_insert_with(|| Arc::clone(&serializer));
        }
        Ok(serializer)
    }

    /// Serializer for a value known only at runtime.
    pub fn serializer_for_runtime(&self, value: &dyn Any) -> Result<Arc<dyn TypeSerializer>> {
        let named = if let Some(record) = value.downcast_ref::<Record>() {
            Some(record.type_name.as_str())
        } else {
            value.downcast_ref::<RecordEnum>().map(|e| e.type_name.as_str())
        };
        let ty = match named {
            Some(name) => self
                .registry
                .by_name(name)
                .ok_or_else(|| Error::not_serializable(name, "runtime type not registered"))?,
            None => self.registry.by_type_id(value.type_id()).ok_or_else(|| {
                Error::not_serializable(format!("{:?}", value.type_id()), "runtime type not registered")
            })?,
        };
        self.serializer_for(&ty)
    }

    fn is_exempt(&self, ty: &LocalType) -> bool {
        ty.trusted || matches!(ty.key, TypeKey::Synthetic(_)) || self.builtin_keys.contains(&ty.key)
    }

    fn check_policy(&self, ty: &LocalType) -> Result<()> {
        if self.is_exempt(ty) || self.policy.load().is_permitted(ty) {
            return Ok(());
        }
        log::warn!("[factory] {} rejected by the type policy", ty.name);
        Err(Error::not_serializable(&ty.name, "not permitted by the type policy"))
    }

    fn token_for(&self, ty: &LocalType, wire_token: Option<&str>) -> String {
        match wire_token {
            Some(token) => token.to_string(),
            None => self.fingerprint_of(ty).token(),
        }
    }

    /// `wire_token` overrides the fingerprint token (synthesized types).
    fn build_serializer(&self, ty: &Arc<LocalType>, wire_token: Option<&str>) -> Result<Arc<dyn TypeSerializer>> {
        let ty_ref = Arc::clone(ty);
        let serializer: Arc<dyn TypeSerializer> = match &ty.shape {
            Shape::Primitive(kind) => Arc::new(PrimitiveSerializer::new(ty_ref, *kind)),
            Shape::Optional(o) => Arc::new(OptionalSerializer::new(ty_ref, o.clone())),
            Shape::Boxed(b) => Arc::new(BoxedSerializer::new(ty_ref, b.clone())),
            Shape::Shared(s) => Arc::new(SharedSerializer::new(ty_ref, s.clone())),
            Shape::Dynamic => Arc::new(DynamicSerializer::new(ty_ref)),
            Shape::Collection(c) => {
                match c.kind {
                    CollectionKind::UnorderedSet => {
                        return Err(Error::not_serializable(&ty.name, "non-deterministic iteration order"))
                    }
                    CollectionKind::Array => {
                        let element = unwrapped(&self.registry, &c.element);
                        if matches!(element.shape, Shape::Composite(_) | Shape::Singleton(_)) {
                            self.check_policy(&element)?;
                        }
                    }
                    CollectionKind::List | CollectionKind::Set => {}
                }
                Arc::new(CollectionSerializer::new(ty_ref, c.clone(), self.token_for(ty, wire_token)))
            }
            Shape::Map(m) => {
                if m.kind == MapKind::Unordered {
                    return Err(Error::not_serializable(&ty.name, "non-deterministic iteration order"));
                }
                Arc::new(MapSerializer::new(ty_ref, m.clone(), self.token_for(ty, wire_token)))
            }
            Shape::Enum(e) => Arc::new(EnumSerializer::new(ty_ref, e.clone(), self.token_for(ty, wire_token))),
            Shape::Singleton(_) | Shape::Composite(_) | Shape::Opaque => {
                let custom = self.customs.read().iter().find(|c| c.handles(ty)).cloned();
                if let Some(custom) = custom {
                    Arc::new(CustomScalarSerializer::new(ty_ref, custom))
                } else {
                    match &ty.shape {
                        Shape::Singleton(s) => {
                            self.check_policy(ty)?;
                            Arc::new(SingletonSerializer::new(ty_ref, s.clone(), self.token_for(ty, wire_token)))
                        }
                        Shape::Composite(c) => {
                            self.check_policy(ty)?;
                            let token = self.token_for(ty, wire_token);
                            let notation = ObjectSerializer::notation_for(&self.registry, ty, c, &token);
                            Arc::new(ObjectSerializer::new(ty_ref, c.clone(), token, notation))
                        }
                        _ => return Err(Error::not_serializable(&ty.name, "no custom serializer registered")),
                    }
                }
            }
        };
        log::debug!(
            "[factory] {} serializer for {}{}",
            ty.shape.label(),
            ty.name,
            serializer
                .descriptor()
                .map(|d| format!(" ({})", d))
                .unwrap_or_default()
        );
        Ok(serializer)
    }

    // ---- Read-side resolution -------------------------------------------

    /// Serializer reading `value` where a `declared` is expected.
    pub fn resolve_for_read(
        &self,
        value: &Value,
        declared: &TypeRef,
        schema: &Schema,
        transforms: &TransformSet,
    ) -> Result<Arc<dyn TypeSerializer>> {
        let declared_ty = self.registry.resolve(declared);
        let local = self.serializer_for(&declared_ty)?;
        // Wrappers and primitives read the value themselves.
        let Some(token) = descriptors::token_of(value) else {
            return Ok(local);
        };
        if local.descriptor().is_none() {
            return Ok(local);
        }
        let resolved = self.resolve_descriptor(token, Some(&local), schema, transforms)?;
        if resolved.local_type().key != declared_ty.key {
            return Err(Error::mismatch(&declared_ty.name, resolved.type_name()));
        }
        Ok(resolved)
    }

    /// Serializer for wire descriptor `token`.
    pub fn resolve_descriptor(
        &self,
        token: &str,
        declared: Option<&Arc<dyn TypeSerializer>>,
        schema: &Schema,
        transforms: &TransformSet,
    ) -> Result<Arc<dyn TypeSerializer>> {
        if let Some(local) = declared.filter(|s| s.descriptor() == Some(token)) {
            return Ok(Arc::clone(local));
        }
        if let Some(cached) = self.by_descriptor.get(token) {
            return Ok(Arc::clone(cached.value()));
        }

        let custom = self
            .customs
            .read()
            .iter()
            .find(|c| c.descriptor() == token)
            .cloned();
        let built: Arc<dyn TypeSerializer> = if let Some(custom) = custom {
            let ty = self.registry.resolve(&custom.local_type());
            Arc::new(CustomScalarSerializer::new(ty, custom))
        } else {
            let notation = schema
                .find(token)
                .ok_or_else(|| Error::malformed(format!("descriptor {} is not in the schema", token)))?;
            self.build_for_notation(notation, schema, transforms)?
        };
        Ok(Arc::clone(
            self.by_descriptor.entry(token.to_string()).or_insert(built).value(),
        ))
    }

    fn build_for_notation(
        &self,
        notation: &TypeNotation,
        schema: &Schema,
        transforms: &TransformSet,
    ) -> Result<Arc<dyn TypeSerializer>> {
        let Some(local) = self.registry.by_name(notation.name()) else {
            return self.synthesize(notation, schema, &mut HashSet::new());
        };
        let current = self.serializer_for(&local)?;
        let token = notation.descriptor().name.as_str();
        if current.descriptor() == Some(token) {
            return Ok(current);
        }

        log::debug!(
            "[factory] {} evolved: wire {} local {}",
            local.name,
            token,
            current.descriptor().unwrap_or("-")
        );
        match (notation, &local.shape) {
            (TypeNotation::Composite(wire), Shape::Composite(_)) => Ok(Arc::new(EvolutionSerializer::build(
                &self.registry,
                local,
                wire,
                transforms,
            )?)),
            (TypeNotation::Restricted(wire), Shape::Enum(_)) if wire.source == RestrictedSource::Enum => {
                Ok(Arc::new(EnumEvolutionSerializer::build(local, wire, transforms)?))
            }
            _ => Err(Error::mismatch(
                &local.name,
                format!("wire {} with descriptor {}", notation.name(), token),
            )),
        }
    }

    /// Synthesize a stand-in for a wire type with no local definition,
    /// missing dependency types first.
    fn synthesize(
        &self,
        notation: &TypeNotation,
        schema: &Schema,
        in_progress: &mut HashSet<String>,
    ) -> Result<Arc<dyn TypeSerializer>> {
        let carpenter = self.carpenter.read().clone().ok_or_else(|| Error::UnknownType {
            type_name: notation.name().to_string(),
        })?;
        in_progress.insert(notation.name().to_string());

        let field_types = match notation {
            TypeNotation::Composite(c) => {
                for field in &c.fields {
                    self.synthesize_dependency(field, schema, in_progress)?;
                }
                c.fields.iter().map(field_type).collect()
            }
            TypeNotation::Restricted(_) => Vec::new(),
        };

        let ty = self.registry.insert(Arc::new(carpenter.synthesize(notation, &field_types)?));
        let token = notation.descriptor().name.as_str();
        let serializer: Arc<dyn TypeSerializer> = match (&ty.shape, notation) {
            (Shape::Composite(shape), TypeNotation::Composite(_)) => Arc::new(ObjectSerializer::new(
                Arc::clone(&ty),
                shape.clone(),
                token.to_string(),
                notation.clone(),
            )),
            _ => self.build_serializer(&ty, Some(token))?,
        };
        log::debug!("[factory] synthesized {} {} ({})", ty.shape.label(), ty.name, token);
        Ok(Arc::clone(
            self.by_key.entry(ty.key.clone()).or_insert(serializer).value(),
        ))
    }

    fn synthesize_dependency(&self, field: &Field, schema: &Schema, in_progress: &mut HashSet<String>) -> Result<()> {
        let name = field.type_name.as_str();
        if PrimitiveKind::from_wire_name(name).is_some()
            || in_progress.contains(name)
            || self.registry.by_name(name).is_some()
        {
            return Ok(());
        }
        let Some(dependency) = schema.by_name(name) else {
            return Ok(());
        };
        let token = dependency.descriptor().name.clone();
        if self.by_descriptor.contains_key(&token) {
            return Ok(());
        }
        let serializer = self.synthesize(dependency, schema, in_progress)?;
        self.by_descriptor.entry(token).or_insert(serializer);
        Ok(())
    }
}

/// Field type of a synthesized composite: primitives as themselves,
/// everything else read dynamically.
fn field_type(field: &Field) -> TypeRef {
    match PrimitiveKind::from_wire_name(&field.type_name) {
        Some(kind) => primitive_ref(kind, !field.mandatory),
        None if field.mandatory => TypeRef::of::<AnyObject>(),
        None => TypeRef::of::<Option<AnyObject>>(),
    }
}

/// Unframe and decode a blob without resolving any of its types.
pub fn open_envelope(bytes: &[u8]) -> Result<(Encoding, Envelope)> {
    let (encoding, body) = encoding::unframe(bytes)?;
    let value = codec::decode(&body)?;
    Ok((encoding, Envelope::from_value(&value)?))
}
