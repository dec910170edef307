// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural type fingerprints.
//!
//! A fingerprint is an order-sensitive MD5 digest over a walk of the type's
//! structure, truncated to 14 bytes. Two independently compiled definitions
//! with the same name, property list (name, type, nullability) and provided
//! interfaces produce the same fingerprint; any change to that composition
//! changes it.
//!
//! Walk rules:
//! - composite: raw name, then per property its type, name and nullability
//!   tag, then the sorted `provides` set
//! - collection/map: raw container name plus element/key/value *names*
//!
//! Inside a composite, every position a type parameter occupies hashes the
//! wildcard sentinel instead: a bare `T` field, and the `T` of `Vec<T>` or
//! `BTreeMap<String, T>`. All instantiations of a generic type therefore
//! share one fingerprint.
//! - enum: name plus every constant
//! - primitive, singleton, opaque: name
//! - optional, boxed, shared: transparent
//! - dynamic: the `any` sentinel
//!
//! A type revisited within one computation hashes the "already seen" sentinel,
//! so self-referential and mutually recursive types terminate.

use crate::model::{GenericMask, LocalType, Shape, TypeKey, TypeRef, TypeRegistry};
use md5::{Digest, Md5};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

const WILDCARD: &str = "?";
const ANY: &str = "*any*";
const ALREADY_SEEN: &str = "!seen";
const NULLABLE: &str = "nullable";
const NOT_NULLABLE: &str = "not-nullable";
const DELIMITER: u8 = 0x1f;

/// 14-byte structural digest of a type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 14]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; 14]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 14] {
        &self.0
    }

    /// Wire token for this fingerprint.
    pub fn token(&self) -> String {
        crate::schema::descriptors::token_for(&self.to_string())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// One fingerprint computation.
pub struct Fingerprinter<'r> {
    registry: &'r TypeRegistry,
    hasher: Md5,
    seen: HashSet<TypeKey>,
}

impl<'r> Fingerprinter<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            hasher: Md5::new(),
            seen: HashSet::new(),
        }
    }

    /// Fingerprint of `ty`; referenced types are resolved through the registry.
    pub fn compute(registry: &TypeRegistry, ty: &LocalType) -> Fingerprint {
        let mut walker = Fingerprinter::new(registry);
        walker.walk(ty);
        walker.finish()
    }

    fn finish(self) -> Fingerprint {
        let digest = self.hasher.finalize();
        let mut bytes = [0u8; 14];
        bytes.copy_from_slice(&digest[..14]);
        Fingerprint(bytes)
    }

    fn update(&mut self, token: &str) {
        self.hasher.update(token.as_bytes());
        self.hasher.update([DELIMITER]);
    }

    fn resolve(&self, ty: &TypeRef) -> Arc<LocalType> {
        self.registry.resolve(ty)
    }

    fn walk(&mut self, ty: &LocalType) {
        if let Some(inner) = ty.shape.transparent_inner() {
            let inner = self.resolve(inner);
            self.walk(&inner);
            return;
        }
        if !self.seen.insert(ty.key.clone()) {
            self.update(ALREADY_SEEN);
            return;
        }

        match &ty.shape {
            Shape::Composite(c) => {
                self.update(&ty.raw_name);
                for prop in &c.properties {
                    let prop_ty = self.resolve(&prop.ty);
                    self.walk_masked(&prop_ty, &prop.generic);
                    self.update(&prop.name);
                    self.update(if prop.nullable { NULLABLE } else { NOT_NULLABLE });
                }
                let mut provides: Vec<&String> = ty.provides.iter().collect();
                provides.sort();
                for p in provides {
                    self.update(p);
                }
            }
            Shape::Collection(c) => {
                self.update(&ty.raw_name);
                let element = self.resolve(&c.element);
                self.update(&element.name);
            }
            Shape::Map(m) => {
                self.update(&ty.raw_name);
                let key = self.resolve(&m.key);
                let value = self.resolve(&m.value);
                self.update(&key.name);
                self.update(&value.name);
            }
            Shape::Enum(e) => {
                self.update(&ty.name);
                for constant in &e.constants {
                    self.update(constant);
                }
            }
            Shape::Dynamic => self.update(ANY),
            Shape::Primitive(_) | Shape::Singleton(_) | Shape::Opaque => self.update(&ty.name),
            // Handled above.
            Shape::Optional(_) | Shape::Boxed(_) | Shape::Shared(_) => {}
        }
    }

    fn walk_masked(&mut self, ty: &LocalType, mask: &GenericMask) {
        match mask {
            GenericMask::Concrete => self.walk(ty),
            GenericMask::Param => self.update(WILDCARD),
            GenericMask::Args(_) => {
                if let Some(inner) = ty.shape.transparent_inner() {
                    let inner = self.resolve(inner);
                    self.walk_masked(&inner, mask);
                    return;
                }
                match &ty.shape {
                    Shape::Collection(c) => {
                        self.update(&ty.raw_name);
                        let element = self.masked_name(&c.element, mask.arg(0));
                        self.update(&element);
                    }
                    Shape::Map(m) => {
                        self.update(&ty.raw_name);
                        let key = self.masked_name(&m.key, mask.arg(0));
                        let value = self.masked_name(&m.value, mask.arg(1));
                        self.update(&key);
                        self.update(&value);
                    }
                    // A nested generic composite wildcards its own parameters.
                    _ => self.walk(ty),
                }
            }
        }
    }

    /// Wire name of `ty` with type-parameter positions replaced by the wildcard.
    fn masked_name(&self, ty: &TypeRef, mask: &GenericMask) -> String {
        let ty = self.resolve(ty);
        match mask {
            GenericMask::Concrete => ty.name.clone(),
            GenericMask::Param => WILDCARD.to_string(),
            GenericMask::Args(_) => match &ty.shape {
                Shape::Optional(o) => format!("{}?", self.masked_name(&o.inner, mask)),
                Shape::Boxed(b) => self.masked_name(&b.inner, mask),
                Shape::Shared(s) => self.masked_name(&s.inner, mask),
                Shape::Collection(c) => {
                    format!("{}<{}>", ty.raw_name, self.masked_name(&c.element, mask.arg(0)))
                }
                Shape::Map(m) => format!(
                    "{}<{},{}>",
                    ty.raw_name,
                    self.masked_name(&m.key, mask.arg(0)),
                    self.masked_name(&m.value, mask.arg(1))
                ),
                _ => ty.raw_name.clone(),
            },
        }
    }
}
