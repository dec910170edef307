// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent registry of local types.
//!
//! Types are indexed three ways:
//! - by [`TypeKey`] (identity),
//! - by wire name (read-side lookup of schema notations),
//! - by runtime `TypeId` (dynamic values).
//!
//! Registering a type registers everything its shape refers to, so a single
//! `register::<Order>()` makes every field type resolvable by name.

use super::{LocalType, TypeKey, TypeRef};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

#[derive(Default)]
pub struct TypeRegistry {
    by_key: DashMap<TypeKey, Arc<LocalType>>,
    by_name: DashMap<String, Arc<LocalType>>,
    by_type_id: DashMap<TypeId, Arc<LocalType>>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a reference, registering the type on first sight.
    pub fn resolve(&self, ty: &TypeRef) -> Arc<LocalType> {
        match ty {
            TypeRef::Resolved(local) => match self.get(&local.key) {
                Some(known) => known,
                None => self.insert(Arc::clone(local)),
            },
            TypeRef::Static { key, describe } => match self.get(key) {
                Some(known) => known,
                None => self.insert(Arc::new(describe())),
            },
        }
    }

    /// Insert `ty` unless its key is taken; returns the registered entry.
    ///
    /// Concurrent inserts of the same key converge on the first one.
    pub fn insert(&self, ty: Arc<LocalType>) -> Arc<LocalType> {
        let stored = self
            .by_key
            .entry(ty.key.clone())
            .or_insert_with(|| Arc::clone(&ty))
            .clone();
        if !Arc::ptr_eq(&stored, &ty) {
            return stored;
        }

        // Wrappers share their inner type's name.
        if !stored.is_transparent() {
            self.by_name
                .entry(stored.name.clone())
                .or_insert_with(|| Arc::clone(&stored));
        }
        let runtime_id = match &stored.key {
            TypeKey::Native(id) => Some(*id),
            TypeKey::Binary => Some(TypeId::of::<Vec<u8>>()),
            TypeKey::Synthetic(_) => None,
        };
        if let Some(id) = runtime_id {
            self.by_type_id
                .entry(id)
                .or_insert_with(|| Arc::clone(&stored));
        }
        log::debug!("[registry] registered {} ({})", stored.name, stored.shape.label());

        for reference in stored.shape.references() {
            self.resolve(reference);
        }
        stored
    }

    pub fn get(&self, key: &TypeKey) -> Option<Arc<LocalType>> {
        self.by_key.get(key).map(|e| Arc::clone(e.value()))
    }

    /// Local type registered under wire name `name`.
    pub fn by_name(&self, name: &str) -> Option<Arc<LocalType>> {
        self.by_name.get(name).map(|e| Arc::clone(e.value()))
    }

    /// Local type of a runtime value.
    pub fn by_type_id(&self, id: TypeId) -> Option<Arc<LocalType>> {
        self.by_type_id.get(&id).map(|e| Arc::clone(e.value()))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Registered wire names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
