// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type allow-list policy.
//!
//! Consulted before building a composite, singleton or array serializer for a
//! type that is not built in, not marked `#[wire(trusted)]` and not
//! synthesized. A denial is a hard `NotSerializable` error.

use crate::model::LocalType;
use std::collections::HashSet;

pub trait TypePolicy: Send + Sync {
    fn is_permitted(&self, ty: &LocalType) -> bool;
}

/// Permits every type.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl TypePolicy for AllowAll {
    fn is_permitted(&self, _ty: &LocalType) -> bool {
        true
    }
}

/// Permits the listed names; generic types match on their raw name.
#[derive(Debug, Default, Clone)]
pub struct AllowList {
    names: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allow(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl TypePolicy for AllowList {
    fn is_permitted(&self, ty: &LocalType) -> bool {
        self.names.contains(&ty.name) || self.names.contains(&ty.raw_name)
    }
}
