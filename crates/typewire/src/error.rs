// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for the object graph codec.
//!
//! Every top-level `serialize`/`deserialize` call either succeeds or raises
//! exactly one [`Error`]. Nothing is retried internally.

use crate::codec::CodecError;
use std::fmt;

/// Errors raised by the write and read engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad magic, truncated or garbled structural lists, size mismatches.
    MalformedEnvelope { reason: String },
    /// A wire type name that is neither locally known nor synthesizable.
    UnknownType { type_name: String },
    /// A value (or back-reference target) does not fit the declared type.
    TypeMismatch { expected: String, found: String },
    /// The unsupported-shape category; `reason` tells the cases apart:
    /// - hash-ordered containers (`HashMap`, `HashSet`)
    /// - types the active policy refuses
    /// - writes through a read-only evolution serializer
    NotSerializable { type_name: String, reason: String },
    /// An old wire field or enum constant cannot be mapped onto the current
    /// local type, even through the known transform rules.
    EvolutionUnresolvable { type_name: String, reason: String },
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_serializable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotSerializable {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn unresolvable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EvolutionUnresolvable {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-friendly name of the error category.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope { .. } => "malformed-envelope",
            Self::UnknownType { .. } => "unknown-type",
            Self::TypeMismatch { .. } => "type-mismatch",
            Self::NotSerializable { .. } => "not-serializable",
            Self::EvolutionUnresolvable { .. } => "evolution-unresolvable",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEnvelope { reason } => write!(f, "malformed envelope: {}", reason),
            Self::UnknownType { type_name } => write!(f, "unknown type: {}", type_name),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Self::NotSerializable { type_name, reason } => {
                write!(f, "{} is not serializable: {}", type_name, reason)
            }
            Self::EvolutionUnresolvable { type_name, reason } => {
                write!(f, "cannot evolve {}: {}", type_name, reason)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::MalformedEnvelope {
            reason: e.to_string(),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
