// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # typewire - self-describing object graph serialization
//!
//! Serializes object graphs into a compact AMQP-style binary envelope that
//! carries, next to the payload, a schema describing every type it uses.
//! Readers need not share the writer's type definitions: types are matched
//! by structural fingerprint, older or newer shapes are evolved onto the
//! local type, and types with no local definition at all are synthesized as
//! structural records.
//!
//! ## Quick Start
//!
//! ```rust
//! use typewire::{Result, SerializerFactory, Wire};
//!
//! #[derive(Wire, Debug, PartialEq)]
//! #[wire(name = "demo.Order")]
//! struct Order {
//!     id: i64,
//!     note: Option<String>,
//! }
//!
//! fn main() -> Result<()> {
//!     let factory = SerializerFactory::new();
//!     let order = Order { id: 7, note: None };
//!
//!     let bytes = factory.serialize(&order)?;
//!     let back: Order = factory.deserialize(&bytes)?;
//!     assert_eq!(back, order);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  SerializerFactory   register | policy | carpenter | caches        |
//! +---------------------------------------------------------------------+
//! |  SerializationOutput / DeserializationInput   (graph + references) |
//! +---------------------------------------------------------------------+
//! |  serializers   object | collection | enum | evolution | custom ... |
//! +---------------------------------------------------------------------+
//! |  schema (notations, transforms, envelope)  |  fingerprint (MD5)    |
//! +---------------------------------------------------------------------+
//! |  codec (Value <-> bytes)    |    encoding (header, deflate, lz4)    |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SerializerFactory`] | Entry point: serialize, deserialize, register |
//! | [`Wire`] | Descriptor table of a Rust type (derive it) |
//! | [`SerializationConfig`] | Encoding, carpentry and policy settings |
//! | [`Envelope`] | Payload, schema and transforms of one message |
//! | [`AnyObject`] | Runtime-typed value (dynamic reads, records) |
//! | [`Record`] | Stand-in for a wire type with no local definition |
//!
//! ## Features
//!
//! - **`config-loaders`** (default): YAML configuration files
//! - **`lz4`**: LZ4 transport encoding next to deflate

// Lets the derive macro's `::typewire::` paths resolve inside this crate's tests
extern crate self as typewire;

/// Class synthesis for wire types with no local definition.
pub mod carpenter;
/// Self-describing binary value encoding.
pub mod codec;
/// Factory configuration (in code or YAML).
pub mod config;
/// Byte framing and transport encodings.
pub mod encoding;
pub mod error;
/// Serializer registry, caches and the top-level entry points.
pub mod factory;
/// Structural type fingerprints.
pub mod fingerprint;
/// Read engine state.
pub mod input;
/// Local type model (descriptor tables).
pub mod model;
/// Write engine state.
pub mod output;
/// Type allow-listing.
pub mod policy;
/// Scalar types handled by the built-in custom serializers.
pub mod scalars;
/// Wire schema, transforms and the envelope.
pub mod schema;
/// Per-shape serializers.
pub mod serializers;

pub use carpenter::{ClassCarpenter, RecordCarpenter};
pub use config::{ConfigError, PolicyMode, SerializationConfig};
pub use encoding::Encoding;
pub use error::{Error, Result};
pub use factory::{open_envelope, SerializerFactory};
pub use fingerprint::Fingerprint;
pub use model::{AnyObject, Record, RecordEnum, RecordField, RecordMap, Wire}; // Trait (for type bounds)
pub use policy::{AllowAll, AllowList, TypePolicy};
pub use scalars::{Decimal, RemoteError};
pub use schema::{Envelope, Transform};
pub use serializers::{CustomSerializer, ScalarSerializer, TypeSerializer};
pub use typewire_codegen::Wire; // Derive macro (for #[derive(typewire::Wire)])

/// typewire version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
