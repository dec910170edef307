// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural fingerprints: stable across factories, sensitive to shape.

use typewire::{SerializerFactory, Wire};

mod v1 {
    use typewire::Wire;

    #[derive(Wire)]
    #[wire(name = "fp.Account")]
    pub struct Account {
        pub id: i64,
        pub owner: String,
    }
}

mod reordered {
    use typewire::Wire;

    #[allow(dead_code)] // Only the shape is under test
    #[derive(Wire)]
    #[wire(name = "fp.Account")]
    pub struct Account {
        pub owner: String,
        pub id: i64,
    }
}

mod nullable {
    use typewire::Wire;

    #[allow(dead_code)] // Only the shape is under test
    #[derive(Wire)]
    #[wire(name = "fp.Account")]
    pub struct Account {
        pub id: i64,
        pub owner: Option<String>,
    }
}

mod same_shape {
    use typewire::Wire;

    /// Identical layout, declared separately.
    #[allow(dead_code)] // Only the shape is under test
    #[derive(Wire)]
    #[wire(name = "fp.Account")]
    pub struct Account {
        pub id: i64,
        pub owner: String,
    }
}

#[allow(dead_code)] // Only the shape is under test
#[derive(Wire)]
#[wire(name = "fp.Holder")]
struct Holder<T> {
    item: T,
}

#[allow(dead_code)] // Only the shape is under test
#[derive(Wire)]
#[wire(name = "fp.Bag")]
struct Bag<T> {
    items: Vec<T>,
    index: std::collections::BTreeMap<String, T>,
    nested: Option<Vec<Vec<T>>>,
}

mod concrete_bag {
    use typewire::Wire;

    #[allow(dead_code)] // Only the shape is under test
    #[derive(Wire)]
    #[wire(name = "fp.Bag")]
    pub struct Bag {
        pub items: Vec<i32>,
        pub index: std::collections::BTreeMap<String, i32>,
        pub nested: Option<Vec<Vec<i32>>>,
    }
}

#[allow(dead_code)] // Only the shape is under test
#[derive(Wire)]
#[wire(name = "fp.Status")]
enum Status {
    Open,
    Closed,
}

#[allow(dead_code)] // Only the shape is under test
#[derive(Wire)]
#[wire(name = "fp.Status")]
enum StatusExtended {
    Open,
    Closed,
    Archived,
}

#[test]
fn test_fingerprint_is_stable_across_factories() {
    let a = SerializerFactory::new();
    let b = SerializerFactory::new();
    assert_eq!(a.fingerprint::<v1::Account>(), b.fingerprint::<v1::Account>());
    assert_eq!(a.fingerprint::<v1::Account>(), a.fingerprint::<v1::Account>());
}

#[test]
fn test_same_shape_same_fingerprint() {
    let factory = SerializerFactory::new();
    assert_eq!(
        factory.fingerprint::<v1::Account>(),
        factory.fingerprint::<same_shape::Account>()
    );
}

#[test]
fn test_field_order_and_nullability_matter() {
    let factory = SerializerFactory::new();
    let base = factory.fingerprint::<v1::Account>();
    assert_ne!(base, factory.fingerprint::<reordered::Account>());
    assert_ne!(base, factory.fingerprint::<nullable::Account>());
}

#[test]
fn test_generic_parameters_hash_as_wildcards() {
    let factory = SerializerFactory::new();
    assert_eq!(
        factory.fingerprint::<Holder<i32>>(),
        factory.fingerprint::<Holder<String>>()
    );
    assert_ne!(Holder::<i32>::wire_name(), Holder::<String>::wire_name());
}

#[test]
fn test_container_parameters_hash_as_wildcards() {
    let factory = SerializerFactory::new();
    let ints = factory.fingerprint::<Bag<i32>>();
    assert_eq!(ints, factory.fingerprint::<Bag<String>>());
    assert_eq!(ints, factory.fingerprint::<Bag<Vec<u64>>>());
    assert_ne!(ints, factory.fingerprint::<concrete_bag::Bag>());
}

#[test]
fn test_enum_constants_matter() {
    let factory = SerializerFactory::new();
    assert_ne!(factory.fingerprint::<Status>(), factory.fingerprint::<StatusExtended>());
}

#[test]
fn test_token_format() {
    let factory = SerializerFactory::new();
    let fingerprint = factory.fingerprint::<v1::Account>();
    let token = fingerprint.token();
    assert_eq!(token, format!("typewire:{}", fingerprint));
    assert_eq!(fingerprint.to_string().len(), 28);
    let bytes = factory
        .serialize(&v1::Account {
            id: 1,
            owner: "o".into(),
        })
        .expect("serialize");
    let envelope = factory.read_envelope(&bytes).expect("envelope");
    let notation = envelope.schema.by_name("fp.Account").expect("notation");
    assert_eq!(notation.descriptor().name, token);
}
