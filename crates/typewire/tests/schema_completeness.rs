// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Every type reachable from a payload is described in its envelope.

use typewire::schema::{RestrictedSource, TypeNotation};
use typewire::{open_envelope, Encoding, SerializationConfig, SerializerFactory, Transform, Wire};

#[derive(Wire)]
#[wire(name = "shop.Currency", enum_default(old = "FRF", new = "EUR"))]
enum Currency {
    #[wire(name = "EUR")]
    Euro,
    #[wire(name = "USD")]
    Dollar,
}

#[derive(Wire)]
#[wire(name = "shop.Price", provides("shop.Priced"))]
struct Price {
    amount: i64,
    currency: Currency,
}

#[derive(Wire)]
#[wire(name = "shop.Basket", rename(from = "items", to = "entries"))]
struct Basket {
    owner: String,
    entries: Vec<Price>,
    #[wire(default = "0", requires("shop.Loyalty"))]
    discount: Option<i32>,
}

fn sample() -> Basket {
    Basket {
        owner: "ada".into(),
        entries: vec![Price {
            amount: 100,
            currency: Currency::Euro,
        }],
        discount: None,
    }
}

#[test]
fn test_schema_lists_every_reachable_type() {
    let factory = SerializerFactory::new();
    let bytes = factory.serialize(&sample()).expect("serialize");
    let (encoding, envelope) = open_envelope(&bytes).expect("open");
    assert_eq!(encoding, Encoding::None);

    for name in ["shop.Basket", "shop.Price", "shop.Currency", "list<shop.Price>"] {
        assert!(envelope.schema.by_name(name).is_some(), "{} missing", name);
    }
    // No duplicates.
    let mut tokens: Vec<&str> = envelope
        .schema
        .types
        .iter()
        .map(|t| t.descriptor().name.as_str())
        .collect();
    let count = tokens.len();
    tokens.sort_unstable();
    tokens.dedup();
    assert_eq!(tokens.len(), count);
}

#[test]
fn test_composite_notation_fields() {
    let factory = SerializerFactory::new();
    let bytes = factory.serialize(&sample()).expect("serialize");
    let envelope = factory.read_envelope(&bytes).expect("envelope");

    let Some(TypeNotation::Composite(basket)) = envelope.schema.by_name("shop.Basket") else {
        panic!("basket is not a composite");
    };
    let names: Vec<&str> = basket.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["owner", "entries", "discount"]);
    assert_eq!(basket.fields[0].type_name, "string");
    assert!(basket.fields[0].mandatory);
    assert_eq!(basket.fields[1].type_name, "list<shop.Price>");
    assert_eq!(basket.fields[2].type_name, "int");
    assert!(!basket.fields[2].mandatory);
    assert_eq!(basket.fields[2].default.as_deref(), Some("0"));
    assert_eq!(basket.fields[2].requires, vec!["shop.Loyalty".to_string()]);

    let Some(TypeNotation::Composite(price)) = envelope.schema.by_name("shop.Price") else {
        panic!("price is not a composite");
    };
    assert_eq!(price.provides, vec!["shop.Priced".to_string()]);
}

#[test]
fn test_restricted_notations() {
    let factory = SerializerFactory::new();
    let bytes = factory.serialize(&sample()).expect("serialize");
    let envelope = factory.read_envelope(&bytes).expect("envelope");

    let Some(TypeNotation::Restricted(currency)) = envelope.schema.by_name("shop.Currency") else {
        panic!("currency is not restricted");
    };
    assert_eq!(currency.source, RestrictedSource::Enum);
    let choices: Vec<(&str, &str)> = currency
        .choices
        .iter()
        .map(|c| (c.name.as_str(), c.value.as_str()))
        .collect();
    assert_eq!(choices, [("EUR", "0"), ("USD", "1")]);

    let Some(TypeNotation::Restricted(list)) = envelope.schema.by_name("list<shop.Price>") else {
        panic!("list is not restricted");
    };
    assert_eq!(list.source, RestrictedSource::List);
}

#[test]
fn test_declared_transforms_travel_with_the_envelope() {
    let factory = SerializerFactory::new();
    let bytes = factory.serialize(&sample()).expect("serialize");
    let envelope = factory.read_envelope(&bytes).expect("envelope");
    assert_eq!(
        envelope.transforms.get("shop.Basket"),
        [Transform::rename("items", "entries")]
    );
    assert_eq!(
        envelope.transforms.get("shop.Currency"),
        [Transform::enum_default("FRF", "EUR")]
    );
    assert!(envelope.transforms.get("shop.Price").is_empty());
}

#[test]
fn test_envelope_is_identical_across_encodings() {
    let plain = SerializerFactory::new();
    let deflated = SerializerFactory::with_config(SerializationConfig::default().with_encoding(Encoding::Deflate))
        .expect("valid config");
    let a = plain.serialize(&sample()).expect("plain");
    let b = deflated.serialize(&sample()).expect("deflate");
    assert_ne!(a, b);

    let (_, left) = open_envelope(&a).expect("plain");
    let (encoding, right) = open_envelope(&b).expect("deflate");
    assert_eq!(encoding, Encoding::Deflate);
    assert_eq!(left, right);
    let _ = Currency::Dollar;
}
