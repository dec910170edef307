// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::float_cmp)] // Exact values survive a round trip

//! Round trips of derived and built-in types through one factory.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use typewire::{Decimal, Encoding, Error, SerializationConfig, SerializerFactory, Wire};

#[derive(Wire, Debug, Clone, PartialEq)]
#[wire(name = "demo.Side")]
enum Side {
    Buy,
    Sell,
}

#[derive(Wire, Debug, Clone, PartialEq)]
#[wire(name = "demo.Line")]
struct Line {
    sku: String,
    quantity: i32,
    price: f64,
}

#[derive(Wire, Debug, Clone, PartialEq)]
#[wire(name = "demo.Order")]
struct Order {
    id: i64,
    side: Side,
    lines: Vec<Line>,
    tags: BTreeSet<String>,
    attributes: BTreeMap<String, i64>,
    note: Option<String>,
    attachment: Vec<u8>,
    ttl: Duration,
    urgent: bool,
    grade: char,
}

fn sample_order() -> Order {
    Order {
        id: 42,
        side: Side::Sell,
        lines: vec![
            Line {
                sku: "A-1".into(),
                quantity: 3,
                price: 9.5,
            },
            Line {
                sku: "B-2".into(),
                quantity: -1,
                price: 0.0,
            },
        ],
        tags: ["fast", "gift"].iter().map(|s| s.to_string()).collect(),
        attributes: BTreeMap::from([("priority".to_string(), 7), ("retries".to_string(), 0)]),
        note: Some("leave at the door".into()),
        attachment: vec![0, 1, 2, 0xff],
        ttl: Duration::from_millis(1500),
        urgent: true,
        grade: 'B',
    }
}

#[test]
fn test_composite_graph_roundtrip() {
    let factory = SerializerFactory::new();
    let order = sample_order();
    let bytes = factory.serialize(&order).expect("serialize");
    let back: Order = factory.deserialize(&bytes).expect("deserialize");
    assert_eq!(back, order);
}

#[test]
fn test_null_and_empty_fields_roundtrip() {
    let factory = SerializerFactory::new();
    let order = Order {
        lines: Vec::new(),
        tags: BTreeSet::new(),
        attributes: BTreeMap::new(),
        note: None,
        attachment: Vec::new(),
        ..sample_order()
    };
    let bytes = factory.serialize(&order).expect("serialize");
    assert_eq!(factory.deserialize::<Order>(&bytes).expect("deserialize"), order);
}

#[test]
fn test_roundtrip_under_every_supported_encoding() {
    let order = sample_order();
    for encoding in [Encoding::None, Encoding::Deflate, Encoding::Lz4] {
        if !encoding.is_supported() {
            continue;
        }
        let factory = SerializerFactory::with_config(SerializationConfig::default().with_encoding(encoding))
            .expect("valid config");
        let bytes = factory.serialize(&order).expect("serialize");
        assert_eq!(&bytes[..6], b"tywire");
        let back: Order = factory.deserialize(&bytes).expect("deserialize");
        assert_eq!(back, order, "encoding {}", encoding);
    }
}

#[test]
fn test_reader_accepts_any_encoding() {
    let writer = SerializerFactory::with_config(SerializationConfig::default().with_encoding(Encoding::Deflate))
        .expect("valid config");
    let reader = SerializerFactory::new();
    let bytes = writer.serialize(&sample_order()).expect("serialize");
    assert_eq!(reader.deserialize::<Order>(&bytes).expect("deserialize"), sample_order());
}

#[derive(Wire, Debug, PartialEq)]
#[wire(name = "demo.Node")]
struct Node {
    value: i32,
    next: Option<Box<Node>>,
}

#[test]
fn test_recursive_type_roundtrip() {
    let factory = SerializerFactory::new();
    let list = Node {
        value: 1,
        next: Some(Box::new(Node {
            value: 2,
            next: Some(Box::new(Node { value: 3, next: None })),
        })),
    };
    let bytes = factory.serialize(&list).expect("serialize");
    assert_eq!(factory.deserialize::<Node>(&bytes).expect("deserialize"), list);
}

#[derive(Wire, Debug, PartialEq)]
#[wire(name = "demo.Nothing")]
struct Nothing;

#[test]
fn test_singleton_roundtrip() {
    let factory = SerializerFactory::new();
    let bytes = factory.serialize(&Nothing).expect("serialize");
    assert_eq!(factory.deserialize::<Nothing>(&bytes).expect("deserialize"), Nothing);
}

#[derive(Wire, Debug, PartialEq)]
#[wire(name = "demo.Pair")]
struct Pair<T> {
    left: T,
    right: T,
}

#[test]
fn test_generic_composite() {
    assert_eq!(Pair::<i32>::wire_name(), "demo.Pair<int>");
    assert_eq!(Pair::<String>::wire_name(), "demo.Pair<string>");

    let factory = SerializerFactory::new();
    let pair = Pair {
        left: "l".to_string(),
        right: "r".to_string(),
    };
    let bytes = factory.serialize(&pair).expect("serialize");
    assert_eq!(factory.deserialize::<Pair<String>>(&bytes).expect("deserialize"), pair);
}

#[derive(Wire)]
struct Unnamed {
    flag: bool,
}

#[test]
fn test_default_name_follows_module_path() {
    assert_eq!(Unnamed::wire_name(), "roundtrip.Unnamed");
    assert!(Unnamed { flag: true }.flag);
}

#[test]
fn test_builtin_scalars_and_containers() {
    let factory = SerializerFactory::new();

    let decimal = Decimal::new(-12345, 2);
    let bytes = factory.serialize(&decimal).expect("decimal");
    assert_eq!(factory.deserialize::<Decimal>(&bytes).expect("decimal"), decimal);

    let nested: Vec<Vec<u16>> = vec![vec![1, 2], vec![], vec![u16::MAX]];
    let bytes = factory.serialize(&nested).expect("nested");
    assert_eq!(factory.deserialize::<Vec<Vec<u16>>>(&bytes).expect("nested"), nested);

    let array: [i8; 3] = [-1, 0, 1];
    let bytes = factory.serialize(&array).expect("array");
    assert_eq!(factory.deserialize::<[i8; 3]>(&bytes).expect("array"), array);
}

#[test]
fn test_corrupt_input_is_malformed() {
    let factory = SerializerFactory::new();
    let bytes = factory.serialize(&sample_order()).expect("serialize");

    let truncated = &bytes[..bytes.len() / 2];
    let err = factory.deserialize::<Order>(truncated).expect_err("truncated");
    assert!(matches!(err, Error::MalformedEnvelope { .. }), "{:?}", err);

    let mut bad_magic = bytes.clone();
    bad_magic[0] = b'X';
    let err = factory.deserialize::<Order>(&bad_magic).expect_err("magic");
    assert!(matches!(err, Error::MalformedEnvelope { .. }), "{:?}", err);
}

#[test]
fn test_reading_as_unrelated_type_fails() {
    let factory = SerializerFactory::new();
    let bytes = factory.serialize(&sample_order()).expect("serialize");
    let err = factory.deserialize::<Line>(&bytes).expect_err("wrong type");
    assert!(matches!(err, Error::NotSerializable { .. }), "{:?}", err);
}
