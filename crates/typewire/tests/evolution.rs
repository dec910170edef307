// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic

//! Reading payloads written by older or newer versions of a type.
//!
//! Each module below is one version of `evo.Profile` / `evo.Color` as some
//! peer compiled it; writer and reader use separate factories.

use std::sync::Arc;
use typewire::output::SerializationOutput;
use typewire::schema::descriptors;
use typewire::{Error, SerializerFactory, TypeSerializer};

mod v1 {
    use typewire::Wire;

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Profile")]
    pub struct Profile {
        pub id: i64,
        pub name: String,
    }

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Color")]
    pub enum Color {
        Red,
        Green,
        Blue,
    }

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Card")]
    pub struct Card {
        pub owner: Profile,
        pub color: Color,
    }
}

/// Adds a nullable field.
mod v2 {
    use typewire::Wire;

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Profile")]
    pub struct Profile {
        pub id: i64,
        pub name: String,
        pub email: Option<String>,
    }
}

/// Adds a defaulted field.
mod defaulted {
    use typewire::Wire;

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Profile")]
    pub struct Profile {
        pub id: i64,
        pub name: String,
        #[wire(default = "3")]
        pub level: i32,
    }
}

/// Adds a field no old payload can fill.
mod mandatory {
    use typewire::Wire;

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Profile")]
    pub struct Profile {
        pub id: i64,
        pub name: String,
        pub level: i32,
    }
}

/// Drops a field.
mod trimmed {
    use typewire::Wire;

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Profile")]
    pub struct Profile {
        pub id: i64,
    }
}

/// Renames a field.
mod renamed {
    use typewire::Wire;

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Profile", rename(from = "name", to = "display_name"))]
    pub struct Profile {
        pub id: i64,
        pub display_name: String,
    }
}

/// Changes a field's type.
mod retyped {
    use typewire::Wire;

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Profile")]
    pub struct Profile {
        pub id: String,
        pub name: String,
    }
}

/// Changes a field's type to a nullable one.
mod retyped_nullable {
    use typewire::Wire;

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Profile")]
    pub struct Profile {
        pub id: i64,
        pub name: Option<i64>,
    }
}

/// Keeps a constructor for the old layout.
mod alternate {
    use typewire::Wire;

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Profile", constructors(legacy(id: i64, name: String)))]
    pub struct Profile {
        pub id: i64,
        pub name: String,
        pub tier: u8,
    }

    impl Profile {
        pub fn legacy(id: i64, name: String) -> Self {
            Self { id, name, tier: 1 }
        }
    }
}

/// Renames `Red`, folds `Blue` into `Green`.
mod colors {
    use typewire::Wire;

    #[derive(Wire, Debug, PartialEq)]
    #[wire(
        name = "evo.Color",
        rename(from = "Red", to = "Crimson"),
        enum_default(old = "Blue", new = "Green")
    )]
    pub enum Color {
        Crimson,
        Green,
    }

    #[derive(Wire, Debug, PartialEq)]
    #[wire(name = "evo.Color")]
    pub enum Plain {
        Red,
        Green,
    }
}

fn write_v1() -> Vec<u8> {
    let writer = SerializerFactory::new();
    writer
        .serialize(&v1::Profile {
            id: 9,
            name: "grace".into(),
        })
        .expect("serialize v1")
}

fn write_color(color: v1::Color) -> Vec<u8> {
    SerializerFactory::new().serialize(&color).expect("serialize color")
}

#[test]
fn test_added_nullable_field_reads_as_none() {
    let reader = SerializerFactory::new();
    let profile: v2::Profile = reader.deserialize(&write_v1()).expect("evolve");
    assert_eq!(
        profile,
        v2::Profile {
            id: 9,
            name: "grace".into(),
            email: None,
        }
    );
}

#[test]
fn test_newer_payload_drops_unknown_fields() {
    let writer = SerializerFactory::new();
    let bytes = writer
        .serialize(&v2::Profile {
            id: 1,
            name: "ada".into(),
            email: Some("ada@example.org".into()),
        })
        .expect("serialize v2");
    let reader = SerializerFactory::new();
    let profile: v1::Profile = reader.deserialize(&bytes).expect("evolve");
    assert_eq!(
        profile,
        v1::Profile {
            id: 1,
            name: "ada".into(),
        }
    );
}

#[test]
fn test_default_literal_fills_missing_field() {
    let reader = SerializerFactory::new();
    let profile: defaulted::Profile = reader.deserialize(&write_v1()).expect("evolve");
    assert_eq!(profile.level, 3);
    assert_eq!(profile.name, "grace");
}

#[test]
fn test_missing_mandatory_field_is_unresolvable() {
    let reader = SerializerFactory::new();
    let err = reader
        .deserialize::<mandatory::Profile>(&write_v1())
        .expect_err("no value for level");
    assert!(matches!(err, Error::EvolutionUnresolvable { .. }), "{:?}", err);
}

#[test]
fn test_removed_field_is_skipped() {
    let reader = SerializerFactory::new();
    let profile: trimmed::Profile = reader.deserialize(&write_v1()).expect("evolve");
    assert_eq!(profile, trimmed::Profile { id: 9 });
}

#[test]
fn test_renamed_field() {
    let reader = SerializerFactory::new();
    let profile: renamed::Profile = reader.deserialize(&write_v1()).expect("evolve");
    assert_eq!(profile.display_name, "grace");
}

#[test]
fn test_changed_field_type_is_unresolvable() {
    let reader = SerializerFactory::new();
    let err = reader
        .deserialize::<retyped::Profile>(&write_v1())
        .expect_err("id changed type");
    assert!(matches!(err, Error::EvolutionUnresolvable { .. }), "{:?}", err);
}

#[test]
fn test_changed_field_type_is_never_nulled_out() {
    let reader = SerializerFactory::new();
    let err = reader
        .deserialize::<retyped_nullable::Profile>(&write_v1())
        .expect_err("name changed type");
    match err {
        Error::EvolutionUnresolvable { reason, .. } => assert!(reason.contains("name"), "{}", reason),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_alternate_constructor_is_preferred() {
    let reader = SerializerFactory::new();
    let profile: alternate::Profile = reader.deserialize(&write_v1()).expect("evolve");
    assert_eq!(profile, alternate::Profile::legacy(9, "grace".into()));
    assert_eq!(profile.tier, 1);
}

#[test]
fn test_enum_rename_and_default() {
    let reader = SerializerFactory::new();
    let red: colors::Color = reader.deserialize(&write_color(v1::Color::Red)).expect("red");
    assert_eq!(red, colors::Color::Crimson);
    let green: colors::Color = reader.deserialize(&write_color(v1::Color::Green)).expect("green");
    assert_eq!(green, colors::Color::Green);
    let blue: colors::Color = reader.deserialize(&write_color(v1::Color::Blue)).expect("blue");
    assert_eq!(blue, colors::Color::Green);
}

#[test]
fn test_unmapped_constant_fails_only_its_value() {
    let reader = SerializerFactory::new();
    let err = reader
        .deserialize::<colors::Plain>(&write_color(v1::Color::Blue))
        .expect_err("blue has no mapping");
    assert!(matches!(err, Error::EvolutionUnresolvable { .. }), "{:?}", err);

    let red: colors::Plain = reader.deserialize(&write_color(v1::Color::Red)).expect("red");
    assert_eq!(red, colors::Plain::Red);
}

#[test]
fn test_nested_types_evolve_independently() {
    let writer = SerializerFactory::new();
    let bytes = writer
        .serialize(&v1::Card {
            owner: v1::Profile {
                id: 4,
                name: "linus".into(),
            },
            color: v1::Color::Blue,
        })
        .expect("serialize card");

    mod reader_side {
        use super::{colors, v2};
        use typewire::Wire;

        #[derive(Wire, Debug)]
        #[wire(name = "evo.Card")]
        pub struct Card {
            pub owner: v2::Profile,
            pub color: colors::Color,
        }
    }

    let reader = SerializerFactory::new();
    let card: reader_side::Card = reader.deserialize(&bytes).expect("evolve card");
    assert_eq!(card.owner.id, 4);
    assert_eq!(card.owner.email, None);
    assert_eq!(card.color, colors::Color::Green);
}

#[test]
fn test_evolution_serializers_are_read_only() {
    let reader = SerializerFactory::new();
    let _: v2::Profile = reader.deserialize(&write_v1()).expect("evolve");
    // The reader still writes its own layout.
    let bytes = reader
        .serialize(&v2::Profile {
            id: 2,
            name: "x".into(),
            email: None,
        })
        .expect("serialize v2");
    let back: v2::Profile = reader.deserialize(&bytes).expect("roundtrip");
    assert_eq!(back.id, 2);
}

/// Resolve the serializer a reader would use for the root of `bytes`.
fn root_serializer(reader: &SerializerFactory, bytes: &[u8]) -> Arc<dyn TypeSerializer> {
    let envelope = reader.read_envelope(bytes).expect("envelope");
    let token = descriptors::token_of(&envelope.payload).expect("described root");
    reader
        .resolve_descriptor(token, None, &envelope.schema, &envelope.transforms)
        .expect("resolve old layout")
}

fn assert_read_only(err: Error) {
    assert_eq!(err.category(), "not-serializable");
    match err {
        Error::NotSerializable { reason, .. } => assert!(reason.contains("read-only"), "{}", reason),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_composite_evolution_serializer_refuses_writes() {
    let reader = SerializerFactory::new();
    reader.register::<v2::Profile>().expect("register");
    let serializer = root_serializer(&reader, &write_v1());
    assert_ne!(
        serializer.descriptor(),
        Some(reader.fingerprint::<v2::Profile>().token().as_str())
    );

    let value = v2::Profile {
        id: 1,
        name: "ada".into(),
        email: None,
    };
    let mut out = SerializationOutput::new(&reader);
    assert_read_only(serializer.write_object(&value, &mut out).expect_err("write object"));
    assert_read_only(serializer.write_class_info(&mut out).expect_err("write class info"));
}

#[test]
fn test_enum_evolution_serializer_refuses_writes() {
    let reader = SerializerFactory::new();
    reader.register::<colors::Color>().expect("register");
    let serializer = root_serializer(&reader, &write_color(v1::Color::Red));

    let mut out = SerializationOutput::new(&reader);
    assert_read_only(
        serializer
            .write_object(&colors::Color::Green, &mut out)
            .expect_err("write object"),
    );
    assert_read_only(serializer.write_class_info(&mut out).expect_err("write class info"));
}
