// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in and user-registered custom serializers.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use typewire::codec::Value;
use typewire::model::{LocalType, Shape, TypeKey};
use typewire::{Error, RemoteError, ScalarSerializer, SerializerFactory, Wire};

/// Amount in minor units, written as "<units> <currency>".
#[derive(Debug, Clone, PartialEq)]
struct Money {
    units: i64,
    currency: String,
}

impl Wire for Money {
    fn local_type() -> LocalType {
        LocalType::new(Self::wire_name(), TypeKey::of::<Self>(), Shape::Opaque)
    }

    fn wire_name() -> String {
        "bank.Money".to_string()
    }
}

fn money_to_repr(m: &Money) -> Result<Value, String> {
    Ok(Value::string(format!("{} {}", m.units, m.currency)))
}

fn money_from_repr(repr: &Value) -> Result<Money, String> {
    let text = repr.as_str().ok_or("money repr must be a string")?;
    let (units, currency) = text.split_once(' ').ok_or("missing currency")?;
    Ok(Money {
        units: units.parse().map_err(|_| format!("bad units '{}'", units))?,
        currency: currency.to_string(),
    })
}

fn money_serializer() -> Arc<ScalarSerializer<Money>> {
    Arc::new(ScalarSerializer::<Money>::new("string", money_to_repr, money_from_repr))
}

#[derive(Wire, Debug, PartialEq)]
#[wire(name = "bank.Payment")]
struct Payment {
    amount: Money,
    fee: Option<Money>,
}

/// Composite whose default layout is replaced by a custom form.
#[derive(Wire, Debug, Clone, PartialEq)]
#[wire(name = "bank.Iban")]
struct Iban {
    country: String,
    digits: String,
}

fn iban_to_repr(i: &Iban) -> Result<Value, String> {
    Ok(Value::string(format!("{}{}", i.country, i.digits)))
}

fn iban_from_repr(repr: &Value) -> Result<Iban, String> {
    let text = repr.as_str().ok_or("iban repr must be a string")?;
    if text.len() < 3 || !text.is_char_boundary(2) {
        return Err(format!("bad iban '{}'", text));
    }
    let (country, digits) = text.split_at(2);
    Ok(Iban {
        country: country.to_string(),
        digits: digits.to_string(),
    })
}

#[test]
fn test_opaque_type_needs_a_custom_serializer() {
    let factory = SerializerFactory::new();
    let money = Money {
        units: 1250,
        currency: "EUR".into(),
    };
    let err = factory.serialize(&money).expect_err("opaque");
    assert!(matches!(err, Error::NotSerializable { .. }), "{:?}", err);

    factory.register_custom(money_serializer());
    let bytes = factory.serialize(&money).expect("custom");
    assert_eq!(factory.deserialize::<Money>(&bytes).expect("read"), money);
}

#[test]
fn test_custom_serializer_inside_composite() {
    let factory = SerializerFactory::new();
    factory.register_custom(money_serializer());
    let payment = Payment {
        amount: Money {
            units: 10,
            currency: "USD".into(),
        },
        fee: None,
    };
    let bytes = factory.serialize(&payment).expect("serialize");
    assert_eq!(factory.deserialize::<Payment>(&bytes).expect("read"), payment);

    let envelope = factory.read_envelope(&bytes).expect("envelope");
    let notation = envelope.schema.by_name("bank.Money").expect("custom notation");
    assert_eq!(notation.descriptor().name, "typewire:scalar:bank.Money");
}

#[test]
fn test_custom_serializer_overrides_composite_layout() {
    let factory = SerializerFactory::new();
    let iban = Iban {
        country: "FR".into(),
        digits: "7630006000011234567890189".into(),
    };
    let composite = factory.serialize(&iban).expect("composite");

    factory.register_custom(Arc::new(ScalarSerializer::<Iban>::new("string", iban_to_repr, iban_from_repr)));
    let custom = factory.serialize(&iban).expect("custom");
    assert_ne!(composite, custom);
    assert_eq!(factory.deserialize::<Iban>(&custom).expect("read"), iban);

    let envelope = factory.read_envelope(&custom).expect("envelope");
    assert!(matches!(
        envelope.payload.as_described(),
        Some((Value::Symbol(token), Value::String(text)))
            if token == "typewire:scalar:bank.Iban" && text.starts_with("FR")
    ));
}

#[test]
fn test_reader_without_the_custom_serializer() {
    let writer = SerializerFactory::new();
    writer.register_custom(money_serializer());
    let bytes = writer
        .serialize(&Money {
            units: 1,
            currency: "JPY".into(),
        })
        .expect("serialize");

    let reader = SerializerFactory::new();
    let err = reader.deserialize_any(&bytes).expect_err("no custom serializer");
    assert!(matches!(err, Error::UnknownType { .. }), "{:?}", err);
}

#[test]
fn test_builtin_time_scalars() {
    let factory = SerializerFactory::new();

    let d = Duration::new(3, 999_999_999);
    let bytes = factory.serialize(&d).expect("duration");
    assert_eq!(factory.deserialize::<Duration>(&bytes).expect("duration"), d);

    for t in [
        UNIX_EPOCH + Duration::new(1_700_000_000, 5),
        UNIX_EPOCH - Duration::new(86_400, 250),
        UNIX_EPOCH,
    ] {
        let bytes = factory.serialize(&t).expect("instant");
        assert_eq!(factory.deserialize::<SystemTime>(&bytes).expect("instant"), t);
    }
}

#[test]
fn test_remote_error_keeps_cause_chain() {
    #[derive(Debug)]
    struct Inner;
    impl std::fmt::Display for Inner {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("disk full")
        }
    }
    impl std::error::Error for Inner {}

    #[derive(Debug)]
    struct Outer(Inner);
    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("write failed")
        }
    }
    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    let factory = SerializerFactory::new();
    let remote = RemoteError::from_error("io", &Outer(Inner));
    let bytes = factory.serialize(&remote).expect("serialize");
    let back: RemoteError = factory.deserialize(&bytes).expect("read");
    assert_eq!(back.message, "write failed");
    assert_eq!(back.causes, vec!["disk full".to_string()]);
    assert_eq!(back, remote);
}
