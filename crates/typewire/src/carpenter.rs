// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class synthesis for wire types with no local definition.
//!
//! The factory hands the carpenter a schema notation plus the local type of
//! every field; the carpenter returns a [`LocalType`] usable exactly like a
//! compiled one. [`RecordCarpenter`] represents unknown types as structural
//! records ([`Record`], [`RecordEnum`], dynamic lists and maps) rather than
//! generating code.

use crate::error::{Error, Result};
use crate::model::{
    AnyObject, CompositeShape, Constructor, EnumShape, LocalType, Object, Param, Property, Record, RecordEnum,
    RecordField, RecordMap, Shape, SingletonShape, TypeKey, TypeRef, Wire,
};
use crate::schema::{CompositeType, RestrictedSource, RestrictedType, TypeNotation};
use std::any::Any;
use std::sync::Arc;

pub trait ClassCarpenter: Send + Sync {
    /// Stand-in local type for `notation`; `field_types` follow the
    /// composite's field order (empty for restricted types).
    fn synthesize(&self, notation: &TypeNotation, field_types: &[TypeRef]) -> Result<LocalType>;
}

/// Synthesizes structural records.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordCarpenter;

impl RecordCarpenter {
    fn composite(c: &CompositeType, field_types: &[TypeRef]) -> Result<LocalType> {
        if field_types.len() != c.fields.len() {
            return Err(Error::malformed(format!(
                "{} declares {} fields, {} types supplied",
                c.name,
                c.fields.len(),
                field_types.len()
            )));
        }
        let properties: Vec<Property> = c
            .fields
            .iter()
            .zip(field_types)
            .enumerate()
            .map(|(i, (field, ty))| {
                Property::new(field.name.clone(), ty.clone(), move |value| {
                    let record = value.downcast_ref::<Record>()?;
                    record.fields.get(i).map(|f| &*f.value as &dyn Any)
                })
                .nullable(!field.mandatory)
                .requires(field.requires.clone())
            })
            .collect();

        let names: Vec<String> = c.fields.iter().map(|f| f.name.clone()).collect();
        let type_name = c.name.clone();
        let constructor = Constructor {
            params: properties.iter().map(Property::param).collect::<Vec<Param>>(),
            build: Arc::new(move |values: Vec<Object>| -> core::result::Result<Object, String> {
                let fields = names
                    .iter()
                    .cloned()
                    .zip(values)
                    .map(|(name, value)| RecordField { name, value })
                    .collect();
                Ok(Box::new(Record::new(type_name.clone(), fields)) as Object)
            }),
        };

        Ok(LocalType::new(
            c.name.clone(),
            TypeKey::Synthetic(c.name.clone()),
            Shape::Composite(CompositeShape {
                properties,
                constructor,
                alternates: Vec::new(),
            }),
        )
        .with_provides(c.provides.clone()))
    }

    fn enumeration(r: &RestrictedType) -> LocalType {
        let constants: Vec<String> = r.choices.iter().map(|c| c.name.clone()).collect();
        let type_name = r.name.clone();
        let lookup = constants.clone();
        let owner = type_name.clone();
        let shape = EnumShape::new(
            constants,
            move |value: &dyn Any| {
                value
                    .downcast_ref::<RecordEnum>()
                    .filter(|e| e.type_name == owner)
                    .map(|e| e.ordinal)
            },
            move |ordinal| {
                lookup.get(ordinal).map(|constant| {
                    Box::new(RecordEnum {
                        type_name: type_name.clone(),
                        constant: constant.clone(),
                        ordinal,
                    }) as Object
                })
            },
        );
        LocalType::new(r.name.clone(), TypeKey::Synthetic(r.name.clone()), Shape::Enum(shape))
            .with_provides(r.provides.clone())
    }

    fn singleton(r: &RestrictedType) -> LocalType {
        let type_name = r.name.clone();
        LocalType::new(
            r.name.clone(),
            TypeKey::Synthetic(r.name.clone()),
            Shape::Singleton(SingletonShape {
                instance: Arc::new(move || Box::new(Record::new(type_name.clone(), Vec::new())) as Object),
            }),
        )
    }

    /// A dynamic container renamed to the wire type.
    fn renamed(mut ty: LocalType, r: &RestrictedType) -> LocalType {
        ty.raw_name = crate::model::erase_generics(&r.name).to_string();
        ty.name = r.name.clone();
        ty.key = TypeKey::Synthetic(r.name.clone());
        ty.provides = r.provides.clone();
        ty
    }
}

impl ClassCarpenter for RecordCarpenter {
    fn synthesize(&self, notation: &TypeNotation, field_types: &[TypeRef]) -> Result<LocalType> {
        let ty = match notation {
            TypeNotation::Composite(c) => Self::composite(c, field_types)?,
            TypeNotation::Restricted(r) => match &r.source {
                RestrictedSource::Enum => Self::enumeration(r),
                RestrictedSource::Singleton => Self::singleton(r),
                RestrictedSource::List | RestrictedSource::Set | RestrictedSource::Array => {
                    Self::renamed(<Vec<AnyObject>>::local_type(), r)
                }
                RestrictedSource::Map => Self::renamed(RecordMap::local_type(), r),
                RestrictedSource::Custom(repr) => {
                    log::debug!("[carpenter] no serializer for custom type {} ({})", r.name, repr);
                    return Err(Error::UnknownType {
                        type_name: r.name.clone(),
                    });
                }
            },
        };
        log::debug!("[carpenter] synthesized {} ({})", ty.name, ty.shape.label());
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Choice, Descriptor, Field};

    fn field(name: &str, type_name: &str, mandatory: bool) -> Field {
        Field {
            name: name.into(),
            type_name: type_name.into(),
            requires: Vec::new(),
            default: None,
            label: None,
            mandatory,
            multiple: false,
        }
    }

    #[test]
    fn test_composite_record_roundtrips_through_constructor() {
        let notation = TypeNotation::Composite(CompositeType {
            name: "remote.Trade".into(),
            label: None,
            provides: vec!["remote.Priced".into()],
            descriptor: Descriptor::new("typewire:abc"),
            fields: vec![field("id", "long", true), field("note", "string", false)],
        });
        let types = [TypeRef::of::<i64>(), TypeRef::of::<Option<String>>()];
        let ty = RecordCarpenter.synthesize(&notation, &types).expect("synthesize");
        assert_eq!(ty.key, TypeKey::Synthetic("remote.Trade".into()));
        assert_eq!(ty.provides, vec!["remote.Priced".to_string()]);

        let shape = ty.composite().expect("composite");
        let built = (shape.constructor.build)(vec![Box::new(5i64) as Object, Box::new(None::<String>) as Object]).expect("build");
        let record = built.downcast_ref::<Record>().expect("record");
        assert_eq!(record.get::<i64>("id"), Some(&5));

        let id = (shape.properties[0].getter)(record as &dyn Any).expect("getter");
        assert_eq!(id.downcast_ref::<i64>(), Some(&5));
        assert!(!shape.properties[0].nullable);
        assert!(shape.properties[1].nullable);
    }

    #[test]
    fn test_enum_record() {
        let notation = TypeNotation::Restricted(RestrictedType {
            name: "remote.Side".into(),
            label: None,
            provides: Vec::new(),
            source: RestrictedSource::Enum,
            descriptor: Descriptor::new("typewire:def"),
            choices: vec![
                Choice { name: "BUY".into(), value: "0".into() },
                Choice { name: "SELL".into(), value: "1".into() },
            ],
        });
        let ty = RecordCarpenter.synthesize(&notation, &[]).expect("synthesize");
        let shape = ty.enumeration().expect("enum");
        let sell = (shape.from_ordinal)(1).expect("SELL");
        let sell = sell.downcast_ref::<RecordEnum>().expect("record enum");
        assert_eq!(sell.constant, "SELL");
        assert_eq!((shape.ordinal_of)(sell as &dyn Any), Some(1));
    }

    #[test]
    fn test_custom_is_unknown() {
        let notation = TypeNotation::Restricted(RestrictedType {
            name: "remote.Money".into(),
            label: None,
            provides: Vec::new(),
            source: RestrictedSource::Custom("string".into()),
            descriptor: Descriptor::new("typewire:scalar:remote.Money"),
            choices: Vec::new(),
        });
        assert!(matches!(
            RecordCarpenter.synthesize(&notation, &[]),
            Err(Error::UnknownType { .. })
        ));
    }
}
