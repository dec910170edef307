// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read-only serializers bridging an older wire layout to the current type.
//!
//! # Composites
//!
//! Built when the wire token for a type name differs from the local
//! fingerprint. Old wire fields (after property renames) are matched to
//! constructor parameters by name and type name:
//!
//! 1. alternate constructors, in declared order, then the primary one: every
//!    parameter must come from an old field or a default literal
//! 2. otherwise the primary constructor, accepting parameters with no wire
//!    counterpart only if they are nullable or defaulted
//!
//! An old field matched by name but not by type fails both steps: its value
//! is never replaced by a null or a default.
//!
//! Old fields with no parameter are walked, not decoded, so back-reference
//! indices stay aligned.
//!
//! # Enums
//!
//! Every constant name seen on the wire, named by a rule, or present locally
//! gets a resolution chain: rename/default rules are applied until the name
//! is a local constant. A cycle or dead end fails only the value that needs it.

use super::enums::constant_name;
use super::{described_list, unwrapped, TypeSerializer};
use crate::codec::Value;
use crate::error::{Error, Result};
use crate::input::DeserializationInput;
use crate::model::{Constructor, EnumShape, LocalType, Object, Param, PrimitiveKind, Shape, TypeRegistry};
use crate::output::SerializationOutput;
use crate::schema::{CompositeType, RestrictedType, Transform, TransformSet};
use std::any::Any;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

fn read_only(type_name: &str) -> Error {
    Error::not_serializable(type_name, "evolution serializers are read-only")
}

/// Union of the envelope's rules for `wire_name` and the type's own rules.
fn rules_for(ty: &LocalType, wire_name: &str, transforms: &TransformSet) -> Vec<Transform> {
    let mut rules: Vec<Transform> = transforms.get(wire_name).to_vec();
    for t in &ty.transforms {
        if !rules.contains(t) {
            rules.push(t.clone());
        }
    }
    rules
}

/// Value supplied for a parameter with no usable wire value.
enum Fill {
    Null(fn() -> Object),
    Literal {
        kind: PrimitiveKind,
        literal: String,
        wrap: Option<fn(Object) -> core::result::Result<Object, String>>,
    },
}

impl Fill {
    fn for_param(registry: &TypeRegistry, param: &Param) -> Option<Self> {
        let ty = registry.resolve(&param.ty);
        let (inner, wrap, none) = match &ty.shape {
            Shape::Optional(o) => (registry.resolve(&o.inner), Some(o.some), Some(o.none)),
            _ => (Arc::clone(&ty), None, None),
        };
        if let Some(literal) = &param.default_literal {
            match &inner.shape {
                Shape::Primitive(kind) if kind.parse_literal(literal).is_some() => {
                    return Some(Self::Literal {
                        kind: *kind,
                        literal: literal.clone(),
                        wrap,
                    });
                }
                _ => log::warn!(
                    "[evolution] ignoring default '{}' for {}: not a {} literal",
                    literal,
                    param.name,
                    inner.name
                ),
            }
        }
        none.map(Self::Null)
    }

    fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    fn make(&self, type_name: &str) -> Result<Object> {
        match self {
            Self::Null(none) => Ok(none()),
            Self::Literal { kind, literal, wrap } => {
                let value = kind
                    .parse_literal(literal)
                    .ok_or_else(|| Error::unresolvable(type_name, format!("bad default '{}'", literal)))?;
                match wrap {
                    Some(wrap) => wrap(value).map_err(|e| Error::mismatch(type_name, e)),
                    None => Ok(value),
                }
            }
        }
    }
}

/// Old field layout as seen through property renames.
struct OldField {
    name: String,
    type_name: String,
}

struct Plan {
    constructor: Constructor,
    /// Parameter fed by each old field, in wire order.
    targets: Vec<Option<usize>>,
    fills: Vec<Option<Fill>>,
}

fn plan_constructor(
    registry: &TypeRegistry,
    constructor: &Constructor,
    old: &[OldField],
    exact: bool,
) -> core::result::Result<Plan, String> {
    let mut targets = vec![None; old.len()];
    let mut fills = Vec::with_capacity(constructor.params.len());
    for (pi, param) in constructor.params.iter().enumerate() {
        let param_ty = unwrapped(registry, &param.ty);
        let dynamic = matches!(param_ty.shape, Shape::Dynamic);
        let fill = Fill::for_param(registry, param);
        let matched = old.iter().position(|f| f.name == param.name);
        let compatible = matched.filter(|&fi| dynamic || old[fi].type_name == param_ty.name);

        match (matched, compatible) {
            (_, Some(fi)) => targets[fi] = Some(pi),
            // On the wire but not assignable.
            (Some(fi), None) => {
                return Err(format!(
                    "{} changed type from {} to {}",
                    param.name, old[fi].type_name, param_ty.name
                ));
            }
            (None, _) => {
                let usable = match &fill {
                    Some(f) => !exact || f.is_literal(),
                    None => false,
                };
                if !usable {
                    return Err(format!("{} has no wire value, default or null", param.name));
                }
            }
        }
        fills.push(fill);
    }
    Ok(Plan {
        constructor: constructor.clone(),
        targets,
        fills,
    })
}

pub struct EvolutionSerializer {
    ty: Arc<LocalType>,
    descriptor: String,
    plan: Plan,
}

impl EvolutionSerializer {
    pub fn build(
        registry: &TypeRegistry,
        ty: Arc<LocalType>,
        wire: &CompositeType,
        transforms: &TransformSet,
    ) -> Result<Self> {
        let shape = ty
            .composite()
            .ok_or_else(|| Error::mismatch(&ty.name, format!("composite {}", wire.name)))?;
        let rules = rules_for(&ty, &wire.name, transforms);
        let old: Vec<OldField> = wire
            .fields
            .iter()
            .map(|f| OldField {
                name: rules
                    .iter()
                    .find_map(|r| match r {
                        Transform::Rename { .. } => r.apply(&f.name),
                        Transform::EnumDefault { .. } => None,
                    })
                    .unwrap_or(f.name.as_str())
                    .to_string(),
                type_name: f.type_name.clone(),
            })
            .collect();

        let exact = shape
            .alternates
            .iter()
            .chain(std::iter::once(&shape.constructor))
            .find_map(|c| plan_constructor(registry, c, &old, true).ok());
        let plan = match exact {
            Some(plan) => plan,
            None => plan_constructor(registry, &shape.constructor, &old, false)
                .map_err(|reason| Error::unresolvable(&ty.name, reason))?,
        };

        log::debug!(
            "[evolution] {}: {} wire fields -> constructor({})",
            ty.name,
            old.len(),
            plan.constructor
                .params
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self {
            descriptor: wire.descriptor.name.clone(),
            ty,
            plan,
        })
    }
}

impl TypeSerializer for EvolutionSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        Some(&self.descriptor)
    }

    fn write_class_info(&self, _out: &mut SerializationOutput<'_>) -> Result<()> {
        Err(read_only(&self.ty.name))
    }

    fn write_object(&self, _obj: &dyn Any, _out: &mut SerializationOutput<'_>) -> Result<Value> {
        Err(read_only(&self.ty.name))
    }

    fn read_object(&self, value: &Value, input: &mut DeserializationInput<'_>) -> Result<Object> {
        let items = described_list(value, &self.descriptor, &self.ty.name)?;
        if items.len() != self.plan.targets.len() {
            return Err(Error::malformed(format!(
                "{} carries {} fields, schema declares {}",
                self.ty.name,
                items.len(),
                self.plan.targets.len()
            )));
        }

        let params = &self.plan.constructor.params;
        let mut args: Vec<Option<Object>> = params.iter().map(|_| None).collect();
        for (item, target) in items.iter().zip(&self.plan.targets) {
            let Some(pi) = *target else {
                input.skip_value(item)?;
                continue;
            };
            let param = &params[pi];
            if item.is_null() && !param.nullable {
                if let Some(fill) = self.plan.fills[pi].as_ref().filter(|f| f.is_literal()) {
                    args[pi] = Some(fill.make(&self.ty.name)?);
                    continue;
                }
            }
            args[pi] = Some(input.read_value(item, &param.ty)?);
        }

        let mut values = Vec::with_capacity(args.len());
        for (pi, arg) in args.into_iter().enumerate() {
            let value = match arg {
                Some(v) => v,
                None => self.plan.fills[pi]
                    .as_ref()
                    .ok_or_else(|| Error::unresolvable(&self.ty.name, format!("no value for {}", params[pi].name)))?
                    .make(&self.ty.name)?,
            };
            values.push(value);
        }
        (self.plan.constructor.build)(values).map_err(|e| Error::mismatch(&self.ty.name, e))
    }
}

pub struct EnumEvolutionSerializer {
    ty: Arc<LocalType>,
    shape: EnumShape,
    descriptor: String,
    resolution: HashMap<String, core::result::Result<usize, String>>,
}

impl EnumEvolutionSerializer {
    pub fn build(ty: Arc<LocalType>, wire: &RestrictedType, transforms: &TransformSet) -> Result<Self> {
        let shape = ty
            .enumeration()
            .cloned()
            .ok_or_else(|| Error::mismatch(&ty.name, format!("enum {}", wire.name)))?;
        let rules = rules_for(&ty, &wire.name, transforms);

        let mut names: BTreeSet<&str> = wire.choices.iter().map(|c| c.name.as_str()).collect();
        for rule in &rules {
            let (a, b) = match rule {
                Transform::Rename { from, to } => (from, to),
                Transform::EnumDefault { old, new } => (old, new),
            };
            names.insert(a);
            names.insert(b);
        }
        names.extend(shape.constants.iter().map(String::as_str));

        let resolution = names
            .into_iter()
            .map(|name| (name.to_string(), resolve_constant(&shape, &rules, name)))
            .collect();
        Ok(Self {
            descriptor: wire.descriptor.name.clone(),
            ty,
            shape,
            resolution,
        })
    }
}

/// Follow rules from `name` until it lands on a local constant.
fn resolve_constant(shape: &EnumShape, rules: &[Transform], name: &str) -> core::result::Result<usize, String> {
    let mut current = name;
    let mut visited = HashSet::new();
    loop {
        if let Some(ordinal) = shape.ordinal(current) {
            return Ok(ordinal);
        }
        if !visited.insert(current) {
            return Err(format!("rules for {} form a cycle at {}", name, current));
        }
        current = rules
            .iter()
            .find_map(|r| r.apply(current))
            .ok_or_else(|| format!("no rule maps {} onto a current constant", current))?;
    }
}

impl TypeSerializer for EnumEvolutionSerializer {
    fn local_type(&self) -> &Arc<LocalType> {
        &self.ty
    }

    fn descriptor(&self) -> Option<&str> {
        Some(&self.descriptor)
    }

    fn write_class_info(&self, _out: &mut SerializationOutput<'_>) -> Result<()> {
        Err(read_only(&self.ty.name))
    }

    fn write_object(&self, _obj: &dyn Any, _out: &mut SerializationOutput<'_>) -> Result<Value> {
        Err(read_only(&self.ty.name))
    }

    fn read_object(&self, value: &Value, _input: &mut DeserializationInput<'_>) -> Result<Object> {
        let items = described_list(value, &self.descriptor, &self.ty.name)?;
        let name = constant_name(items, &self.ty.name)?;
        match self.resolution.get(name) {
            Some(Ok(ordinal)) => (self.shape.from_ordinal)(*ordinal)
                .ok_or_else(|| Error::mismatch(&self.ty.name, format!("ordinal {}", ordinal))),
            Some(Err(reason)) => Err(Error::unresolvable(&self.ty.name, reason.clone())),
            None => Err(Error::unresolvable(
                &self.ty.name,
                format!("constant {} is not in the wire schema", name),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors(constants: &[&str]) -> EnumShape {
        let n = constants.len();
        EnumShape::new(
            constants.iter().map(|c| c.to_string()).collect(),
            |_| None,
            move |i| (i < n).then(|| Box::new(i) as Object),
        )
    }

    #[test]
    fn test_resolve_constant_follows_rules() {
        let shape = colors(&["CRIMSON", "BLUE"]);
        let rules = vec![Transform::rename("RED", "SCARLET"), Transform::rename("SCARLET", "CRIMSON")];
        assert_eq!(resolve_constant(&shape, &rules, "RED"), Ok(0));
        assert_eq!(resolve_constant(&shape, &rules, "BLUE"), Ok(1));
        assert!(resolve_constant(&shape, &rules, "GREEN").is_err());
    }

    #[test]
    fn test_resolve_constant_detects_cycle() {
        let shape = colors(&["BLUE"]);
        let rules = vec![Transform::rename("A", "B"), Transform::enum_default("B", "A")];
        let err = resolve_constant(&shape, &rules, "A").unwrap_err();
        assert!(err.contains("cycle"));
    }
}
