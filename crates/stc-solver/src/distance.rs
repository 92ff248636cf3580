//! Argument-to-parameter distance used to rank overloads.
//!
//! The distance is 0 only for identical types. Along an inheritance chain it
//! grows with every hop (see `hierarchy::supertype_distances`), boxing costs 1
//! and each rung of the primitive widening ladder costs 2. Arrays matched
//! against non-arrays pay `ARRAY_PENALTY`. Every per-argument distance is
//! capped at `MAX_ARGUMENT_DISTANCE` so that the variadic penalty dominates.

use crate::db::TypeDatabase;
use crate::hierarchy::{class_depth, class_distance, is_subclass};
use crate::numeric::{box_type, numeric_kind, unboxed_kind};
use crate::sam::is_sam_type;
use crate::types::{TypeData, TypeId};
use stc_common::limits::{ARRAY_PENALTY, MAX_ARGUMENT_DISTANCE, NULL_ARGUMENT_BASE};

/// Distance from an argument of type `actual` to a parameter of type `declared`.
#[must_use]
pub fn get_distance(db: &dyn TypeDatabase, actual: TypeId, declared: TypeId) -> u32 {
    if actual == declared {
        return 0;
    }
    raw_distance(db, actual, declared, 0).clamp(1, MAX_ARGUMENT_DISTANCE)
}

/// Distance of a reference type to `Object`: its specificity.
fn object_distance(db: &dyn TypeDatabase, ty: TypeId, depth: u32) -> u32 {
    raw_distance(db, ty, db.object_type(), depth + 1)
}

fn declared_depth(db: &dyn TypeDatabase, declared: TypeId) -> u32 {
    match db.lookup(declared) {
        TypeData::Class(class_ref) => class_depth(db, class_ref.class),
        TypeData::Array(_) => 1,
        _ => 0,
    }
}

fn raw_distance(db: &dyn TypeDatabase, actual: TypeId, declared: TypeId, depth: u32) -> u32 {
    if actual == declared {
        return 0;
    }
    if depth > stc_common::limits::MAX_TYPE_WALK_DEPTH {
        return MAX_ARGUMENT_DISTANCE;
    }
    let object = db.object_type();

    // Declared side that stands for "some reference".
    match db.lookup(declared) {
        TypeData::Dynamic | TypeData::Placeholder(_) => {
            return if actual == TypeId::NULL {
                NULL_ARGUMENT_BASE
            } else if actual == object {
                1
            } else {
                object_distance(db, actual, depth).max(1)
            };
        }
        TypeData::Wildcard { upper, .. } => {
            return raw_distance(db, actual, upper.unwrap_or(object), depth + 1);
        }
        _ => {}
    }

    match db.lookup(actual) {
        TypeData::Null => {
            if declared.is_primitive() {
                return MAX_ARGUMENT_DISTANCE;
            }
            let specificity = declared_depth(db, declared).min(NULL_ARGUMENT_BASE - 1);
            return NULL_ARGUMENT_BASE - specificity;
        }
        TypeData::Dynamic => {
            // Unknown argument: prefer the least specific parameter.
            return 1 + declared_depth(db, declared) + u32::from(declared.is_primitive()) * 8;
        }
        TypeData::Union(members) => {
            return members
                .iter()
                .map(|&m| raw_distance(db, m, declared, depth + 1))
                .max()
                .unwrap_or(0);
        }
        TypeData::Placeholder(_) => return object_distance(db, declared, depth),
        TypeData::Wildcard { upper, .. } => {
            return raw_distance(db, upper.unwrap_or(object), declared, depth + 1);
        }
        _ => {}
    }

    // Primitive pairs: the widening ladder.
    if let (Some(a), Some(d)) = (actual.primitive_kind(), declared.primitive_kind()) {
        return match (a.widening_rank(), d.widening_rank()) {
            (Some(ar), Some(dr)) if ar <= dr => 2 * (dr - ar) + u32::from(ar == dr),
            (Some(ar), Some(dr)) => 2 * (ar - dr) + 1,
            _ => MAX_ARGUMENT_DISTANCE,
        };
    }

    // Unboxing into a primitive parameter.
    if let Some(d) = declared.primitive_kind() {
        return match unboxed_kind(db, actual) {
            Some(a) => 1 + raw_distance(db, a.type_id(), d.type_id(), depth + 1),
            None => MAX_ARGUMENT_DISTANCE,
        };
    }

    // Boxing a primitive argument.
    if actual.is_primitive() {
        let boxed = box_type(db, actual);
        if boxed == declared {
            return 1;
        }
        if let (Some(a), Some(d)) = (numeric_kind(db, actual), numeric_kind(db, declared)) {
            if d != crate::numeric::NumericKind::Number {
                return 1 + 2 * d.ladder_rank().abs_diff(a.ladder_rank());
            }
        }
        return 1 + raw_distance(db, boxed, declared, depth + 1);
    }

    match (db.lookup(actual), db.lookup(declared)) {
        (TypeData::Array(ac), TypeData::Array(dc)) => raw_distance(db, ac, dc, depth + 1),
        (TypeData::Array(_), _) => ARRAY_PENALTY + 1,
        (_, TypeData::Array(dc)) => ARRAY_PENALTY + raw_distance(db, object, dc, depth + 1),
        (TypeData::Class(actual_ref), TypeData::Class(declared_ref)) => {
            let wk = db.well_known();
            if actual_ref.class == declared_ref.class {
                // Same class, different (or raw) type arguments.
                return 1;
            }
            if actual_ref.class == wk.gstring && declared_ref.class == wk.string {
                return 2;
            }
            if let (Some(a), Some(d)) = (numeric_kind(db, actual), numeric_kind(db, declared)) {
                if d != crate::numeric::NumericKind::Number && a != d {
                    return 2 * d.ladder_rank().abs_diff(a.ladder_rank()) + 1;
                }
            }
            if let Some(distance) = class_distance(db, actual_ref.class, declared_ref.class) {
                return distance;
            }
            if is_subclass(db, actual_ref.class, wk.closure)
                && is_sam_type(db, declared_ref.class, true)
            {
                return 2;
            }
            MAX_ARGUMENT_DISTANCE
        }
        _ => MAX_ARGUMENT_DISTANCE,
    }
}

#[cfg(test)]
#[path = "tests/distance_tests.rs"]
mod tests;
