//! Assignability between types.
//!
//! `is_assignable_to` answers whether a value of one type may be stored in a
//! slot of another. `AssignMode::Exact` is the relation used for method
//! arguments; `AssignMode::Coercion` is the relation used for assignments and
//! `as` casts and additionally admits the runtime's implicit conversions.

use crate::db::TypeDatabase;
use crate::distance::get_distance;
use crate::generics::substitute;
use crate::hierarchy::{as_supertype, is_subclass, own_bindings};
use crate::numeric::{box_type, is_wrapper, numeric_kind, unboxed_kind};
use crate::sam::is_sam_type;
use crate::types::{MethodId, PrimitiveKind, TypeData, TypeId};
use stc_common::limits::MAX_TYPE_WALK_DEPTH;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AssignMode {
    /// Strict relation used for method arguments.
    #[default]
    Exact,
    /// Assignment relation: adds truthiness, `toString`, literal constructors
    /// and closure coercion to abstract classes.
    Coercion,
}

/// Whether a value of type `source` can be stored in a slot of type `target`.
#[must_use]
pub fn is_assignable_to(
    db: &dyn TypeDatabase,
    source: TypeId,
    target: TypeId,
    mode: AssignMode,
) -> bool {
    Assignability { db, mode }.check(source, target, 0)
}

/// Whether a primitive widens to another without a cast.
#[must_use]
pub fn primitive_widens(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    if from == to {
        return true;
    }
    if to == PrimitiveKind::Char {
        return false;
    }
    match (from.widening_rank(), to.widening_rank()) {
        (Some(f), Some(t)) => f <= t && !(from == PrimitiveKind::Char && t < 2),
        _ => false,
    }
}

struct Assignability<'a> {
    db: &'a dyn TypeDatabase,
    mode: AssignMode,
}

impl Assignability<'_> {
    fn coercion(&self) -> bool {
        self.mode == AssignMode::Coercion
    }

    fn check(&self, source: TypeId, target: TypeId, depth: u32) -> bool {
        if source == target || depth > MAX_TYPE_WALK_DEPTH {
            return true;
        }
        if source == TypeId::DYNAMIC || target == TypeId::DYNAMIC {
            return true;
        }
        if source == TypeId::VOID || target == TypeId::VOID {
            return false;
        }
        if source == TypeId::NULL {
            return !target.is_primitive();
        }

        let src = self.db.lookup(source);
        let tgt = self.db.lookup(target);

        match &tgt {
            TypeData::Placeholder(_) => return true,
            TypeData::Wildcard { upper, lower } => {
                return upper.is_none_or(|u| self.check(source, u, depth + 1))
                    && lower.is_none_or(|l| self.check(l, source, depth + 1));
            }
            _ => {}
        }
        match &src {
            TypeData::Placeholder(_) => return true,
            TypeData::Wildcard { upper, .. } => {
                let upper = upper.unwrap_or_else(|| self.db.object_type());
                return self.check(upper, target, depth + 1);
            }
            TypeData::Union(members) => {
                return members.iter().all(|&m| self.check(m, target, depth + 1));
            }
            _ => {}
        }
        if let TypeData::Union(members) = &tgt {
            return members.iter().any(|&m| self.check(source, m, depth + 1));
        }

        if let Some(target_kind) = target.primitive_kind() {
            return self.to_primitive(source, target_kind);
        }
        if let Some(source_kind) = source.primitive_kind() {
            return self.from_primitive(source, source_kind, target, depth);
        }
        self.reference(source, target, &src, &tgt, depth)
    }

    fn to_primitive(&self, source: TypeId, target_kind: PrimitiveKind) -> bool {
        if self.coercion() && target_kind == PrimitiveKind::Boolean {
            return true;
        }
        match unboxed_kind(self.db, source) {
            Some(source_kind) => primitive_widens(source_kind, target_kind),
            None => {
                self.coercion()
                    && target_kind == PrimitiveKind::Char
                    && self.db.class_of(source) == Some(self.db.well_known().string)
            }
        }
    }

    fn from_primitive(
        &self,
        source: TypeId,
        source_kind: PrimitiveKind,
        target: TypeId,
        depth: u32,
    ) -> bool {
        let boxed = box_type(self.db, source);
        if boxed == target {
            return true;
        }
        let Some(target_class) = self.db.class_of(target) else {
            return false;
        };
        if is_wrapper(self.db, target) {
            return false;
        }
        let wk = self.db.well_known();
        if target_class == wk.big_integer {
            return source_kind.is_integral();
        }
        if target_class == wk.big_decimal {
            return source_kind.is_numeric();
        }
        let src = self.db.lookup(boxed);
        let tgt = self.db.lookup(target);
        self.reference(boxed, target, &src, &tgt, depth)
    }

    fn reference(
        &self,
        source: TypeId,
        target: TypeId,
        src: &TypeData,
        tgt: &TypeData,
        depth: u32,
    ) -> bool {
        let db = self.db;
        let wk = db.well_known();
        match (src, tgt) {
            (TypeData::Array(sc), TypeData::Array(tc)) => {
                if sc.is_primitive() || tc.is_primitive() {
                    return sc == tc;
                }
                return self.check(*sc, *tc, depth + 1);
            }
            (TypeData::Array(_), TypeData::Class(target_ref)) => {
                return target_ref.class == wk.object
                    || target_ref.class == wk.cloneable
                    || target_ref.class == wk.serializable
                    || (self.coercion() && self.is_coercion_sink(target_ref.class));
            }
            (TypeData::Class(_), TypeData::Array(tc)) => {
                if !self.coercion() {
                    return false;
                }
                // A collection (list literal) can be converted to an array.
                return match as_supertype(db, source, wk.collection) {
                    Some(view) => match db.lookup(view) {
                        TypeData::Class(view_ref) => view_ref
                            .args
                            .first()
                            .is_none_or(|&element| self.check(element, *tc, depth + 1)),
                        _ => true,
                    },
                    None => false,
                };
            }
            _ => {}
        }

        let (TypeData::Class(source_ref), TypeData::Class(target_ref)) = (src, tgt) else {
            return false;
        };
        if target_ref.class == wk.object {
            return true;
        }
        if self.coercion() && self.is_coercion_sink(target_ref.class) {
            return true;
        }
        if source_ref.class == wk.gstring && target_ref.class == wk.string {
            return true;
        }
        if let Some(kind) = numeric_kind(db, source) {
            if target_ref.class == wk.big_decimal {
                return true;
            }
            if target_ref.class == wk.big_integer && kind.is_integral() {
                return true;
            }
        }
        if target.primitive_kind().is_none() && is_wrapper(db, target) && is_wrapper(db, source) {
            return false;
        }

        if let Some(view) = as_supertype(db, source, target_ref.class) {
            return self.generic_args_compatible(view, target, depth);
        }
        if is_subclass(db, source_ref.class, wk.closure)
            && is_sam_type(db, target_ref.class, self.coercion())
        {
            return true;
        }
        if self.coercion()
            && is_subclass(db, source_ref.class, wk.collection)
            && is_subclass(db, target_ref.class, wk.collection)
            && !db.class_def(target_ref.class).is_abstract()
        {
            return true;
        }
        false
    }

    /// Slots that accept any value in coercion mode.
    fn is_coercion_sink(&self, class: crate::types::ClassId) -> bool {
        let wk = self.db.well_known();
        class == wk.string || class == wk.boolean || class == wk.class
    }

    fn generic_args_compatible(&self, view: TypeId, target: TypeId, depth: u32) -> bool {
        let (TypeData::Class(view_ref), TypeData::Class(target_ref)) =
            (self.db.lookup(view), self.db.lookup(target))
        else {
            return true;
        };
        if view_ref.args.is_empty()
            || target_ref.args.is_empty()
            || view_ref.args.len() != target_ref.args.len()
        {
            return true;
        }
        view_ref
            .args
            .iter()
            .zip(target_ref.args.iter())
            .all(|(&actual, &formal)| self.type_arg_compatible(actual, formal, depth + 1))
    }

    /// Type arguments are invariant (after boxing) unless the formal is a
    /// wildcard. Placeholders and dynamic arguments are accepted.
    fn type_arg_compatible(&self, actual: TypeId, formal: TypeId, depth: u32) -> bool {
        if actual == formal || depth > MAX_TYPE_WALK_DEPTH {
            return true;
        }
        let exact = Assignability {
            db: self.db,
            mode: AssignMode::Exact,
        };
        match self.db.lookup(formal) {
            TypeData::Wildcard { upper, lower } => {
                let actual_upper = match self.db.lookup(actual) {
                    TypeData::Wildcard { upper, .. } => upper.unwrap_or_else(|| self.db.object_type()),
                    _ => actual,
                };
                upper.is_none_or(|u| exact.check(actual_upper, u, depth + 1))
                    && lower.is_none_or(|l| exact.check(l, actual, depth + 1))
            }
            TypeData::Placeholder(_) | TypeData::Dynamic => true,
            TypeData::Class(formal_ref) => match self.db.lookup(actual) {
                TypeData::Placeholder(_) | TypeData::Dynamic | TypeData::Wildcard { .. } => true,
                TypeData::Class(actual_ref) if actual_ref.class == formal_ref.class => {
                    exact.generic_args_compatible(actual, formal, depth + 1)
                }
                _ => box_type(self.db, actual) == box_type(self.db, formal),
            },
            _ => match self.db.lookup(actual) {
                TypeData::Placeholder(_) | TypeData::Dynamic => true,
                _ => box_type(self.db, actual) == box_type(self.db, formal),
            },
        }
    }
}

/// Constructor used to build `target` from a list literal with the given
/// element types (`Point p = [1, 2]`), choosing the closest match.
#[must_use]
pub fn literal_constructor_for(
    db: &dyn TypeDatabase,
    target: TypeId,
    element_types: &[TypeId],
) -> Option<MethodId> {
    let class = db.class_of(target)?;
    let bindings = own_bindings(db, target);
    let mut best: Option<(u32, MethodId)> = None;
    for &ctor in &db.class_def(class).constructors {
        let params = &db.method_def(ctor).params;
        if params.len() != element_types.len() {
            continue;
        }
        let mut total = 0u32;
        let mut matches = true;
        for (param, &element) in params.iter().zip(element_types) {
            let param_ty = substitute(db, &bindings, param.ty);
            if !is_assignable_to(db, element, param_ty, AssignMode::Exact) {
                matches = false;
                break;
            }
            total = total.saturating_add(get_distance(db, element, param_ty));
        }
        if matches && best.is_none_or(|(d, _)| total < d) {
            best = Some((total, ctor));
        }
    }
    best.map(|(_, ctor)| ctor)
}

#[cfg(test)]
#[path = "tests/assignability_tests.rs"]
mod tests;
