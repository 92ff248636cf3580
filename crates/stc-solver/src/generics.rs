//! Generic placeholder connections and substitution.
//!
//! Connections are extracted one way only: the formal (placeholder-bearing)
//! type is walked in lock-step with the actual type, and every placeholder met
//! in the formal records the actual type found at the same position. There is
//! no backtracking and no unification variable; two different types for one
//! placeholder are reported as a conflict instead of overwriting each other.

use crate::assignability::{AssignMode, is_assignable_to};
use crate::db::TypeDatabase;
use crate::hierarchy::as_supertype;
use crate::numeric::box_type;
use crate::sam::single_abstract_method;
use crate::types::{GenericParam, TypeData, TypeId};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use stc_common::limits::MAX_TYPE_WALK_DEPTH;
use std::sync::Arc;
use tracing::trace;

/// Placeholder name to bound type, in discovery order.
pub type Bindings = IndexMap<Arc<str>, TypeId, FxBuildHasher>;

/// Two different types found for the same placeholder.
///
/// A binding is invariant when it was found inside the type arguments of a
/// parameterized type (`T` in `List<T>`); those cannot be widened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub placeholder: Arc<str>,
    pub first: TypeId,
    pub second: TypeId,
    pub first_invariant: bool,
    pub second_invariant: bool,
}

impl Conflict {
    /// Whether no single type satisfies both bindings: two invariant types
    /// differ, or the other binding is not assignable to the invariant one.
    #[must_use]
    pub fn is_violation(&self, db: &dyn TypeDatabase) -> bool {
        match (self.first_invariant, self.second_invariant) {
            (true, true) => true,
            (true, false) => !is_assignable_to(db, self.second, self.first, AssignMode::Exact),
            (false, true) => !is_assignable_to(db, self.first, self.second, AssignMode::Exact),
            (false, false) => false,
        }
    }
}

/// Result of extracting connections from one or more (actual, formal) pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Connections {
    pub bindings: Bindings,
    pub conflicts: Vec<Conflict>,
    /// Placeholders whose recorded binding is invariant.
    pub invariant: SmallVec<[Arc<str>; 2]>,
}

impl Connections {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding. `null` binds nothing and `dynamic` never overrides
    /// a concrete binding; a concrete type replaces an earlier `dynamic`.
    pub fn bind(&mut self, name: Arc<str>, ty: TypeId) {
        self.bind_at(name, ty, false);
    }

    /// Record a binding found inside the type arguments of a parameterized type.
    pub fn bind_invariant(&mut self, name: Arc<str>, ty: TypeId) {
        self.bind_at(name, ty, true);
    }

    /// Whether the recorded binding for `name` is invariant.
    #[must_use]
    pub fn is_invariant(&self, name: &str) -> bool {
        self.invariant.iter().any(|n| &**n == name)
    }

    fn bind_at(&mut self, name: Arc<str>, ty: TypeId, invariant: bool) {
        if ty == TypeId::NULL {
            return;
        }
        match self.bindings.get(&name).copied() {
            None => self.record(name, ty, invariant),
            Some(TypeId::DYNAMIC) if ty != TypeId::DYNAMIC => self.record(name, ty, invariant),
            Some(existing) if existing == ty => {
                if invariant && !self.is_invariant(&name) {
                    self.invariant.push(name);
                }
            }
            Some(_) if ty == TypeId::DYNAMIC => {}
            Some(existing) => {
                trace!(placeholder = %name, ?existing, ?ty, invariant, "conflicting connection");
                let first_invariant = self.is_invariant(&name);
                self.conflicts.push(Conflict {
                    placeholder: name,
                    first: existing,
                    second: ty,
                    first_invariant,
                    second_invariant: invariant,
                });
            }
        }
    }

    fn record(&mut self, name: Arc<str>, ty: TypeId, invariant: bool) {
        self.invariant.retain(|n| *n != name);
        if invariant {
            self.invariant.push(name.clone());
        }
        self.bindings.insert(name, ty);
    }

    pub fn merge(&mut self, other: Self) {
        for (name, ty) in other.bindings {
            let invariant = other.invariant.iter().any(|n| *n == name);
            self.bind_at(name, ty, invariant);
        }
        self.conflicts.extend(other.conflicts);
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Conflicts no widening can resolve.
    pub fn violations<'c>(
        &'c self,
        db: &'c dyn TypeDatabase,
    ) -> impl Iterator<Item = &'c Conflict> + 'c {
        self.conflicts.iter().filter(move |c| c.is_violation(db))
    }

    /// Bindings with every conflicting placeholder widened to the least upper
    /// bound of all types seen for it.
    #[must_use]
    pub fn widened_bindings(&self, db: &dyn TypeDatabase) -> Bindings {
        let mut bindings = self.bindings.clone();
        for conflict in &self.conflicts {
            if let Some(current) = bindings.get(&conflict.placeholder).copied() {
                let widened =
                    crate::lub::least_upper_bound(db, &[current, conflict.first, conflict.second]);
                bindings.insert(conflict.placeholder.clone(), widened);
            }
        }
        bindings
    }
}

/// Extract placeholder bindings by walking `formal` against `actual`.
#[must_use]
pub fn extract_connections(db: &dyn TypeDatabase, actual: TypeId, formal: TypeId) -> Connections {
    let mut connections = Connections::new();
    walk(db, actual, formal, &mut connections, false, 0);
    connections
}

fn walk(
    db: &dyn TypeDatabase,
    actual: TypeId,
    formal: TypeId,
    out: &mut Connections,
    invariant: bool,
    depth: u32,
) {
    if depth > MAX_TYPE_WALK_DEPTH || actual == TypeId::NULL {
        return;
    }
    match db.lookup(formal) {
        TypeData::Placeholder(name) => out.bind_at(name, box_type(db, actual), invariant),
        TypeData::Wildcard { upper, lower } => {
            let (actual_upper, actual_lower) = match db.lookup(actual) {
                TypeData::Wildcard { upper, lower } => (upper, lower),
                _ => (Some(actual), Some(actual)),
            };
            if let (Some(upper), Some(actual_upper)) = (upper, actual_upper) {
                walk(db, actual_upper, upper, out, false, depth + 1);
            }
            if let (Some(lower), Some(actual_lower)) = (lower, actual_lower) {
                walk(db, actual_lower, lower, out, false, depth + 1);
            }
        }
        TypeData::Array(formal_component) => {
            if let TypeData::Array(actual_component) = db.lookup(actual) {
                walk(db, actual_component, formal_component, out, invariant, depth + 1);
            }
        }
        TypeData::Class(formal_ref) => {
            if formal_ref.args.is_empty() {
                return;
            }
            if let Some(view) = as_supertype(db, actual, formal_ref.class) {
                if let TypeData::Class(view_ref) = db.lookup(view) {
                    if view_ref.args.len() == formal_ref.args.len() {
                        for (&a, &f) in view_ref.args.iter().zip(formal_ref.args.iter()) {
                            walk(db, a, f, out, true, depth + 1);
                        }
                    }
                }
                return;
            }
            walk_closure_to_sam(db, actual, formal, out, depth);
        }
        TypeData::Union(members) => {
            for member in members {
                walk(db, actual, member, out, invariant, depth + 1);
            }
        }
        TypeData::Primitive(_) | TypeData::Null | TypeData::Dynamic => {}
    }
}

/// `Closure<R>` passed where a single-abstract-method interface is expected:
/// connect `R` with the abstract method's return type.
fn walk_closure_to_sam(
    db: &dyn TypeDatabase,
    actual: TypeId,
    formal: TypeId,
    out: &mut Connections,
    depth: u32,
) {
    let closure = db.well_known().closure;
    let Some(view) = as_supertype(db, actual, closure) else {
        return;
    };
    let closure_return = match db.lookup(view) {
        TypeData::Class(class_ref) => class_ref.args.first().copied(),
        _ => None,
    };
    let Some(closure_return) = closure_return else {
        return;
    };
    let Some(class) = db.class_of(formal) else {
        return;
    };
    let Some(sam) = single_abstract_method(db, class, true) else {
        return;
    };
    let declaring = db.method_def(sam).declaring;
    let Some(formal_view) = as_supertype(db, formal, declaring) else {
        return;
    };
    let bindings = crate::hierarchy::own_bindings(db, formal_view);
    let sam_return = substitute(db, &bindings, db.method_def(sam).return_type);
    walk(db, closure_return, sam_return, out, false, depth + 1);
}

/// Replace bound placeholders in `formal`. Unbound placeholders and wildcards
/// are preserved.
#[must_use]
pub fn substitute(db: &dyn TypeDatabase, bindings: &Bindings, formal: TypeId) -> TypeId {
    if bindings.is_empty() {
        return formal;
    }
    substitute_inner(db, bindings, formal, 0)
}

fn substitute_inner(db: &dyn TypeDatabase, bindings: &Bindings, ty: TypeId, depth: u32) -> TypeId {
    if depth > MAX_TYPE_WALK_DEPTH || ty.0 < TypeId::FIRST_USER {
        return ty;
    }
    match db.lookup(ty) {
        TypeData::Placeholder(name) => bindings.get(&name).copied().unwrap_or(ty),
        TypeData::Class(class_ref) => {
            if class_ref.args.is_empty() {
                return ty;
            }
            let args: SmallVec<[TypeId; 2]> = class_ref
                .args
                .iter()
                .map(|&arg| substitute_inner(db, bindings, arg, depth + 1))
                .collect();
            db.class_type(class_ref.class, &args)
        }
        TypeData::Array(component) => {
            db.array_of(substitute_inner(db, bindings, component, depth + 1))
        }
        TypeData::Wildcard { upper, lower } => db.intern(TypeData::Wildcard {
            upper: upper.map(|u| substitute_inner(db, bindings, u, depth + 1)),
            lower: lower.map(|l| substitute_inner(db, bindings, l, depth + 1)),
        }),
        TypeData::Union(members) => {
            let members: SmallVec<[TypeId; 4]> = members
                .iter()
                .map(|&m| substitute_inner(db, bindings, m, depth + 1))
                .collect();
            crate::lub::union_of(db, &members)
        }
        TypeData::Primitive(_) | TypeData::Null | TypeData::Dynamic => ty,
    }
}

/// Whether a type mentions any placeholder.
#[must_use]
pub fn contains_placeholders(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    contains_placeholders_inner(db, ty, 0)
}

fn contains_placeholders_inner(db: &dyn TypeDatabase, ty: TypeId, depth: u32) -> bool {
    if depth > MAX_TYPE_WALK_DEPTH || ty.0 < TypeId::FIRST_USER {
        return false;
    }
    match db.lookup(ty) {
        TypeData::Placeholder(_) => true,
        TypeData::Class(class_ref) => class_ref
            .args
            .iter()
            .any(|&arg| contains_placeholders_inner(db, arg, depth + 1)),
        TypeData::Array(component) => contains_placeholders_inner(db, component, depth + 1),
        TypeData::Wildcard { upper, lower } => upper
            .into_iter()
            .chain(lower)
            .any(|t| contains_placeholders_inner(db, t, depth + 1)),
        TypeData::Union(members) => members
            .iter()
            .any(|&m| contains_placeholders_inner(db, m, depth + 1)),
        TypeData::Primitive(_) | TypeData::Null | TypeData::Dynamic => false,
    }
}

/// Replace every remaining placeholder with its erasure: the first upper
/// bound declared in `params` (itself erased), or `Object`. A wildcard left
/// at the top level becomes its upper bound.
#[must_use]
pub fn erase_placeholders(db: &dyn TypeDatabase, ty: TypeId, params: &[GenericParam]) -> TypeId {
    let erased = erase_inner(db, ty, params, 0);
    match db.lookup(erased) {
        TypeData::Wildcard { upper, .. } => upper.unwrap_or_else(|| db.object_type()),
        _ => erased,
    }
}

fn erase_inner(db: &dyn TypeDatabase, ty: TypeId, params: &[GenericParam], depth: u32) -> TypeId {
    if depth > MAX_TYPE_WALK_DEPTH {
        return db.object_type();
    }
    if !contains_placeholders(db, ty) {
        return ty;
    }
    match db.lookup(ty) {
        TypeData::Placeholder(name) => params
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.upper_bounds.first().copied())
            .map_or_else(
                || db.object_type(),
                |bound| erase_inner(db, bound, params, depth + 1),
            ),
        TypeData::Class(class_ref) => {
            let args: SmallVec<[TypeId; 2]> = class_ref
                .args
                .iter()
                .map(|&arg| erase_inner(db, arg, params, depth + 1))
                .collect();
            db.class_type(class_ref.class, &args)
        }
        TypeData::Array(component) => db.array_of(erase_inner(db, component, params, depth + 1)),
        TypeData::Wildcard { upper, lower } => db.intern(TypeData::Wildcard {
            upper: upper.map(|u| erase_inner(db, u, params, depth + 1)),
            lower: lower.map(|l| erase_inner(db, l, params, depth + 1)),
        }),
        TypeData::Union(members) => {
            let members: SmallVec<[TypeId; 4]> = members
                .iter()
                .map(|&m| erase_inner(db, m, params, depth + 1))
                .collect();
            crate::lub::union_of(db, &members)
        }
        TypeData::Primitive(_) | TypeData::Null | TypeData::Dynamic => ty,
    }
}

/// A binding that breaks a declared bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundViolation {
    pub placeholder: Arc<str>,
    pub actual: TypeId,
    pub bound: TypeId,
}

/// Check every bound placeholder in `params` against its declared bounds.
#[must_use]
pub fn check_bounds(
    db: &dyn TypeDatabase,
    params: &[GenericParam],
    bindings: &Bindings,
) -> Vec<BoundViolation> {
    let mut violations = Vec::new();
    for param in params {
        let Some(&actual) = bindings.get(&param.name) else {
            continue;
        };
        if actual == TypeId::DYNAMIC || contains_placeholders(db, actual) {
            continue;
        }
        for &bound in &param.upper_bounds {
            let bound = substitute(db, bindings, bound);
            if !is_assignable_to(db, actual, bound, AssignMode::Exact) {
                violations.push(BoundViolation {
                    placeholder: param.name.clone(),
                    actual,
                    bound,
                });
            }
        }
        if let Some(lower) = param.lower_bound {
            let lower = substitute(db, bindings, lower);
            if !is_assignable_to(db, lower, actual, AssignMode::Exact) {
                violations.push(BoundViolation {
                    placeholder: param.name.clone(),
                    actual,
                    bound: lower,
                });
            }
        }
    }
    violations
}

#[cfg(test)]
#[path = "tests/generics_tests.rs"]
mod tests;
