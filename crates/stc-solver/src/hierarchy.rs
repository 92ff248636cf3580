//! Class hierarchy queries.
//!
//! Supertype edges are stored on `ClassDef` in terms of the class's own
//! placeholders; walking them for a parameterized type substitutes the type's
//! arguments along the way. Walks are bounded so a malformed (cyclic)
//! hierarchy handed over by the host cannot hang the checker.

use crate::db::TypeDatabase;
use crate::generics::{Bindings, substitute};
use crate::types::{ClassId, TypeData, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use stc_common::limits::MAX_HIERARCHY_WALK;
use std::collections::VecDeque;

/// Bindings of a class's generic parameters for a class reference.
/// Raw references bind nothing.
#[must_use]
pub fn own_bindings(db: &dyn TypeDatabase, ty: TypeId) -> Bindings {
    let mut bindings = Bindings::default();
    if let TypeData::Class(class_ref) = db.lookup(ty) {
        let def = db.class_def(class_ref.class);
        if class_ref.args.len() == def.type_params.len() {
            for (param, &arg) in def.type_params.iter().zip(class_ref.args.iter()) {
                bindings.insert(param.name.clone(), arg);
            }
        }
    }
    bindings
}

/// Whether a class reference omits the arguments of a generic class.
#[must_use]
pub fn is_raw(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    match db.lookup(ty) {
        TypeData::Class(class_ref) => {
            class_ref.args.is_empty() && !db.class_def(class_ref.class).type_params.is_empty()
        }
        _ => false,
    }
}

fn strip_args(db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
    match db.class_of(ty) {
        Some(class) => db.class_type(class, &[]),
        None => ty,
    }
}

/// Direct supertypes (superclass first, then interfaces) of a class type,
/// with its type arguments substituted. Supertypes of raw types are raw.
#[must_use]
pub fn direct_supertypes(db: &dyn TypeDatabase, ty: TypeId) -> SmallVec<[TypeId; 4]> {
    let mut out = SmallVec::new();
    let TypeData::Class(class_ref) = db.lookup(ty) else {
        return out;
    };
    let def = db.class_def(class_ref.class);
    let raw = class_ref.args.is_empty() && !def.type_params.is_empty();
    let bindings = own_bindings(db, ty);
    for &sup in def.super_class.iter().chain(def.interfaces.iter()) {
        out.push(if raw {
            strip_args(db, sup)
        } else {
            substitute(db, &bindings, sup)
        });
    }
    out
}

/// View `ty` as an instance of `target` (`ArrayList<String>` as `List` gives
/// `List<String>`). Every class and array type is an `Object`.
#[must_use]
pub fn as_supertype(db: &dyn TypeDatabase, ty: TypeId, target: ClassId) -> Option<TypeId> {
    let object = db.well_known().object;
    match db.lookup(ty) {
        TypeData::Class(class_ref) => {
            if class_ref.class == target {
                return Some(ty);
            }
        }
        TypeData::Array(_) | TypeData::Union(_) if target == object => {
            return Some(db.object_type());
        }
        _ => return None,
    }
    if target == object {
        return Some(db.object_type());
    }
    let mut visited = FxHashSet::default();
    let mut queue = VecDeque::from([ty]);
    while let Some(current) = queue.pop_front() {
        if visited.len() > MAX_HIERARCHY_WALK {
            break;
        }
        let Some(class) = db.class_of(current) else {
            continue;
        };
        if class == target {
            return Some(current);
        }
        if !visited.insert(class) {
            continue;
        }
        queue.extend(direct_supertypes(db, current));
    }
    None
}

/// Whether `sub` is `sup` or inherits from it.
#[must_use]
pub fn is_subclass(db: &dyn TypeDatabase, sub: ClassId, sup: ClassId) -> bool {
    if sub == sup || sup == db.well_known().object {
        return true;
    }
    let mut visited = FxHashSet::default();
    let mut stack = vec![sub];
    while let Some(class) = stack.pop() {
        if class == sup {
            return true;
        }
        if !visited.insert(class) || visited.len() > MAX_HIERARCHY_WALK {
            continue;
        }
        let def = db.class_def(class);
        stack.extend(
            def.super_class
                .iter()
                .chain(def.interfaces.iter())
                .filter_map(|&t| db.class_of(t)),
        );
    }
    false
}

/// All classes `class` inherits from, breadth first: the class itself, then
/// superclasses and interfaces level by level. `Object` comes last.
#[must_use]
pub fn ancestors(db: &dyn TypeDatabase, class: ClassId) -> Vec<ClassId> {
    let object = db.well_known().object;
    let mut out = Vec::new();
    let mut visited = FxHashSet::default();
    let mut queue = VecDeque::from([class]);
    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) || visited.len() > MAX_HIERARCHY_WALK {
            continue;
        }
        if current != object {
            out.push(current);
        }
        let def = db.class_def(current);
        queue.extend(
            def.super_class
                .iter()
                .chain(def.interfaces.iter())
                .filter_map(|&t| db.class_of(t)),
        );
    }
    out.push(object);
    out
}

/// Cost of reaching each supertype of `class`.
///
/// The superclass `k` levels up costs `2k + 1`; an interface reached through
/// `i` interface edges from a class at cost `c` costs `c + i`. `Object` always
/// costs more than every other supertype.
#[must_use]
pub fn supertype_distances(db: &dyn TypeDatabase, class: ClassId) -> FxHashMap<ClassId, u32> {
    let object = db.well_known().object;
    let mut dist: FxHashMap<ClassId, u32> = FxHashMap::default();
    let mut chain_seen = FxHashSet::default();
    let mut current = Some(class);
    let mut level = 0u32;
    while let Some(c) = current {
        if !chain_seen.insert(c) || chain_seen.len() > MAX_HIERARCHY_WALK {
            break;
        }
        let cost = if level == 0 { 0 } else { 2 * level + 1 };
        let entry = dist.entry(c).or_insert(cost);
        *entry = (*entry).min(cost);

        let def = db.class_def(c);
        let mut queue: VecDeque<(ClassId, u32)> = def
            .interfaces
            .iter()
            .filter_map(|&t| db.class_of(t))
            .map(|iface| (iface, cost + 1))
            .collect();
        let mut steps = 0usize;
        while let Some((iface, d)) = queue.pop_front() {
            steps += 1;
            if steps > MAX_HIERARCHY_WALK {
                break;
            }
            if dist.get(&iface).is_some_and(|&old| old <= d) {
                continue;
            }
            dist.insert(iface, d);
            for &sup in &db.class_def(iface).interfaces {
                if let Some(sup) = db.class_of(sup) {
                    queue.push_back((sup, d + 1));
                }
            }
        }

        current = def.super_class.and_then(|t| db.class_of(t));
        level += 1;
    }
    if class != object {
        let farthest = dist
            .iter()
            .filter(|(c, _)| **c != object)
            .map(|(_, d)| *d)
            .max()
            .unwrap_or(0);
        let via_chain = dist.get(&object).copied().unwrap_or(0);
        dist.insert(object, via_chain.max(farthest + 1));
    }
    dist
}

/// Cost of reaching `sup` from `sub`, if it is a supertype.
#[must_use]
pub fn class_distance(db: &dyn TypeDatabase, sub: ClassId, sup: ClassId) -> Option<u32> {
    if sub == sup {
        return Some(0);
    }
    supertype_distances(db, sub).get(&sup).copied()
}

/// Specificity of a class: superclass hops to `Object` for classes, longest
/// interface chain for interfaces.
#[must_use]
pub fn class_depth(db: &dyn TypeDatabase, class: ClassId) -> u32 {
    let object = db.well_known().object;
    let def = db.class_def(class);
    if def.is_interface() {
        return interface_depth(db, class, 0);
    }
    let mut depth = 0;
    let mut current = class;
    while current != object && depth < MAX_HIERARCHY_WALK as u32 {
        depth += 1;
        match db.class_def(current).super_class.and_then(|t| db.class_of(t)) {
            Some(next) => current = next,
            None => break,
        }
    }
    depth
}

fn interface_depth(db: &dyn TypeDatabase, iface: ClassId, guard: u32) -> u32 {
    if guard > stc_common::limits::MAX_TYPE_WALK_DEPTH {
        return 1;
    }
    1 + db
        .class_def(iface)
        .interfaces
        .iter()
        .filter_map(|&t| db.class_of(t))
        .map(|sup| interface_depth(db, sup, guard + 1))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "tests/hierarchy_tests.rs"]
mod tests;
