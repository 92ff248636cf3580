//! Least upper bound of a set of types.
//!
//! Used wherever control flow merges: branch assignments, ternaries, closure
//! return statements, list literal elements. The result is independent of the
//! input order and `lub([T]) == T`.

use crate::assignability::{AssignMode, is_assignable_to};
use crate::db::TypeDatabase;
use crate::hierarchy::as_supertype;
use crate::numeric::box_type;
use crate::types::{TypeData, TypeId};
use smallvec::SmallVec;
use tracing::trace;

/// Intern a normalized union of `members`.
#[must_use]
pub fn union_of(db: &dyn TypeDatabase, members: &[TypeId]) -> TypeId {
    let mut flat: SmallVec<[TypeId; 4]> = SmallVec::new();
    for &member in members {
        match db.lookup(member) {
            TypeData::Union(inner) => flat.extend(inner),
            _ => flat.push(member),
        }
    }
    flat.sort_unstable();
    flat.dedup();
    match flat.len() {
        0 => TypeId::NULL,
        1 => flat[0],
        _ => db.intern(TypeData::Union(flat)),
    }
}

/// Members of a union, or the type itself.
#[must_use]
pub fn union_members(db: &dyn TypeDatabase, ty: TypeId) -> SmallVec<[TypeId; 4]> {
    match db.lookup(ty) {
        TypeData::Union(members) => members,
        _ => SmallVec::from_slice(&[ty]),
    }
}

/// The most specific type every member of `types` is assignable to.
///
/// Identical inputs collapse to themselves (`lub([int, int]) == int`). Otherwise
/// primitives are boxed and `null` is dropped; a member that is a supertype of
/// all others wins, then the nearest common superclass other than `Object`.
/// With no such class a synthetic union of all members is returned.
#[must_use]
pub fn least_upper_bound(db: &dyn TypeDatabase, types: &[TypeId]) -> TypeId {
    let mut flat: SmallVec<[TypeId; 4]> = SmallVec::new();
    for &ty in types {
        flat.extend(union_members(db, ty));
    }
    if flat.is_empty() {
        return TypeId::NULL;
    }
    if flat.contains(&TypeId::DYNAMIC) {
        return TypeId::DYNAMIC;
    }
    flat.sort_unstable();
    flat.dedup();
    let non_null: SmallVec<[TypeId; 4]> = flat
        .iter()
        .copied()
        .filter(|&t| t != TypeId::NULL)
        .collect();
    match non_null.len() {
        0 => return TypeId::NULL,
        // `null` alongside a primitive forces the wrapper.
        1 if flat.len() == 1 => return non_null[0],
        1 => return box_type(db, non_null[0]),
        _ => {}
    }

    let mut boxed: SmallVec<[TypeId; 4]> = non_null.iter().map(|&t| box_type(db, t)).collect();
    boxed.sort_unstable();
    boxed.dedup();
    if boxed.len() == 1 {
        return boxed[0];
    }

    // A member every other member is assignable to.
    if let Some(&top) = boxed.iter().find(|&&candidate| {
        boxed
            .iter()
            .all(|&other| is_assignable_to(db, other, candidate, AssignMode::Exact))
    }) {
        return top;
    }

    if let Some(common) = common_superclass(db, &boxed) {
        trace!(?boxed, ?common, "lub: common superclass");
        return common;
    }

    if let Some(array) = common_array(db, &boxed) {
        return array;
    }

    union_of(db, &boxed)
}

/// Nearest superclass (not `Object`) shared by every member. Type arguments
/// are kept when all members agree on them.
fn common_superclass(db: &dyn TypeDatabase, members: &[TypeId]) -> Option<TypeId> {
    let object = db.well_known().object;
    let first_class = db.class_of(members[0])?;
    let mut current = Some(first_class);
    let mut guard = 0usize;
    while let Some(class) = current {
        guard += 1;
        if class == object || guard > stc_common::limits::MAX_HIERARCHY_WALK {
            return None;
        }
        let views: Option<SmallVec<[TypeId; 4]>> = members
            .iter()
            .map(|&m| as_supertype(db, m, class))
            .collect();
        if let Some(views) = views {
            let first = views[0];
            return Some(if views.iter().all(|&v| v == first) {
                first
            } else {
                db.class_type(class, &[])
            });
        }
        current = db.class_def(class).super_class.and_then(|t| db.class_of(t));
    }
    None
}

fn common_array(db: &dyn TypeDatabase, members: &[TypeId]) -> Option<TypeId> {
    let components: Option<SmallVec<[TypeId; 4]>> = members
        .iter()
        .map(|&m| match db.lookup(m) {
            TypeData::Array(c) if !c.is_primitive() => Some(c),
            _ => None,
        })
        .collect();
    let components = components?;
    let component = least_upper_bound(db, &components);
    match db.lookup(component) {
        TypeData::Union(_) => None,
        _ => Some(db.array_of(component)),
    }
}

#[cfg(test)]
#[path = "tests/lub_tests.rs"]
mod tests;
