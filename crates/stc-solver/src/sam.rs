//! Single-abstract-method (functional) type detection.

use crate::db::TypeDatabase;
use crate::hierarchy::ancestors;
use crate::types::{ClassId, ClassKind, MethodId};
use rustc_hash::FxHashMap;

/// Abstract methods re-declared from `Object` do not count towards the single
/// abstract method.
fn is_object_method(name: &str, arity: usize) -> bool {
    matches!((name, arity), ("equals", 1) | ("hashCode", 0) | ("toString", 0))
}

/// The single abstract method of `class`, if it has exactly one.
///
/// Interfaces always qualify; abstract classes only when
/// `allow_abstract_class` is set (closure coercion to abstract classes is a
/// coercion-mode feature).
#[must_use]
pub fn single_abstract_method(
    db: &dyn TypeDatabase,
    class: ClassId,
    allow_abstract_class: bool,
) -> Option<MethodId> {
    match db.class_def(class).kind {
        ClassKind::Interface => {}
        ClassKind::AbstractClass if allow_abstract_class => {}
        _ => return None,
    }
    let object = db.well_known().object;
    // (name, arity) -> (method, is_abstract); the most derived declaration wins.
    let mut seen: FxHashMap<(&str, usize), (MethodId, bool)> = FxHashMap::default();
    for ancestor in ancestors(db, class) {
        if ancestor == object {
            continue;
        }
        for &method_id in &db.class_def(ancestor).methods {
            let method = db.method_def(method_id);
            if method.is_static() || is_object_method(&method.name, method.params.len()) {
                continue;
            }
            seen.entry((&method.name, method.params.len()))
                .or_insert((method_id, method.is_abstract()));
        }
    }
    let mut abstract_methods = seen.values().filter(|(_, is_abstract)| *is_abstract);
    let (first, _) = abstract_methods.next()?;
    if abstract_methods.next().is_some() {
        return None;
    }
    Some(*first)
}

/// Whether `class` is a functional type a closure can be coerced to.
#[must_use]
pub fn is_sam_type(db: &dyn TypeDatabase, class: ClassId, allow_abstract_class: bool) -> bool {
    single_abstract_method(db, class, allow_abstract_class).is_some()
}
