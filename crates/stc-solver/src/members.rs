//! Property and field lookup on a receiver type.
//!
//! A property access `x.foo` is answered, in order, by a map key (for maps),
//! the array `length`, a declared property or field, and finally a JavaBean
//! getter (`getFoo`/`isFoo`). The lookup walks the receiver's ancestry most
//! derived first and substitutes the receiver's type arguments.

use crate::db::TypeDatabase;
use crate::hierarchy::{ancestors, as_supertype, own_bindings};
use crate::generics::substitute;
use crate::numeric::box_type;
use crate::types::{ClassId, MemberFlags, MethodId, TypeData, TypeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertySource {
    Property,
    Field,
    Getter,
    ArrayLength,
    MapKey,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyInfo {
    pub ty: TypeId,
    pub read_only: bool,
    pub is_static: bool,
    pub source: PropertySource,
    pub declaring: Option<ClassId>,
    pub getter: Option<MethodId>,
}

/// `foo` -> `Foo`.
#[must_use]
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Property named by an accessor suffix: `Foo` -> `foo`, `URL` -> `URL`.
#[must_use]
pub fn decapitalize(suffix: &str) -> Option<String> {
    let mut chars = suffix.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    if chars.next().is_some_and(char::is_uppercase) {
        return Some(suffix.to_owned());
    }
    Some(first.to_lowercase().chain(suffix.chars().skip(1)).collect())
}

/// A declared property or field named `name`, most derived first.
#[must_use]
pub fn find_field_or_property(
    db: &dyn TypeDatabase,
    receiver: TypeId,
    name: &str,
    static_only: bool,
) -> Option<PropertyInfo> {
    let receiver = box_type(db, receiver);
    let class = db.class_of(receiver)?;
    for ancestor in ancestors(db, class) {
        let Some(view) = as_supertype(db, receiver, ancestor) else {
            continue;
        };
        let bindings = own_bindings(db, view);
        let def = db.class_def(ancestor);
        let found = def
            .properties
            .iter()
            .find(|p| &*p.name == name)
            .map(|p| (p.ty, p.flags, PropertySource::Property))
            .or_else(|| {
                def.fields
                    .iter()
                    .find(|f| &*f.name == name)
                    .map(|f| (f.ty, f.flags, PropertySource::Field))
            });
        if let Some((ty, flags, source)) = found {
            let is_static = flags.contains(MemberFlags::STATIC);
            if static_only && !is_static {
                continue;
            }
            return Some(PropertyInfo {
                ty: substitute(db, &bindings, ty),
                read_only: flags.contains(MemberFlags::FINAL),
                is_static,
                source,
                declaring: Some(ancestor),
                getter: None,
            });
        }
    }
    None
}

fn find_accessor(
    db: &dyn TypeDatabase,
    receiver: TypeId,
    method_name: &str,
    arity: usize,
    static_only: bool,
) -> Option<(MethodId, TypeId, ClassId)> {
    let class = db.class_of(receiver)?;
    for ancestor in ancestors(db, class) {
        for &method_id in &db.class_def(ancestor).methods {
            let method = db.method_def(method_id);
            if &*method.name != method_name
                || method.params.len() != arity
                || (static_only && !method.is_static())
            {
                continue;
            }
            let view = as_supertype(db, receiver, ancestor)?;
            let ret = substitute(db, &own_bindings(db, view), method.return_type);
            return Some((method_id, ret, ancestor));
        }
    }
    None
}

/// Resolve `receiver.name` as a property read.
#[must_use]
pub fn lookup_property(
    db: &dyn TypeDatabase,
    receiver: TypeId,
    name: &str,
    static_only: bool,
) -> Option<PropertyInfo> {
    let wk = db.well_known();
    if let TypeData::Array(_) = db.lookup(receiver) {
        return (name == "length").then_some(PropertyInfo {
            ty: TypeId::INT,
            read_only: true,
            is_static: false,
            source: PropertySource::ArrayLength,
            declaring: None,
            getter: None,
        });
    }
    let receiver = box_type(db, receiver);
    if !static_only {
        if let Some(view) = as_supertype(db, receiver, wk.map) {
            let value = match db.lookup(view) {
                TypeData::Class(map_ref) if map_ref.args.len() == 2 => map_ref.args[1],
                _ => db.object_type(),
            };
            return Some(PropertyInfo {
                ty: value,
                read_only: false,
                is_static: false,
                source: PropertySource::MapKey,
                declaring: Some(wk.map),
                getter: None,
            });
        }
    }
    if let Some(info) = find_field_or_property(db, receiver, name, static_only) {
        return Some(info);
    }

    let cap = capitalize(name);
    let getter = find_accessor(db, receiver, &format!("get{cap}"), 0, static_only).or_else(|| {
        find_accessor(db, receiver, &format!("is{cap}"), 0, static_only)
            .filter(|(_, ty, _)| box_type(db, *ty) == db.class_type(wk.boolean, &[]))
    });
    let (method, ty, declaring) = getter?;
    let has_setter = find_accessor(db, receiver, &format!("set{cap}"), 1, static_only).is_some();
    Some(PropertyInfo {
        ty,
        read_only: !has_setter,
        is_static: db.method_def(method).is_static(),
        source: PropertySource::Getter,
        declaring: Some(declaring),
        getter: Some(method),
    })
}

#[cfg(test)]
#[path = "tests/members_tests.rs"]
mod tests;
