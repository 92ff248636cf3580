//! Human-readable type names for diagnostics.

use crate::db::TypeDatabase;
use crate::types::{TypeData, TypeId};

/// Render a type the way diagnostics print it (`java.util.List<java.lang.String>`).
#[must_use]
pub fn format_type(db: &dyn TypeDatabase, ty: TypeId) -> String {
    let mut out = String::new();
    write_type(db, ty, &mut out, 0);
    out
}

/// Render a parameter list as `int, java.lang.String`.
#[must_use]
pub fn format_type_list(db: &dyn TypeDatabase, types: &[TypeId]) -> String {
    let mut out = String::new();
    for (i, &ty) in types.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_type(db, ty, &mut out, 0);
    }
    out
}

fn write_type(db: &dyn TypeDatabase, ty: TypeId, out: &mut String, depth: u32) {
    if depth > stc_common::limits::MAX_TYPE_WALK_DEPTH {
        out.push_str("...");
        return;
    }
    match db.lookup(ty) {
        TypeData::Primitive(kind) => out.push_str(kind.name()),
        TypeData::Class(class_ref) => {
            out.push_str(&db.class_def(class_ref.class).name);
            if !class_ref.args.is_empty() {
                out.push('<');
                for (i, &arg) in class_ref.args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_type(db, arg, out, depth + 1);
                }
                out.push('>');
            }
        }
        TypeData::Array(component) => {
            write_type(db, component, out, depth + 1);
            out.push_str("[]");
        }
        TypeData::Placeholder(name) => out.push_str(&name),
        TypeData::Wildcard { upper, lower } => {
            out.push('?');
            if let Some(upper) = upper {
                out.push_str(" extends ");
                write_type(db, upper, out, depth + 1);
            } else if let Some(lower) = lower {
                out.push_str(" super ");
                write_type(db, lower, out, depth + 1);
            }
        }
        TypeData::Union(members) => {
            out.push('(');
            for (i, &member) in members.iter().enumerate() {
                if i > 0 {
                    out.push_str(" | ");
                }
                write_type(db, member, out, depth + 1);
            }
            out.push(')');
        }
        TypeData::Null => out.push_str("<null>"),
        TypeData::Dynamic => out.push_str(&db.class_def(db.well_known().object).name),
    }
}
