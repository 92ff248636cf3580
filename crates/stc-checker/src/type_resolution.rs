//! Mapping source type annotations to interned types.

use crate::state::CheckerState;
use stc_ast::{NodeIndex, TypeRef};
use stc_common::diagnostics::diagnostic_codes;
use stc_solver::{PrimitiveKind, TypeData, TypeDatabase, TypeId};
use std::sync::Arc;

/// Resolve `ty` against the declared classes, with `type_params` naming the
/// placeholders in scope. A diamond resolves to the raw class.
///
/// # Errors
/// The first class name that does not resolve.
pub fn resolve_type_ref(
    db: &dyn TypeDatabase,
    ty: &TypeRef,
    type_params: &[Arc<str>],
) -> Result<TypeId, String> {
    match ty {
        TypeRef::Named { name, args, .. } => {
            if args.is_empty() {
                if name == "def" || name == "var" {
                    return Ok(TypeId::DYNAMIC);
                }
                if let Some(kind) = PrimitiveKind::from_name(name) {
                    return Ok(kind.type_id());
                }
                if type_params.iter().any(|p| **p == **name) {
                    return Ok(db.placeholder(name));
                }
            }
            let class = db.class_by_name(name).ok_or_else(|| name.clone())?;
            let args = args
                .iter()
                .map(|arg| resolve_type_ref(db, arg, type_params))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(db.class_type(class, &args))
        }
        TypeRef::Array(component) => {
            let component = resolve_type_ref(db, component, type_params)?;
            Ok(db.array_of(component))
        }
        TypeRef::Wildcard { upper, lower } => {
            let upper = upper
                .as_deref()
                .map(|u| resolve_type_ref(db, u, type_params))
                .transpose()?;
            let lower = lower
                .as_deref()
                .map(|l| resolve_type_ref(db, l, type_params))
                .transpose()?;
            Ok(db.intern(TypeData::Wildcard { upper, lower }))
        }
    }
}

impl<'a> CheckerState<'a> {
    /// Resolve an annotation at `idx`, reporting unknown classes there.
    pub(crate) fn resolve_type_at(&mut self, ty: &TypeRef, idx: NodeIndex) -> TypeId {
        let params = self.ctx.type_params_in_scope();
        match resolve_type_ref(self.ctx.db, ty, &params) {
            Ok(resolved) => resolved,
            Err(name) => {
                self.error_at_node(idx, diagnostic_codes::UNABLE_TO_RESOLVE_CLASS, &[&name]);
                TypeId::DYNAMIC
            }
        }
    }

    /// Resolve an optional annotation; `None` means `def`.
    pub(crate) fn resolve_optional_type(&mut self, ty: Option<&TypeRef>, idx: NodeIndex) -> TypeId {
        ty.map_or(TypeId::DYNAMIC, |ty| self.resolve_type_at(ty, idx))
    }
}

#[cfg(test)]
#[path = "tests/type_resolution_tests.rs"]
mod tests;
