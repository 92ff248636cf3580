//! Closure literals.
//!
//! A closure is typed as `Closure<R>` where `R` is the least upper bound of
//! its `return` statements and its last expression. Parameter types come from
//! the closure's own declarations, else from the hints of the method it is
//! passed to, else `Object`.

use crate::context::{ClosureFrame, DelegationFrame};
use crate::state::{CheckerState, VisitResult};
use smallvec::SmallVec;
use stc_ast::{NodeIndex, NodeKind, Param};
use stc_solver::{ClosureParamTypes, DelegationStrategy, TypeId};
use tracing::trace;

impl<'a> CheckerState<'a> {
    pub(crate) fn visit_closure(
        &mut self,
        idx: NodeIndex,
        hints: Option<ClosureParamTypes>,
        delegation: Option<(TypeId, DelegationStrategy)>,
    ) -> VisitResult {
        let db = self.ctx.db;
        let arena = self.ctx.arena;
        let Some(NodeKind::Closure { params, body }) = arena.kind(idx) else {
            return Ok(TypeId::DYNAMIC);
        };
        let before = self.ctx.depths();
        let (delegate, strategy) = match delegation {
            Some((delegate, strategy)) => (Some(delegate), strategy),
            None => (None, DelegationStrategy::default()),
        };
        self.ctx.delegation_chain.push(DelegationFrame { delegate, strategy });
        self.ctx.enclosing_closures.push(ClosureFrame {
            node: idx,
            returns: SmallVec::new(),
        });
        self.ctx.push_scope();

        let param_types = self.declare_closure_parameters(idx, params.as_deref(), hints.as_ref());
        trace!(node = idx.0, params = param_types.len(), "visiting closure");
        self.ctx.metadata.set_closure_arg_types(idx, param_types);
        let visited = self.check_statement(*body);
        let implicit = self.implicit_return(*body);

        self.ctx.pop_scope();
        let frame = self.ctx.enclosing_closures.pop();
        self.ctx.delegation_chain.pop();
        visited?;
        self.ctx.ensure_balanced(before)?;

        let mut returns: SmallVec<[TypeId; 4]> = frame.map(|f| f.returns).unwrap_or_default();
        returns.extend(implicit.map(|(ty, _)| ty));
        let ret = self.merge_return_types(&returns);
        self.ctx.metadata.store_return_type(db, idx, ret);
        let ty = db.class_type(db.well_known().closure, &[ret]);
        self.ctx.metadata.store_type(db, idx, ty);
        Ok(ty)
    }

    /// Declare the closure's parameters in the current scope and return their
    /// types. A closure without a parameter list gets an implicit `it`.
    fn declare_closure_parameters(
        &mut self,
        idx: NodeIndex,
        params: Option<&[Param]>,
        hints: Option<&ClosureParamTypes>,
    ) -> Vec<TypeId> {
        let db = self.ctx.db;
        let count = params.map_or(1, <[Param]>::len);
        let hint = |i: usize| -> Option<TypeId> {
            match hints? {
                ClosureParamTypes::Fixed(types) => types.get(i).copied(),
                ClosureParamTypes::MapEntry { key, value, entry } => match (count, i) {
                    (2, 0) => Some(*key),
                    (2, 1) => Some(*value),
                    (_, 0) => Some(*entry),
                    _ => None,
                },
            }
        };

        let Some(params) = params else {
            if !self.ctx.options.implicit_it {
                return Vec::new();
            }
            let it = hint(0).unwrap_or_else(|| db.object_type());
            self.ctx.declare_variable("it", it, it);
            return vec![it];
        };

        let mut types = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            let ty = match &param.ty {
                Some(declared) => self.resolve_type_at(declared, idx),
                None => hint(i).unwrap_or_else(|| db.object_type()),
            };
            self.ctx.declare_variable(&param.name, ty, ty);
            types.push(ty);
        }
        types
    }
}

#[cfg(test)]
#[path = "tests/closure_checker_tests.rs"]
mod tests;
