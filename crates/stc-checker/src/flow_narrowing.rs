//! `instanceof` narrowing and assignment tracking across branches and loops.
//!
//! Narrowing: a condition's `instanceof` tests become facts in a temporary
//! type info frame that lives exactly as long as the guarded region. Negated
//! tests apply to the else branch.
//!
//! Tracking: a tracked construct reports the assignments of each path through
//! it. After the visit, every variable assigned on some path gets the least
//! upper bound of everything it may hold; a path that does not assign it
//! contributes the type it had before the construct. If a merged type differs
//! from the type before the construct the construct is visited once more with
//! the merged types in place, and the first visit's diagnostics are dropped.

use crate::context::AssignmentFrame;
use crate::state::{CheckerState, VisitResult};
use crate::type_resolution::resolve_type_ref;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use stc_ast::{BinaryOp, NodeIndex, NodeKind, UnaryOp};
use stc_solver::{TypeId, least_upper_bound};
use tracing::debug;

/// Narrowing facts, in the order they were found.
pub(crate) type Facts = SmallVec<[(String, TypeId); 2]>;

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Narrowing
    // =========================================================================

    /// Facts that hold when `condition` evaluates to `!negated`.
    pub(crate) fn instanceof_facts(&self, condition: NodeIndex, negated: bool) -> Facts {
        let mut facts = Facts::new();
        self.collect_facts(condition, negated, &mut facts);
        facts
    }

    fn collect_facts(&self, condition: NodeIndex, negated: bool, out: &mut Facts) {
        let arena = self.ctx.arena;
        match arena.kind(condition) {
            Some(NodeKind::Binary { op, left, right }) => match op {
                BinaryOp::InstanceOf if !negated => self.push_instanceof(*left, *right, out),
                BinaryOp::NotInstanceOf if negated => self.push_instanceof(*left, *right, out),
                BinaryOp::And if !negated => {
                    self.collect_facts(*left, false, out);
                    self.collect_facts(*right, false, out);
                }
                BinaryOp::Or if negated => {
                    self.collect_facts(*left, true, out);
                    self.collect_facts(*right, true, out);
                }
                _ => {}
            },
            Some(NodeKind::Unary {
                op: UnaryOp::Not,
                operand,
            }) => self.collect_facts(*operand, !negated, out),
            _ => {}
        }
    }

    fn push_instanceof(&self, subject: NodeIndex, class: NodeIndex, out: &mut Facts) {
        let arena = self.ctx.arena;
        let name = match arena.kind(subject) {
            Some(NodeKind::Variable { name }) => name.clone(),
            Some(NodeKind::This) => "this".to_string(),
            _ => return,
        };
        let Some(NodeKind::ClassLiteral { ty }) = arena.kind(class) else {
            return;
        };
        let params = self.ctx.type_params_in_scope();
        if let Ok(ty) = resolve_type_ref(self.ctx.db, ty, &params) {
            if ty != TypeId::DYNAMIC {
                out.push((name, ty));
            }
        }
    }

    /// Visit `body` with `facts` in a fresh temporary type info frame.
    pub(crate) fn with_facts<T>(
        &mut self,
        facts: &Facts,
        body: impl FnOnce(&mut Self) -> VisitResult<T>,
    ) -> VisitResult<T> {
        self.ctx.push_type_info();
        for (name, ty) in facts {
            self.ctx.add_type_fact(name, *ty);
        }
        let result = body(self);
        self.ctx.pop_type_info();
        result
    }

    /// Visit one path of a tracked construct, returning its assignments.
    pub(crate) fn tracked_path(
        &mut self,
        facts: &Facts,
        body: impl FnOnce(&mut Self) -> VisitResult<()>,
    ) -> VisitResult<AssignmentFrame> {
        self.ctx.push_tracking();
        let result = self.with_facts(facts, body);
        let frame = self.ctx.pop_tracking();
        result.map(|()| frame)
    }

    // =========================================================================
    // Assignment tracking
    // =========================================================================

    /// Visit a tracked construct. `visit` returns the assignments of every
    /// path through the construct, including paths that skip it.
    pub(crate) fn with_assignment_tracking(
        &mut self,
        node: NodeIndex,
        mut visit: impl FnMut(&mut Self) -> VisitResult<Vec<AssignmentFrame>>,
    ) -> VisitResult<()> {
        let before = self.ctx.visible_variable_types();
        let mark = self.ctx.errors.mark();
        let paths = visit(self)?;
        let merged = self.merge_paths(&before, &paths);
        let changed = merged
            .iter()
            .any(|(name, ty)| before.get(name) != Some(ty));

        if changed && self.ctx.options.second_pass {
            debug!(node = node.0, variables = merged.len(), "re-visiting construct with merged types");
            self.ctx.errors.rollback(mark);
            for (name, &ty) in &merged {
                self.ctx.set_variable_type(name, ty);
            }
            let start = self.ctx.visible_variable_types();
            let paths = visit(self)?;
            let merged = self.merge_paths(&start, &paths);
            for (name, &ty) in &merged {
                self.ctx.set_variable_type(name, ty);
            }
        } else {
            for (name, &ty) in &merged {
                self.ctx.set_variable_type(name, ty);
            }
        }
        Ok(())
    }

    /// Merged type of every variable declared before the construct and
    /// assigned on at least one path.
    fn merge_paths(
        &self,
        before: &FxHashMap<String, TypeId>,
        paths: &[AssignmentFrame],
    ) -> FxHashMap<String, TypeId> {
        let mut merged = FxHashMap::default();
        for (name, &start) in before {
            if !paths.iter().any(|p| p.contains_key(name)) {
                continue;
            }
            let mut types: SmallVec<[TypeId; 4]> = SmallVec::new();
            for path in paths {
                match path.get(name) {
                    Some(assigned) => types.extend(assigned.iter().copied()),
                    None => types.push(start),
                }
            }
            merged.insert(name.clone(), least_upper_bound(self.ctx.db, &types));
        }
        merged
    }
}

#[cfg(test)]
#[path = "tests/flow_narrowing_tests.rs"]
mod tests;
