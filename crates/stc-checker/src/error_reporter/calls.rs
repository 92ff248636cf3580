//! Call, operator and generics error reporting (1101-1104, 1301, 1401-1403).

use crate::diagnostics::diagnostic_codes;
use crate::state::CheckerState;
use stc_ast::NodeIndex;
use stc_solver::resolution::describe_candidates;
use stc_solver::{BoundViolation, Conflict, MethodMatch, TypeId};

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Method Resolution Errors
    // =========================================================================

    pub(crate) fn error_no_matching_method(
        &mut self,
        receiver: TypeId,
        name: &str,
        args: &[TypeId],
        idx: NodeIndex,
    ) {
        let receiver = self.type_to_string(receiver);
        let args = self.types_to_string(args);
        self.error_at_node(
            idx,
            diagnostic_codes::CANNOT_FIND_MATCHING_METHOD,
            &[&receiver, name, &args],
        );
    }

    pub(crate) fn error_no_matching_constructor(&mut self, class: TypeId, args: &[TypeId], idx: NodeIndex) {
        let class = self.type_to_string(class);
        let args = self.types_to_string(args);
        self.error_at_node(
            idx,
            diagnostic_codes::CANNOT_FIND_MATCHING_CONSTRUCTOR,
            &[&class, &args],
        );
    }

    pub(crate) fn error_ambiguous_method(&mut self, candidates: &[MethodMatch], idx: NodeIndex) {
        let described = describe_candidates(self.ctx.db, candidates);
        self.error_at_node(
            idx,
            diagnostic_codes::REFERENCE_TO_METHOD_IS_AMBIGUOUS,
            &[&described],
        );
    }

    pub(crate) fn error_static_context(&mut self, receiver: TypeId, name: &str, idx: NodeIndex) {
        let receiver = self.type_to_string(receiver);
        self.error_at_node(
            idx,
            diagnostic_codes::NON_STATIC_METHOD_FROM_STATIC_CONTEXT,
            &[&receiver, name],
        );
    }

    // =========================================================================
    // Operators
    // =========================================================================

    pub(crate) fn error_operator(&mut self, op: &str, left: TypeId, right: TypeId, idx: NodeIndex) {
        let left = self.type_to_string(left);
        let right = self.type_to_string(right);
        self.error_at_node(
            idx,
            diagnostic_codes::CANNOT_APPLY_OPERATOR,
            &[op, &left, &right],
        );
    }

    // =========================================================================
    // Generics
    // =========================================================================

    /// Report the first violated bound; later ones at the same node would be
    /// dropped by position deduplication anyway.
    pub(crate) fn error_bound_violations(&mut self, violations: &[BoundViolation], idx: NodeIndex) {
        let Some(first) = violations.first() else {
            return;
        };
        let actual = self.type_to_string(first.actual);
        let bound = self.type_to_string(first.bound);
        self.error_at_node(
            idx,
            diagnostic_codes::TYPE_DOES_NOT_SATISFY_BOUND,
            &[&actual, &bound, &first.placeholder],
        );
    }

    /// Two arguments bind one placeholder to types no widening reconciles.
    pub(crate) fn error_generic_conflict(&mut self, conflict: &Conflict, idx: NodeIndex) {
        let (source, target) = if conflict.first_invariant && !conflict.second_invariant {
            (conflict.second, conflict.first)
        } else {
            (conflict.first, conflict.second)
        };
        let source = self.type_to_string(source);
        let target = self.type_to_string(target);
        self.error_at_node(
            idx,
            diagnostic_codes::INCOMPATIBLE_GENERIC_ARGUMENT_TYPES,
            &[&source, &target],
        );
    }

    pub(crate) fn error_diamond_inference(&mut self, class: TypeId, target: Option<TypeId>, idx: NodeIndex) {
        let class = self.type_to_string(class);
        let target = target.map_or_else(|| "<none>".to_string(), |t| self.type_to_string(t));
        self.error_at_node(
            idx,
            diagnostic_codes::CANNOT_INFER_DIAMOND_TYPE,
            &[&class, &target],
        );
    }
}
