//! Assignment, return and cast error reporting (1003, 1201-1203, 1401) plus
//! unresolved names (1001, 1002).

use crate::diagnostics::diagnostic_codes;
use crate::state::CheckerState;
use stc_ast::NodeIndex;
use stc_solver::{TypeData, TypeId};
use tracing::trace;

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Assignment Errors
    // =========================================================================

    /// Report that `value` cannot be stored in a slot of type `target`.
    ///
    /// When both sides are the same generic class the message names the
    /// generic arguments (1401); otherwise it is a plain mismatch (1201).
    pub(crate) fn error_incompatible_assignment(
        &mut self,
        value: TypeId,
        target: TypeId,
        idx: NodeIndex,
    ) {
        let source_text = self.type_to_string(value);
        let target_text = self.type_to_string(target);
        if self.same_class_different_arguments(value, target) {
            trace!(%source_text, %target_text, "generic argument mismatch");
            self.error_at_node(
                idx,
                diagnostic_codes::INCOMPATIBLE_GENERIC_ARGUMENT_TYPES,
                &[&source_text, &target_text],
            );
        } else {
            self.error_at_node(
                idx,
                diagnostic_codes::CANNOT_ASSIGN_VALUE_OF_TYPE,
                &[&source_text, &target_text],
            );
        }
    }

    fn same_class_different_arguments(&self, value: TypeId, target: TypeId) -> bool {
        let db = self.ctx.db;
        match (db.lookup(value), db.lookup(target)) {
            (TypeData::Class(v), TypeData::Class(t)) => {
                v.class == t.class && !t.args.is_empty() && v.args != t.args
            }
            _ => false,
        }
    }

    pub(crate) fn error_incompatible_return(&mut self, value: TypeId, declared: TypeId, idx: NodeIndex) {
        let value = self.type_to_string(value);
        let declared = self.type_to_string(declared);
        self.error_at_node(
            idx,
            diagnostic_codes::CANNOT_RETURN_VALUE_OF_TYPE,
            &[&value, &declared],
        );
    }

    pub(crate) fn error_inconvertible_cast(&mut self, source: TypeId, target: TypeId, idx: NodeIndex) {
        let source = self.type_to_string(source);
        let target = self.type_to_string(target);
        self.error_at_node(
            idx,
            diagnostic_codes::INCONVERTIBLE_TYPES_CANNOT_CAST,
            &[&source, &target],
        );
    }

    pub(crate) fn error_read_only_property(&mut self, name: &str, idx: NodeIndex) {
        self.error_at_node(idx, diagnostic_codes::CANNOT_SET_READ_ONLY_PROPERTY, &[name]);
    }

    // =========================================================================
    // Unresolved Names
    // =========================================================================

    pub(crate) fn error_undeclared_variable(&mut self, name: &str, idx: NodeIndex) {
        self.error_at_node(idx, diagnostic_codes::THE_VARIABLE_IS_UNDECLARED, &[name]);
    }

    pub(crate) fn error_no_such_property(&mut self, name: &str, receiver: TypeId, idx: NodeIndex) {
        let receiver = self.type_to_string(receiver);
        self.error_at_node(idx, diagnostic_codes::NO_SUCH_PROPERTY, &[name, &receiver]);
    }
}
