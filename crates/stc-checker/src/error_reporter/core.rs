//! Core error emission helpers and type formatting utilities.

use crate::diagnostics::{Diagnostic, format_message, get_message_template};
use crate::state::CheckerState;
use rustc_hash::FxHashSet;
use stc_ast::NodeIndex;
use stc_common::SourcePos;
use stc_solver::{TypeId, format_type, format_type_list};
use tracing::trace;

/// Diagnostics of one pass, at most one per source position.
#[derive(Clone, Debug, Default)]
pub struct ErrorCollector {
    diagnostics: Vec<Diagnostic>,
    positions: FxHashSet<(u32, u32)>,
}

impl ErrorCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic unless its position already reported one.
    pub fn add(&mut self, diagnostic: Diagnostic) -> bool {
        let key = (diagnostic.pos.line, diagnostic.pos.column);
        if !diagnostic.pos.is_synthetic() && !self.positions.insert(key) {
            trace!(code = diagnostic.code, pos = ?diagnostic.pos, "duplicate position");
            return false;
        }
        self.diagnostics.push(diagnostic);
        true
    }

    /// Number of diagnostics so far, for a later `rollback`.
    #[must_use]
    pub fn mark(&self) -> usize {
        self.diagnostics.len()
    }

    /// Drop every diagnostic recorded after `mark`.
    pub fn rollback(&mut self, mark: usize) {
        for dropped in self.diagnostics.drain(mark..) {
            self.positions.remove(&(dropped.pos.line, dropped.pos.column));
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl<'a> CheckerState<'a> {
    pub(crate) fn type_to_string(&self, ty: TypeId) -> String {
        format_type(self.ctx.db, ty)
    }

    pub(crate) fn types_to_string(&self, types: &[TypeId]) -> String {
        format_type_list(self.ctx.db, types)
    }

    /// Emit the diagnostic for `code` at `pos` with its template filled in.
    pub(crate) fn error_at_pos(&mut self, pos: SourcePos, code: u32, args: &[&str]) {
        let template = get_message_template(code).unwrap_or("{0}");
        let message = format_message(template, args);
        let diagnostic = Diagnostic::error(self.ctx.options.file_name.clone(), pos, message, code);
        self.ctx.errors.add(diagnostic);
    }

    pub(crate) fn error_at_node(&mut self, idx: NodeIndex, code: u32, args: &[&str]) {
        let pos = self.ctx.arena.pos(idx);
        self.error_at_pos(pos, code, args);
    }
}

#[cfg(test)]
#[path = "../tests/error_collector_tests.rs"]
mod tests;
