//! Unrecoverable checker failures.
//!
//! User mistakes never end up here; they are diagnostics. A `CheckerError`
//! means the host handed over inconsistent declarations or the visitor lost
//! track of its own context, and the pass is aborted.

use stc_solver::SolverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("context stack `{stack}` unbalanced: expected depth {expected}, found {found}")]
    UnbalancedContext {
        stack: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid checker options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}
