//! Unrecoverable solver failures.
//!
//! Everything a user can cause is reported as a diagnostic by the checker.
//! These errors signal inconsistent input from the host and abort the pass.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error(
        "method {method} is declared on {declaring}, which is not in the ancestry of receiver type {receiver}"
    )]
    DeclaringClassNotInAncestry {
        method: String,
        declaring: String,
        receiver: String,
    },
}
