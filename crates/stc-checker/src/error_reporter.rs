//! Diagnostic emission. `error_*` methods format a message template and
//! record it at a node; `ErrorCollector` keeps at most one per position.

mod assignability;
mod calls;
mod core;

pub use self::core::ErrorCollector;
