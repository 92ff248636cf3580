//! Static type checker for dynamically-typed JVM-style code.
//!
//! This crate walks the tree built with `stc-ast`, asks `stc-solver` about
//! types, and produces diagnostics plus per-node metadata:
//! - `declarations` - registering the unit's classes and methods in the store
//! - `state` - `CheckerState`, the entry points of a pass
//! - `context` - `CheckerContext`, the stacks a pass maintains while visiting
//! - `expr`, `binary`, `call_checker`, `closure_checker`, `property_access` -
//!   expression typing
//! - `statements`, `flow_narrowing` - statements, `instanceof` narrowing and
//!   assignment tracking
//! - `class_checker` - classes, methods and script code
//! - `extension` - hooks that observe or override checker decisions
//! - `error_reporter` - diagnostic emission
//!
//! A `TypeStore` is declared once per unit and then shared read-only; any
//! number of passes may check against it concurrently.

pub mod binary;
pub mod call_checker;
pub mod class_checker;
pub mod closure_checker;
pub mod context;
pub mod declarations;
pub mod error;
pub mod error_reporter;
pub mod expr;
pub mod extension;
pub mod flow_narrowing;
pub mod metadata;
pub mod options;
pub mod property_access;
pub mod state;
pub mod statements;
pub mod type_resolution;

pub mod diagnostics {
    pub use stc_common::diagnostics::*;
}

pub use context::CheckerContext;
pub use declarations::{DeclaredUnit, SCRIPT_CLASS_NAME, declare_unit};
pub use error::CheckerError;
pub use error_reporter::ErrorCollector;
pub use extension::{ExtensionChain, Handled, HookSet, TypeCheckingExtension};
pub use metadata::{MetadataTable, NodeMetadata};
pub use options::CheckerOptions;
pub use state::{CheckResult, CheckerState, check_unit, check_unit_with_cache};
pub use type_resolution::resolve_type_ref;
