//! `stc`: static type checking and overload resolution for an optionally
//! typed object language.
//!
//! The work is split across four crates, re-exported here:
//! - [`stc_common`] - source positions, diagnostics and limits
//! - [`stc_ast`] - the node arena the checker reads, and `AstBuilder`
//! - [`stc_solver`] - the type store, assignability, distance, least upper
//!   bounds and method resolution
//! - [`stc_checker`] - the tree-walking checker, flow typing, closures and
//!   extension hooks
//!
//! ```ignore
//! use stc::{AstBuilder, CheckerOptions, TypeStore, check_unit};
//!
//! let mut b = AstBuilder::new();
//! let text = b.string("abc");
//! let call = b.call(text, "length", Vec::new());
//! let stmt = b.expr_stmt(call);
//! let root = b.unit(Vec::new(), vec![stmt]);
//! let arena = b.finish();
//!
//! let mut store = TypeStore::new();
//! let result = check_unit(&mut store, &arena, root, CheckerOptions::default())?;
//! assert!(result.diagnostics.is_empty());
//! ```
//!
//! Library code emits `tracing` events but never installs a subscriber.

pub use stc_ast;
pub use stc_checker;
pub use stc_common;
pub use stc_solver;

pub use stc_ast::{AstBuilder, NodeArena, NodeIndex, TypeRef};
pub use stc_checker::{
    CheckResult, CheckerError, CheckerOptions, CheckerState, DeclaredUnit, Handled, HookSet,
    MetadataTable, TypeCheckingExtension, check_unit, check_unit_with_cache, declare_unit,
};
pub use stc_common::{Diagnostic, DiagnosticCategory, SourcePos};
pub use stc_solver::{
    ExtensionMethodCache, LoadingContextId, MethodResolution, MethodResolver, TypeDatabase,
    TypeId, TypeStore,
};
