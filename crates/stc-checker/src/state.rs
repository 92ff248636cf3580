//! # CheckerState - checking pass orchestration
//!
//! `CheckerState` owns the context of one pass and drives the visit:
//!
//! - **Entry points**: `check` for a root node, `check_unit` to declare and
//!   check a compilation unit in one call, `check_unit_with_cache` to share
//!   extension snapshots between units
//! - **Classes and methods**: `class_checker` (class bodies, methods,
//!   constructors, script code, on-demand `def` return inference)
//! - **Expressions**: `expr` dispatches to `binary`, `call_checker`,
//!   `closure_checker` and `property_access`
//! - **Statements**: `statements`, with assignment tracking and narrowing in
//!   `flow_narrowing`
//! - **Diagnostics**: `error_reporter`
//!
//! Visit methods return `VisitResult`; `Err` only carries fatal failures, user
//! errors are diagnostics and the visit continues with a fallback type.
//!
//! ```
//! use stc_ast::AstBuilder;
//! use stc_checker::{CheckerOptions, check_unit};
//! use stc_solver::TypeStore;
//!
//! let mut b = AstBuilder::new();
//! let one = b.int(1);
//! let decl = b.def("x", one);
//! let root = b.unit(Vec::new(), vec![decl]);
//! let arena = b.finish();
//!
//! let mut store = TypeStore::new();
//! let result = check_unit(&mut store, &arena, root, CheckerOptions::default()).unwrap();
//! assert!(result.diagnostics.is_empty());
//! ```

use crate::context::CheckerContext;
use crate::declarations::{DeclaredUnit, declare_unit};
use crate::diagnostics::{Diagnostic, diagnostic_codes};
use crate::error::CheckerError;
use crate::extension::{ExtensionChain, TypeCheckingExtension};
use crate::metadata::MetadataTable;
use crate::options::CheckerOptions;
use rustc_hash::FxHashSet;
use stc_ast::{NodeArena, NodeIndex, NodeKind};
use stc_solver::{
    BuiltinExtensions, ExtensionMethodCache, ExtensionSet, ExtensionSource, LoadingContextId,
    TypeDatabase, TypeId, TypeStore,
};
use std::sync::Arc;
use tracing::debug;

/// Result of a visit step. `Err` aborts the pass.
pub(crate) type VisitResult<T = TypeId> = Result<T, CheckerError>;

/// Output of a checking pass.
#[derive(Clone, Debug, Default)]
pub struct CheckResult {
    /// Diagnostics in source order.
    pub diagnostics: Vec<Diagnostic>,
    pub metadata: MetadataTable,
}

impl CheckResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Diagnostic codes in source order.
    #[must_use]
    pub fn codes(&self) -> Vec<u32> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }
}

pub struct CheckerState<'a> {
    pub ctx: CheckerContext<'a>,
    pub(crate) declared: &'a DeclaredUnit,
    pub(crate) extensions: ExtensionChain<'a>,
    /// Method and constructor nodes whose bodies have been checked.
    pub(crate) checked_methods: FxHashSet<NodeIndex>,
    /// Methods currently on the visit path, to stop on-demand inference
    /// from recursing.
    pub(crate) in_progress: FxHashSet<NodeIndex>,
    /// Diagnostics of methods checked on demand. Kept apart so a re-visit of
    /// the construct that triggered the check cannot discard them.
    pub(crate) deferred_diagnostics: Vec<Diagnostic>,
    /// Whether extension methods were supplied; otherwise `check` loads the
    /// builtins.
    extension_methods_supplied: bool,
}

impl<'a> CheckerState<'a> {
    /// A pass over a unit declared in `db`. Unless a snapshot or cache is
    /// supplied, `check` loads the builtin extension methods for the
    /// configured loading context.
    pub fn new(
        db: &'a dyn TypeDatabase,
        arena: &'a NodeArena,
        declared: &'a DeclaredUnit,
        options: CheckerOptions,
    ) -> Self {
        CheckerState {
            ctx: CheckerContext::new(db, arena, options, Arc::default()),
            declared,
            extensions: ExtensionChain::new(),
            checked_methods: FxHashSet::default(),
            in_progress: FxHashSet::default(),
            deferred_diagnostics: Vec::new(),
            extension_methods_supplied: false,
        }
    }

    /// Use this extension snapshot instead of the builtins. It must have been
    /// loaded into the same type store.
    #[must_use]
    pub fn with_extension_methods(mut self, methods: Arc<ExtensionSet>) -> Self {
        self.ctx.extension_methods = methods;
        self.extension_methods_supplied = true;
        self
    }

    /// Take the extension snapshot for this pass's store and loading context
    /// from a shared cache.
    #[must_use]
    pub fn with_extension_cache(self, cache: &ExtensionMethodCache) -> Self {
        let context = LoadingContextId(self.ctx.options.loading_context);
        let methods = cache.get(context, self.ctx.db);
        self.with_extension_methods(methods)
    }

    /// Register a handler for the checker's decision points.
    #[must_use]
    pub fn with_extension(mut self, handler: impl TypeCheckingExtension + 'a) -> Self {
        self.extensions.push(handler);
        self
    }

    /// Check the tree rooted at `root`: a compilation unit, a single class or
    /// a block of script statements.
    ///
    /// # Errors
    /// Fatal solver failures and context stack imbalances.
    pub fn check(mut self, root: NodeIndex) -> Result<CheckResult, CheckerError> {
        if !self.extension_methods_supplied {
            let context = LoadingContextId(self.ctx.options.loading_context);
            let builtins = BuiltinExtensions.load(context, self.ctx.db);
            self.ctx.extension_methods = Arc::new(ExtensionSet::from_methods(builtins));
        }
        let unresolved = self.declared.unresolved.clone();
        for (pos, name) in unresolved {
            self.error_at_pos(pos, diagnostic_codes::UNABLE_TO_RESOLVE_CLASS, &[&name]);
        }

        let arena = self.ctx.arena;
        match arena.kind(root) {
            Some(NodeKind::CompilationUnit { classes, script }) => {
                for &class in classes {
                    self.check_class(class)?;
                }
                if script.is_some() {
                    self.check_script(*script)?;
                }
            }
            Some(NodeKind::Class { .. }) => self.check_class(root)?,
            Some(_) => self.check_script(root)?,
            None => {}
        }

        let mut errors = std::mem::take(&mut self.ctx.errors);
        for diagnostic in std::mem::take(&mut self.deferred_diagnostics) {
            errors.add(diagnostic);
        }
        let mut diagnostics = errors.into_diagnostics();
        diagnostics.sort_by_key(|d| (d.pos.line, d.pos.column));
        debug!(
            diagnostics = diagnostics.len(),
            nodes = self.ctx.metadata.len(),
            "check complete"
        );
        Ok(CheckResult {
            diagnostics,
            metadata: self.ctx.metadata,
        })
    }
}

/// Declare the unit rooted at `root` in `store`, then check it with the
/// builtin extension methods.
///
/// # Errors
/// See [`CheckerState::check`].
pub fn check_unit(
    store: &mut TypeStore,
    arena: &NodeArena,
    root: NodeIndex,
    options: CheckerOptions,
) -> Result<CheckResult, CheckerError> {
    let declared = declare_unit(store, arena, root);
    let store: &TypeStore = store;
    CheckerState::new(store, arena, &declared, options).check(root)
}

/// Like [`check_unit`], with extension methods from a cache shared across
/// units and stores.
///
/// # Errors
/// See [`CheckerState::check`].
pub fn check_unit_with_cache(
    store: &mut TypeStore,
    arena: &NodeArena,
    root: NodeIndex,
    options: CheckerOptions,
    cache: &ExtensionMethodCache,
) -> Result<CheckResult, CheckerError> {
    let declared = declare_unit(store, arena, root);
    let store: &TypeStore = store;
    CheckerState::new(store, arena, &declared, options)
        .with_extension_cache(cache)
        .check(root)
}
