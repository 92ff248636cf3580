//! Checker context: the explicit stacks a visit runs against.
//!
//! Every stack here is pushed and popped around exactly the tree region it
//! describes. `depths()` snapshots all of them so callers can assert that a
//! visit left the context as it found it.

use crate::error::CheckerError;
use crate::error_reporter::ErrorCollector;
use crate::metadata::MetadataTable;
use crate::options::CheckerOptions;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use stc_ast::{NodeArena, NodeIndex};
use stc_solver::{ClassId, DelegationStrategy, ExtensionSet, MethodId, TypeDatabase, TypeId};
use std::sync::Arc;

/// A class whose body is being checked.
#[derive(Clone, Debug)]
pub struct ClassFrame {
    pub class: ClassId,
    /// The class type with its own placeholders as arguments.
    pub self_type: TypeId,
}

#[derive(Clone, Debug)]
pub struct MethodFrame {
    pub node: NodeIndex,
    pub method: Option<MethodId>,
    /// `None` for `def` methods.
    pub declared_return: Option<TypeId>,
    pub is_static: bool,
    pub type_params: Vec<Arc<str>>,
    pub returns: SmallVec<[TypeId; 4]>,
    /// Closure depth when the method was entered.
    pub closure_depth: usize,
}

#[derive(Clone, Debug)]
pub struct ClosureFrame {
    pub node: NodeIndex,
    pub returns: SmallVec<[TypeId; 4]>,
}

/// Where a closure looks up unqualified names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelegationFrame {
    pub delegate: Option<TypeId>,
    pub strategy: DelegationStrategy,
}

/// A local variable (or closure/method parameter).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarInfo {
    /// `DYNAMIC` for `def` variables.
    pub declared: TypeId,
    /// Type of the value currently held, after flow typing.
    pub current: TypeId,
    /// Closure depth the variable was declared at.
    pub closure_depth: usize,
}

/// Types assigned to variables inside one tracked construct, by name.
pub type AssignmentFrame = FxHashMap<String, SmallVec<[TypeId; 2]>>;

/// Facts learned from `instanceof` tests, by variable name.
pub type TypeInfoFrame = FxHashMap<String, SmallVec<[TypeId; 2]>>;

/// Depth of every stack, for balance checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackDepths {
    pub classes: usize,
    pub methods: usize,
    pub closures: usize,
    pub binaries: usize,
    pub delegation: usize,
    pub type_info: usize,
    pub scopes: usize,
    pub tracking: usize,
    pub expected: usize,
}

/// Every traversal stack, moved out while a method is checked out of order.
#[derive(Debug, Default)]
pub struct SavedStacks {
    classes: Vec<ClassFrame>,
    methods: Vec<MethodFrame>,
    closures: Vec<ClosureFrame>,
    binaries: Vec<NodeIndex>,
    delegation: Vec<DelegationFrame>,
    type_info: Vec<TypeInfoFrame>,
    scopes: Vec<FxHashMap<String, VarInfo>>,
    tracking: Vec<AssignmentFrame>,
    expected: Vec<Option<TypeId>>,
    expr_depth: u32,
}

pub struct CheckerContext<'a> {
    pub db: &'a dyn TypeDatabase,
    pub arena: &'a NodeArena,
    pub options: CheckerOptions,
    pub extension_methods: Arc<ExtensionSet>,

    pub enclosing_classes: Vec<ClassFrame>,
    pub enclosing_methods: Vec<MethodFrame>,
    pub enclosing_closures: Vec<ClosureFrame>,
    pub enclosing_binaries: Vec<NodeIndex>,
    pub delegation_chain: Vec<DelegationFrame>,
    pub temporary_type_info: Vec<TypeInfoFrame>,
    pub scopes: Vec<FxHashMap<String, VarInfo>>,
    pub assignment_tracking: Vec<AssignmentFrame>,
    /// Type expected by the enclosing declaration or assignment.
    pub expected_types: Vec<Option<TypeId>>,

    pub errors: ErrorCollector,
    pub metadata: MetadataTable,
    pub expr_depth: u32,
}

impl<'a> CheckerContext<'a> {
    pub fn new(
        db: &'a dyn TypeDatabase,
        arena: &'a NodeArena,
        options: CheckerOptions,
        extension_methods: Arc<ExtensionSet>,
    ) -> Self {
        Self {
            db,
            arena,
            options,
            extension_methods,
            enclosing_classes: Vec::new(),
            enclosing_methods: Vec::new(),
            enclosing_closures: Vec::new(),
            enclosing_binaries: Vec::new(),
            delegation_chain: Vec::new(),
            temporary_type_info: Vec::new(),
            scopes: Vec::new(),
            assignment_tracking: Vec::new(),
            expected_types: Vec::new(),
            errors: ErrorCollector::new(),
            metadata: MetadataTable::new(),
            expr_depth: 0,
        }
    }

    #[must_use]
    pub fn depths(&self) -> StackDepths {
        StackDepths {
            classes: self.enclosing_classes.len(),
            methods: self.enclosing_methods.len(),
            closures: self.enclosing_closures.len(),
            binaries: self.enclosing_binaries.len(),
            delegation: self.delegation_chain.len(),
            type_info: self.temporary_type_info.len(),
            scopes: self.scopes.len(),
            tracking: self.assignment_tracking.len(),
            expected: self.expected_types.len(),
        }
    }

    /// Fail if any stack differs from `before`.
    ///
    /// # Errors
    /// `CheckerError::UnbalancedContext` naming the first unbalanced stack.
    pub fn ensure_balanced(&self, before: StackDepths) -> Result<(), CheckerError> {
        let after = self.depths();
        let pairs = [
            ("enclosing_classes", before.classes, after.classes),
            ("enclosing_methods", before.methods, after.methods),
            ("enclosing_closures", before.closures, after.closures),
            ("enclosing_binaries", before.binaries, after.binaries),
            ("delegation_chain", before.delegation, after.delegation),
            ("temporary_type_info", before.type_info, after.type_info),
            ("scopes", before.scopes, after.scopes),
            ("assignment_tracking", before.tracking, after.tracking),
            ("expected_types", before.expected, after.expected),
        ];
        for (stack, expected, found) in pairs {
            if expected != found {
                return Err(CheckerError::UnbalancedContext {
                    stack,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Empty every stack, returning what was there.
    pub fn take_stacks(&mut self) -> SavedStacks {
        SavedStacks {
            classes: std::mem::take(&mut self.enclosing_classes),
            methods: std::mem::take(&mut self.enclosing_methods),
            closures: std::mem::take(&mut self.enclosing_closures),
            binaries: std::mem::take(&mut self.enclosing_binaries),
            delegation: std::mem::take(&mut self.delegation_chain),
            type_info: std::mem::take(&mut self.temporary_type_info),
            scopes: std::mem::take(&mut self.scopes),
            tracking: std::mem::take(&mut self.assignment_tracking),
            expected: std::mem::take(&mut self.expected_types),
            expr_depth: std::mem::replace(&mut self.expr_depth, 0),
        }
    }

    pub fn restore_stacks(&mut self, saved: SavedStacks) {
        self.enclosing_classes = saved.classes;
        self.enclosing_methods = saved.methods;
        self.enclosing_closures = saved.closures;
        self.enclosing_binaries = saved.binaries;
        self.delegation_chain = saved.delegation;
        self.temporary_type_info = saved.type_info;
        self.scopes = saved.scopes;
        self.assignment_tracking = saved.tracking;
        self.expected_types = saved.expected;
        self.expr_depth = saved.expr_depth;
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn declare_variable(&mut self, name: &str, declared: TypeId, current: TypeId) {
        let info = VarInfo {
            declared,
            current,
            closure_depth: self.enclosing_closures.len(),
        };
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), info);
        }
    }

    #[must_use]
    pub fn lookup_variable(&self, name: &str) -> Option<VarInfo> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// Replace the current type of the innermost variable called `name`.
    pub fn set_variable_type(&mut self, name: &str, current: TypeId) {
        if let Some(info) = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
        {
            info.current = current;
        }
    }

    /// Current type of every visible variable, innermost declaration winning.
    #[must_use]
    pub fn visible_variable_types(&self) -> FxHashMap<String, TypeId> {
        let mut out = FxHashMap::default();
        for scope in &self.scopes {
            for (name, info) in scope {
                out.insert(name.clone(), info.current);
            }
        }
        out
    }

    // =========================================================================
    // Temporary type info
    // =========================================================================

    pub fn push_type_info(&mut self) {
        self.temporary_type_info.push(TypeInfoFrame::default());
    }

    pub fn pop_type_info(&mut self) {
        self.temporary_type_info.pop();
    }

    pub fn add_type_fact(&mut self, name: &str, ty: TypeId) {
        if let Some(frame) = self.temporary_type_info.last_mut() {
            frame.entry(name.to_string()).or_default().push(ty);
        }
    }

    /// Most recent `instanceof` fact about `name`.
    #[must_use]
    pub fn narrowed_type(&self, name: &str) -> Option<TypeId> {
        self.temporary_type_info
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).and_then(|facts| facts.last().copied()))
    }

    /// Forget every fact about `name`; its value changed.
    pub fn clear_type_facts(&mut self, name: &str) {
        for frame in &mut self.temporary_type_info {
            frame.remove(name);
        }
    }

    // =========================================================================
    // Assignment tracking
    // =========================================================================

    pub fn push_tracking(&mut self) {
        self.assignment_tracking.push(AssignmentFrame::default());
    }

    pub fn pop_tracking(&mut self) -> AssignmentFrame {
        self.assignment_tracking.pop().unwrap_or_default()
    }

    /// Record an assignment in every open tracking frame.
    pub fn track_assignment(&mut self, name: &str, ty: TypeId) {
        for frame in &mut self.assignment_tracking {
            frame.entry(name.to_string()).or_default().push(ty);
        }
    }

    // =========================================================================
    // Enclosing declarations
    // =========================================================================

    #[must_use]
    pub fn current_class(&self) -> Option<&ClassFrame> {
        self.enclosing_classes.last()
    }

    #[must_use]
    pub fn current_method(&self) -> Option<&MethodFrame> {
        self.enclosing_methods.last()
    }

    /// Whether the innermost callable is a closure rather than a method.
    #[must_use]
    pub fn in_closure(&self) -> bool {
        let floor = self.current_method().map_or(0, |m| m.closure_depth);
        self.enclosing_closures.len() > floor
    }

    #[must_use]
    pub fn in_static_context(&self) -> bool {
        self.current_method().is_some_and(|m| m.is_static)
    }

    #[must_use]
    pub fn expected_type(&self) -> Option<TypeId> {
        self.expected_types.last().copied().flatten()
    }

    /// Generic parameter names visible from the current position.
    #[must_use]
    pub fn type_params_in_scope(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = Vec::new();
        if let Some(frame) = self.current_class() {
            names.extend(
                self.db
                    .class_def(frame.class)
                    .type_params
                    .iter()
                    .map(|p| p.name.clone()),
            );
        }
        if let Some(method) = self.current_method() {
            names.extend(method.type_params.iter().cloned());
        }
        names
    }
}

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod tests;
