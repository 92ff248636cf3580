//! Type checking extensions: handlers that observe or override the checker at
//! fixed decision points.
//!
//! Every decision point is one method on [`TypeCheckingExtension`]. A handler
//! returns [`Handled::Yes`] to suppress the checker's default behavior for that
//! event (usually a diagnostic) and may fill in the event's result slot
//! (`resolved_type`, `return_type`, `chosen`) to supply the type the checker
//! continues with.
//!
//! Handlers are composed with [`ExtensionChain`], which offers each event to
//! every handler. [`HookSet`] adapts plain closures to the trait.

use stc_ast::NodeIndex;
use stc_solver::{MethodId, MethodMatch, TypeDatabase, TypeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handled {
    Yes,
    No,
}

impl Handled {
    #[must_use]
    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Yes)
    }

    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        if self.is_handled() || other.is_handled() {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// A method call, before or after resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodCallEvent {
    pub node: NodeIndex,
    pub receiver: TypeId,
    pub name: String,
    pub arg_types: Vec<TypeId>,
    /// Result type. Set by the checker after resolution; a handler may replace it.
    pub return_type: Option<TypeId>,
    pub target: Option<MethodId>,
}

/// A name that is neither a local, a property of an implicit receiver nor a class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedVariableEvent {
    pub node: NodeIndex,
    pub name: String,
    pub resolved_type: Option<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedPropertyEvent {
    pub node: NodeIndex,
    pub receiver: TypeId,
    pub name: String,
    pub resolved_type: Option<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingMethodEvent {
    pub node: NodeIndex,
    pub receiver: TypeId,
    pub name: String,
    pub arg_types: Vec<TypeId>,
    pub return_type: Option<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmbiguousMethodEvent {
    pub node: NodeIndex,
    pub receiver: TypeId,
    pub name: String,
    pub candidates: Vec<MethodMatch>,
    /// Index into `candidates` of the method to use.
    pub chosen: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncompatibleAssignmentEvent {
    pub node: NodeIndex,
    pub target: TypeId,
    pub value: TypeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodVisitEvent {
    pub node: NodeIndex,
    pub name: String,
    pub method: Option<MethodId>,
}

/// Handlers for the checker's decision points. Every method defaults to
/// [`Handled::No`].
pub trait TypeCheckingExtension {
    fn before_method_call(&mut self, _db: &dyn TypeDatabase, _event: &mut MethodCallEvent) -> Handled {
        Handled::No
    }

    fn after_method_call(&mut self, _db: &dyn TypeDatabase, _event: &mut MethodCallEvent) -> Handled {
        Handled::No
    }

    fn handle_unresolved_variable(
        &mut self,
        _db: &dyn TypeDatabase,
        _event: &mut UnresolvedVariableEvent,
    ) -> Handled {
        Handled::No
    }

    fn handle_unresolved_property(
        &mut self,
        _db: &dyn TypeDatabase,
        _event: &mut UnresolvedPropertyEvent,
    ) -> Handled {
        Handled::No
    }

    fn handle_missing_method(
        &mut self,
        _db: &dyn TypeDatabase,
        _event: &mut MissingMethodEvent,
    ) -> Handled {
        Handled::No
    }

    fn handle_ambiguous_method(
        &mut self,
        _db: &dyn TypeDatabase,
        _event: &mut AmbiguousMethodEvent,
    ) -> Handled {
        Handled::No
    }

    fn handle_incompatible_assignment(
        &mut self,
        _db: &dyn TypeDatabase,
        _event: &mut IncompatibleAssignmentEvent,
    ) -> Handled {
        Handled::No
    }

    /// `Handled::Yes` skips checking the method body.
    fn before_visit_method(&mut self, _db: &dyn TypeDatabase, _event: &mut MethodVisitEvent) -> Handled {
        Handled::No
    }

    fn after_visit_method(&mut self, _db: &dyn TypeDatabase, _event: &mut MethodVisitEvent) -> Handled {
        Handled::No
    }
}

/// Registered handlers, in registration order.
#[derive(Default)]
pub struct ExtensionChain<'a> {
    handlers: Vec<Box<dyn TypeCheckingExtension + 'a>>,
}

impl<'a> ExtensionChain<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handler: impl TypeCheckingExtension + 'a) {
        self.handlers.push(Box::new(handler));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn dispatch<E>(
        &mut self,
        event: &mut E,
        mut call: impl FnMut(&mut (dyn TypeCheckingExtension + 'a), &mut E) -> Handled,
    ) -> Handled {
        let mut handled = Handled::No;
        for handler in &mut self.handlers {
            handled = handled.or(call(handler.as_mut(), event));
        }
        handled
    }
}

impl TypeCheckingExtension for ExtensionChain<'_> {
    fn before_method_call(&mut self, db: &dyn TypeDatabase, event: &mut MethodCallEvent) -> Handled {
        self.dispatch(event, |h, e| h.before_method_call(db, e))
    }

    fn after_method_call(&mut self, db: &dyn TypeDatabase, event: &mut MethodCallEvent) -> Handled {
        self.dispatch(event, |h, e| h.after_method_call(db, e))
    }

    fn handle_unresolved_variable(
        &mut self,
        db: &dyn TypeDatabase,
        event: &mut UnresolvedVariableEvent,
    ) -> Handled {
        self.dispatch(event, |h, e| h.handle_unresolved_variable(db, e))
    }

    fn handle_unresolved_property(
        &mut self,
        db: &dyn TypeDatabase,
        event: &mut UnresolvedPropertyEvent,
    ) -> Handled {
        self.dispatch(event, |h, e| h.handle_unresolved_property(db, e))
    }

    fn handle_missing_method(
        &mut self,
        db: &dyn TypeDatabase,
        event: &mut MissingMethodEvent,
    ) -> Handled {
        self.dispatch(event, |h, e| h.handle_missing_method(db, e))
    }

    fn handle_ambiguous_method(
        &mut self,
        db: &dyn TypeDatabase,
        event: &mut AmbiguousMethodEvent,
    ) -> Handled {
        self.dispatch(event, |h, e| h.handle_ambiguous_method(db, e))
    }

    fn handle_incompatible_assignment(
        &mut self,
        db: &dyn TypeDatabase,
        event: &mut IncompatibleAssignmentEvent,
    ) -> Handled {
        self.dispatch(event, |h, e| h.handle_incompatible_assignment(db, e))
    }

    fn before_visit_method(&mut self, db: &dyn TypeDatabase, event: &mut MethodVisitEvent) -> Handled {
        self.dispatch(event, |h, e| h.before_visit_method(db, e))
    }

    fn after_visit_method(&mut self, db: &dyn TypeDatabase, event: &mut MethodVisitEvent) -> Handled {
        self.dispatch(event, |h, e| h.after_visit_method(db, e))
    }
}

type Hook<'h, E> = Box<dyn FnMut(&dyn TypeDatabase, &mut E) -> Handled + 'h>;

/// Closure-based handlers, one optional slot per decision point.
///
/// ```
/// use stc_checker::extension::{Handled, HookSet};
/// use stc_solver::TypeId;
///
/// let hooks = HookSet::new().on_unresolved_variable(|_db, event| {
///     if event.name == "env" {
///         event.resolved_type = Some(TypeId::DYNAMIC);
///         return Handled::Yes;
///     }
///     Handled::No
/// });
/// # drop(hooks);
/// ```
#[derive(Default)]
pub struct HookSet<'h> {
    pub before_method_call: Option<Hook<'h, MethodCallEvent>>,
    pub after_method_call: Option<Hook<'h, MethodCallEvent>>,
    pub unresolved_variable: Option<Hook<'h, UnresolvedVariableEvent>>,
    pub unresolved_property: Option<Hook<'h, UnresolvedPropertyEvent>>,
    pub missing_method: Option<Hook<'h, MissingMethodEvent>>,
    pub ambiguous_method: Option<Hook<'h, AmbiguousMethodEvent>>,
    pub incompatible_assignment: Option<Hook<'h, IncompatibleAssignmentEvent>>,
    pub before_visit_method: Option<Hook<'h, MethodVisitEvent>>,
    pub after_visit_method: Option<Hook<'h, MethodVisitEvent>>,
}

macro_rules! hook_setter {
    ($setter:ident, $slot:ident, $event:ty) => {
        #[must_use]
        pub fn $setter(
            mut self,
            hook: impl FnMut(&dyn TypeDatabase, &mut $event) -> Handled + 'h,
        ) -> Self {
            self.$slot = Some(Box::new(hook));
            self
        }
    };
}

impl<'h> HookSet<'h> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    hook_setter!(on_before_method_call, before_method_call, MethodCallEvent);
    hook_setter!(on_after_method_call, after_method_call, MethodCallEvent);
    hook_setter!(on_unresolved_variable, unresolved_variable, UnresolvedVariableEvent);
    hook_setter!(on_unresolved_property, unresolved_property, UnresolvedPropertyEvent);
    hook_setter!(on_missing_method, missing_method, MissingMethodEvent);
    hook_setter!(on_ambiguous_method, ambiguous_method, AmbiguousMethodEvent);
    hook_setter!(
        on_incompatible_assignment,
        incompatible_assignment,
        IncompatibleAssignmentEvent
    );
    hook_setter!(on_before_visit_method, before_visit_method, MethodVisitEvent);
    hook_setter!(on_after_visit_method, after_visit_method, MethodVisitEvent);
}

fn run<E>(hook: &mut Option<Hook<'_, E>>, db: &dyn TypeDatabase, event: &mut E) -> Handled {
    hook.as_mut().map_or(Handled::No, |hook| hook(db, event))
}

impl TypeCheckingExtension for HookSet<'_> {
    fn before_method_call(&mut self, db: &dyn TypeDatabase, event: &mut MethodCallEvent) -> Handled {
        run(&mut self.before_method_call, db, event)
    }

    fn after_method_call(&mut self, db: &dyn TypeDatabase, event: &mut MethodCallEvent) -> Handled {
        run(&mut self.after_method_call, db, event)
    }

    fn handle_unresolved_variable(
        &mut self,
        db: &dyn TypeDatabase,
        event: &mut UnresolvedVariableEvent,
    ) -> Handled {
        run(&mut self.unresolved_variable, db, event)
    }

    fn handle_unresolved_property(
        &mut self,
        db: &dyn TypeDatabase,
        event: &mut UnresolvedPropertyEvent,
    ) -> Handled {
        run(&mut self.unresolved_property, db, event)
    }

    fn handle_missing_method(
        &mut self,
        db: &dyn TypeDatabase,
        event: &mut MissingMethodEvent,
    ) -> Handled {
        run(&mut self.missing_method, db, event)
    }

    fn handle_ambiguous_method(
        &mut self,
        db: &dyn TypeDatabase,
        event: &mut AmbiguousMethodEvent,
    ) -> Handled {
        run(&mut self.ambiguous_method, db, event)
    }

    fn handle_incompatible_assignment(
        &mut self,
        db: &dyn TypeDatabase,
        event: &mut IncompatibleAssignmentEvent,
    ) -> Handled {
        run(&mut self.incompatible_assignment, db, event)
    }

    fn before_visit_method(&mut self, db: &dyn TypeDatabase, event: &mut MethodVisitEvent) -> Handled {
        run(&mut self.before_visit_method, db, event)
    }

    fn after_visit_method(&mut self, db: &dyn TypeDatabase, event: &mut MethodVisitEvent) -> Handled {
        run(&mut self.after_visit_method, db, event)
    }
}

#[cfg(test)]
#[path = "tests/extension_tests.rs"]
mod tests;
