//! Method and constructor calls.
//!
//! A call is checked in three steps. Arguments other than closures are typed
//! first; closure literals take part in resolution as a raw `Closure`. Once a
//! method is selected, each closure argument is visited with the parameter
//! types and delegate that method declares for it, and the final return type
//! is computed from the completed argument types.

use crate::extension::{
    AmbiguousMethodEvent, MethodCallEvent, MissingMethodEvent, TypeCheckingExtension,
};
use crate::metadata::CallTarget;
use crate::state::{CheckerState, VisitResult};
use crate::statements::type_args;
use stc_ast::{LiteralValue, NodeIndex, NodeKind, TypeRef};
use stc_solver::hierarchy::as_supertype;
use stc_solver::numeric::box_type;
use stc_solver::{
    Bindings, CandidateOrigin, MethodMatch, MethodResolution, MethodResolver, TypeData, TypeId,
    check_bounds, extract_connections, lookup_property,
};
use std::sync::Arc;
use tracing::trace;

impl<'a> CheckerState<'a> {
    pub(crate) fn resolve_on(&self, receiver: TypeId, name: &str, args: &[TypeId]) -> MethodResolution {
        MethodResolver::new(self.ctx.db)
            .with_extensions(&self.ctx.extension_methods)
            .resolve_method(receiver, name, args)
    }

    fn resolve_static_on(&self, class_type: TypeId, name: &str, args: &[TypeId]) -> MethodResolution {
        MethodResolver::new(self.ctx.db)
            .with_extensions(&self.ctx.extension_methods)
            .resolve_static(class_type, name, args)
    }

    fn resolve_constructor_on(&self, class_type: TypeId, args: &[TypeId]) -> MethodResolution {
        MethodResolver::new(self.ctx.db).resolve_constructor(class_type, args)
    }

    /// Return type of a resolved call. `def` methods of this unit are
    /// checked first if their return type is still unknown. Records the
    /// call target on `idx`.
    pub(crate) fn call_return_type(&mut self, idx: NodeIndex, m: &MethodMatch, args: &[TypeId]) -> VisitResult {
        for candidate in std::iter::once(m).chain(&m.union_members) {
            if let (Some(method), CandidateOrigin::Declared) = (candidate.candidate.method, candidate.candidate.origin) {
                self.infer_on_demand(method)?;
            }
        }
        let extensions = Arc::clone(&self.ctx.extension_methods);
        let ret = MethodResolver::new(self.ctx.db)
            .with_extensions(&extensions)
            .infer_return_type(m, args)?;
        if let Some(target) = CallTarget::of(&m.candidate, &extensions) {
            self.ctx.metadata.set_target(idx, target);
        }
        Ok(ret)
    }

    /// Types of the arguments, with closure literals left as raw `Closure`.
    fn provisional_argument_types(&mut self, args: &[NodeIndex]) -> VisitResult<Vec<TypeId>> {
        let db = self.ctx.db;
        let closure = db.class_type(db.well_known().closure, &[]);
        args.iter()
            .map(|&arg| {
                if self.ctx.arena.is_closure(arg) {
                    Ok(closure)
                } else {
                    self.visit_expr_expecting(arg, None)
                }
            })
            .collect()
    }

    /// Visit closure arguments of a call that was not resolved.
    fn visit_unhinted_closures(&mut self, args: &[NodeIndex], arg_types: &mut [TypeId]) -> VisitResult<()> {
        for (i, &arg) in args.iter().enumerate() {
            if self.ctx.arena.is_closure(arg) {
                arg_types[i] = self.visit_closure(arg, None, None)?;
            }
        }
        Ok(())
    }

    fn visit_closure_arguments(
        &mut self,
        args: &[NodeIndex],
        m: &MethodMatch,
        arg_types: &mut [TypeId],
    ) -> VisitResult<()> {
        let db = self.ctx.db;
        for (i, &arg) in args.iter().enumerate() {
            if !self.ctx.arena.is_closure(arg) {
                continue;
            }
            let extensions = Arc::clone(&self.ctx.extension_methods);
            let resolver = MethodResolver::new(db).with_extensions(&extensions);
            let hints = resolver.closure_params(m, i, arg_types);
            let delegation = resolver.delegation(m, i, arg_types);
            trace!(arg = i, ?hints, ?delegation, "visiting closure argument");
            arg_types[i] = self.visit_closure(arg, hints, delegation)?;
        }
        Ok(())
    }

    // =========================================================================
    // Method calls
    // =========================================================================

    pub(crate) fn visit_method_call(
        &mut self,
        idx: NodeIndex,
        receiver: NodeIndex,
        name: &str,
        args: &[NodeIndex],
        safe: bool,
        spread: bool,
    ) -> VisitResult {
        let db = self.ctx.db;
        let mut arg_types = self.provisional_argument_types(args)?;
        if receiver.is_none() {
            return self.visit_implicit_call(idx, name, args, arg_types);
        }

        if let Some(class_type) = self.class_reference(receiver) {
            let class_object = self.class_literal_type(class_type);
            self.ctx.metadata.store_type(db, receiver, class_object);
            let mut resolution = self.resolve_static_on(class_type, name, &arg_types);
            if matches!(resolution, MethodResolution::NotFound) {
                resolution = self.resolve_on(class_object, name, &arg_types);
            }
            return self.complete_call(idx, class_type, name, args, arg_types, resolution);
        }

        let receiver_type = self.visit_expr_expecting(receiver, None)?;
        if receiver_type == TypeId::DYNAMIC {
            self.visit_unhinted_closures(args, &mut arg_types)?;
            return Ok(TypeId::DYNAMIC);
        }

        if spread {
            let element = self.element_type(receiver_type);
            if element == TypeId::DYNAMIC {
                self.visit_unhinted_closures(args, &mut arg_types)?;
                return Ok(TypeId::DYNAMIC);
            }
            let resolution = self.resolve_on(element, name, &arg_types);
            let ret = self.complete_call(idx, element, name, args, arg_types, resolution)?;
            return Ok(if ret == TypeId::DYNAMIC {
                ret
            } else {
                self.list_of(ret)
            });
        }

        let mut resolution = self.resolve_on(receiver_type, name, &arg_types);
        if matches!(resolution, MethodResolution::NotFound) {
            if let Some(declared) = self.unnarrowed_type(receiver) {
                resolution = self.resolve_on(declared, name, &arg_types);
            }
        }
        let ret = self.complete_call(idx, receiver_type, name, args, arg_types, resolution)?;
        Ok(if safe { box_type(db, ret) } else { ret })
    }

    /// Type of a narrowed local without its `instanceof` facts.
    fn unnarrowed_type(&self, receiver: NodeIndex) -> Option<TypeId> {
        let Some(NodeKind::Variable { name }) = self.ctx.arena.kind(receiver) else {
            return None;
        };
        self.ctx.narrowed_type(name)?;
        self.ctx.lookup_variable(name).map(|info| info.current)
    }

    fn visit_implicit_call(
        &mut self,
        idx: NodeIndex,
        name: &str,
        args: &[NodeIndex],
        mut arg_types: Vec<TypeId>,
    ) -> VisitResult {
        let db = self.ctx.db;
        if let Some(info) = self.ctx.lookup_variable(name) {
            let callee = self.ctx.narrowed_type(name).unwrap_or(info.current);
            if let Some(ret) = self.closure_call_type(callee) {
                self.visit_unhinted_closures(args, &mut arg_types)?;
                return Ok(ret);
            }
        }

        let receivers = self.implicit_receivers();
        for receiver in &receivers {
            let resolution = if receiver.static_only {
                self.resolve_static_on(receiver.ty, name, &arg_types)
            } else {
                self.resolve_on(receiver.ty, name, &arg_types)
            };
            if !matches!(resolution, MethodResolution::NotFound) {
                self.ctx
                    .metadata
                    .set_implicit_receiver(idx, receiver.path.clone());
                return self.complete_call(idx, receiver.ty, name, args, arg_types, resolution);
            }
        }

        // An instance method called from static code.
        if let Some(receiver) = receivers.iter().find(|r| r.is_class && r.static_only) {
            if let MethodResolution::Resolved(_) = self.resolve_on(receiver.ty, name, &arg_types) {
                self.error_static_context(receiver.ty, name, idx);
                self.visit_unhinted_closures(args, &mut arg_types)?;
                return Ok(TypeId::DYNAMIC);
            }
        }

        let receiver = receivers
            .iter()
            .find(|r| r.is_class)
            .map_or_else(|| db.object_type(), |r| r.ty);
        self.complete_call(idx, receiver, name, args, arg_types, MethodResolution::NotFound)
    }

    /// Result type when a value of type `callee` is called like a method.
    fn closure_call_type(&self, callee: TypeId) -> Option<TypeId> {
        let db = self.ctx.db;
        if callee == TypeId::DYNAMIC {
            return Some(TypeId::DYNAMIC);
        }
        if db.class_of(callee) != Some(db.well_known().closure) {
            return None;
        }
        Some(
            type_args(db, callee)
                .first()
                .copied()
                .unwrap_or_else(|| db.object_type()),
        )
    }

    /// Apply the extension hooks and the resolution outcome to a call.
    fn complete_call(
        &mut self,
        idx: NodeIndex,
        receiver: TypeId,
        name: &str,
        args: &[NodeIndex],
        mut arg_types: Vec<TypeId>,
        resolution: MethodResolution,
    ) -> VisitResult {
        let db = self.ctx.db;
        let mut before = MethodCallEvent {
            node: idx,
            receiver,
            name: name.to_string(),
            arg_types: arg_types.clone(),
            return_type: None,
            target: None,
        };
        if self.extensions.before_method_call(db, &mut before).is_handled() {
            self.visit_unhinted_closures(args, &mut arg_types)?;
            return Ok(before.return_type.unwrap_or(TypeId::DYNAMIC));
        }

        let m = match resolution {
            MethodResolution::Resolved(m) => *m,
            MethodResolution::NotFound => {
                let mut event = MissingMethodEvent {
                    node: idx,
                    receiver,
                    name: name.to_string(),
                    arg_types: arg_types.clone(),
                    return_type: None,
                };
                if !self.extensions.handle_missing_method(db, &mut event).is_handled() {
                    self.error_no_matching_method(receiver, name, &arg_types, idx);
                }
                self.visit_unhinted_closures(args, &mut arg_types)?;
                return Ok(event.return_type.unwrap_or(TypeId::DYNAMIC));
            }
            MethodResolution::Ambiguous(candidates) => {
                let mut event = AmbiguousMethodEvent {
                    node: idx,
                    receiver,
                    name: name.to_string(),
                    candidates,
                    chosen: None,
                };
                let handled = self.extensions.handle_ambiguous_method(db, &mut event).is_handled();
                let chosen = event
                    .chosen
                    .filter(|_| handled)
                    .and_then(|i| event.candidates.get(i).cloned());
                match chosen {
                    Some(m) => m,
                    None => {
                        if !handled {
                            self.error_ambiguous_method(&event.candidates, idx);
                        }
                        self.visit_unhinted_closures(args, &mut arg_types)?;
                        return Ok(TypeId::DYNAMIC);
                    }
                }
            }
        };

        if !m.candidate.type_params.is_empty() {
            let violations = check_bounds(db, &m.candidate.type_params, &m.connections.bindings);
            if !violations.is_empty() {
                self.error_bound_violations(&violations, idx);
            }
            let conflict = m
                .connections
                .violations(db)
                .find(|c| m.candidate.type_params.iter().any(|p| p.name == c.placeholder))
                .cloned();
            if let Some(conflict) = conflict {
                self.error_generic_conflict(&conflict, idx);
            }
        }
        self.visit_closure_arguments(args, &m, &mut arg_types)?;
        let ret = self.call_return_type(idx, &m, &arg_types)?;

        let mut after = MethodCallEvent {
            node: idx,
            receiver,
            name: name.to_string(),
            arg_types,
            return_type: Some(ret),
            target: m.candidate.method,
        };
        self.extensions.after_method_call(db, &mut after);
        Ok(after.return_type.unwrap_or(ret))
    }

    // =========================================================================
    // Constructor calls
    // =========================================================================

    pub(crate) fn visit_constructor_call(
        &mut self,
        idx: NodeIndex,
        ty: &TypeRef,
        args: &[NodeIndex],
    ) -> VisitResult {
        let db = self.ctx.db;
        let resolved = self.resolve_type_at(ty, idx);
        let mut arg_types = self.provisional_argument_types(args)?;
        let Some(class) = db.class_of(resolved) else {
            self.visit_unhinted_closures(args, &mut arg_types)?;
            return Ok(resolved);
        };
        let class_type = if ty.is_diamond() {
            self.complete_diamond(idx, resolved)
        } else {
            self.check_explicit_type_args(idx, resolved);
            resolved
        };
        trace!(class = %db.class_def(class).name, "constructor call");

        match self.resolve_constructor_on(class_type, &arg_types) {
            MethodResolution::Resolved(m) => {
                self.visit_closure_arguments(args, &m, &mut arg_types)?;
                if let Some(target) = CallTarget::of(&m.candidate, &self.ctx.extension_methods) {
                    self.ctx.metadata.set_target(idx, target);
                }
            }
            MethodResolution::Ambiguous(candidates) => {
                self.error_ambiguous_method(&candidates, idx);
                self.visit_unhinted_closures(args, &mut arg_types)?;
            }
            MethodResolution::NotFound => {
                if !self.named_argument_constructor(class_type, args) {
                    self.error_no_matching_constructor(class_type, &arg_types, idx);
                }
                self.visit_unhinted_closures(args, &mut arg_types)?;
            }
        }
        Ok(class_type)
    }

    /// `new C<>()`: type arguments come from the type the value is assigned to.
    fn complete_diamond(&mut self, idx: NodeIndex, raw: TypeId) -> TypeId {
        let db = self.ctx.db;
        let Some(class) = db.class_of(raw) else {
            return raw;
        };
        let expected = self.ctx.expected_type();
        let params = db.class_def(class).type_params.clone();
        if params.is_empty() {
            self.error_diamond_inference(raw, expected, idx);
            return raw;
        }
        let object_args = vec![db.object_type(); params.len()];
        let Some(target) = expected.filter(|&t| db.class_of(t).is_some()) else {
            return db.class_type(class, &object_args);
        };
        let Some(target_class) = db.class_of(target) else {
            return db.class_type(class, &object_args);
        };
        let generic_args: Vec<TypeId> = params.iter().map(|p| db.placeholder(&p.name)).collect();
        let generic = db.class_type(class, &generic_args);
        let Some(view) = as_supertype(db, generic, target_class) else {
            self.error_diamond_inference(raw, Some(target), idx);
            return db.class_type(class, &object_args);
        };
        let connections = extract_connections(db, target, view);
        let args: Vec<TypeId> = params
            .iter()
            .map(|p| {
                connections
                    .bindings
                    .get(&p.name)
                    .copied()
                    .map(|t| match db.lookup(t) {
                        TypeData::Wildcard { upper, lower } => {
                            lower.or(upper).unwrap_or_else(|| db.object_type())
                        }
                        _ => box_type(db, t),
                    })
                    .unwrap_or_else(|| db.object_type())
            })
            .collect();
        db.class_type(class, &args)
    }

    /// `new C<A, B>()`: the arguments must satisfy C's bounds.
    fn check_explicit_type_args(&mut self, idx: NodeIndex, class_type: TypeId) {
        let db = self.ctx.db;
        let Some(class) = db.class_of(class_type) else {
            return;
        };
        let args = type_args(db, class_type);
        if args.is_empty() {
            return;
        }
        let params = db.class_def(class).type_params.clone();
        let bindings: Bindings = params.iter().map(|p| p.name.clone()).zip(args).collect();
        let violations = check_bounds(db, &params, &bindings);
        if !violations.is_empty() {
            self.error_bound_violations(&violations, idx);
        }
    }

    /// `new Person(name: 'x', age: 3)`: a single map literal with string keys
    /// sets properties after the no-argument constructor runs. Returns false
    /// when the call does not have that shape.
    fn named_argument_constructor(&mut self, class_type: TypeId, args: &[NodeIndex]) -> bool {
        let db = self.ctx.db;
        let arena = self.ctx.arena;
        let [arg] = args else {
            return false;
        };
        let Some(NodeKind::MapLiteral { entries }) = arena.kind(*arg) else {
            return false;
        };
        let mut named = Vec::with_capacity(entries.len());
        for &(key, value) in entries {
            let Some(NodeKind::Literal(LiteralValue::String(name))) = arena.kind(key) else {
                return false;
            };
            named.push((name.as_str(), key, value));
        }
        if !matches!(
            self.resolve_constructor_on(class_type, &[]),
            MethodResolution::Resolved(_)
        ) {
            return false;
        }
        for (name, key, value) in named {
            let value_type = self
                .ctx
                .metadata
                .inferred_type(value)
                .unwrap_or(TypeId::DYNAMIC);
            match lookup_property(db, class_type, name, false) {
                Some(info) if info.read_only => self.error_read_only_property(name, key),
                Some(info) => {
                    self.check_assignment_compat(info.ty, value_type, value);
                }
                None => self.error_no_such_property(name, class_type, key),
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "tests/call_checker_tests.rs"]
mod tests;
