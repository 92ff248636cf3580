//! Class bodies, methods, constructors and top-level script code.
//!
//! Methods are checked once per pass. A call to a `def` method whose return
//! type has not been inferred yet checks that method first, out of order, in a
//! fresh context (`infer_on_demand`); the result is memoized on the store.

use crate::context::{ClassFrame, MethodFrame};
use crate::extension::{MethodVisitEvent, TypeCheckingExtension};
use crate::state::{CheckerState, VisitResult};
use smallvec::SmallVec;
use stc_ast::{FieldDecl, NodeIndex, NodeKind, Param};
use stc_solver::numeric::box_type;
use stc_solver::{ClassId, MethodId, TypeId, least_upper_bound};
use std::sync::Arc;
use tracing::debug;

impl<'a> CheckerState<'a> {
    pub(crate) fn push_class_frame(&mut self, class: ClassId) {
        let db = self.ctx.db;
        let args: Vec<TypeId> = db
            .class_def(class)
            .type_params
            .iter()
            .map(|p| db.placeholder(&p.name))
            .collect();
        let self_type = db.class_type(class, &args);
        self.ctx
            .enclosing_classes
            .push(ClassFrame { class, self_type });
    }

    pub(crate) fn check_class(&mut self, idx: NodeIndex) -> VisitResult<()> {
        let arena = self.ctx.arena;
        let Some(NodeKind::Class {
            name,
            fields,
            members,
            ..
        }) = arena.kind(idx)
        else {
            return Ok(());
        };
        let Some(class) = self.declared.class_of_node(idx) else {
            return Ok(());
        };
        debug!(class = %name, "check_class");
        let before = self.ctx.depths();
        self.push_class_frame(class);
        for field in fields {
            self.check_field_initializer(class, field)?;
        }
        for &member in members {
            match arena.kind(member) {
                Some(NodeKind::Method { .. }) => self.check_method(member)?,
                Some(NodeKind::Constructor { .. }) => self.check_constructor(member)?,
                _ => {}
            }
        }
        self.ctx.enclosing_classes.pop();
        self.ctx.ensure_balanced(before)
    }

    fn field_type(&self, class: ClassId, name: &str) -> TypeId {
        let def = self.ctx.db.class_def(class);
        def.properties
            .iter()
            .map(|p| (&p.name, p.ty))
            .chain(def.fields.iter().map(|f| (&f.name, f.ty)))
            .find(|(n, _)| &***n == name)
            .map_or(TypeId::DYNAMIC, |(_, ty)| ty)
    }

    /// Initializers run in a synthetic method of their own.
    fn check_field_initializer(&mut self, class: ClassId, field: &FieldDecl) -> VisitResult<()> {
        if field.init.is_none() {
            return Ok(());
        }
        let declared = self.field_type(class, &field.name);
        self.ctx.enclosing_methods.push(MethodFrame {
            node: field.init,
            method: None,
            declared_return: None,
            is_static: field.is_static,
            type_params: Vec::new(),
            returns: SmallVec::new(),
            closure_depth: self.ctx.enclosing_closures.len(),
        });
        self.ctx.push_scope();
        self.check_initializer(declared, field.init)?;
        self.ctx.pop_scope();
        self.ctx.enclosing_methods.pop();
        Ok(())
    }

    /// Declare parameters in the current scope and check their defaults.
    fn declare_parameters(&mut self, params: &[Param], method: Option<MethodId>) -> VisitResult<()> {
        let db = self.ctx.db;
        for (i, param) in params.iter().enumerate() {
            let ty = method
                .and_then(|m| db.method_def(m).params.get(i))
                .map_or_else(|| db.object_type(), |p| p.ty);
            if param.default.is_some() {
                self.check_initializer(ty, param.default)?;
            }
            self.ctx.declare_variable(&param.name, ty, ty);
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn check_method(&mut self, idx: NodeIndex) -> VisitResult<()> {
        if self.checked_methods.contains(&idx) || self.in_progress.contains(&idx) {
            return Ok(());
        }
        let arena = self.ctx.arena;
        let Some(NodeKind::Method {
            name,
            type_params,
            params,
            body,
            is_static,
            skip_checking,
            ..
        }) = arena.kind(idx)
        else {
            return Ok(());
        };
        let db = self.ctx.db;
        let method = self.declared.method_of_node(idx);
        let mut event = MethodVisitEvent {
            node: idx,
            name: name.clone(),
            method,
        };
        if *skip_checking || self.extensions.before_visit_method(db, &mut event).is_handled() {
            debug!(method = %name, "skipping method body");
            self.checked_methods.insert(idx);
            return Ok(());
        }

        self.in_progress.insert(idx);
        let before = self.ctx.depths();
        let declared_return = method
            .map(|m| db.method_def(m).return_type)
            .filter(|&t| t != TypeId::DYNAMIC);
        self.ctx.enclosing_methods.push(MethodFrame {
            node: idx,
            method,
            declared_return,
            is_static: *is_static,
            type_params: type_params
                .iter()
                .map(|t| Arc::from(t.name.as_str()))
                .collect(),
            returns: SmallVec::new(),
            closure_depth: self.ctx.enclosing_closures.len(),
        });
        self.ctx.push_scope();
        self.declare_parameters(params, method)?;
        self.check_statement(*body)?;
        let implicit = self.implicit_return(*body);
        self.ctx.pop_scope();
        let frame = self.ctx.enclosing_methods.pop();

        match declared_return {
            Some(declared) => {
                if let Some((value, at)) = implicit.filter(|_| declared != TypeId::VOID) {
                    self.check_return_value(value, declared, at);
                }
                self.ctx.metadata.store_return_type(db, idx, declared);
            }
            None => {
                let mut returns: SmallVec<[TypeId; 4]> =
                    frame.map(|f| f.returns).unwrap_or_default();
                returns.extend(implicit.map(|(ty, _)| ty));
                let inferred = self.merge_return_types(&returns);
                if let Some(method) = method {
                    db.record_inferred_return_type(method, inferred);
                }
                self.ctx.metadata.store_return_type(db, idx, inferred);
                debug!(method = %name, inferred = %self.type_to_string(inferred), "inferred return type");
            }
        }

        self.in_progress.remove(&idx);
        self.checked_methods.insert(idx);
        self.extensions.after_visit_method(db, &mut event);
        self.ctx.ensure_balanced(before)
    }

    /// Boxed least upper bound of the collected return types; `void` counts
    /// as `null` and nothing at all as `Object`.
    pub(crate) fn merge_return_types(&self, returns: &[TypeId]) -> TypeId {
        let db = self.ctx.db;
        let values: SmallVec<[TypeId; 4]> = returns
            .iter()
            .map(|&t| if t == TypeId::VOID { TypeId::NULL } else { t })
            .collect();
        match least_upper_bound(db, &values) {
            TypeId::NULL => db.object_type(),
            ty => box_type(db, ty),
        }
    }

    pub(crate) fn check_constructor(&mut self, idx: NodeIndex) -> VisitResult<()> {
        if !self.checked_methods.insert(idx) {
            return Ok(());
        }
        let arena = self.ctx.arena;
        let Some(NodeKind::Constructor { params, body }) = arena.kind(idx) else {
            return Ok(());
        };
        let before = self.ctx.depths();
        let method = self.declared.method_of_node(idx);
        self.ctx.enclosing_methods.push(MethodFrame {
            node: idx,
            method,
            declared_return: Some(TypeId::VOID),
            is_static: false,
            type_params: Vec::new(),
            returns: SmallVec::new(),
            closure_depth: self.ctx.enclosing_closures.len(),
        });
        self.ctx.push_scope();
        self.declare_parameters(params, method)?;
        self.check_statement(*body)?;
        self.ctx.pop_scope();
        self.ctx.enclosing_methods.pop();
        self.ctx.ensure_balanced(before)
    }

    /// Top-level statements run in the synthetic script class. Methods
    /// declared in the script are checked before the statements.
    pub(crate) fn check_script(&mut self, root: NodeIndex) -> VisitResult<()> {
        let arena = self.ctx.arena;
        let before = self.ctx.depths();
        let script_class = self.declared.script_class;
        if let Some(class) = script_class {
            self.push_class_frame(class);
        }

        let statements: &[NodeIndex] = match arena.kind(root) {
            Some(NodeKind::Block { statements }) => statements,
            _ => std::slice::from_ref(&root),
        };
        for &statement in statements {
            if matches!(arena.kind(statement), Some(NodeKind::Method { .. })) {
                self.check_method(statement)?;
            }
        }

        self.ctx.enclosing_methods.push(MethodFrame {
            node: root,
            method: None,
            declared_return: None,
            is_static: false,
            type_params: Vec::new(),
            returns: SmallVec::new(),
            closure_depth: 0,
        });
        self.ctx.push_scope();
        for &statement in statements {
            self.check_statement(statement)?;
        }
        self.ctx.pop_scope();
        self.ctx.enclosing_methods.pop();

        if script_class.is_some() {
            self.ctx.enclosing_classes.pop();
        }
        self.ctx.ensure_balanced(before)
    }

    /// Make sure the return type of `method` is known before a call uses it.
    ///
    /// Only `def` methods of this unit that have not been checked yet are
    /// affected. The method is checked with empty stacks; its diagnostics are
    /// set aside so that a re-visit of the calling construct keeps them.
    pub(crate) fn infer_on_demand(&mut self, method: MethodId) -> VisitResult<()> {
        let db = self.ctx.db;
        let def = db.method_def(method);
        if def.return_type != TypeId::DYNAMIC || db.inferred_return_type(method).is_some() {
            return Ok(());
        }
        let Some(node) = def.decl_node.map(NodeIndex) else {
            return Ok(());
        };
        if self.declared.method_of_node(node) != Some(method)
            || self.checked_methods.contains(&node)
            || self.in_progress.contains(&node)
        {
            return Ok(());
        }
        debug!(method = %def.name, "inferring return type on demand");
        let saved = self.ctx.take_stacks();
        let outer_errors = std::mem::take(&mut self.ctx.errors);
        self.push_class_frame(def.declaring);
        let result = self.check_method(node);
        self.ctx.enclosing_classes.pop();
        let method_errors = std::mem::replace(&mut self.ctx.errors, outer_errors);
        self.deferred_diagnostics
            .extend(method_errors.into_diagnostics());
        self.ctx.restore_stacks(saved);
        result
    }
}

#[cfg(test)]
#[path = "tests/class_checker_tests.rs"]
mod tests;
