//! Statement checking.
//!
//! Statements have no type; checking them types the expressions they contain
//! and maintains scopes. Branches and loops go through assignment tracking
//! (see `flow_narrowing`).

use crate::context::AssignmentFrame;
use crate::flow_narrowing::Facts;
use crate::state::{CheckerState, VisitResult};
use smallvec::SmallVec;
use stc_ast::{CatchClause, NodeIndex, NodeKind, SwitchCase, TypeRef};
use stc_solver::hierarchy::as_supertype;
use stc_solver::numeric::array_component;
use stc_solver::resolution::sam_param_types;
use stc_solver::{
    AssignMode, ClosureParamTypes, TypeData, TypeDatabase, TypeId, is_assignable_to,
    least_upper_bound,
};

impl<'a> CheckerState<'a> {
    pub(crate) fn check_statement(&mut self, idx: NodeIndex) -> VisitResult<()> {
        let arena = self.ctx.arena;
        let Some(kind) = arena.kind(idx) else {
            return Ok(());
        };
        match kind {
            NodeKind::Block { statements } => {
                self.ctx.push_scope();
                let result = self.check_statements(statements);
                self.ctx.pop_scope();
                result
            }
            NodeKind::ExpressionStatement { expr } => {
                self.visit_expr_expecting(*expr, None)?;
                Ok(())
            }
            NodeKind::VariableDecl { name, ty, init } => {
                self.check_variable_decl(idx, name, ty.as_ref(), *init)
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.check_if(idx, *condition, *then_branch, *else_branch),
            NodeKind::While { condition, body } => self.check_while(idx, *condition, *body),
            NodeKind::DoWhile { body, condition } => {
                self.with_assignment_tracking(idx, |this| {
                    let frame = this.tracked_path(&Facts::new(), |this| {
                        this.check_statement(*body)?;
                        this.visit_expr_expecting(*condition, None)?;
                        Ok(())
                    })?;
                    Ok(vec![frame])
                })
            }
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => self.check_for(idx, *init, *condition, *update, *body),
            NodeKind::ForIn {
                var_name,
                var_type,
                iterable,
                body,
            } => self.check_for_in(idx, var_name, var_type.as_ref(), *iterable, *body),
            NodeKind::Switch { subject, cases } => self.check_switch(idx, *subject, cases),
            NodeKind::TryCatch {
                body,
                catches,
                finally,
            } => self.check_try_catch(idx, *body, catches, *finally),
            NodeKind::Return { expr } => self.check_return(idx, *expr),
            NodeKind::Throw { expr } => {
                self.visit_expr_expecting(*expr, None)?;
                Ok(())
            }
            NodeKind::Break | NodeKind::Continue => Ok(()),
            NodeKind::Method { .. } => self.check_method(idx),
            NodeKind::Constructor { .. } => self.check_constructor(idx),
            NodeKind::Class { .. } => self.check_class(idx),
            NodeKind::CompilationUnit { .. } => Ok(()),
            _ => {
                self.visit_expr_expecting(idx, None)?;
                Ok(())
            }
        }
    }

    pub(crate) fn check_statements(&mut self, statements: &[NodeIndex]) -> VisitResult<()> {
        for &statement in statements {
            self.check_statement(statement)?;
        }
        Ok(())
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Type a value stored in a slot declared as `declared`: closures get
    /// parameter hints from a single-abstract-method slot, collection
    /// literals complete their generics from it, and the value must be
    /// assignable.
    pub(crate) fn check_initializer(&mut self, declared: TypeId, init: NodeIndex) -> VisitResult {
        let value = if self.ctx.arena.is_closure(init) && declared != TypeId::DYNAMIC {
            let hints = sam_param_types(self.ctx.db, declared).map(ClosureParamTypes::Fixed);
            self.visit_closure(init, hints, None)?
        } else {
            self.visit_expr_expecting(init, Some(declared))?
        };
        if !self.check_assignment_compat(declared, value, init) {
            return Ok(declared);
        }
        Ok(value)
    }

    fn check_variable_decl(
        &mut self,
        idx: NodeIndex,
        name: &str,
        ty: Option<&TypeRef>,
        init: NodeIndex,
    ) -> VisitResult<()> {
        let declared = self.resolve_optional_type(ty, idx);
        let current = if init.is_some() {
            let value = self.check_initializer(declared, init)?;
            self.flow_type(declared, value)
        } else {
            declared
        };
        self.ctx.declare_variable(name, declared, current);
        self.ctx.metadata.store_type(self.ctx.db, idx, current);
        Ok(())
    }

    // =========================================================================
    // Branches
    // =========================================================================

    fn check_if(
        &mut self,
        idx: NodeIndex,
        condition: NodeIndex,
        then_branch: NodeIndex,
        else_branch: NodeIndex,
    ) -> VisitResult<()> {
        self.with_assignment_tracking(idx, |this| {
            this.visit_expr_expecting(condition, None)?;
            let positive = this.instanceof_facts(condition, false);
            let negative = this.instanceof_facts(condition, true);
            let then_frame = this.tracked_path(&positive, |this| this.check_statement(then_branch))?;
            let else_frame = if else_branch.is_some() {
                this.tracked_path(&negative, |this| this.check_statement(else_branch))?
            } else {
                AssignmentFrame::default()
            };
            Ok(vec![then_frame, else_frame])
        })
    }

    fn check_switch(&mut self, idx: NodeIndex, subject: NodeIndex, cases: &[SwitchCase]) -> VisitResult<()> {
        self.visit_expr_expecting(subject, None)?;
        let has_default = cases.iter().any(|c| c.values.is_empty());
        self.with_assignment_tracking(idx, |this| {
            let mut paths = Vec::with_capacity(cases.len() + 1);
            for case in cases {
                for &value in &case.values {
                    this.visit_expr_expecting(value, None)?;
                }
                paths.push(this.tracked_path(&Facts::new(), |this| this.check_statement(case.body))?);
            }
            if !has_default {
                paths.push(AssignmentFrame::default());
            }
            Ok(paths)
        })
    }

    fn check_try_catch(
        &mut self,
        idx: NodeIndex,
        body: NodeIndex,
        catches: &[CatchClause],
        finally: NodeIndex,
    ) -> VisitResult<()> {
        self.check_statement(body)?;
        for clause in catches {
            let types: SmallVec<[TypeId; 2]> = clause
                .types
                .iter()
                .map(|t| self.resolve_type_at(t, idx))
                .collect();
            let caught = if types.is_empty() {
                let wk = self.ctx.db.well_known();
                self.ctx.db.class_type(wk.exception, &[])
            } else {
                least_upper_bound(self.ctx.db, &types)
            };
            self.ctx.push_scope();
            self.ctx.declare_variable(&clause.name, caught, caught);
            let result = self.check_statement(clause.body);
            self.ctx.pop_scope();
            result?;
        }
        if finally.is_some() {
            self.check_statement(finally)?;
        }
        Ok(())
    }

    // =========================================================================
    // Loops
    // =========================================================================

    fn check_while(&mut self, idx: NodeIndex, condition: NodeIndex, body: NodeIndex) -> VisitResult<()> {
        self.with_assignment_tracking(idx, |this| {
            this.visit_expr_expecting(condition, None)?;
            let facts = this.instanceof_facts(condition, false);
            let frame = this.tracked_path(&facts, |this| this.check_statement(body))?;
            Ok(vec![frame, AssignmentFrame::default()])
        })
    }

    fn check_for(
        &mut self,
        idx: NodeIndex,
        init: NodeIndex,
        condition: NodeIndex,
        update: NodeIndex,
        body: NodeIndex,
    ) -> VisitResult<()> {
        self.ctx.push_scope();
        let result = self.check_statement(init).and_then(|()| {
            self.with_assignment_tracking(idx, |this| {
                this.visit_expr_expecting(condition, None)?;
                let facts = this.instanceof_facts(condition, false);
                let frame = this.tracked_path(&facts, |this| {
                    this.check_statement(body)?;
                    this.visit_expr_expecting(update, None)?;
                    Ok(())
                })?;
                Ok(vec![frame, AssignmentFrame::default()])
            })
        });
        self.ctx.pop_scope();
        result
    }

    fn check_for_in(
        &mut self,
        idx: NodeIndex,
        var_name: &str,
        var_type: Option<&TypeRef>,
        iterable: NodeIndex,
        body: NodeIndex,
    ) -> VisitResult<()> {
        let iterable_type = self.visit_expr_expecting(iterable, None)?;
        let element = self.element_type(iterable_type);
        let declared = self.resolve_optional_type(var_type, idx);
        let current = if declared == TypeId::DYNAMIC {
            element
        } else {
            if !is_assignable_to(self.ctx.db, element, declared, AssignMode::Coercion) {
                self.error_incompatible_assignment(element, declared, idx);
            }
            declared
        };
        self.ctx.push_scope();
        self.ctx.declare_variable(var_name, declared, current);
        let result = self.with_assignment_tracking(idx, |this| {
            let frame = this.tracked_path(&Facts::new(), |this| this.check_statement(body))?;
            Ok(vec![frame, AssignmentFrame::default()])
        });
        self.ctx.pop_scope();
        result
    }

    /// Type of the loop variable when iterating over `iterable`.
    pub(crate) fn element_type(&self, iterable: TypeId) -> TypeId {
        let db = self.ctx.db;
        let wk = db.well_known();
        if iterable == TypeId::DYNAMIC {
            return TypeId::DYNAMIC;
        }
        if let Some(component) = array_component(db, iterable) {
            return component;
        }
        if let Some(map) = as_supertype(db, iterable, wk.map) {
            let args = type_args(db, map);
            return match args.as_slice() {
                [key, value] => db.class_type(wk.map_entry, &[*key, *value]),
                _ => db.class_type(wk.map_entry, &[]),
            };
        }
        if db.class_of(iterable) == Some(wk.string) {
            return db.string_type();
        }
        for class in [wk.iterator, wk.iterable] {
            if let Some(view) = as_supertype(db, iterable, class) {
                return type_args(db, view)
                    .first()
                    .copied()
                    .unwrap_or_else(|| db.object_type());
            }
        }
        db.object_type()
    }

    // =========================================================================
    // Returns
    // =========================================================================

    fn check_return(&mut self, idx: NodeIndex, expr: NodeIndex) -> VisitResult<()> {
        if self.ctx.in_closure() {
            let value = self.visit_expr_expecting(expr, None)?;
            if let Some(frame) = self.ctx.enclosing_closures.last_mut() {
                frame.returns.push(value);
            }
            return Ok(());
        }
        let declared = self.ctx.current_method().and_then(|m| m.declared_return);
        let value = if expr.is_some() {
            match declared {
                Some(declared) if declared != TypeId::VOID => self.check_initializer_value(declared, expr)?,
                _ => self.visit_expr_expecting(expr, None)?,
            }
        } else {
            TypeId::VOID
        };
        match declared {
            Some(declared) => self.check_return_value(value, declared, idx),
            None => {
                if let Some(frame) = self.ctx.enclosing_methods.last_mut() {
                    frame.returns.push(value);
                }
            }
        }
        Ok(())
    }

    /// Type a returned expression against the declared return type without
    /// reporting an assignment error; the return check reports instead.
    fn check_initializer_value(&mut self, declared: TypeId, expr: NodeIndex) -> VisitResult {
        if self.ctx.arena.is_closure(expr) {
            let hints = sam_param_types(self.ctx.db, declared).map(ClosureParamTypes::Fixed);
            return self.visit_closure(expr, hints, None);
        }
        self.visit_expr_expecting(expr, Some(declared))
    }

    pub(crate) fn check_return_value(&mut self, value: TypeId, declared: TypeId, at: NodeIndex) {
        if value == TypeId::VOID || declared == TypeId::DYNAMIC {
            return;
        }
        if declared == TypeId::VOID
            || !is_assignable_to(self.ctx.db, value, declared, AssignMode::Coercion)
        {
            self.error_incompatible_return(value, declared, at);
        }
    }

    /// Type of the last expression statement of `body`, which a method or
    /// closure returns implicitly.
    pub(crate) fn implicit_return(&self, body: NodeIndex) -> Option<(TypeId, NodeIndex)> {
        let arena = self.ctx.arena;
        let last = match arena.kind(body) {
            Some(NodeKind::Block { statements }) => *statements.last()?,
            _ => body,
        };
        match arena.kind(last) {
            Some(NodeKind::ExpressionStatement { expr }) => {
                let ty = self.ctx.metadata.inferred_type(*expr)?;
                Some((ty, *expr))
            }
            _ => None,
        }
    }
}

pub(crate) fn type_args(db: &dyn TypeDatabase, ty: TypeId) -> SmallVec<[TypeId; 2]> {
    match db.lookup(ty) {
        TypeData::Class(class_ref) => class_ref.args,
        _ => SmallVec::new(),
    }
}

#[cfg(test)]
#[path = "tests/statements_tests.rs"]
mod tests;
