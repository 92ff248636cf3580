//! Expression dispatch and the simple expression kinds.
//!
//! `visit_expr` is the single entry point for typing an expression node. It
//! enforces the nesting depth limit and records the result in the metadata
//! table; the per-kind work lives here or in the specialized modules.

use crate::state::{CheckerState, VisitResult};
use smallvec::SmallVec;
use stc_ast::{LiteralValue, NodeIndex, NodeKind, TypeRef};
use stc_solver::hierarchy::as_supertype;
use stc_solver::numeric::{box_type, is_numeric};
use stc_solver::resolution::sam_param_types;
use stc_solver::{
    AssignMode, ClosureParamTypes, TypeData, TypeId, is_assignable_to, least_upper_bound,
};
use tracing::trace;

impl<'a> CheckerState<'a> {
    /// Type an expression and record it for `idx`.
    pub(crate) fn visit_expr(&mut self, idx: NodeIndex) -> VisitResult {
        if idx.is_none() {
            return Ok(TypeId::VOID);
        }
        if self.ctx.expr_depth >= self.ctx.options.max_expr_depth {
            trace!(node = idx.0, "expression depth limit reached");
            return Ok(TypeId::DYNAMIC);
        }
        self.ctx.expr_depth += 1;
        let result = self.compute_expr_type(idx);
        self.ctx.expr_depth -= 1;
        let ty = result?;
        self.ctx.metadata.store_type(self.ctx.db, idx, ty);
        Ok(ty)
    }

    /// Type an expression while `expected` is the type of the slot it fills.
    pub(crate) fn visit_expr_expecting(
        &mut self,
        idx: NodeIndex,
        expected: Option<TypeId>,
    ) -> VisitResult {
        self.ctx
            .expected_types
            .push(expected.filter(|&t| t != TypeId::DYNAMIC));
        let result = self.visit_expr(idx);
        self.ctx.expected_types.pop();
        result
    }

    fn compute_expr_type(&mut self, idx: NodeIndex) -> VisitResult {
        let arena = self.ctx.arena;
        let Some(kind) = arena.kind(idx) else {
            return Ok(TypeId::DYNAMIC);
        };
        match kind {
            NodeKind::Literal(value) => Ok(self.literal_type(value)),
            NodeKind::GString { parts } => {
                for &part in parts {
                    self.visit_expr_expecting(part, None)?;
                }
                let wk = self.ctx.db.well_known();
                Ok(self.ctx.db.class_type(wk.gstring, &[]))
            }
            NodeKind::Variable { name } => self.visit_variable(idx, name),
            NodeKind::This => Ok(self.this_type()),
            NodeKind::Super => Ok(self.super_type()),
            NodeKind::Binary { op, left, right } => self.visit_binary(idx, *op, *left, *right),
            NodeKind::Unary { op, operand } => self.visit_unary(idx, *op, *operand),
            NodeKind::Ternary {
                condition,
                when_true,
                when_false,
            } => self.visit_ternary(*condition, *when_true, *when_false),
            NodeKind::Elvis { value, fallback } => {
                let value = self.visit_expr(*value)?;
                let fallback = self.visit_expr(*fallback)?;
                Ok(least_upper_bound(self.ctx.db, &[value, fallback]))
            }
            NodeKind::Cast {
                target,
                expr,
                coerce,
            } => self.visit_cast(idx, target, *expr, *coerce),
            NodeKind::ClassLiteral { ty } => {
                let target = self.resolve_type_at(ty, idx);
                Ok(self.class_literal_type(target))
            }
            NodeKind::MethodCall {
                receiver,
                name,
                args,
                safe,
                spread,
            } => self.visit_method_call(idx, *receiver, name, args, *safe, *spread),
            NodeKind::ConstructorCall { ty, args } => self.visit_constructor_call(idx, ty, args),
            NodeKind::Property {
                receiver,
                name,
                safe,
                spread,
            } => self.visit_property(idx, *receiver, name, *safe, *spread),
            NodeKind::Closure { .. } => self.visit_closure(idx, None, None),
            NodeKind::ListLiteral { elements } => self.visit_list_literal(elements),
            NodeKind::MapLiteral { entries } => self.visit_map_literal(entries),
            NodeKind::Range { from, to, .. } => self.visit_range(*from, *to),
            NodeKind::Block { .. }
            | NodeKind::ExpressionStatement { .. }
            | NodeKind::VariableDecl { .. }
            | NodeKind::If { .. }
            | NodeKind::While { .. }
            | NodeKind::DoWhile { .. }
            | NodeKind::For { .. }
            | NodeKind::ForIn { .. }
            | NodeKind::Switch { .. }
            | NodeKind::TryCatch { .. }
            | NodeKind::Return { .. }
            | NodeKind::Throw { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Method { .. }
            | NodeKind::Constructor { .. }
            | NodeKind::Class { .. }
            | NodeKind::CompilationUnit { .. } => {
                self.check_statement(idx)?;
                Ok(TypeId::VOID)
            }
        }
    }

    // =========================================================================
    // Literals
    // =========================================================================

    pub(crate) fn literal_type(&self, value: &LiteralValue) -> TypeId {
        let db = self.ctx.db;
        let wk = db.well_known();
        match value {
            LiteralValue::Integer(v) => {
                if i32::try_from(*v).is_ok() {
                    TypeId::INT
                } else {
                    TypeId::LONG
                }
            }
            LiteralValue::Long(_) => TypeId::LONG,
            LiteralValue::BigInteger(_) => db.class_type(wk.big_integer, &[]),
            LiteralValue::Decimal(_) => db.class_type(wk.big_decimal, &[]),
            LiteralValue::Double(_) => TypeId::DOUBLE,
            LiteralValue::Float(_) => TypeId::FLOAT,
            LiteralValue::String(_) => db.string_type(),
            LiteralValue::Char(_) => TypeId::CHAR,
            LiteralValue::Bool(_) => TypeId::BOOLEAN,
            LiteralValue::Null => TypeId::NULL,
        }
    }

    /// `Class<T>` for a class literal of `target`.
    pub(crate) fn class_literal_type(&self, target: TypeId) -> TypeId {
        let db = self.ctx.db;
        let boxed = box_type(db, target);
        db.class_type(db.well_known().class, &[boxed])
    }

    fn this_type(&self) -> TypeId {
        self.ctx
            .current_class()
            .map_or_else(|| self.ctx.db.object_type(), |frame| frame.self_type)
    }

    fn super_type(&self) -> TypeId {
        let db = self.ctx.db;
        self.ctx
            .current_class()
            .and_then(|frame| db.class_def(frame.class).super_class)
            .unwrap_or_else(|| db.object_type())
    }

    // =========================================================================
    // Conditional expressions
    // =========================================================================

    /// Least upper bound of both branches; the true branch sees the facts the
    /// condition establishes, the false branch their negation.
    fn visit_ternary(
        &mut self,
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    ) -> VisitResult {
        self.visit_expr_expecting(condition, None)?;
        let positive = self.instanceof_facts(condition, false);
        let negative = self.instanceof_facts(condition, true);

        self.ctx.push_type_info();
        for (name, ty) in &positive {
            self.ctx.add_type_fact(name, *ty);
        }
        let true_type = self.visit_expr(when_true);
        self.ctx.pop_type_info();
        let true_type = true_type?;

        self.ctx.push_type_info();
        for (name, ty) in &negative {
            self.ctx.add_type_fact(name, *ty);
        }
        let false_type = self.visit_expr(when_false);
        self.ctx.pop_type_info();
        let false_type = false_type?;

        Ok(least_upper_bound(self.ctx.db, &[true_type, false_type]))
    }

    // =========================================================================
    // Casts
    // =========================================================================

    fn visit_cast(
        &mut self,
        idx: NodeIndex,
        target: &TypeRef,
        expr: NodeIndex,
        coerce: bool,
    ) -> VisitResult {
        let target = self.resolve_type_at(target, idx);
        let source = if self.ctx.arena.is_closure(expr) && target != TypeId::DYNAMIC {
            let hints = sam_param_types(self.ctx.db, target).map(ClosureParamTypes::Fixed);
            self.visit_closure(expr, hints, None)?
        } else {
            self.visit_expr_expecting(expr, Some(target))?
        };
        if !coerce && !self.is_castable(source, target) {
            self.error_inconvertible_cast(source, target, idx);
        }
        Ok(target)
    }

    /// Whether `(target) value` can succeed at runtime for some value of
    /// type `source`.
    fn is_castable(&self, source: TypeId, target: TypeId) -> bool {
        let db = self.ctx.db;
        if matches!(source, TypeId::DYNAMIC | TypeId::NULL) || target == TypeId::DYNAMIC {
            return true;
        }
        if is_assignable_to(db, source, target, AssignMode::Exact)
            || is_assignable_to(db, target, source, AssignMode::Exact)
        {
            return true;
        }
        if is_numeric(db, source) && is_numeric(db, target) {
            return true;
        }
        let is_interface = |ty: TypeId| {
            db.class_of(box_type(db, ty))
                .is_some_and(|class| db.class_def(class).is_interface())
        };
        is_interface(source) || is_interface(target)
    }

    // =========================================================================
    // Collection literals
    // =========================================================================

    /// First type argument of `expected` seen as `target_class`, if any.
    fn expected_arguments(&self, target_class: stc_solver::ClassId) -> Option<SmallVec<[TypeId; 2]>> {
        let db = self.ctx.db;
        let expected = self.ctx.expected_type()?;
        let view = as_supertype(db, expected, target_class)?;
        match db.lookup(view) {
            TypeData::Class(class_ref) if !class_ref.args.is_empty() => Some(class_ref.args),
            _ => None,
        }
    }

    fn boxed_lub(&self, types: &[TypeId]) -> TypeId {
        let db = self.ctx.db;
        match least_upper_bound(db, types) {
            TypeId::NULL => db.object_type(),
            ty => box_type(db, ty),
        }
    }

    /// `ArrayList<E>` with `E` the boxed least upper bound of the elements.
    /// An empty literal takes its element type from the expected type.
    fn visit_list_literal(&mut self, elements: &[NodeIndex]) -> VisitResult {
        let db = self.ctx.db;
        let wk = db.well_known();
        if elements.is_empty() {
            let element = self
                .expected_arguments(wk.iterable)
                .and_then(|args| args.first().copied())
                .map_or_else(|| db.object_type(), |arg| self.wildcard_bound(arg));
            return Ok(db.class_type(wk.array_list, &[element]));
        }
        let mut types: SmallVec<[TypeId; 4]> = SmallVec::new();
        for &element in elements {
            types.push(self.visit_expr_expecting(element, None)?);
        }
        let element = self.boxed_lub(&types);
        Ok(db.class_type(wk.array_list, &[element]))
    }

    /// `LinkedHashMap<K, V>`, completed from the expected type when empty.
    fn visit_map_literal(&mut self, entries: &[(NodeIndex, NodeIndex)]) -> VisitResult {
        let db = self.ctx.db;
        let wk = db.well_known();
        if entries.is_empty() {
            let (key, value) = match self.expected_arguments(wk.map) {
                Some(args) if args.len() == 2 => {
                    (self.wildcard_bound(args[0]), self.wildcard_bound(args[1]))
                }
                _ => (db.object_type(), db.object_type()),
            };
            return Ok(db.class_type(wk.linked_hash_map, &[key, value]));
        }
        let mut keys: SmallVec<[TypeId; 4]> = SmallVec::new();
        let mut values: SmallVec<[TypeId; 4]> = SmallVec::new();
        for &(key, value) in entries {
            keys.push(self.visit_expr_expecting(key, None)?);
            values.push(self.visit_expr_expecting(value, None)?);
        }
        let key = self.boxed_lub(&keys);
        let value = self.boxed_lub(&values);
        Ok(db.class_type(wk.linked_hash_map, &[key, value]))
    }

    fn visit_range(&mut self, from: NodeIndex, to: NodeIndex) -> VisitResult {
        let db = self.ctx.db;
        let wk = db.well_known();
        let from = self.visit_expr_expecting(from, None)?;
        let to = self.visit_expr_expecting(to, None)?;
        let integer = db.class_type(wk.integer, &[]);
        if box_type(db, from) == integer && box_type(db, to) == integer {
            return Ok(db.class_type(wk.int_range, &[]));
        }
        let element = self.boxed_lub(&[from, to]);
        Ok(db.class_type(wk.range, &[element]))
    }

    /// Concrete type standing for a type argument: the bound of a wildcard.
    fn wildcard_bound(&self, arg: TypeId) -> TypeId {
        let db = self.ctx.db;
        match db.lookup(arg) {
            TypeData::Wildcard { upper, lower } => {
                lower.or(upper).unwrap_or_else(|| db.object_type())
            }
            _ => arg,
        }
    }
}

#[cfg(test)]
#[path = "tests/expr_tests.rs"]
mod tests;
