//! Binary and unary expressions, including assignment.
//!
//! Operators first try a fixed table (numeric promotion, string
//! concatenation, boolean-valued operators, indexing) and otherwise dispatch
//! to the conventionally named method on the left operand (`+` to `plus`,
//! `<<` to `leftShift`, ...).

use crate::extension::{IncompatibleAssignmentEvent, TypeCheckingExtension};
use crate::metadata::CallTarget;
use crate::state::{CheckerState, VisitResult};
use stc_ast::{BinaryOp, NodeIndex, NodeKind, UnaryOp};
use stc_solver::hierarchy::is_raw;
use stc_solver::numeric::{NumericOp, array_component, is_numeric, is_string_like, numeric_binary_result};
use stc_solver::resolution::sam_param_types;
use stc_solver::sam::is_sam_type;
use stc_solver::{
    AssignMode, ClosureParamTypes, MethodResolution, PropertyInfo, TypeId,
    is_assignable_to, least_upper_bound, literal_constructor_for,
};
use tracing::trace;

/// The slot an assignment writes to.
#[derive(Clone, Debug)]
pub(crate) enum AssignTarget {
    Local {
        name: String,
        declared: TypeId,
        current: TypeId,
        closure_depth: usize,
    },
    Property {
        name: String,
        receiver: TypeId,
        info: PropertyInfo,
    },
    Index {
        receiver: TypeId,
        index: TypeId,
        /// Component type for array receivers.
        component: Option<TypeId>,
    },
    /// Already reported, or a receiver that is not checked.
    Unknown,
}

fn numeric_op(op: BinaryOp) -> Option<NumericOp> {
    Some(match op {
        BinaryOp::Plus => NumericOp::Plus,
        BinaryOp::Minus => NumericOp::Minus,
        BinaryOp::Multiply => NumericOp::Multiply,
        BinaryOp::Divide => NumericOp::Divide,
        BinaryOp::IntDivide => NumericOp::IntDivide,
        BinaryOp::Mod => NumericOp::Mod,
        BinaryOp::Power => NumericOp::Power,
        BinaryOp::LeftShift | BinaryOp::RightShift | BinaryOp::UnsignedRightShift => {
            NumericOp::Shift
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => NumericOp::Bitwise,
        _ => return None,
    })
}

impl<'a> CheckerState<'a> {
    pub(crate) fn visit_binary(
        &mut self,
        idx: NodeIndex,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    ) -> VisitResult {
        self.ctx.enclosing_binaries.push(idx);
        let result = self.compute_binary(idx, op, left, right);
        self.ctx.enclosing_binaries.pop();
        result
    }

    fn compute_binary(
        &mut self,
        idx: NodeIndex,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    ) -> VisitResult {
        if op.is_assignment() {
            return self.visit_assignment(idx, op, left, right);
        }
        match op {
            BinaryOp::And => {
                self.visit_expr_expecting(left, None)?;
                let facts = self.instanceof_facts(left, false);
                self.with_facts(&facts, |this| this.visit_expr_expecting(right, None))?;
                Ok(TypeId::BOOLEAN)
            }
            BinaryOp::Or => {
                self.visit_expr_expecting(left, None)?;
                let facts = self.instanceof_facts(left, true);
                self.with_facts(&facts, |this| this.visit_expr_expecting(right, None))?;
                Ok(TypeId::BOOLEAN)
            }
            BinaryOp::InstanceOf | BinaryOp::NotInstanceOf => {
                self.visit_expr_expecting(left, None)?;
                self.visit_expr_expecting(right, None)?;
                Ok(TypeId::BOOLEAN)
            }
            _ => {
                let l = self.visit_expr_expecting(left, None)?;
                let r = self.visit_expr_expecting(right, None)?;
                self.binary_result(idx, op, l, r)
            }
        }
    }

    /// Result type of `l op r` for operators that only need operand types.
    pub(crate) fn binary_result(
        &mut self,
        idx: NodeIndex,
        op: BinaryOp,
        l: TypeId,
        r: TypeId,
    ) -> VisitResult {
        let db = self.ctx.db;
        match op {
            BinaryOp::Equal | BinaryOp::NotEqual | BinaryOp::Identical | BinaryOp::NotIdentical => {
                Ok(TypeId::BOOLEAN)
            }
            BinaryOp::RegexMatch => Ok(TypeId::BOOLEAN),
            BinaryOp::RegexFind => Ok(db.object_type()),
            BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual
            | BinaryOp::Spaceship => {
                let result = if op == BinaryOp::Spaceship {
                    TypeId::INT
                } else {
                    TypeId::BOOLEAN
                };
                if !(is_numeric(db, l) && is_numeric(db, r)) {
                    self.operator_method(idx, op, l, r)?;
                }
                Ok(result)
            }
            BinaryOp::In | BinaryOp::NotIn => {
                if l != TypeId::DYNAMIC && r != TypeId::DYNAMIC {
                    let resolution = self.resolve_on(r, "isCase", &[l]);
                    if !matches!(resolution, MethodResolution::Resolved(_)) {
                        self.error_operator(op.text(), l, r, idx);
                    }
                }
                Ok(TypeId::BOOLEAN)
            }
            BinaryOp::Index => {
                if let Some(component) = array_component(db, l) {
                    return Ok(component);
                }
                self.operator_method(idx, op, l, r)
            }
            _ => {
                if let Some(numeric) = numeric_op(op) {
                    if let Some(result) = numeric_binary_result(db, numeric, l, r) {
                        return Ok(result);
                    }
                }
                if op == BinaryOp::Plus && is_string_like(db, l) {
                    return Ok(db.string_type());
                }
                self.operator_method(idx, op, l, r)
            }
        }
    }

    /// Resolve the method an operator stands for on the left operand.
    fn operator_method(&mut self, idx: NodeIndex, op: BinaryOp, l: TypeId, r: TypeId) -> VisitResult {
        if l == TypeId::DYNAMIC || r == TypeId::DYNAMIC {
            return Ok(TypeId::DYNAMIC);
        }
        let Some(name) = op.method_name() else {
            self.error_operator(op.text(), l, r, idx);
            return Ok(TypeId::DYNAMIC);
        };
        match self.resolve_on(l, name, &[r]) {
            MethodResolution::Resolved(m) => {
                trace!(operator = op.text(), method = name, "operator resolved to method");
                self.call_return_type(idx, &m, &[r])
            }
            _ => {
                self.error_operator(op.text(), l, r, idx);
                Ok(TypeId::DYNAMIC)
            }
        }
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    fn visit_assignment(
        &mut self,
        idx: NodeIndex,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    ) -> VisitResult {
        let target = self.assignment_target(left)?;
        let value = match op {
            BinaryOp::Assign => self.visit_value_for(target.slot_type(), right)?,
            BinaryOp::ElvisAssign => {
                let current = self.target_read_type(idx, &target)?;
                let value = self.visit_value_for(target.slot_type(), right)?;
                least_upper_bound(self.ctx.db, &[current, value])
            }
            _ => {
                let current = self.target_read_type(idx, &target)?;
                let value = self.visit_expr_expecting(right, None)?;
                match op.compound_base() {
                    Some(base) => self.binary_result(idx, base, current, value)?,
                    None => value,
                }
            }
        };
        let stored = self.complete_assignment(idx, right, &target, value)?;
        self.ctx.metadata.store_type(self.ctx.db, left, stored);
        Ok(value)
    }

    /// Type a value written into a slot of type `slot`, giving closures the
    /// slot's parameter types.
    fn visit_value_for(&mut self, slot: TypeId, value: NodeIndex) -> VisitResult {
        if self.ctx.arena.is_closure(value) && slot != TypeId::DYNAMIC {
            let hints = sam_param_types(self.ctx.db, slot).map(ClosureParamTypes::Fixed);
            return self.visit_closure(value, hints, None);
        }
        self.visit_expr_expecting(value, Some(slot))
    }

    fn assignment_target(&mut self, left: NodeIndex) -> VisitResult<AssignTarget> {
        let arena = self.ctx.arena;
        match arena.kind(left) {
            Some(NodeKind::Variable { name }) => {
                if let Some(info) = self.ctx.lookup_variable(name) {
                    return Ok(AssignTarget::Local {
                        name: name.clone(),
                        declared: info.declared,
                        current: self.ctx.narrowed_type(name).unwrap_or(info.current),
                        closure_depth: info.closure_depth,
                    });
                }
                if let Some((receiver, info)) = self.implicit_property(left, name) {
                    return Ok(AssignTarget::Property {
                        name: name.clone(),
                        receiver,
                        info,
                    });
                }
                self.unresolved_variable(left, name);
                Ok(AssignTarget::Unknown)
            }
            Some(NodeKind::Property { receiver, name, .. }) => {
                let receiver_type = match self.class_reference(*receiver) {
                    Some(class_type) => class_type,
                    None => self.visit_expr_expecting(*receiver, None)?,
                };
                if receiver_type == TypeId::DYNAMIC {
                    return Ok(AssignTarget::Unknown);
                }
                let static_only = self.class_reference(*receiver).is_some();
                match self.lookup_member_property(receiver_type, name, static_only) {
                    Some(info) => Ok(AssignTarget::Property {
                        name: name.clone(),
                        receiver: receiver_type,
                        info,
                    }),
                    None => {
                        self.unresolved_property(left, receiver_type, name);
                        Ok(AssignTarget::Unknown)
                    }
                }
            }
            Some(NodeKind::Binary {
                op: BinaryOp::Index,
                left: target,
                right: index,
            }) => {
                let receiver = self.visit_expr_expecting(*target, None)?;
                let index = self.visit_expr_expecting(*index, None)?;
                Ok(AssignTarget::Index {
                    receiver,
                    index,
                    component: array_component(self.ctx.db, receiver),
                })
            }
            _ => {
                self.visit_expr_expecting(left, None)?;
                Ok(AssignTarget::Unknown)
            }
        }
    }

    /// Type of the current value of an assignment target, for compound
    /// operators.
    fn target_read_type(&mut self, idx: NodeIndex, target: &AssignTarget) -> VisitResult {
        Ok(match target {
            AssignTarget::Local { current, .. } => *current,
            AssignTarget::Property { info, .. } => info.ty,
            AssignTarget::Index {
                receiver,
                index,
                component,
            } => match component {
                Some(component) => *component,
                None => self.binary_result(idx, BinaryOp::Index, *receiver, *index)?,
            },
            AssignTarget::Unknown => TypeId::DYNAMIC,
        })
    }

    /// Check the write and update flow types. Returns the type the target
    /// holds afterwards.
    fn complete_assignment(
        &mut self,
        idx: NodeIndex,
        value_node: NodeIndex,
        target: &AssignTarget,
        value: TypeId,
    ) -> VisitResult {
        let db = self.ctx.db;
        match target {
            AssignTarget::Local {
                name,
                declared,
                current,
                closure_depth,
            } => {
                let compatible = self.check_assignment_compat_at(*declared, value, value_node, idx);
                let mut flow = if compatible {
                    self.flow_type(*declared, value)
                } else {
                    *declared
                };
                if *closure_depth < self.ctx.enclosing_closures.len() {
                    flow = least_upper_bound(db, &[*current, flow]);
                }
                self.ctx.set_variable_type(name, flow);
                self.ctx.clear_type_facts(name);
                self.ctx.track_assignment(name, flow);
                Ok(flow)
            }
            AssignTarget::Property { name, info, .. } => {
                if info.read_only {
                    self.error_read_only_property(name, idx);
                } else {
                    self.check_assignment_compat_at(info.ty, value, value_node, idx);
                }
                Ok(info.ty)
            }
            AssignTarget::Index {
                receiver,
                index,
                component,
            } => {
                if let Some(component) = component {
                    self.check_assignment_compat_at(*component, value, value_node, idx);
                    return Ok(*component);
                }
                if *receiver != TypeId::DYNAMIC {
                    let args = [*index, value];
                    match self.resolve_on(*receiver, "putAt", &args) {
                        MethodResolution::Resolved(m) => {
                            self.call_return_type(idx, &m, &args)?;
                        }
                        _ => self.error_no_matching_method(*receiver, "putAt", &args, idx),
                    }
                }
                Ok(value)
            }
            AssignTarget::Unknown => Ok(value),
        }
    }

    /// Type a variable holds after being assigned `value`.
    ///
    /// `def` variables take the value's type. Typed variables take it when it
    /// is a class assignable without coercion, so that the more precise type
    /// is available afterwards; otherwise they keep the declared type.
    pub(crate) fn flow_type(&self, declared: TypeId, value: TypeId) -> TypeId {
        let db = self.ctx.db;
        if declared == TypeId::DYNAMIC {
            return if value == TypeId::VOID { TypeId::NULL } else { value };
        }
        if db.class_of(value).is_none() || !is_assignable_to(db, value, declared, AssignMode::Exact) {
            return declared;
        }
        if is_raw(db, value) && db.class_of(declared).is_some() && !is_raw(db, declared) {
            return declared;
        }
        value
    }

    /// Check that `value` may be stored in a slot of type `declared`,
    /// reporting at `node`. Returns whether the assignment is accepted.
    pub(crate) fn check_assignment_compat(&mut self, declared: TypeId, value: TypeId, node: NodeIndex) -> bool {
        self.check_assignment_compat_at(declared, value, node, node)
    }

    fn check_assignment_compat_at(
        &mut self,
        declared: TypeId,
        value: TypeId,
        value_node: NodeIndex,
        anchor: NodeIndex,
    ) -> bool {
        let db = self.ctx.db;
        if declared == TypeId::DYNAMIC || value == TypeId::DYNAMIC {
            return true;
        }
        if is_assignable_to(db, value, declared, AssignMode::Coercion) && self.sam_coercion_allowed(declared, value) {
            return true;
        }
        if let Some(accepted) = self.list_literal_constructor(declared, value_node) {
            return accepted;
        }
        let mut event = IncompatibleAssignmentEvent {
            node: anchor,
            target: declared,
            value,
        };
        if self
            .extensions
            .handle_incompatible_assignment(db, &mut event)
            .is_handled()
        {
            return true;
        }
        self.error_incompatible_assignment(value, declared, anchor);
        false
    }

    /// With SAM coercion disabled a closure only fits closure slots.
    fn sam_coercion_allowed(&self, declared: TypeId, value: TypeId) -> bool {
        if self.ctx.options.sam_coercion {
            return true;
        }
        let db = self.ctx.db;
        let closure = db.well_known().closure;
        if db.class_of(value) != Some(closure) {
            return true;
        }
        match db.class_of(declared) {
            Some(class) if class != closure => !is_sam_type(db, class, true),
            _ => true,
        }
    }

    /// `Point p = [1, 2]`: a list literal stored in a class that is not a
    /// collection calls the matching constructor. `None` when this rule does
    /// not apply.
    fn list_literal_constructor(&mut self, declared: TypeId, value_node: NodeIndex) -> Option<bool> {
        let db = self.ctx.db;
        let arena = self.ctx.arena;
        let Some(NodeKind::ListLiteral { elements }) = arena.kind(value_node) else {
            return None;
        };
        let class = db.class_of(declared)?;
        let wk = db.well_known();
        if stc_solver::hierarchy::is_subclass(db, class, wk.iterable) || class == wk.object {
            return None;
        }
        let element_types: Vec<TypeId> = elements
            .iter()
            .map(|&e| {
                self.ctx
                    .metadata
                    .inferred_type(e)
                    .unwrap_or(TypeId::DYNAMIC)
            })
            .collect();
        match literal_constructor_for(db, declared, &element_types) {
            Some(ctor) => {
                self.ctx.metadata.set_target(value_node, CallTarget::Constructor(ctor));
                Some(true)
            }
            None => {
                self.error_no_matching_constructor(declared, &element_types, value_node);
                Some(false)
            }
        }
    }

    // =========================================================================
    // Unary
    // =========================================================================

    pub(crate) fn visit_unary(&mut self, idx: NodeIndex, op: UnaryOp, operand: NodeIndex) -> VisitResult {
        let ty = self.visit_expr_expecting(operand, None)?;
        let db = self.ctx.db;
        if op == UnaryOp::Not {
            return Ok(TypeId::BOOLEAN);
        }
        if ty == TypeId::DYNAMIC {
            return Ok(TypeId::DYNAMIC);
        }
        if is_numeric(db, ty) {
            return Ok(ty);
        }
        let method = match op {
            UnaryOp::Minus => "negative",
            UnaryOp::Plus => "positive",
            UnaryOp::BitwiseNegate => "bitwiseNegate",
            UnaryOp::PrefixIncrement | UnaryOp::PostfixIncrement => "next",
            UnaryOp::PrefixDecrement | UnaryOp::PostfixDecrement => "previous",
            UnaryOp::Not => return Ok(TypeId::BOOLEAN),
        };
        let result = match self.resolve_on(ty, method, &[]) {
            MethodResolution::Resolved(m) => self.call_return_type(idx, &m, &[])?,
            _ => {
                self.error_no_matching_method(ty, method, &[], idx);
                return Ok(TypeId::DYNAMIC);
            }
        };
        if op.is_increment_or_decrement() {
            if let Some(NodeKind::Variable { name }) = self.ctx.arena.kind(operand) {
                if let Some(info) = self.ctx.lookup_variable(name) {
                    let flow = self.flow_type(info.declared, result);
                    self.ctx.set_variable_type(name, flow);
                    self.ctx.track_assignment(name, flow);
                }
            }
        }
        Ok(result)
    }
}

impl AssignTarget {
    /// Type values written to the target must have.
    pub(crate) fn slot_type(&self) -> TypeId {
        match self {
            Self::Local { declared, .. } => *declared,
            Self::Property { info, .. } => info.ty,
            Self::Index { component, .. } => component.unwrap_or(TypeId::DYNAMIC),
            Self::Unknown => TypeId::DYNAMIC,
        }
    }
}

#[cfg(test)]
#[path = "tests/binary_tests.rs"]
mod tests;
