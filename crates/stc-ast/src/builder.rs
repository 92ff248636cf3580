//! Programmatic tree construction.
//!
//! Each node receives its own source line so that diagnostics for different
//! nodes never collapse into one (line, column) slot.

use crate::node::{
    BinaryOp, CatchClause, FieldDecl, LiteralValue, NodeArena, NodeIndex, NodeKind, Param,
    SwitchCase, TypeParamDecl, UnaryOp,
};
use crate::type_ref::TypeRef;
use stc_common::SourcePos;

#[derive(Debug, Default)]
pub struct AstBuilder {
    arena: NodeArena,
    next_line: u32,
}

impl AstBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            next_line: 1,
        }
    }

    /// Add a node of any kind at a fresh position.
    pub fn add(&mut self, kind: NodeKind) -> NodeIndex {
        let pos = SourcePos::new(self.next_line, 1);
        self.next_line += 1;
        self.arena.add(kind, pos)
    }

    /// Add a node at an explicit position.
    pub fn add_at(&mut self, kind: NodeKind, pos: SourcePos) -> NodeIndex {
        self.arena.add(kind, pos)
    }

    #[must_use]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    #[must_use]
    pub fn finish(self) -> NodeArena {
        self.arena
    }

    pub fn param(name: &str, ty: Option<TypeRef>) -> Param {
        Param {
            name: name.to_string(),
            ty,
            default: NodeIndex::NONE,
        }
    }

    pub fn type_param(name: &str, upper_bounds: Vec<TypeRef>) -> TypeParamDecl {
        TypeParamDecl {
            name: name.to_string(),
            upper_bounds,
            lower_bound: None,
        }
    }

    // =========================================================================
    // Literals
    // =========================================================================

    pub fn int(&mut self, value: i64) -> NodeIndex {
        self.add(NodeKind::Literal(LiteralValue::Integer(value)))
    }

    pub fn long(&mut self, value: i64) -> NodeIndex {
        self.add(NodeKind::Literal(LiteralValue::Long(value)))
    }

    pub fn big_integer(&mut self, text: &str) -> NodeIndex {
        self.add(NodeKind::Literal(LiteralValue::BigInteger(text.to_string())))
    }

    pub fn decimal(&mut self, text: &str) -> NodeIndex {
        self.add(NodeKind::Literal(LiteralValue::Decimal(text.to_string())))
    }

    pub fn double(&mut self, value: f64) -> NodeIndex {
        self.add(NodeKind::Literal(LiteralValue::Double(value)))
    }

    pub fn float(&mut self, value: f32) -> NodeIndex {
        self.add(NodeKind::Literal(LiteralValue::Float(value)))
    }

    pub fn string(&mut self, value: &str) -> NodeIndex {
        self.add(NodeKind::Literal(LiteralValue::String(value.to_string())))
    }

    pub fn char(&mut self, value: char) -> NodeIndex {
        self.add(NodeKind::Literal(LiteralValue::Char(value)))
    }

    pub fn bool(&mut self, value: bool) -> NodeIndex {
        self.add(NodeKind::Literal(LiteralValue::Bool(value)))
    }

    pub fn null(&mut self) -> NodeIndex {
        self.add(NodeKind::Literal(LiteralValue::Null))
    }

    pub fn gstring(&mut self, parts: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::GString { parts })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn var(&mut self, name: &str) -> NodeIndex {
        self.add(NodeKind::Variable {
            name: name.to_string(),
        })
    }

    pub fn this(&mut self) -> NodeIndex {
        self.add(NodeKind::This)
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Binary { op, left, right })
    }

    pub fn assign(&mut self, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.binary(BinaryOp::Assign, left, right)
    }

    /// `name = value` as a statement.
    pub fn assign_stmt(&mut self, name: &str, value: NodeIndex) -> NodeIndex {
        let target = self.var(name);
        let assign = self.assign(target, value);
        self.expr_stmt(assign)
    }

    pub fn instance_of(&mut self, expr: NodeIndex, ty: TypeRef) -> NodeIndex {
        let class = self.class_literal(ty);
        self.binary(BinaryOp::InstanceOf, expr, class)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Unary { op, operand })
    }

    pub fn ternary(
        &mut self,
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::Ternary {
            condition,
            when_true,
            when_false,
        })
    }

    pub fn elvis(&mut self, value: NodeIndex, fallback: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Elvis { value, fallback })
    }

    pub fn cast(&mut self, target: TypeRef, expr: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Cast {
            target,
            expr,
            coerce: false,
        })
    }

    pub fn as_cast(&mut self, expr: NodeIndex, target: TypeRef) -> NodeIndex {
        self.add(NodeKind::Cast {
            target,
            expr,
            coerce: true,
        })
    }

    pub fn class_literal(&mut self, ty: TypeRef) -> NodeIndex {
        self.add(NodeKind::ClassLiteral { ty })
    }

    pub fn call(&mut self, receiver: NodeIndex, name: &str, args: Vec<NodeIndex>) -> NodeIndex {
        self.call_with(receiver, name, args, false, false)
    }

    /// Call with an implicit receiver (`foo(1)`).
    pub fn implicit_call(&mut self, name: &str, args: Vec<NodeIndex>) -> NodeIndex {
        self.call_with(NodeIndex::NONE, name, args, false, false)
    }

    pub fn call_with(
        &mut self,
        receiver: NodeIndex,
        name: &str,
        args: Vec<NodeIndex>,
        safe: bool,
        spread: bool,
    ) -> NodeIndex {
        self.add(NodeKind::MethodCall {
            receiver,
            name: name.to_string(),
            args,
            safe,
            spread,
        })
    }

    pub fn new_instance(&mut self, ty: TypeRef, args: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::ConstructorCall { ty, args })
    }

    pub fn prop(&mut self, receiver: NodeIndex, name: &str) -> NodeIndex {
        self.prop_with(receiver, name, false, false)
    }

    pub fn prop_with(
        &mut self,
        receiver: NodeIndex,
        name: &str,
        safe: bool,
        spread: bool,
    ) -> NodeIndex {
        self.add(NodeKind::Property {
            receiver,
            name: name.to_string(),
            safe,
            spread,
        })
    }

    /// Closure literal; `body` statements are wrapped in a block.
    pub fn closure(&mut self, params: Option<Vec<Param>>, body: Vec<NodeIndex>) -> NodeIndex {
        let body = self.block(body);
        self.add(NodeKind::Closure { params, body })
    }

    pub fn list(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::ListLiteral { elements })
    }

    pub fn map(&mut self, entries: Vec<(NodeIndex, NodeIndex)>) -> NodeIndex {
        self.add(NodeKind::MapLiteral { entries })
    }

    pub fn range(&mut self, from: NodeIndex, to: NodeIndex, exclusive: bool) -> NodeIndex {
        self.add(NodeKind::Range {
            from,
            to,
            exclusive,
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub fn block(&mut self, statements: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Block { statements })
    }

    pub fn expr_stmt(&mut self, expr: NodeIndex) -> NodeIndex {
        self.add(NodeKind::ExpressionStatement { expr })
    }

    /// Typed declaration (`String s = init`). Pass `NodeIndex::NONE` for no initializer.
    pub fn decl(&mut self, name: &str, ty: TypeRef, init: NodeIndex) -> NodeIndex {
        self.add(NodeKind::VariableDecl {
            name: name.to_string(),
            ty: Some(ty),
            init,
        })
    }

    /// `def name = init`
    pub fn def(&mut self, name: &str, init: NodeIndex) -> NodeIndex {
        self.add(NodeKind::VariableDecl {
            name: name.to_string(),
            ty: None,
            init,
        })
    }

    pub fn if_stmt(
        &mut self,
        condition: NodeIndex,
        then_branch: NodeIndex,
        else_branch: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    pub fn while_stmt(&mut self, condition: NodeIndex, body: NodeIndex) -> NodeIndex {
        self.add(NodeKind::While { condition, body })
    }

    pub fn do_while(&mut self, body: NodeIndex, condition: NodeIndex) -> NodeIndex {
        self.add(NodeKind::DoWhile { body, condition })
    }

    pub fn for_stmt(
        &mut self,
        init: NodeIndex,
        condition: NodeIndex,
        update: NodeIndex,
        body: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::For {
            init,
            condition,
            update,
            body,
        })
    }

    pub fn for_in(
        &mut self,
        var_name: &str,
        var_type: Option<TypeRef>,
        iterable: NodeIndex,
        body: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::ForIn {
            var_name: var_name.to_string(),
            var_type,
            iterable,
            body,
        })
    }

    pub fn switch(&mut self, subject: NodeIndex, cases: Vec<SwitchCase>) -> NodeIndex {
        self.add(NodeKind::Switch { subject, cases })
    }

    pub fn try_catch(
        &mut self,
        body: NodeIndex,
        catches: Vec<CatchClause>,
        finally: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::TryCatch {
            body,
            catches,
            finally,
        })
    }

    pub fn ret(&mut self, expr: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Return { expr })
    }

    pub fn throw(&mut self, expr: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Throw { expr })
    }

    pub fn break_stmt(&mut self) -> NodeIndex {
        self.add(NodeKind::Break)
    }

    pub fn continue_stmt(&mut self) -> NodeIndex {
        self.add(NodeKind::Continue)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Instance method with the given parameters and body statements.
    pub fn method(
        &mut self,
        name: &str,
        params: Vec<Param>,
        return_type: Option<TypeRef>,
        body: Vec<NodeIndex>,
    ) -> NodeIndex {
        let body = self.block(body);
        self.add(NodeKind::Method {
            name: name.to_string(),
            type_params: Vec::new(),
            params,
            return_type,
            body,
            is_static: false,
            is_abstract: false,
            skip_checking: false,
        })
    }

    pub fn constructor(&mut self, params: Vec<Param>, body: Vec<NodeIndex>) -> NodeIndex {
        let body = self.block(body);
        self.add(NodeKind::Constructor { params, body })
    }

    /// Concrete class extending `Object` with the given members.
    pub fn class(&mut self, name: &str, fields: Vec<FieldDecl>, members: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Class {
            name: name.to_string(),
            is_interface: false,
            is_abstract: false,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            fields,
            members,
            outer: None,
        })
    }

    pub fn field(&mut self, name: &str, ty: Option<TypeRef>, init: NodeIndex) -> FieldDecl {
        let pos = SourcePos::new(self.next_line, 1);
        self.next_line += 1;
        FieldDecl {
            name: name.to_string(),
            ty,
            init,
            is_static: false,
            is_property: true,
            is_final: false,
            pos,
        }
    }

    pub fn unit(&mut self, classes: Vec<NodeIndex>, script: Vec<NodeIndex>) -> NodeIndex {
        let script = if script.is_empty() {
            NodeIndex::NONE
        } else {
            self.block(script)
        };
        self.add(NodeKind::CompilationUnit { classes, script })
    }
}
