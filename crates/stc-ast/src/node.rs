//! Node arena and node kinds.
//!
//! Children are referenced by `NodeIndex`. Optional children use
//! `NodeIndex::NONE` rather than `Option` so that node payloads stay small and
//! uniform across kinds.

use crate::type_ref::TypeRef;
use serde::Serialize;
use stc_common::SourcePos;

/// Index of a node in a `NodeArena`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: Self = Self(u32::MAX);

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

/// Literal payloads.
///
/// Arbitrary precision values keep their source text; the checker only needs
/// their type.
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    /// Integer literal without suffix: `int` if it fits, `long` otherwise.
    Integer(i64),
    /// Integer literal with an `L` suffix.
    Long(i64),
    /// Integer literal with a `G` suffix or too large for `long`.
    BigInteger(String),
    /// Decimal literal without suffix (`1.5`), typed as `BigDecimal`.
    Decimal(String),
    Double(f64),
    Float(f32),
    String(String),
    Char(char),
    Bool(bool),
    Null,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Assign,
    PlusAssign,
    MinusAssign,
    MultiplyAssign,
    DivideAssign,
    ModAssign,
    PowerAssign,
    LeftShiftAssign,
    RightShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ElvisAssign,

    Plus,
    Minus,
    Multiply,
    Divide,
    IntDivide,
    Mod,
    Power,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    BitAnd,
    BitOr,
    BitXor,

    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Spaceship,
    RegexFind,
    RegexMatch,

    And,
    Or,
    InstanceOf,
    NotInstanceOf,
    In,
    NotIn,
    Index,
}

impl BinaryOp {
    /// Source text of the operator, used in diagnostics.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::MultiplyAssign => "*=",
            Self::DivideAssign => "/=",
            Self::ModAssign => "%=",
            Self::PowerAssign => "**=",
            Self::LeftShiftAssign => "<<=",
            Self::RightShiftAssign => ">>=",
            Self::BitAndAssign => "&=",
            Self::BitOrAssign => "|=",
            Self::BitXorAssign => "^=",
            Self::ElvisAssign => "?=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::IntDivide => "intdiv",
            Self::Mod => "%",
            Self::Power => "**",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::UnsignedRightShift => ">>>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Identical => "===",
            Self::NotIdentical => "!==",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Spaceship => "<=>",
            Self::RegexFind => "=~",
            Self::RegexMatch => "==~",
            Self::And => "&&",
            Self::Or => "||",
            Self::InstanceOf => "instanceof",
            Self::NotInstanceOf => "!instanceof",
            Self::In => "in",
            Self::NotIn => "!in",
            Self::Index => "[]",
        }
    }

    /// Whether this is `=` or one of the compound assignment operators.
    #[must_use]
    pub const fn is_assignment(self) -> bool {
        matches!(
            self,
            Self::Assign
                | Self::PlusAssign
                | Self::MinusAssign
                | Self::MultiplyAssign
                | Self::DivideAssign
                | Self::ModAssign
                | Self::PowerAssign
                | Self::LeftShiftAssign
                | Self::RightShiftAssign
                | Self::BitAndAssign
                | Self::BitOrAssign
                | Self::BitXorAssign
                | Self::ElvisAssign
        )
    }

    /// The operator a compound assignment applies before storing.
    #[must_use]
    pub const fn compound_base(self) -> Option<Self> {
        Some(match self {
            Self::PlusAssign => Self::Plus,
            Self::MinusAssign => Self::Minus,
            Self::MultiplyAssign => Self::Multiply,
            Self::DivideAssign => Self::Divide,
            Self::ModAssign => Self::Mod,
            Self::PowerAssign => Self::Power,
            Self::LeftShiftAssign => Self::LeftShift,
            Self::RightShiftAssign => Self::RightShift,
            Self::BitAndAssign => Self::BitAnd,
            Self::BitOrAssign => Self::BitOr,
            Self::BitXorAssign => Self::BitXor,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::Identical
                | Self::NotIdentical
                | Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
        )
    }

    /// Conventional method name an operator dispatches to.
    #[must_use]
    pub const fn method_name(self) -> Option<&'static str> {
        Some(match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Multiply => "multiply",
            Self::Divide => "div",
            Self::IntDivide => "intdiv",
            Self::Mod => "mod",
            Self::Power => "power",
            Self::LeftShift => "leftShift",
            Self::RightShift => "rightShift",
            Self::UnsignedRightShift => "rightShiftUnsigned",
            Self::BitAnd => "and",
            Self::BitOr => "or",
            Self::BitXor => "xor",
            Self::Equal | Self::NotEqual => "equals",
            Self::Less
            | Self::LessEqual
            | Self::Greater
            | Self::GreaterEqual
            | Self::Spaceship => "compareTo",
            Self::Index => "getAt",
            Self::In | Self::NotIn => "isCase",
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    BitwiseNegate,
    PrefixIncrement,
    PrefixDecrement,
    PostfixIncrement,
    PostfixDecrement,
}

impl UnaryOp {
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Minus => "-",
            Self::Plus => "+",
            Self::BitwiseNegate => "~",
            Self::PrefixIncrement | Self::PostfixIncrement => "++",
            Self::PrefixDecrement | Self::PostfixDecrement => "--",
        }
    }

    #[must_use]
    pub const fn is_increment_or_decrement(self) -> bool {
        matches!(
            self,
            Self::PrefixIncrement
                | Self::PrefixDecrement
                | Self::PostfixIncrement
                | Self::PostfixDecrement
        )
    }
}

/// A method or closure parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    /// `None` for untyped (`def`) parameters.
    pub ty: Option<TypeRef>,
    /// Default value expression, or `NodeIndex::NONE`.
    pub default: NodeIndex,
}

/// A generic parameter declaration (`T extends Number`).
#[derive(Clone, Debug, PartialEq)]
pub struct TypeParamDecl {
    pub name: String,
    pub upper_bounds: Vec<TypeRef>,
    pub lower_bound: Option<TypeRef>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Option<TypeRef>,
    pub init: NodeIndex,
    pub is_static: bool,
    /// Fields declared without a visibility modifier become properties.
    pub is_property: bool,
    pub is_final: bool,
    pub pos: SourcePos,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    /// Case expressions; empty for `default:`.
    pub values: Vec<NodeIndex>,
    pub body: NodeIndex,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
    /// More than one type for a multi-catch (`catch (A | B e)`).
    pub types: Vec<TypeRef>,
    pub name: String,
    pub body: NodeIndex,
}

/// All node kinds the checker understands.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    // Expressions
    Literal(LiteralValue),
    GString {
        parts: Vec<NodeIndex>,
    },
    Variable {
        name: String,
    },
    This,
    Super,
    Binary {
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    },
    Unary {
        op: UnaryOp,
        operand: NodeIndex,
    },
    Ternary {
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    },
    Elvis {
        value: NodeIndex,
        fallback: NodeIndex,
    },
    Cast {
        target: TypeRef,
        expr: NodeIndex,
        /// `x as T` rather than `(T) x`.
        coerce: bool,
    },
    ClassLiteral {
        ty: TypeRef,
    },
    MethodCall {
        /// `NodeIndex::NONE` for an implicit receiver.
        receiver: NodeIndex,
        name: String,
        args: Vec<NodeIndex>,
        safe: bool,
        spread: bool,
    },
    ConstructorCall {
        ty: TypeRef,
        args: Vec<NodeIndex>,
    },
    Property {
        /// `NodeIndex::NONE` for an implicit receiver.
        receiver: NodeIndex,
        name: String,
        safe: bool,
        spread: bool,
    },
    Closure {
        /// `None` when no parameter list is written (implicit `it`).
        params: Option<Vec<Param>>,
        body: NodeIndex,
    },
    ListLiteral {
        elements: Vec<NodeIndex>,
    },
    MapLiteral {
        entries: Vec<(NodeIndex, NodeIndex)>,
    },
    Range {
        from: NodeIndex,
        to: NodeIndex,
        exclusive: bool,
    },

    // Statements
    Block {
        statements: Vec<NodeIndex>,
    },
    ExpressionStatement {
        expr: NodeIndex,
    },
    VariableDecl {
        name: String,
        /// `None` for `def`.
        ty: Option<TypeRef>,
        init: NodeIndex,
    },
    If {
        condition: NodeIndex,
        then_branch: NodeIndex,
        else_branch: NodeIndex,
    },
    While {
        condition: NodeIndex,
        body: NodeIndex,
    },
    DoWhile {
        body: NodeIndex,
        condition: NodeIndex,
    },
    For {
        init: NodeIndex,
        condition: NodeIndex,
        update: NodeIndex,
        body: NodeIndex,
    },
    ForIn {
        var_name: String,
        var_type: Option<TypeRef>,
        iterable: NodeIndex,
        body: NodeIndex,
    },
    Switch {
        subject: NodeIndex,
        cases: Vec<SwitchCase>,
    },
    TryCatch {
        body: NodeIndex,
        catches: Vec<CatchClause>,
        finally: NodeIndex,
    },
    Return {
        expr: NodeIndex,
    },
    Throw {
        expr: NodeIndex,
    },
    Break,
    Continue,

    // Declarations
    Method {
        name: String,
        type_params: Vec<TypeParamDecl>,
        params: Vec<Param>,
        /// `None` for `def` methods whose return type is inferred.
        return_type: Option<TypeRef>,
        body: NodeIndex,
        is_static: bool,
        is_abstract: bool,
        /// Body excluded from checking (`@TypeChecked(SKIP)`).
        skip_checking: bool,
    },
    Constructor {
        params: Vec<Param>,
        body: NodeIndex,
    },
    Class {
        name: String,
        is_interface: bool,
        is_abstract: bool,
        type_params: Vec<TypeParamDecl>,
        super_class: Option<TypeRef>,
        interfaces: Vec<TypeRef>,
        fields: Vec<FieldDecl>,
        /// `Method` and `Constructor` nodes.
        members: Vec<NodeIndex>,
        /// Name of the lexically enclosing class for inner classes.
        outer: Option<String>,
    },
    CompilationUnit {
        classes: Vec<NodeIndex>,
        /// Top-level script statements (a `Block`), or `NodeIndex::NONE`.
        script: NodeIndex,
    },
}

impl NodeKind {
    /// Whether this kind produces a value.
    #[must_use]
    pub const fn is_expression(&self) -> bool {
        matches!(
            self,
            Self::Literal(_)
                | Self::GString { .. }
                | Self::Variable { .. }
                | Self::This
                | Self::Super
                | Self::Binary { .. }
                | Self::Unary { .. }
                | Self::Ternary { .. }
                | Self::Elvis { .. }
                | Self::Cast { .. }
                | Self::ClassLiteral { .. }
                | Self::MethodCall { .. }
                | Self::ConstructorCall { .. }
                | Self::Property { .. }
                | Self::Closure { .. }
                | Self::ListLiteral { .. }
                | Self::MapLiteral { .. }
                | Self::Range { .. }
        )
    }
}

/// A node: its kind plus its source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: SourcePos,
}

/// Flat storage for every node of a compilation unit.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, kind: NodeKind, pos: SourcePos) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node { kind, pos });
        index
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            return None;
        }
        self.nodes.get(index.0 as usize)
    }

    #[inline]
    #[must_use]
    pub fn kind(&self, index: NodeIndex) -> Option<&NodeKind> {
        self.get(index).map(|node| &node.kind)
    }

    /// Source position of a node; synthetic for `NONE` or unknown indices.
    #[inline]
    #[must_use]
    pub fn pos(&self, index: NodeIndex) -> SourcePos {
        self.get(index)
            .map_or(SourcePos::SYNTHETIC, |node| node.pos)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the node is a `null` literal.
    #[must_use]
    pub fn is_null_literal(&self, index: NodeIndex) -> bool {
        matches!(self.kind(index), Some(NodeKind::Literal(LiteralValue::Null)))
    }

    /// Whether the node is a closure literal.
    #[must_use]
    pub fn is_closure(&self, index: NodeIndex) -> bool {
        matches!(self.kind(index), Some(NodeKind::Closure { .. }))
    }
}

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod tests;
