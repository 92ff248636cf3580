//! AST consumed by the stc type checker.
//!
//! Parsing is done elsewhere; this crate only defines the shape of the tree the
//! checker walks:
//! - `NodeArena` stores every node in a flat vector indexed by `NodeIndex`
//! - `NodeKind` is a closed sum type over all expression, statement and
//!   declaration kinds, so the checker matches exhaustively
//! - `TypeRef` is an unresolved type annotation as written in source
//! - `AstBuilder` assembles trees for hosts and tests

pub mod node;
pub use node::{
    BinaryOp, CatchClause, FieldDecl, LiteralValue, Node, NodeArena, NodeIndex, NodeKind, Param,
    SwitchCase, TypeParamDecl, UnaryOp,
};

pub mod type_ref;
pub use type_ref::TypeRef;

pub mod builder;
pub use builder::AstBuilder;
