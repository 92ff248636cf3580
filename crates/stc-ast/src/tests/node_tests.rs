use super::*;
use crate::AstBuilder;

#[test]
fn test_none_index_resolves_to_nothing() {
    let arena = NodeArena::new();
    assert!(arena.get(NodeIndex::NONE).is_none());
    assert_eq!(arena.pos(NodeIndex::NONE), SourcePos::SYNTHETIC);
}

#[test]
fn test_builder_assigns_distinct_positions() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let sum = b.binary(BinaryOp::Plus, one, two);
    let arena = b.finish();
    assert_ne!(arena.pos(one), arena.pos(two));
    assert_ne!(arena.pos(two), arena.pos(sum));
    assert!(arena.kind(sum).is_some_and(NodeKind::is_expression));
}

#[test]
fn test_compound_assignment_maps_to_base_operator() {
    assert_eq!(BinaryOp::PlusAssign.compound_base(), Some(BinaryOp::Plus));
    assert_eq!(BinaryOp::Assign.compound_base(), None);
    assert!(BinaryOp::ElvisAssign.is_assignment());
    assert!(!BinaryOp::Plus.is_assignment());
}

#[test]
fn test_operator_method_names() {
    assert_eq!(BinaryOp::Plus.method_name(), Some("plus"));
    assert_eq!(BinaryOp::Index.method_name(), Some("getAt"));
    assert_eq!(BinaryOp::In.method_name(), Some("isCase"));
    assert_eq!(BinaryOp::Spaceship.method_name(), Some("compareTo"));
    assert_eq!(BinaryOp::And.method_name(), None);
}

#[test]
fn test_null_and_closure_predicates() {
    let mut b = AstBuilder::new();
    let null = b.null();
    let closure = b.closure(None, vec![]);
    let arena = b.finish();
    assert!(arena.is_null_literal(null));
    assert!(!arena.is_null_literal(closure));
    assert!(arena.is_closure(closure));
}
