//! Flow typing across statements: `instanceof` narrowing in conditions,
//! ternaries and loops, and loop re-visits driven by assignment tracking.

use stc_ast::{AstBuilder, BinaryOp, NodeIndex, TypeRef};
use stc_checker::diagnostics::diagnostic_codes;
use stc_checker::{CheckResult, CheckerOptions, check_unit};
use stc_solver::{TypeDatabase, TypeId, TypeStore};

fn check(mut b: AstBuilder, classes: Vec<NodeIndex>, script: Vec<NodeIndex>, options: CheckerOptions) -> (TypeStore, CheckResult) {
    let root = b.unit(classes, script);
    let arena = b.finish();
    let mut store = TypeStore::new();
    let result = check_unit(&mut store, &arena, root, options).expect("check succeeds");
    (store, result)
}

/// `class Handler { void handle(Object o) { <body> } }`
fn handler(b: &mut AstBuilder, body: Vec<NodeIndex>) -> NodeIndex {
    let method = b.method(
        "handle",
        vec![AstBuilder::param("o", Some(TypeRef::named("Object")))],
        Some(TypeRef::named("void")),
        body,
    );
    b.class("Handler", Vec::new(), vec![method])
}

fn length_of_o(b: &mut AstBuilder) -> (NodeIndex, NodeIndex) {
    let o = b.var("o");
    let call = b.call(o, "length", Vec::new());
    let stmt = b.expr_stmt(call);
    (call, stmt)
}

#[test]
fn test_ternary_condition_narrows_true_branch() {
    let mut b = AstBuilder::new();
    let o = b.var("o");
    let test = b.instance_of(o, TypeRef::named("String"));
    let receiver = b.var("o");
    let length = b.call(receiver, "length", Vec::new());
    let fallback = b.int(0);
    let ternary = b.ternary(test, length, fallback);
    let stmt = b.expr_stmt(ternary);
    let class = handler(&mut b, vec![stmt]);
    let (_, result) = check(b, vec![class], Vec::new(), CheckerOptions::default());

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(ternary), Some(TypeId::INT));
}

#[test]
fn test_disjunction_does_not_narrow() {
    let mut b = AstBuilder::new();
    let o = b.var("o");
    let is_string = b.instance_of(o, TypeRef::named("String"));
    let o = b.var("o");
    let is_list = b.instance_of(o, TypeRef::named("List"));
    let either = b.binary(BinaryOp::Or, is_string, is_list);
    let (_, stmt) = length_of_o(&mut b);
    let then_branch = b.block(vec![stmt]);
    let if_stmt = b.if_stmt(either, then_branch, NodeIndex::NONE);
    let class = handler(&mut b, vec![if_stmt]);
    let (_, result) = check(b, vec![class], Vec::new(), CheckerOptions::default());

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_FIND_MATCHING_METHOD]);
}

#[test]
fn test_assignment_discards_narrowing() {
    let mut b = AstBuilder::new();
    let o = b.var("o");
    let test = b.instance_of(o, TypeRef::named("String"));
    let one = b.int(1);
    let reassign = b.assign_stmt("o", one);
    let (call, stmt) = length_of_o(&mut b);
    let then_branch = b.block(vec![reassign, stmt]);
    let if_stmt = b.if_stmt(test, then_branch, NodeIndex::NONE);
    let class = handler(&mut b, vec![if_stmt]);
    let (_, result) = check(b, vec![class], Vec::new(), CheckerOptions::default());

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_FIND_MATCHING_METHOD]);
    assert_eq!(result.metadata.inferred_type(call), Some(TypeId::DYNAMIC));
}

#[test]
fn test_while_condition_narrows_body() {
    let mut b = AstBuilder::new();
    let o = b.var("o");
    let test = b.instance_of(o, TypeRef::named("String"));
    let (call, stmt) = length_of_o(&mut b);
    let body = b.block(vec![stmt]);
    let loop_stmt = b.while_stmt(test, body);
    let (_, after) = length_of_o(&mut b);
    let class = handler(&mut b, vec![loop_stmt, after]);
    let (_, result) = check(b, vec![class], Vec::new(), CheckerOptions::default());

    assert_eq!(result.metadata.inferred_type(call), Some(TypeId::INT));
    // Only the read after the loop is unnarrowed.
    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_FIND_MATCHING_METHOD]);
}

/// `def x = "s"; while (true) { x.toUpperCase(); x = 1 }`
fn loop_that_changes_type(b: &mut AstBuilder) -> (Vec<NodeIndex>, NodeIndex) {
    let text = b.string("s");
    let decl = b.def("x", text);
    let cond = b.bool(true);
    let x = b.var("x");
    let upper = b.call(x, "toUpperCase", Vec::new());
    let use_stmt = b.expr_stmt(upper);
    let one = b.int(1);
    let assign = b.assign_stmt("x", one);
    let body = b.block(vec![use_stmt, assign]);
    let loop_stmt = b.while_stmt(cond, body);
    (vec![decl, loop_stmt], upper)
}

#[test]
fn test_second_pass_sees_type_assigned_later_in_loop() {
    let mut b = AstBuilder::new();
    let (script, _) = loop_that_changes_type(&mut b);
    let (_, result) = check(b, Vec::new(), script, CheckerOptions::default());

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_FIND_MATCHING_METHOD]);
}

#[test]
fn test_without_second_pass_loop_body_is_checked_once() {
    let mut b = AstBuilder::new();
    let (script, upper) = loop_that_changes_type(&mut b);
    let options = CheckerOptions {
        second_pass: false,
        ..CheckerOptions::default()
    };
    let (store, result) = check(b, Vec::new(), script, options);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(upper), Some(store.string_type()));
}

#[test]
fn test_for_in_assignment_merges_after_loop() {
    let mut b = AstBuilder::new();
    let zero = b.int(0);
    let decl = b.def("last", zero);
    let a = b.string("a");
    let items = b.list(vec![a]);
    let target = b.var("last");
    let item = b.var("item");
    let assign = b.assign(target, item);
    let stmt = b.expr_stmt(assign);
    let body = b.block(vec![stmt]);
    let for_in = b.for_in("item", None, items, body);
    let after = b.var("last");
    let read = b.expr_stmt(after);
    let (store, result) = check(b, Vec::new(), vec![decl, for_in, read], CheckerOptions::default());

    assert!(result.diagnostics.is_empty());
    let expected = stc_solver::least_upper_bound(&store, &[TypeId::INT, store.string_type()]);
    assert_eq!(result.metadata.inferred_type(after), Some(expected));
}
