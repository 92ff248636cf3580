use super::*;
use crate::diagnostics::diagnostic_codes;
use crate::options::CheckerOptions;
use crate::state::{CheckResult, check_unit};
use stc_ast::{AstBuilder, BinaryOp, TypeRef};
use stc_solver::numeric::box_type;
use stc_solver::{TypeDatabase, TypeStore, least_upper_bound};

fn run_with(mut b: AstBuilder, script: Vec<NodeIndex>, options: CheckerOptions) -> (TypeStore, CheckResult) {
    let root = b.unit(Vec::new(), script);
    let arena = b.finish();
    let mut store = TypeStore::new();
    let result = check_unit(&mut store, &arena, root, options).expect("check succeeds");
    (store, result)
}

fn run(b: AstBuilder, script: Vec<NodeIndex>) -> (TypeStore, CheckResult) {
    run_with(b, script, CheckerOptions::default())
}

fn closure_of(store: &TypeStore, ret: TypeId) -> TypeId {
    store.class_type(store.well_known().closure, &[ret])
}

#[test]
fn test_declared_parameter_types() {
    let mut b = AstBuilder::new();
    let s = b.var("s");
    let length = b.call(s, "length", Vec::new());
    let body = b.expr_stmt(length);
    let closure = b.closure(
        Some(vec![AstBuilder::param("s", Some(TypeRef::named("String")))]),
        vec![body],
    );
    let decl = b.def("c", closure);
    let (store, result) = run(b, vec![decl]);

    let integer = store.class_type(store.well_known().integer, &[]);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(closure), Some(closure_of(&store, integer)));
    assert_eq!(result.metadata.inferred_return_type(closure), Some(integer));
    assert_eq!(
        result.metadata.get(closure).and_then(|m| m.closure_arg_types.clone()),
        Some(vec![store.string_type()])
    );
}

#[test]
fn test_implicit_it_defaults_to_object() {
    let mut b = AstBuilder::new();
    let it = b.var("it");
    let body = b.expr_stmt(it);
    let closure = b.closure(None, vec![body]);
    let decl = b.def("c", closure);
    let (store, result) = run(b, vec![decl]);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(it), Some(store.object_type()));
    assert_eq!(
        result.metadata.inferred_type(closure),
        Some(closure_of(&store, store.object_type()))
    );
}

#[test]
fn test_implicit_it_can_be_disabled() {
    let mut b = AstBuilder::new();
    let it = b.var("it");
    let body = b.expr_stmt(it);
    let closure = b.closure(None, vec![body]);
    let decl = b.def("c", closure);
    let options = CheckerOptions {
        implicit_it: false,
        ..CheckerOptions::default()
    };
    let (_, result) = run_with(b, vec![decl], options);

    assert_eq!(result.codes(), vec![diagnostic_codes::THE_VARIABLE_IS_UNDECLARED]);
}

#[test]
fn test_return_statements_join_implicit_return() {
    let mut b = AstBuilder::new();
    let flag = b.bool(true);
    let flag_decl = b.def("flag", flag);
    let cond = b.var("flag");
    let one = b.int(1);
    let early = b.ret(one);
    let then_branch = b.block(vec![early]);
    let if_stmt = b.if_stmt(cond, then_branch, NodeIndex::NONE);
    let text = b.string("s");
    let last = b.expr_stmt(text);
    let closure = b.closure(Some(Vec::new()), vec![if_stmt, last]);
    let decl = b.def("c", closure);
    let (store, result) = run(b, vec![flag_decl, decl]);

    let expected = box_type(
        &store,
        least_upper_bound(&store, &[TypeId::INT, store.string_type()]),
    );
    assert_eq!(result.metadata.inferred_return_type(closure), Some(expected));
}

#[test]
fn test_sam_slot_supplies_parameter_types() {
    let mut b = AstBuilder::new();
    let a = b.var("a");
    let a_len = b.call(a, "length", Vec::new());
    let c = b.var("b");
    let b_len = b.call(c, "length", Vec::new());
    let diff = b.binary(BinaryOp::Minus, a_len, b_len);
    let body = b.expr_stmt(diff);
    let closure = b.closure(
        Some(vec![AstBuilder::param("a", None), AstBuilder::param("b", None)]),
        vec![body],
    );
    let decl = b.decl(
        "byLength",
        TypeRef::generic("Comparator", vec![TypeRef::named("String")]),
        closure,
    );
    let (store, result) = run(b, vec![decl]);

    assert!(result.diagnostics.is_empty());
    assert_eq!(
        result.metadata.get(closure).and_then(|m| m.closure_arg_types.clone()),
        Some(vec![store.string_type(), store.string_type()])
    );
    assert_eq!(result.metadata.inferred_type(diff), Some(TypeId::INT));
}

#[test]
fn test_sam_coercion_can_be_disabled() {
    let mut b = AstBuilder::new();
    let zero = b.int(0);
    let body = b.expr_stmt(zero);
    let closure = b.closure(
        Some(vec![AstBuilder::param("a", None), AstBuilder::param("b", None)]),
        vec![body],
    );
    let decl = b.decl(
        "cmp",
        TypeRef::generic("Comparator", vec![TypeRef::named("String")]),
        closure,
    );
    let options = CheckerOptions {
        sam_coercion: false,
        ..CheckerOptions::default()
    };
    let (_, result) = run_with(b, vec![decl], options);

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_ASSIGN_VALUE_OF_TYPE]);
}

#[test]
fn test_assignment_to_captured_variable_widens_it() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let decl = b.def("x", one);
    let text = b.string("s");
    let assign = b.assign_stmt("x", text);
    let closure = b.closure(Some(Vec::new()), vec![assign]);
    let closure_decl = b.def("c", closure);
    let after = b.var("x");
    let stmt = b.expr_stmt(after);
    let (store, result) = run(b, vec![decl, closure_decl, stmt]);

    let expected = least_upper_bound(&store, &[TypeId::INT, store.string_type()]);
    assert_eq!(result.metadata.inferred_type(after), Some(expected));
}

#[test]
fn test_calling_a_closure_variable() {
    let mut b = AstBuilder::new();
    let text = b.string("s");
    let body = b.expr_stmt(text);
    let closure = b.closure(Some(Vec::new()), vec![body]);
    let decl = b.def("greet", closure);
    let call = b.implicit_call("greet", Vec::new());
    let stmt = b.expr_stmt(call);
    let (store, result) = run(b, vec![decl, stmt]);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(call), Some(store.string_type()));
}
