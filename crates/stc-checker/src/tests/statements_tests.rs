use super::*;
use crate::declarations::DeclaredUnit;
use crate::diagnostics::diagnostic_codes;
use crate::options::CheckerOptions;
use crate::state::{CheckResult, check_unit};
use stc_ast::{AstBuilder, NodeArena};
use stc_solver::TypeStore;

fn run_unit(mut b: AstBuilder, classes: Vec<NodeIndex>, script: Vec<NodeIndex>) -> (TypeStore, CheckResult) {
    let root = b.unit(classes, script);
    let arena = b.finish();
    let mut store = TypeStore::new();
    let result =
        check_unit(&mut store, &arena, root, CheckerOptions::default()).expect("check succeeds");
    (store, result)
}

fn run(b: AstBuilder, script: Vec<NodeIndex>) -> (TypeStore, CheckResult) {
    run_unit(b, Vec::new(), script)
}

#[test]
fn test_incompatible_initializer_is_reported() {
    let mut b = AstBuilder::new();
    let text = b.string("s");
    let decl = b.decl("x", TypeRef::named("int"), text);
    let (_, result) = run(b, vec![decl]);

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_ASSIGN_VALUE_OF_TYPE]);
    assert_eq!(result.metadata.inferred_type(decl), Some(TypeId::INT));
}

#[test]
fn test_declared_supertype_flows_value_type() {
    let mut b = AstBuilder::new();
    let text = b.string("s");
    let decl = b.decl("o", TypeRef::named("Object"), text);
    let use_site = b.var("o");
    let stmt = b.expr_stmt(use_site);
    let (store, result) = run(b, vec![decl, stmt]);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(decl), Some(store.string_type()));
    assert_eq!(result.metadata.inferred_type(use_site), Some(store.string_type()));
}

#[test]
fn test_null_assignment_restores_declared_type() {
    let mut b = AstBuilder::new();
    let text = b.string("s");
    let decl = b.decl("o", TypeRef::named("Object"), text);
    let nothing = b.null();
    let clear = b.assign_stmt("o", nothing);
    let receiver = b.var("o");
    let call = b.call(receiver, "toUpperCase", Vec::new());
    let stmt = b.expr_stmt(call);
    let (store, result) = run(b, vec![decl, clear, stmt]);

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_FIND_MATCHING_METHOD]);
    assert_eq!(result.metadata.inferred_type(receiver), Some(store.object_type()));
}

#[test]
fn test_for_in_over_list_types_loop_variable() {
    let mut b = AstBuilder::new();
    let a = b.string("a");
    let list = b.list(vec![a]);
    let s = b.var("s");
    let call = b.call(s, "length", Vec::new());
    let stmt = b.expr_stmt(call);
    let body = b.block(vec![stmt]);
    let for_in = b.for_in("s", None, list, body);
    let (store, result) = run(b, vec![for_in]);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(s), Some(store.string_type()));
    assert_eq!(result.metadata.inferred_type(call), Some(TypeId::INT));
}

#[test]
fn test_for_in_with_incompatible_variable_type() {
    let mut b = AstBuilder::new();
    let a = b.string("a");
    let list = b.list(vec![a]);
    let body = b.block(Vec::new());
    let for_in = b.for_in("i", Some(TypeRef::named("Integer")), list, body);
    let (_, result) = run(b, vec![for_in]);

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_ASSIGN_VALUE_OF_TYPE]);
}

#[test]
fn test_element_type_of_map_is_entry() {
    let store = TypeStore::new();
    let arena = NodeArena::new();
    let declared = DeclaredUnit::default();
    let state = CheckerState::new(&store, &arena, &declared, CheckerOptions::default());

    let wk = store.well_known();
    let integer = store.class_type(wk.integer, &[]);
    let map = store.class_type(wk.linked_hash_map, &[store.string_type(), integer]);
    assert_eq!(
        state.element_type(map),
        store.class_type(wk.map_entry, &[store.string_type(), integer])
    );
    assert_eq!(state.element_type(store.string_type()), store.string_type());
    assert_eq!(state.element_type(store.array_of(TypeId::INT)), TypeId::INT);
    assert_eq!(state.element_type(TypeId::DYNAMIC), TypeId::DYNAMIC);
}

#[test]
fn test_multi_catch_variable_is_common_superclass() {
    let mut b = AstBuilder::new();
    let body = b.block(Vec::new());
    let e = b.var("e");
    let stmt = b.expr_stmt(e);
    let handler = b.block(vec![stmt]);
    let clause = CatchClause {
        types: vec![
            TypeRef::named("IOException"),
            TypeRef::named("IllegalArgumentException"),
        ],
        name: "e".to_string(),
        body: handler,
    };
    let try_catch = b.try_catch(body, vec![clause], NodeIndex::NONE);
    let (store, result) = run(b, vec![try_catch]);

    let exception = store.class_type(store.well_known().exception, &[]);
    assert_eq!(result.metadata.inferred_type(e), Some(exception));
}

#[test]
fn test_return_mismatch_is_reported() {
    let mut b = AstBuilder::new();
    let text = b.string("s");
    let ret = b.ret(text);
    let method = b.method("count", Vec::new(), Some(TypeRef::named("int")), vec![ret]);
    let class = b.class("Counter", Vec::new(), vec![method]);
    let (_, result) = run_unit(b, vec![class], Vec::new());

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_RETURN_VALUE_OF_TYPE]);
}

#[test]
fn test_void_method_returning_value_is_reported() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let ret = b.ret(one);
    let method = b.method("run", Vec::new(), Some(TypeRef::named("void")), vec![ret]);
    let class = b.class("Job", Vec::new(), vec![method]);
    let (_, result) = run_unit(b, vec![class], Vec::new());

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_RETURN_VALUE_OF_TYPE]);
}

#[test]
fn test_switch_without_default_keeps_prior_type() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let decl = b.def("x", one);
    let subject = b.var("x");
    let case_value = b.int(1);
    let text = b.string("s");
    let assign = b.assign_stmt("x", text);
    let case_body = b.block(vec![assign]);
    let switch = b.switch(
        subject,
        vec![SwitchCase {
            values: vec![case_value],
            body: case_body,
        }],
    );
    let after = b.var("x");
    let stmt = b.expr_stmt(after);
    let (store, result) = run(b, vec![decl, switch, stmt]);

    let expected = least_upper_bound(&store, &[store.string_type(), TypeId::INT]);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(after), Some(expected));
}
