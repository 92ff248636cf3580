//! Closure parameter and return inference through extension method calls.

use stc_ast::{AstBuilder, BinaryOp, NodeIndex, TypeRef};
use stc_checker::{CheckResult, CheckerOptions, check_unit};
use stc_solver::{TypeDatabase, TypeId, TypeStore};

fn check(mut b: AstBuilder, classes: Vec<NodeIndex>, script: Vec<NodeIndex>) -> (TypeStore, CheckResult) {
    let root = b.unit(classes, script);
    let arena = b.finish();
    let mut store = TypeStore::new();
    let result =
        check_unit(&mut store, &arena, root, CheckerOptions::default()).expect("check succeeds");
    (store, result)
}

fn int_list(b: &mut AstBuilder, values: &[i64]) -> NodeIndex {
    let elements = values.iter().map(|&v| b.int(v)).collect();
    b.list(elements)
}

fn arg_types(result: &CheckResult, closure: NodeIndex) -> Option<Vec<TypeId>> {
    result
        .metadata
        .get(closure)
        .and_then(|m| m.closure_arg_types.clone())
}

#[test]
fn test_chained_list_calls() {
    let mut b = AstBuilder::new();
    let list = int_list(&mut b, &[1, 2, 3]);
    let it = b.var("it");
    let one = b.int(1);
    let keep = b.binary(BinaryOp::Greater, it, one);
    let body = b.expr_stmt(keep);
    let filter = b.closure(None, vec![body]);
    let filtered = b.call(list, "findAll", vec![filter]);
    let it = b.var("it");
    let two = b.double(2.5);
    let scaled = b.binary(BinaryOp::Multiply, it, two);
    let body = b.expr_stmt(scaled);
    let mapper = b.closure(None, vec![body]);
    let mapped = b.call(filtered, "collect", vec![mapper]);
    let stmt = b.expr_stmt(mapped);
    let (store, result) = check(b, Vec::new(), vec![stmt]);

    let wk = store.well_known();
    let integer = store.class_type(wk.integer, &[]);
    let double = store.class_type(wk.double, &[]);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(keep), Some(TypeId::BOOLEAN));
    assert_eq!(result.metadata.inferred_type(filtered), Some(store.class_type(wk.list, &[integer])));
    assert_eq!(arg_types(&result, mapper), Some(vec![integer]));
    assert_eq!(result.metadata.inferred_type(scaled), Some(TypeId::DOUBLE));
    assert_eq!(result.metadata.inferred_type(mapped), Some(store.class_type(wk.list, &[double])));
}

#[test]
fn test_map_each_with_key_value_or_entry() {
    let mut b = AstBuilder::new();
    let key = b.string("a");
    let one = b.int(1);
    let map = b.map(vec![(key, one)]);
    let decl = b.def("m", map);

    let receiver = b.var("m");
    let k = b.var("k");
    let body = b.expr_stmt(k);
    let pair = b.closure(
        Some(vec![AstBuilder::param("k", None), AstBuilder::param("v", None)]),
        vec![body],
    );
    let call = b.call(receiver, "each", vec![pair]);
    let first = b.expr_stmt(call);

    let receiver = b.var("m");
    let e = b.var("e");
    let body = b.expr_stmt(e);
    let single = b.closure(Some(vec![AstBuilder::param("e", None)]), vec![body]);
    let call = b.call(receiver, "each", vec![single]);
    let second = b.expr_stmt(call);
    let (store, result) = check(b, Vec::new(), vec![decl, first, second]);

    let wk = store.well_known();
    let string = store.string_type();
    let integer = store.class_type(wk.integer, &[]);
    assert!(result.diagnostics.is_empty());
    assert_eq!(arg_types(&result, pair), Some(vec![string, integer]));
    assert_eq!(
        arg_types(&result, single),
        Some(vec![store.class_type(wk.map_entry, &[string, integer])])
    );
}

#[test]
fn test_times_passes_the_counter() {
    let mut b = AstBuilder::new();
    let five = b.int(5);
    let it = b.var("it");
    let body = b.expr_stmt(it);
    let closure = b.closure(None, vec![body]);
    let call = b.call(five, "times", vec![closure]);
    let stmt = b.expr_stmt(call);
    let (_, result) = check(b, Vec::new(), vec![stmt]);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(it), Some(TypeId::INT));
    assert_eq!(result.metadata.inferred_type(call), Some(TypeId::VOID));
}

#[test]
fn test_nested_closures_see_their_own_hints() {
    let mut b = AstBuilder::new();
    let inner_list = int_list(&mut b, &[1]);
    let outer_list = b.list(vec![inner_list]);
    let inner = b.var("inner");
    let it = b.var("it");
    let body = b.expr_stmt(it);
    let inner_closure = b.closure(None, vec![body]);
    let inner_call = b.call(inner, "each", vec![inner_closure]);
    let body = b.expr_stmt(inner_call);
    let outer_closure = b.closure(Some(vec![AstBuilder::param("inner", None)]), vec![body]);
    let call = b.call(outer_list, "each", vec![outer_closure]);
    let stmt = b.expr_stmt(call);
    let (store, result) = check(b, Vec::new(), vec![stmt]);

    let wk = store.well_known();
    let integer = store.class_type(wk.integer, &[]);
    let inner_type = store.class_type(wk.array_list, &[integer]);
    assert!(result.diagnostics.is_empty());
    assert_eq!(arg_types(&result, outer_closure), Some(vec![inner_type]));
    assert_eq!(result.metadata.inferred_type(inner), Some(inner_type));
    assert_eq!(result.metadata.inferred_type(it), Some(integer));
}

#[test]
fn test_with_resolves_implicit_calls_on_delegate() {
    let mut b = AstBuilder::new();
    let text = b.string("abc");
    let length = b.implicit_call("length", Vec::new());
    let body = b.expr_stmt(length);
    let closure = b.closure(None, vec![body]);
    let call = b.call(text, "with", vec![closure]);
    let stmt = b.expr_stmt(call);
    let (store, result) = check(b, Vec::new(), vec![stmt]);

    let integer = store.class_type(store.well_known().integer, &[]);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(length), Some(TypeId::INT));
    assert_eq!(
        result
            .metadata
            .get(length)
            .and_then(|m| m.implicit_receiver.as_deref()),
        Some("delegate")
    );
    assert_eq!(result.metadata.inferred_return_type(closure), Some(integer));
    assert_eq!(result.metadata.inferred_type(call), Some(integer));
}

#[test]
fn test_outer_delegate_is_reached_through_owner() {
    let mut b = AstBuilder::new();
    let name = b.field("name", Some(TypeRef::named("String")), NodeIndex::NONE);
    let class = b.class("Person", vec![name], Vec::new());
    let person = b.new_instance(TypeRef::named("Person"), Vec::new());

    let text = b.string("x");
    let read = b.var("name");
    let body = b.expr_stmt(read);
    let inner = b.closure(None, vec![body]);
    let inner_call = b.call(text, "with", vec![inner]);
    let body = b.expr_stmt(inner_call);
    let outer = b.closure(None, vec![body]);
    let call = b.call(person, "with", vec![outer]);
    let stmt = b.expr_stmt(call);
    let (store, result) = check(b, vec![class], vec![stmt]);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(read), Some(store.string_type()));
    assert_eq!(
        result
            .metadata
            .get(read)
            .and_then(|m| m.implicit_receiver.as_deref()),
        Some("owner.delegate")
    );
}
