use super::*;
use crate::diagnostics::diagnostic_codes;
use crate::options::CheckerOptions;
use crate::state::{CheckResult, check_unit};
use stc_ast::{AstBuilder, Param};
use stc_solver::{TypeDatabase, TypeStore};

fn run_unit(mut b: AstBuilder, classes: Vec<NodeIndex>, script: Vec<NodeIndex>) -> (TypeStore, CheckResult) {
    let root = b.unit(classes, script);
    let arena = b.finish();
    let mut store = TypeStore::new();
    let result =
        check_unit(&mut store, &arena, root, CheckerOptions::default()).expect("check succeeds");
    (store, result)
}

fn static_method(
    b: &mut AstBuilder,
    name: &str,
    params: Vec<Param>,
    return_type: Option<TypeRef>,
    body: Vec<NodeIndex>,
) -> NodeIndex {
    let body = b.block(body);
    b.add(NodeKind::Method {
        name: name.to_string(),
        type_params: Vec::new(),
        params,
        return_type,
        body,
        is_static: true,
        is_abstract: false,
        skip_checking: false,
    })
}

/// `Type name(Type p) { return <literal> }`
fn returning_method(b: &mut AstBuilder, name: &str, param: &str, result: NodeIndex, ret: &str) -> NodeIndex {
    let ret_stmt = b.ret(result);
    b.method(
        name,
        vec![AstBuilder::param("p", Some(TypeRef::named(param)))],
        Some(TypeRef::named(ret)),
        vec![ret_stmt],
    )
}

#[test]
fn test_overload_picks_closest_parameter_type() {
    let mut b = AstBuilder::new();
    let text = b.string("o");
    let general = returning_method(&mut b, "f", "Object", text, "String");
    let one = b.int(1);
    let specific = returning_method(&mut b, "f", "String", one, "int");
    let class = b.class("Calc", Vec::new(), vec![general, specific]);

    let calc = b.new_instance(TypeRef::named("Calc"), Vec::new());
    let decl = b.def("calc", calc);
    let receiver = b.var("calc");
    let arg = b.string("x");
    let with_string = b.call(receiver, "f", vec![arg]);
    let first = b.expr_stmt(with_string);
    let receiver = b.var("calc");
    let arg = b.int(1);
    let with_int = b.call(receiver, "f", vec![arg]);
    let second = b.expr_stmt(with_int);
    let (store, result) = run_unit(b, vec![class], vec![decl, first, second]);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(with_string), Some(TypeId::INT));
    assert_eq!(result.metadata.inferred_type(with_int), Some(store.string_type()));
    assert_ne!(
        result.metadata.target_method(with_string),
        result.metadata.target_method(with_int)
    );
}

#[test]
fn test_equally_close_overloads_are_ambiguous() {
    let mut b = AstBuilder::new();
    let left = b.method(
        "m",
        vec![
            AstBuilder::param("a", Some(TypeRef::named("Integer"))),
            AstBuilder::param("b", Some(TypeRef::named("Object"))),
        ],
        Some(TypeRef::named("void")),
        Vec::new(),
    );
    let right = b.method(
        "m",
        vec![
            AstBuilder::param("a", Some(TypeRef::named("Object"))),
            AstBuilder::param("b", Some(TypeRef::named("Integer"))),
        ],
        Some(TypeRef::named("void")),
        Vec::new(),
    );
    let class = b.class("Pair", Vec::new(), vec![left, right]);
    let pair = b.new_instance(TypeRef::named("Pair"), Vec::new());
    let one = b.int(1);
    let two = b.int(2);
    let call = b.call(pair, "m", vec![one, two]);
    let stmt = b.expr_stmt(call);
    let (_, result) = run_unit(b, vec![class], vec![stmt]);

    assert_eq!(result.codes(), vec![diagnostic_codes::REFERENCE_TO_METHOD_IS_AMBIGUOUS]);
    assert_eq!(result.metadata.inferred_type(call), Some(TypeId::DYNAMIC));
}

#[test]
fn test_missing_method_names_receiver_and_arguments() {
    let mut b = AstBuilder::new();
    let text = b.string("s");
    let one = b.int(1);
    let call = b.call(text, "nope", vec![one]);
    let stmt = b.expr_stmt(call);
    let (_, result) = run_unit(b, Vec::new(), vec![stmt]);

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_FIND_MATCHING_METHOD]);
    let message = &result.diagnostics[0].message_text;
    assert!(message.contains("java.lang.String#nope(int)"), "{message}");
}

#[test]
fn test_instance_method_from_static_context() {
    let mut b = AstBuilder::new();
    let call = b.implicit_call("helper", Vec::new());
    let stmt = b.expr_stmt(call);
    let run = static_method(&mut b, "run", Vec::new(), Some(TypeRef::named("void")), vec![stmt]);
    let one = b.int(1);
    let ret = b.ret(one);
    let helper = b.method("helper", Vec::new(), Some(TypeRef::named("int")), vec![ret]);
    let class = b.class("Calc", Vec::new(), vec![run, helper]);
    let (_, result) = run_unit(b, vec![class], Vec::new());

    assert_eq!(
        result.codes(),
        vec![diagnostic_codes::NON_STATIC_METHOD_FROM_STATIC_CONTEXT]
    );
}

#[test]
fn test_static_call_through_class_name() {
    let mut b = AstBuilder::new();
    let x = b.var("x");
    let two = b.int(2);
    let product = b.binary(stc_ast::BinaryOp::Multiply, x, two);
    let ret = b.ret(product);
    let twice = static_method(
        &mut b,
        "twice",
        vec![AstBuilder::param("x", Some(TypeRef::named("int")))],
        Some(TypeRef::named("int")),
        vec![ret],
    );
    let class = b.class("Util", Vec::new(), vec![twice]);
    let receiver = b.var("Util");
    let arg = b.int(21);
    let call = b.call(receiver, "twice", vec![arg]);
    let stmt = b.expr_stmt(call);
    let (store, result) = run_unit(b, vec![class], vec![stmt]);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(call), Some(TypeId::INT));
    let util = store.class_by_name("Util").expect("declared");
    let class_object = store.class_type(store.well_known().class, &[store.class_type(util, &[])]);
    assert_eq!(result.metadata.inferred_type(receiver), Some(class_object));
}

#[test]
fn test_implicit_call_in_script_records_receiver() {
    let mut b = AstBuilder::new();
    let text = b.string("hello");
    let call = b.implicit_call("println", vec![text]);
    let stmt = b.expr_stmt(call);
    let (_, result) = run_unit(b, Vec::new(), vec![stmt]);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(call), Some(TypeId::VOID));
    assert_eq!(
        result
            .metadata
            .get(call)
            .and_then(|m| m.implicit_receiver.as_deref()),
        Some("this")
    );
}

#[test]
fn test_safe_call_boxes_primitive_result() {
    let mut b = AstBuilder::new();
    let text = b.string("s");
    let call = b.call_with(text, "length", Vec::new(), true, false);
    let stmt = b.expr_stmt(call);
    let (store, result) = run_unit(b, Vec::new(), vec![stmt]);

    let integer = store.class_type(store.well_known().integer, &[]);
    assert_eq!(result.metadata.inferred_type(call), Some(integer));
}

#[test]
fn test_spread_call_collects_results() {
    let mut b = AstBuilder::new();
    let a = b.string("a");
    let bb = b.string("bb");
    let list = b.list(vec![a, bb]);
    let call = b.call_with(list, "length", Vec::new(), false, true);
    let stmt = b.expr_stmt(call);
    let (store, result) = run_unit(b, Vec::new(), vec![stmt]);

    let wk = store.well_known();
    let integer = store.class_type(wk.integer, &[]);
    assert!(result.diagnostics.is_empty());
    assert_eq!(
        result.metadata.inferred_type(call),
        Some(store.class_type(wk.list, &[integer]))
    );
}

#[test]
fn test_diamond_takes_arguments_from_target() {
    let mut b = AstBuilder::new();
    let created = b.new_instance(TypeRef::diamond("ArrayList"), Vec::new());
    let decl = b.decl(
        "names",
        TypeRef::generic("List", vec![TypeRef::named("String")]),
        created,
    );
    let (store, result) = run_unit(b, Vec::new(), vec![decl]);

    assert!(result.diagnostics.is_empty());
    let wk = store.well_known();
    assert_eq!(
        result.metadata.inferred_type(created),
        Some(store.class_type(wk.array_list, &[store.string_type()]))
    );
}

#[test]
fn test_diamond_on_non_generic_class() {
    let mut b = AstBuilder::new();
    let created = b.new_instance(TypeRef::diamond("String"), Vec::new());
    let stmt = b.expr_stmt(created);
    let (_, result) = run_unit(b, Vec::new(), vec![stmt]);

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_INFER_DIAMOND_TYPE]);
}

#[test]
fn test_constructor_without_match() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let created = b.new_instance(TypeRef::named("String"), vec![one, two]);
    let stmt = b.expr_stmt(created);
    let (store, result) = run_unit(b, Vec::new(), vec![stmt]);

    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_FIND_MATCHING_CONSTRUCTOR]);
    assert_eq!(result.metadata.inferred_type(created), Some(store.string_type()));
}

#[test]
fn test_named_argument_constructor() {
    let mut b = AstBuilder::new();
    let name = b.field("name", Some(TypeRef::named("String")), NodeIndex::NONE);
    let class = b.class("Person", vec![name], Vec::new());

    let key = b.string("name");
    let value = b.string("Ada");
    let args = b.map(vec![(key, value)]);
    let good = b.new_instance(TypeRef::named("Person"), vec![args]);
    let first = b.expr_stmt(good);

    let unknown_key = b.string("age");
    let age = b.int(3);
    let args = b.map(vec![(unknown_key, age)]);
    let bad = b.new_instance(TypeRef::named("Person"), vec![args]);
    let second = b.expr_stmt(bad);
    let (_, result) = run_unit(b, vec![class], vec![first, second]);

    assert_eq!(result.codes(), vec![diagnostic_codes::NO_SUCH_PROPERTY]);
    assert!(result.metadata.target_method(good).is_none());
}

#[test]
fn test_closure_argument_gets_parameter_hints() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let list = b.list(vec![one, two]);
    let it = b.var("it");
    let two = b.int(2);
    let doubled = b.binary(stc_ast::BinaryOp::Multiply, it, two);
    let body = b.expr_stmt(doubled);
    let closure = b.closure(None, vec![body]);
    let call = b.call(list, "collect", vec![closure]);
    let stmt = b.expr_stmt(call);
    let (store, result) = run_unit(b, Vec::new(), vec![stmt]);

    let wk = store.well_known();
    let integer = store.class_type(wk.integer, &[]);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.metadata.inferred_type(it), Some(integer));
    assert_eq!(
        result.metadata.get(closure).and_then(|m| m.closure_arg_types.clone()),
        Some(vec![integer])
    );
    assert_eq!(
        result.metadata.inferred_type(call),
        Some(store.class_type(wk.list, &[integer]))
    );
}

/// `static <T> T pair(T a, List<T> b) { return a }`
fn generic_pair_method(b: &mut AstBuilder) -> NodeIndex {
    let a = b.var("a");
    let ret = b.ret(a);
    let body = b.block(vec![ret]);
    b.add(NodeKind::Method {
        name: "pair".to_string(),
        type_params: vec![AstBuilder::type_param("T", Vec::new())],
        params: vec![
            AstBuilder::param("a", Some(TypeRef::named("T"))),
            AstBuilder::param("b", Some(TypeRef::generic("List", vec![TypeRef::named("T")]))),
        ],
        return_type: Some(TypeRef::named("T")),
        body,
        is_static: true,
        is_abstract: false,
        skip_checking: false,
    })
}

#[test]
fn test_conflicting_generic_arguments_are_reported() {
    let mut b = AstBuilder::new();
    let pair = generic_pair_method(&mut b);
    let class = b.class("Util", Vec::new(), vec![pair]);
    let text = b.string("a");
    let names = b.list(vec![text]);
    let decl = b.decl("names", TypeRef::generic("List", vec![TypeRef::named("String")]), names);
    let receiver = b.var("Util");
    let one = b.int(1);
    let list = b.var("names");
    let call = b.call(receiver, "pair", vec![one, list]);
    let stmt = b.expr_stmt(call);
    let (_, result) = run_unit(b, vec![class], vec![decl, stmt]);

    assert_eq!(result.codes(), vec![diagnostic_codes::INCOMPATIBLE_GENERIC_ARGUMENT_TYPES]);
    let message = &result.diagnostics[0].message_text;
    assert!(message.contains("java.lang.Integer"), "{message}");
    assert!(message.contains("java.lang.String"), "{message}");
}

#[test]
fn test_generic_argument_compatible_with_list_element() {
    let mut b = AstBuilder::new();
    let pair = generic_pair_method(&mut b);
    let class = b.class("Util", Vec::new(), vec![pair]);
    let text = b.string("a");
    let names = b.list(vec![text]);
    let decl = b.decl("names", TypeRef::generic("List", vec![TypeRef::named("String")]), names);
    let receiver = b.var("Util");
    let other = b.string("b");
    let list = b.var("names");
    let call = b.call(receiver, "pair", vec![other, list]);
    let stmt = b.expr_stmt(call);
    let (store, result) = run_unit(b, vec![class], vec![decl, stmt]);

    assert!(result.diagnostics.is_empty(), "{:?}", result.codes());
    assert_eq!(result.metadata.inferred_type(call), Some(store.string_type()));
}

#[test]
fn test_targets_for_accessor_and_implicit_constructor() {
    let mut b = AstBuilder::new();
    let name = b.field("name", Some(TypeRef::named("String")), NodeIndex::NONE);
    let class = b.class("Person", vec![name], Vec::new());

    let created = b.new_instance(TypeRef::named("Person"), Vec::new());
    let decl = b.decl("p", TypeRef::named("Person"), created);
    let receiver = b.var("p");
    let getter = b.call(receiver, "getName", Vec::new());
    let read = b.expr_stmt(getter);
    let receiver = b.var("p");
    let value = b.string("Ada");
    let setter = b.call(receiver, "setName", vec![value]);
    let write = b.expr_stmt(setter);
    let (store, result) = run_unit(b, vec![class], vec![decl, read, write]);

    assert!(result.diagnostics.is_empty(), "{:?}", result.codes());
    let person = store.class_by_name("Person").expect("declared");
    assert_eq!(
        result.metadata.target(created),
        Some(&CallTarget::ImplicitConstructor(person))
    );
    assert_eq!(
        result.metadata.target(getter),
        Some(&CallTarget::Accessor {
            class: Some(person),
            name: "getName".to_string(),
            setter: false,
        })
    );
    assert!(matches!(
        result.metadata.target(setter),
        Some(CallTarget::Accessor { setter: true, .. })
    ));
    assert_eq!(result.metadata.inferred_type(getter), Some(store.string_type()));
}
