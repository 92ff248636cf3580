//! Whole programs built with `AstBuilder`: declaration, checking and the
//! metadata a backend reads afterwards.

use stc_ast::{AstBuilder, NodeArena, NodeIndex, TypeRef};
use stc_checker::diagnostics::diagnostic_codes;
use stc_checker::{CheckResult, CheckerOptions, CheckerState, DeclaredUnit, declare_unit};
use stc_common::limits::VARIADIC_PENALTY;
use stc_solver::{MethodResolver, MethodShape, TypeDatabase, TypeId, TypeStore};

struct Checked {
    store: TypeStore,
    declared: DeclaredUnit,
    result: CheckResult,
}

fn check(arena: &NodeArena, root: NodeIndex, options: CheckerOptions) -> Checked {
    let mut store = TypeStore::new();
    let declared = declare_unit(&mut store, arena, root);
    let result = CheckerState::new(&store, arena, &declared, options)
        .check(root)
        .expect("check succeeds");
    Checked {
        store,
        declared,
        result,
    }
}

fn void_method(b: &mut AstBuilder, name: &str, params: &[(&str, TypeRef)]) -> NodeIndex {
    let params = params
        .iter()
        .map(|(n, t)| AstBuilder::param(n, Some(t.clone())))
        .collect();
    b.method(name, params, Some(TypeRef::named("void")), Vec::new())
}

/// `new <class>().<name>(args)` as a script statement.
fn call_on_new(b: &mut AstBuilder, class: &str, name: &str, args: Vec<NodeIndex>) -> (NodeIndex, NodeIndex) {
    let receiver = b.new_instance(TypeRef::named(class), Vec::new());
    let call = b.call(receiver, name, args);
    let stmt = b.expr_stmt(call);
    (call, stmt)
}

#[test]
fn test_exact_arity_beats_variadic_overload() {
    let mut b = AstBuilder::new();
    let pair = void_method(
        &mut b,
        "foo",
        &[("a", TypeRef::named("int")), ("b", TypeRef::named("int"))],
    );
    let variadic = void_method(
        &mut b,
        "foo",
        &[
            ("a", TypeRef::named("int")),
            ("b", TypeRef::named("int")),
            ("rest", TypeRef::array(TypeRef::named("int"))),
        ],
    );
    let class = b.class("Api", Vec::new(), vec![pair, variadic]);
    let one = b.int(1);
    let two = b.int(2);
    let (two_args, first) = call_on_new(&mut b, "Api", "foo", vec![one, two]);
    let one = b.int(1);
    let two = b.int(2);
    let three = b.int(3);
    let (three_args, second) = call_on_new(&mut b, "Api", "foo", vec![one, two, three]);
    let root = b.unit(vec![class], vec![first, second]);
    let arena = b.finish();

    let checked = check(&arena, root, CheckerOptions::default());
    assert!(checked.result.diagnostics.is_empty());
    assert_eq!(
        checked.result.metadata.target_method(two_args),
        checked.declared.method_of_node(pair)
    );
    assert_eq!(
        checked.result.metadata.target_method(three_args),
        checked.declared.method_of_node(variadic)
    );
}

#[test]
fn test_single_argument_to_object_variadic() {
    let mut b = AstBuilder::new();
    let foo = void_method(
        &mut b,
        "foo",
        &[("args", TypeRef::array(TypeRef::named("Object")))],
    );
    let class = b.class("Api", Vec::new(), vec![foo]);
    let x = b.string("x");
    let (call, stmt) = call_on_new(&mut b, "Api", "foo", vec![x]);
    let root = b.unit(vec![class], vec![stmt]);
    let arena = b.finish();

    let checked = check(&arena, root, CheckerOptions::default());
    assert!(checked.result.diagnostics.is_empty());
    assert_eq!(
        checked.result.metadata.target_method(call),
        checked.declared.method_of_node(foo)
    );

    let store = &checked.store;
    let api = store.class_by_name("Api").expect("declared");
    let resolution = MethodResolver::new(store).resolve_method(
        store.class_type(api, &[]),
        "foo",
        &[store.string_type()],
    );
    let m = resolution.resolved().expect("foo(Object...)");
    assert_eq!(m.shape, MethodShape::Variadic);
    assert!(m.distance >= VARIADIC_PENALTY);
    assert!(m.distance < 2 * VARIADIC_PENALTY);
}

#[test]
fn test_number_parameter_beats_object() {
    let mut b = AstBuilder::new();
    let number = void_method(&mut b, "m", &[("n", TypeRef::named("Number"))]);
    let object = void_method(&mut b, "m", &[("o", TypeRef::named("Object"))]);
    let class = b.class("Sink", Vec::new(), vec![object, number]);
    let one = b.int(1);
    let (with_int, first) = call_on_new(&mut b, "Sink", "m", vec![one]);
    let text = b.string("s");
    let (with_string, second) = call_on_new(&mut b, "Sink", "m", vec![text]);
    let root = b.unit(vec![class], vec![first, second]);
    let arena = b.finish();

    let checked = check(&arena, root, CheckerOptions::default());
    assert!(checked.result.diagnostics.is_empty());
    assert_eq!(
        checked.result.metadata.target_method(with_int),
        checked.declared.method_of_node(number)
    );
    assert_eq!(
        checked.result.metadata.target_method(with_string),
        checked.declared.method_of_node(object)
    );
}

#[test]
fn test_equal_distance_overloads_are_ambiguous_inside_class() {
    let mut b = AstBuilder::new();
    let left = void_method(
        &mut b,
        "m",
        &[("a", TypeRef::named("Integer")), ("b", TypeRef::named("Object"))],
    );
    let right = void_method(
        &mut b,
        "m",
        &[("a", TypeRef::named("Object")), ("b", TypeRef::named("Integer"))],
    );
    let one = b.int(1);
    let two = b.int(2);
    let call = b.implicit_call("m", vec![one, two]);
    let stmt = b.expr_stmt(call);
    let caller = b.method("run", Vec::new(), Some(TypeRef::named("void")), vec![stmt]);
    let class = b.class("Pair", Vec::new(), vec![left, right, caller]);
    let root = b.unit(vec![class], Vec::new());
    let arena = b.finish();

    let checked = check(&arena, root, CheckerOptions::default());
    assert_eq!(
        checked.result.codes(),
        vec![diagnostic_codes::REFERENCE_TO_METHOD_IS_AMBIGUOUS]
    );
    assert!(checked.result.metadata.target_method(call).is_none());
}

#[test]
fn test_diagnostics_are_ordered_and_carry_file_name() {
    let mut b = AstBuilder::new();
    let text = b.string("s");
    let bad_decl = b.decl("n", TypeRef::named("int"), text);
    let missing = b.var("missing");
    let read = b.expr_stmt(missing);
    let receiver = b.string("s");
    let call = b.call(receiver, "nope", Vec::new());
    let bad_call = b.expr_stmt(call);
    // Statements out of construction order.
    let root = b.unit(Vec::new(), vec![bad_call, read, bad_decl]);
    let arena = b.finish();

    let options = CheckerOptions::default().with_file_name("Main.groovy");
    let checked = check(&arena, root, options);
    let result = &checked.result;
    assert!(result.has_errors());
    assert_eq!(
        result.codes(),
        vec![
            diagnostic_codes::CANNOT_ASSIGN_VALUE_OF_TYPE,
            diagnostic_codes::THE_VARIABLE_IS_UNDECLARED,
            diagnostic_codes::CANNOT_FIND_MATCHING_METHOD,
        ]
    );
    assert!(result.diagnostics.iter().all(|d| d.file == "Main.groovy"));
    assert!(
        result
            .diagnostics
            .windows(2)
            .all(|w| (w[0].pos.line, w[0].pos.column) <= (w[1].pos.line, w[1].pos.column))
    );
}

#[test]
fn test_loop_revisit_reports_each_problem_once() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let decl = b.def("x", one);
    let cond = b.bool(false);
    let missing = b.var("missing");
    let read = b.expr_stmt(missing);
    let text = b.string("s");
    let assign = b.assign_stmt("x", text);
    let body = b.block(vec![read, assign]);
    let loop_stmt = b.while_stmt(cond, body);
    let root = b.unit(Vec::new(), vec![decl, loop_stmt]);
    let arena = b.finish();

    let checked = check(&arena, root, CheckerOptions::default());
    assert_eq!(
        checked.result.codes(),
        vec![diagnostic_codes::THE_VARIABLE_IS_UNDECLARED]
    );
}

#[test]
fn test_metadata_for_a_small_program() {
    let mut b = AstBuilder::new();
    let name = b.field("name", Some(TypeRef::named("String")), NodeIndex::NONE);
    let this_name = b.var("name");
    let greeting = b.string("Hello, ");
    let text = b.binary(stc_ast::BinaryOp::Plus, greeting, this_name);
    let ret = b.ret(text);
    let greet = b.method("greet", Vec::new(), Some(TypeRef::named("String")), vec![ret]);
    let class = b.class("Person", vec![name], vec![greet]);

    let created = b.new_instance(TypeRef::named("Person"), Vec::new());
    let decl = b.def("p", created);
    let receiver = b.var("p");
    let call = b.call(receiver, "greet", Vec::new());
    let length = b.call(call, "length", Vec::new());
    let stmt = b.expr_stmt(length);
    let root = b.unit(vec![class], vec![decl, stmt]);
    let arena = b.finish();

    let checked = check(&arena, root, CheckerOptions::default());
    let store = &checked.store;
    let metadata = &checked.result.metadata;
    let person = store.class_by_name("Person").expect("declared");

    assert!(checked.result.diagnostics.is_empty());
    assert_eq!(metadata.inferred_type(created), Some(store.class_type(person, &[])));
    assert_eq!(metadata.inferred_type(text), Some(store.string_type()));
    assert_eq!(metadata.inferred_type(call), Some(store.string_type()));
    assert_eq!(metadata.inferred_type(length), Some(TypeId::INT));
    assert_eq!(metadata.target_method(call), checked.declared.method_of_node(greet));
    assert_eq!(metadata.inferred_return_type(greet), Some(store.string_type()));
    assert!(checked.declared.script_class.is_some());
}
