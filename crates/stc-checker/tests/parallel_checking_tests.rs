//! Several checking passes sharing one declared `TypeStore` across threads.

use rayon::prelude::*;
use stc_ast::{AstBuilder, BinaryOp, NodeArena, NodeIndex, TypeRef};
use stc_checker::diagnostics::diagnostic_codes;
use stc_checker::{
    CheckResult, CheckerOptions, CheckerState, DeclaredUnit, check_unit_with_cache, declare_unit,
};
use stc_solver::{ExtensionMethodCache, TypeDatabase, TypeId, TypeStore};

struct Program {
    arena: NodeArena,
    root: NodeIndex,
    /// `calc.label()`, whose return type is inferred on demand.
    label_call: NodeIndex,
    /// `[1, 2].collect { it * 2 }`
    collect_call: NodeIndex,
    /// Read of `x`, a `String` until a loop assigns it an `int`.
    loop_read: NodeIndex,
}

fn program() -> Program {
    let mut b = AstBuilder::new();
    let text = b.string("calc");
    let last = b.expr_stmt(text);
    let label = b.method("label", Vec::new(), None, vec![last]);
    let class = b.class("Calc", Vec::new(), vec![label]);

    let created = b.new_instance(TypeRef::named("Calc"), Vec::new());
    let calc = b.def("calc", created);
    let receiver = b.var("calc");
    let label_call = b.call(receiver, "label", Vec::new());
    let first = b.expr_stmt(label_call);

    let one = b.int(1);
    let two = b.int(2);
    let list = b.list(vec![one, two]);
    let it = b.var("it");
    let factor = b.int(2);
    let doubled = b.binary(BinaryOp::Multiply, it, factor);
    let body = b.expr_stmt(doubled);
    let closure = b.closure(None, vec![body]);
    let collect_call = b.call(list, "collect", vec![closure]);
    let second = b.expr_stmt(collect_call);

    let start = b.string("s");
    let x = b.def("x", start);
    let cond = b.bool(true);
    let receiver = b.var("x");
    let upper = b.call(receiver, "toUpperCase", Vec::new());
    let use_stmt = b.expr_stmt(upper);
    let value = b.int(1);
    let assign = b.assign_stmt("x", value);
    let loop_body = b.block(vec![use_stmt, assign]);
    let loop_stmt = b.while_stmt(cond, loop_body);
    let loop_read = b.var("x");
    let third = b.expr_stmt(loop_read);

    let root = b.unit(vec![class], vec![calc, first, second, x, loop_stmt, third]);
    Program {
        arena: b.finish(),
        root,
        label_call,
        collect_call,
        loop_read,
    }
}

fn run(
    store: &TypeStore,
    program: &Program,
    declared: &DeclaredUnit,
    cache: &ExtensionMethodCache,
    options: CheckerOptions,
) -> CheckResult {
    CheckerState::new(store, &program.arena, declared, options)
        .with_extension_cache(cache)
        .check(program.root)
        .expect("check succeeds")
}

#[test]
fn test_parallel_passes_agree_with_sequential_pass() {
    let program = program();
    let mut store = TypeStore::new();
    let declared = declare_unit(&mut store, &program.arena, program.root);
    let store = store;
    let cache = ExtensionMethodCache::with_builtins();

    let baseline = run(&store, &program, &declared, &cache, CheckerOptions::default());
    let wk = store.well_known();
    let integer = store.class_type(wk.integer, &[]);
    assert_eq!(baseline.metadata.inferred_type(program.label_call), Some(store.string_type()));
    assert_eq!(
        baseline.metadata.inferred_type(program.collect_call),
        Some(store.class_type(wk.list, &[integer]))
    );
    assert_eq!(baseline.codes(), vec![diagnostic_codes::CANNOT_FIND_MATCHING_METHOD]);

    let results: Vec<CheckResult> = (0..16)
        .into_par_iter()
        .map(|_| run(&store, &program, &declared, &cache, CheckerOptions::default()))
        .collect();

    for result in &results {
        assert_eq!(result.codes(), baseline.codes());
        for node in [program.label_call, program.collect_call, program.loop_read] {
            assert_eq!(
                result.metadata.inferred_type(node),
                baseline.metadata.inferred_type(node)
            );
        }
        assert_eq!(result.metadata.len(), baseline.metadata.len());
    }
}

#[test]
fn test_first_passes_race_on_inferred_return_types() {
    let program = program();
    let mut store = TypeStore::new();
    let declared = declare_unit(&mut store, &program.arena, program.root);
    let store = store;
    let cache = ExtensionMethodCache::with_builtins();

    let label_types: Vec<Option<TypeId>> = (0..8)
        .into_par_iter()
        .map(|_| {
            run(&store, &program, &declared, &cache, CheckerOptions::default())
                .metadata
                .inferred_type(program.label_call)
        })
        .collect();

    assert!(label_types.iter().all(|&t| t == Some(store.string_type())));
}

#[test]
fn test_passes_with_different_options_run_side_by_side() {
    let program = program();
    let mut store = TypeStore::new();
    let declared = declare_unit(&mut store, &program.arena, program.root);
    let store = store;
    let cache = ExtensionMethodCache::with_builtins();

    let outcomes: Vec<(bool, CheckResult)> = [true, false, true, false]
        .into_par_iter()
        .map(|second_pass| {
            let options = CheckerOptions {
                second_pass,
                ..CheckerOptions::default()
            };
            (second_pass, run(&store, &program, &declared, &cache, options))
        })
        .collect();

    let merged = stc_solver::least_upper_bound(&store, &[TypeId::INT, store.string_type()]);
    for (second_pass, result) in outcomes {
        if second_pass {
            assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_FIND_MATCHING_METHOD]);
        } else {
            assert!(result.diagnostics.is_empty());
        }
        assert_eq!(result.metadata.inferred_type(program.loop_read), Some(merged));
    }
}

/// `["a", "bb"].collect { it.length() }` as a unit of its own.
fn collect_unit() -> (NodeArena, NodeIndex, NodeIndex) {
    let mut b = AstBuilder::new();
    let a = b.string("a");
    let bb = b.string("bb");
    let list = b.list(vec![a, bb]);
    let it = b.var("it");
    let length = b.call(it, "length", Vec::new());
    let body = b.expr_stmt(length);
    let closure = b.closure(None, vec![body]);
    let call = b.call(list, "collect", vec![closure]);
    let stmt = b.expr_stmt(call);
    let root = b.unit(Vec::new(), vec![stmt]);
    (b.finish(), root, call)
}

#[test]
fn test_units_share_extension_snapshot_per_store() {
    let cache = ExtensionMethodCache::with_builtins();
    let program = program();
    let mut first = TypeStore::new();
    let result = check_unit_with_cache(
        &mut first,
        &program.arena,
        program.root,
        CheckerOptions::default(),
        &cache,
    )
    .expect("check succeeds");
    assert_eq!(result.codes(), vec![diagnostic_codes::CANNOT_FIND_MATCHING_METHOD]);

    let (arena, root, call) = collect_unit();
    let result = check_unit_with_cache(&mut first, &arena, root, CheckerOptions::default(), &cache)
        .expect("check succeeds");
    assert!(result.diagnostics.is_empty());
    let integer = first.class_type(first.well_known().integer, &[]);
    assert_eq!(
        result.metadata.inferred_type(call),
        Some(first.class_type(first.well_known().list, &[integer]))
    );
    assert_eq!(cache.rebuild_count(), 1);

    // A second store interns its own types; it gets its own snapshot.
    let mut second = TypeStore::new();
    let (arena, root, call) = collect_unit();
    let result = check_unit_with_cache(&mut second, &arena, root, CheckerOptions::default(), &cache)
        .expect("check succeeds");
    assert!(result.diagnostics.is_empty());
    let integer = second.class_type(second.well_known().integer, &[]);
    assert_eq!(
        result.metadata.inferred_type(call),
        Some(second.class_type(second.well_known().list, &[integer]))
    );
    assert_eq!(cache.rebuild_count(), 2);
    assert_eq!(cache.snapshot_count(), 2);
}
