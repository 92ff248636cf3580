//! Overload resolution and whole-unit checking benchmarks.
//!
//! Measures how resolution scales with the number of overloads on one
//! receiver, and how a pass scales with the number of script statements.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use stc::stc_ast::BinaryOp;
use stc::{
    AstBuilder, CheckerOptions, CheckerState, ExtensionMethodCache, LoadingContextId,
    MethodResolver, NodeArena, NodeIndex, TypeDatabase, TypeId, TypeRef, TypeStore, check_unit,
    declare_unit,
};

const OVERLOAD_COUNTS: &[usize] = &[2, 8, 32];
const STATEMENT_COUNTS: &[usize] = &[10, 100, 1000];

const PARAM_TYPES: &[&str] = &["Object", "Number", "Integer", "Comparable", "CharSequence", "String"];

/// `class Api { void m(<T1> a, <T2> b) ... }` with `count` overloads.
fn overloaded_class(count: usize) -> (NodeArena, NodeIndex) {
    let mut b = AstBuilder::new();
    let methods = (0..count)
        .map(|i| {
            let first = PARAM_TYPES[i % PARAM_TYPES.len()];
            let second = PARAM_TYPES[(i / PARAM_TYPES.len()) % PARAM_TYPES.len()];
            let mut params = vec![
                AstBuilder::param("a", Some(TypeRef::named(first))),
                AstBuilder::param("b", Some(TypeRef::named(second))),
            ];
            if i % 3 == 2 {
                params.push(AstBuilder::param(
                    "rest",
                    Some(TypeRef::array(TypeRef::named("Object"))),
                ));
            }
            b.method("m", params, Some(TypeRef::named("void")), Vec::new())
        })
        .collect();
    let class = b.class("Api", Vec::new(), methods);
    let root = b.unit(vec![class], Vec::new());
    (b.finish(), root)
}

fn bench_resolve_method(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_method");

    for &count in OVERLOAD_COUNTS {
        let (arena, root) = overloaded_class(count);
        let mut store = TypeStore::new();
        declare_unit(&mut store, &arena, root);
        let Some(api) = store.class_by_name("Api") else {
            continue;
        };
        let receiver = store.class_type(api, &[]);
        let args = [TypeId::INT, store.string_type()];

        group.bench_with_input(BenchmarkId::new("overloads", count), &args, |b, args| {
            b.iter(|| {
                let resolver = MethodResolver::new(&store);
                black_box(resolver.resolve_method(receiver, "m", black_box(args)))
            });
        });
    }

    group.finish();
}

fn bench_extension_methods(c: &mut Criterion) {
    let store = TypeStore::new();
    let cache = ExtensionMethodCache::with_builtins();
    let extensions = cache.get(LoadingContextId(0), &store);
    let wk = store.well_known();
    let integer = store.class_type(wk.integer, &[]);
    let list = store.class_type(wk.list, &[integer]);
    let closure = store.class_type(wk.closure, &[]);

    c.bench_function("resolve_extension_each", |b| {
        b.iter(|| {
            let resolver = MethodResolver::new(&store).with_extensions(&extensions);
            black_box(resolver.resolve_method(list, "each", &[closure]))
        });
    });

    c.bench_function("extension_cache_hit", |b| {
        b.iter(|| black_box(cache.get(LoadingContextId(0), &store)));
    });
}

/// `def x = 0; x = x + 1; "s".length(); ...` repeated `count` times.
fn script(count: usize) -> (NodeArena, NodeIndex) {
    let mut b = AstBuilder::new();
    let zero = b.int(0);
    let mut statements = vec![b.def("x", zero)];
    for i in 0..count {
        let stmt = match i % 3 {
            0 => {
                let x = b.var("x");
                let one = b.int(1);
                let sum = b.binary(BinaryOp::Plus, x, one);
                b.assign_stmt("x", sum)
            }
            1 => {
                let text = b.string("s");
                let call = b.call(text, "length", Vec::new());
                b.expr_stmt(call)
            }
            _ => {
                let one = b.int(1);
                let two = b.int(2);
                let list = b.list(vec![one, two]);
                let it = b.var("it");
                let body = b.expr_stmt(it);
                let closure = b.closure(None, vec![body]);
                let call = b.call(list, "collect", vec![closure]);
                b.expr_stmt(call)
            }
        };
        statements.push(stmt);
    }
    let root = b.unit(Vec::new(), statements);
    (b.finish(), root)
}

fn bench_check_unit(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_unit");

    for &count in STATEMENT_COUNTS {
        let (arena, root) = script(count);
        group.bench_with_input(BenchmarkId::new("declare_and_check", count), &arena, |b, arena| {
            b.iter(|| {
                let mut store = TypeStore::new();
                black_box(check_unit(&mut store, arena, root, CheckerOptions::default()))
            });
        });

        let mut store = TypeStore::new();
        let declared = declare_unit(&mut store, &arena, root);
        let cache = ExtensionMethodCache::with_builtins();
        let methods = cache.get(LoadingContextId(0), &store);
        group.bench_with_input(BenchmarkId::new("check_only", count), &arena, |b, arena| {
            b.iter(|| {
                let state = CheckerState::new(&store, arena, &declared, CheckerOptions::default())
                    .with_extension_methods(methods.clone());
                black_box(state.check(root))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_method,
    bench_extension_methods,
    bench_check_unit
);
criterion_main!(benches);
