//! Extension methods: methods contributed to a type from outside its declaration.
//!
//! An extension method behaves as if it were declared on its `self_type` with
//! the receiver as an implicit leading argument. Providers implement
//! `ExtensionSource`; `ExtensionMethodCache` keeps one immutable snapshot per
//! loading context and type store, and rebuilds it wholesale when any provider
//! reports a new version for that context. Readers only ever see complete
//! snapshots.

use crate::db::{StoreId, TypeDatabase};
use crate::types::{
    ClosureParamHint, DelegationStrategy, DelegationTarget, GenericParam, ParamDef, TypeId,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Opaque identifier of a class-loading context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LoadingContextId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionMethod {
    pub name: Arc<str>,
    /// Type of the implicit receiver parameter; may mention `type_params`.
    pub self_type: TypeId,
    pub type_params: Vec<GenericParam>,
    pub params: Vec<ParamDef>,
    pub return_type: TypeId,
    /// Static extensions apply to class literals of `self_type`.
    pub is_static: bool,
    /// Name of the providing module, for diagnostics.
    pub source: Arc<str>,
}

impl ExtensionMethod {
    pub fn new(name: &str, self_type: TypeId, params: Vec<ParamDef>, return_type: TypeId) -> Self {
        Self {
            name: Arc::from(name),
            self_type,
            type_params: Vec::new(),
            params,
            return_type,
            is_static: false,
            source: Arc::from("extension"),
        }
    }

    #[must_use]
    pub fn with_type_params(mut self, names: &[&str]) -> Self {
        self.type_params = names.iter().map(|n| GenericParam::new(n)).collect();
        self
    }

    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn from_source(mut self, source: &str) -> Self {
        self.source = Arc::from(source);
        self
    }
}

/// Immutable snapshot of the extension methods visible in one loading context.
#[derive(Debug, Default)]
pub struct ExtensionSet {
    methods: Vec<ExtensionMethod>,
    by_name: FxHashMap<Arc<str>, SmallVec<[usize; 4]>>,
}

impl ExtensionSet {
    #[must_use]
    pub fn from_methods(methods: Vec<ExtensionMethod>) -> Self {
        let mut by_name: FxHashMap<Arc<str>, SmallVec<[usize; 4]>> = FxHashMap::default();
        for (index, method) in methods.iter().enumerate() {
            by_name.entry(method.name.clone()).or_default().push(index);
        }
        Self { methods, by_name }
    }

    /// Extension methods called `name`, with their index in this set.
    pub fn methods_named<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = (usize, &'a ExtensionMethod)> + 'a {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(move |&index| (index, &self.methods[index]))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ExtensionMethod> {
        self.methods.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// A provider of extension methods.
pub trait ExtensionSource: Send + Sync {
    /// Changes whenever the methods this source contributes to `context` change.
    fn version(&self, context: LoadingContextId) -> u64;

    fn load(&self, context: LoadingContextId, db: &dyn TypeDatabase) -> Vec<ExtensionMethod>;
}

struct Snapshot {
    versions: SmallVec<[u64; 2]>,
    set: Arc<ExtensionSet>,
}

/// Per-loading-context cache of extension snapshots.
///
/// Snapshots hold `TypeId`s of the store they were loaded into, so they are
/// keyed by store as well as context. Safe to share across threads. Lookups for an up-to-date context take a
/// shard read lock only; a version change rebuilds the whole snapshot under
/// the shard's write lock so each version is loaded exactly once.
pub struct ExtensionMethodCache {
    sources: Vec<Arc<dyn ExtensionSource>>,
    snapshots: DashMap<(LoadingContextId, StoreId), Snapshot, FxBuildHasher>,
    rebuilds: AtomicU64,
}

impl ExtensionMethodCache {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn ExtensionSource>>) -> Self {
        Self {
            sources,
            snapshots: DashMap::with_hasher(FxBuildHasher),
            rebuilds: AtomicU64::new(0),
        }
    }

    /// A cache serving only the builtin extension methods.
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::new(vec![Arc::new(BuiltinExtensions)])
    }

    fn versions(&self, context: LoadingContextId) -> SmallVec<[u64; 2]> {
        self.sources.iter().map(|s| s.version(context)).collect()
    }

    fn build(&self, context: LoadingContextId, db: &dyn TypeDatabase) -> Arc<ExtensionSet> {
        let mut methods = Vec::new();
        for source in &self.sources {
            methods.extend(source.load(context, db));
        }
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        debug!(
            context = context.0,
            store = db.store_id().0,
            count = methods.len(),
            "rebuilt extension snapshot"
        );
        Arc::new(ExtensionSet::from_methods(methods))
    }

    /// Snapshot for `context` in `db`, rebuilt if any source changed version.
    pub fn get(&self, context: LoadingContextId, db: &dyn TypeDatabase) -> Arc<ExtensionSet> {
        let versions = self.versions(context);
        let key = (context, db.store_id());
        if let Some(snapshot) = self.snapshots.get(&key) {
            if snapshot.versions == versions {
                return Arc::clone(&snapshot.set);
            }
        }
        match self.snapshots.entry(key) {
            Entry::Occupied(mut occupied) => {
                // Another reader may have rebuilt it while we waited for the lock.
                if occupied.get().versions == versions {
                    return Arc::clone(&occupied.get().set);
                }
                let set = self.build(context, db);
                occupied.insert(Snapshot {
                    versions,
                    set: Arc::clone(&set),
                });
                set
            }
            Entry::Vacant(vacant) => {
                let set = self.build(context, db);
                vacant.insert(Snapshot {
                    versions,
                    set: Arc::clone(&set),
                });
                set
            }
        }
    }

    /// Drop the snapshots of `context` in every store; the next `get` rebuilds.
    pub fn invalidate(&self, context: LoadingContextId) {
        self.snapshots.retain(|(c, _), _| *c != context);
    }

    /// Drop every snapshot loaded into `store`.
    pub fn forget_store(&self, store: StoreId) {
        self.snapshots.retain(|(_, s), _| *s != store);
    }

    /// Number of snapshots built so far.
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }

    /// Number of live (context, store) snapshots.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}

/// The runtime's default extension methods on collections, strings, numbers,
/// arrays and `Object`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinExtensions;

const BUILTIN_SOURCE: &str = "DefaultGroovyMethods";

impl ExtensionSource for BuiltinExtensions {
    fn version(&self, _context: LoadingContextId) -> u64 {
        1
    }

    fn load(&self, _context: LoadingContextId, db: &dyn TypeDatabase) -> Vec<ExtensionMethod> {
        let mut out = Vec::new();
        builtin_iterable(db, &mut out);
        builtin_list(db, &mut out);
        builtin_map(db, &mut out);
        builtin_string(db, &mut out);
        builtin_number(db, &mut out);
        builtin_object(db, &mut out);
        builtin_array(db, &mut out);
        for method in &mut out {
            method.source = Arc::from(BUILTIN_SOURCE);
        }
        out
    }
}

fn hinted(name: &str, ty: TypeId, hint: Vec<TypeId>) -> ParamDef {
    ParamDef::new(name, ty).with_closure_params(ClosureParamHint::Types(hint))
}

fn param(name: &str, ty: TypeId) -> ParamDef {
    ParamDef::new(name, ty)
}

fn builtin_iterable(db: &dyn TypeDatabase, out: &mut Vec<ExtensionMethod>) {
    let wk = db.well_known();
    let t = db.placeholder("T");
    let u = db.placeholder("U");
    let this = db.class_type(wk.iterable, &[t]);
    let closure = db.class_type(wk.closure, &[]);
    let closure_u = db.class_type(wk.closure, &[u]);
    let list_t = db.class_type(wk.list, &[t]);
    let list_u = db.class_type(wk.list, &[u]);
    let string = db.string_type();

    let ext = |name: &str, params: Vec<ParamDef>, ret: TypeId| {
        ExtensionMethod::new(name, this, params, ret).with_type_params(&["T"])
    };
    out.push(ext("each", vec![hinted("closure", closure, vec![t])], this));
    out.push(ext(
        "eachWithIndex",
        vec![hinted("closure", closure, vec![t, TypeId::INT])],
        this,
    ));
    out.push(
        ExtensionMethod::new("collect", this, vec![hinted("transform", closure_u, vec![t])], list_u)
            .with_type_params(&["T", "U"]),
    );
    out.push(ext("find", vec![hinted("condition", closure, vec![t])], t));
    out.push(ext("findAll", vec![hinted("condition", closure, vec![t])], list_t));
    out.push(ext("any", vec![hinted("condition", closure, vec![t])], TypeId::BOOLEAN));
    out.push(ext("every", vec![hinted("condition", closure, vec![t])], TypeId::BOOLEAN));
    out.push(ext("join", vec![param("separator", string)], string));
    out.push(ext("sum", vec![], t));
    out.push(ext("toList", vec![], list_t));
    out.push(ext("first", vec![], t));
}

fn builtin_list(db: &dyn TypeDatabase, out: &mut Vec<ExtensionMethod>) {
    let wk = db.well_known();
    let t = db.placeholder("T");
    let this = db.class_type(wk.list, &[t]);
    let collection_t = db.class_type(wk.collection, &[t]);
    let object = db.object_type();

    let ext = |name: &str, params: Vec<ParamDef>, ret: TypeId| {
        ExtensionMethod::new(name, this, params, ret).with_type_params(&["T"])
    };
    out.push(ext("getAt", vec![param("index", TypeId::INT)], t));
    out.push(ext(
        "putAt",
        vec![param("index", TypeId::INT), param("value", t)],
        TypeId::VOID,
    ));
    out.push(ext("plus", vec![param("items", collection_t)], this));
    out.push(ext("plus", vec![param("item", t)], this));
    out.push(ext("minus", vec![param("items", collection_t)], this));
    out.push(ext("minus", vec![param("item", object)], this));
    out.push(ext("leftShift", vec![param("item", t)], this));
    out.push(ext("last", vec![], t));
}

fn builtin_map(db: &dyn TypeDatabase, out: &mut Vec<ExtensionMethod>) {
    let wk = db.well_known();
    let k = db.placeholder("K");
    let v = db.placeholder("V");
    let u = db.placeholder("U");
    let this = db.class_type(wk.map, &[k, v]);
    let entry = db.class_type(wk.map_entry, &[k, v]);
    let closure = db.class_type(wk.closure, &[]);
    let closure_u = db.class_type(wk.closure, &[u]);
    let list_u = db.class_type(wk.list, &[u]);
    let object = db.object_type();
    let entry_hint = |name: &str, ty: TypeId| {
        ParamDef::new(name, ty)
            .with_closure_params(ClosureParamHint::MapEntryOrKeyValue { key: k, value: v })
    };

    let ext = |name: &str, params: Vec<ParamDef>, ret: TypeId| {
        ExtensionMethod::new(name, this, params, ret).with_type_params(&["K", "V"])
    };
    out.push(ext("each", vec![entry_hint("closure", closure)], this));
    out.push(
        ExtensionMethod::new("collect", this, vec![entry_hint("transform", closure_u)], list_u)
            .with_type_params(&["K", "V", "U"]),
    );
    out.push(ext("find", vec![entry_hint("condition", closure)], entry));
    out.push(ext("findAll", vec![entry_hint("condition", closure)], this));
    out.push(ext("any", vec![entry_hint("condition", closure)], TypeId::BOOLEAN));
    out.push(ext("every", vec![entry_hint("condition", closure)], TypeId::BOOLEAN));
    out.push(ext("getAt", vec![param("key", k)], v));
    out.push(ext("putAt", vec![param("key", k), param("value", v)], TypeId::VOID));
    out.push(ext("plus", vec![param("other", this)], this));
    out.push(ext("isCase", vec![param("key", object)], TypeId::BOOLEAN));
}

fn builtin_string(db: &dyn TypeDatabase, out: &mut Vec<ExtensionMethod>) {
    let wk = db.well_known();
    let this = db.string_type();
    let object = db.object_type();
    let number = db.class_type(wk.number, &[]);
    let closure = db.class_type(wk.closure, &[]);
    let integer = db.class_type(wk.integer, &[]);

    let ext = |name: &str, params: Vec<ParamDef>, ret: TypeId| {
        ExtensionMethod::new(name, this, params, ret)
    };
    out.push(ext("getAt", vec![param("index", TypeId::INT)], this));
    out.push(ext("plus", vec![param("value", object)], this));
    out.push(ext("minus", vec![param("value", object)], this));
    out.push(ext("multiply", vec![param("times", number)], this));
    out.push(ext("isCase", vec![param("value", object)], TypeId::BOOLEAN));
    out.push(ext("each", vec![hinted("closure", closure, vec![this])], this));
    out.push(ext("size", vec![], TypeId::INT));
    out.push(ext("toInteger", vec![], integer));
    out.push(ext("next", vec![], this));
    out.push(ext("previous", vec![], this));
}

fn builtin_number(db: &dyn TypeDatabase, out: &mut Vec<ExtensionMethod>) {
    let wk = db.well_known();
    let this = db.class_type(wk.number, &[]);
    let string = db.string_type();
    let closure = db.class_type(wk.closure, &[]);

    let ext = |name: &str, params: Vec<ParamDef>, ret: TypeId| {
        ExtensionMethod::new(name, this, params, ret)
    };
    out.push(ext("plus", vec![param("value", string)], string));
    out.push(ext(
        "times",
        vec![hinted("closure", closure, vec![TypeId::INT])],
        TypeId::VOID,
    ));
    out.push(ext(
        "upto",
        vec![param("to", this), hinted("closure", closure, vec![this])],
        TypeId::VOID,
    ));
    out.push(ext("next", vec![], this));
    out.push(ext("previous", vec![], this));
}

fn builtin_object(db: &dyn TypeDatabase, out: &mut Vec<ExtensionMethod>) {
    let wk = db.well_known();
    let t = db.placeholder("T");
    let u = db.placeholder("U");
    let object = db.object_type();
    let closure = db.class_type(wk.closure, &[]);
    let closure_u = db.class_type(wk.closure, &[u]);
    let string = db.string_type();

    out.push(
        ExtensionMethod::new(
            "with",
            t,
            vec![
                hinted("closure", closure_u, vec![t])
                    .with_delegate(DelegationTarget::Receiver, DelegationStrategy::DelegateFirst),
            ],
            u,
        )
        .with_type_params(&["T", "U"]),
    );
    out.push(
        ExtensionMethod::new(
            "tap",
            t,
            vec![
                hinted("closure", closure, vec![t])
                    .with_delegate(DelegationTarget::Receiver, DelegationStrategy::DelegateFirst),
            ],
            t,
        )
        .with_type_params(&["T"]),
    );
    let ext = |name: &str, params: Vec<ParamDef>, ret: TypeId| {
        ExtensionMethod::new(name, object, params, ret)
    };
    out.push(ext("println", vec![], TypeId::VOID));
    out.push(ext("println", vec![param("value", object)], TypeId::VOID));
    out.push(ext("print", vec![param("value", object)], TypeId::VOID));
    out.push(ext("isCase", vec![param("value", object)], TypeId::BOOLEAN));
    out.push(ext("is", vec![param("other", object)], TypeId::BOOLEAN));
    out.push(ext("inspect", vec![], string));

    let class_t = db.class_type(wk.class, &[t]);
    out.push(
        ExtensionMethod::new("isCase", class_t, vec![param("value", object)], TypeId::BOOLEAN)
            .with_type_params(&["T"]),
    );
}

fn builtin_array(db: &dyn TypeDatabase, out: &mut Vec<ExtensionMethod>) {
    let wk = db.well_known();
    let t = db.placeholder("T");
    let u = db.placeholder("U");
    let this = db.array_of(t);
    let closure = db.class_type(wk.closure, &[]);
    let closure_u = db.class_type(wk.closure, &[u]);
    let list_t = db.class_type(wk.list, &[t]);
    let list_u = db.class_type(wk.list, &[u]);

    let ext = |name: &str, params: Vec<ParamDef>, ret: TypeId| {
        ExtensionMethod::new(name, this, params, ret).with_type_params(&["T"])
    };
    out.push(ext("getAt", vec![param("index", TypeId::INT)], t));
    out.push(ext(
        "putAt",
        vec![param("index", TypeId::INT), param("value", t)],
        TypeId::VOID,
    ));
    out.push(ext("size", vec![], TypeId::INT));
    out.push(ext("each", vec![hinted("closure", closure, vec![t])], this));
    out.push(
        ExtensionMethod::new("collect", this, vec![hinted("transform", closure_u, vec![t])], list_u)
            .with_type_params(&["T", "U"]),
    );
    out.push(ext("toList", vec![], list_t));
}

#[cfg(test)]
#[path = "tests/extensions_tests.rs"]
mod tests;
