use super::*;
use crate::db::TypeStore;
use crate::types::{DelegatesTo, TypeData};

/// Source whose version can be bumped from the test.
struct Versioned {
    version: AtomicU64,
    name: &'static str,
}

impl Versioned {
    fn new(name: &'static str) -> Self {
        Self {
            version: AtomicU64::new(1),
            name,
        }
    }
}

impl ExtensionSource for Versioned {
    fn version(&self, _context: LoadingContextId) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn load(&self, _context: LoadingContextId, db: &dyn TypeDatabase) -> Vec<ExtensionMethod> {
        vec![
            ExtensionMethod::new(self.name, db.string_type(), Vec::new(), TypeId::INT)
                .from_source("test"),
        ]
    }
}

#[test]
fn test_set_indexes_by_name() {
    let store = TypeStore::new();
    let string = store.string_type();
    let set = ExtensionSet::from_methods(vec![
        ExtensionMethod::new("shout", string, Vec::new(), string),
        ExtensionMethod::new("whisper", string, Vec::new(), string),
        ExtensionMethod::new("shout", string, vec![ParamDef::new("n", TypeId::INT)], string),
    ]);
    assert_eq!(set.len(), 3);
    let shout: Vec<usize> = set.methods_named("shout").map(|(i, _)| i).collect();
    assert_eq!(shout, vec![0, 2]);
    assert_eq!(set.methods_named("missing").count(), 0);
    assert_eq!(set.get(1).map(|m| &*m.name), Some("whisper"));
    assert!(set.get(3).is_none());
}

#[test]
fn test_builtins_cover_core_groups() {
    let store = TypeStore::new();
    let methods = BuiltinExtensions.load(LoadingContextId(0), &store);
    let set = ExtensionSet::from_methods(methods);
    for name in ["each", "collect", "findAll", "getAt", "with", "times", "println", "size"] {
        assert!(set.methods_named(name).next().is_some(), "missing builtin {name}");
    }
    assert!(
        set.methods_named("each")
            .all(|(_, m)| &*m.source == "DefaultGroovyMethods")
    );
}

#[test]
fn test_with_delegates_to_receiver() {
    let store = TypeStore::new();
    let set = ExtensionSet::from_methods(BuiltinExtensions.load(LoadingContextId(0), &store));
    let (_, with) = set
        .methods_named("with")
        .next()
        .expect("builtin with");
    assert!(matches!(store.lookup(with.self_type), TypeData::Placeholder(_)));
    assert_eq!(with.params.len(), 1);
    assert_eq!(
        with.params[0].delegates_to,
        Some(DelegatesTo {
            target: DelegationTarget::Receiver,
            strategy: DelegationStrategy::DelegateFirst,
        })
    );
}

#[test]
fn test_cache_reuses_snapshot() {
    let store = TypeStore::new();
    let cache = ExtensionMethodCache::new(vec![Arc::new(Versioned::new("shout")) as Arc<dyn ExtensionSource>]);
    let first = cache.get(LoadingContextId(1), &store);
    let second = cache.get(LoadingContextId(1), &store);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.rebuild_count(), 1);
    assert_eq!(cache.snapshot_count(), 1);
}

#[test]
fn test_cache_rebuilds_on_version_change() {
    let store = TypeStore::new();
    let source = Arc::new(Versioned::new("shout"));
    let cache = ExtensionMethodCache::new(vec![source.clone() as Arc<dyn ExtensionSource>]);
    let before = cache.get(LoadingContextId(1), &store);
    source.version.store(2, Ordering::SeqCst);
    let after = cache.get(LoadingContextId(1), &store);
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(cache.rebuild_count(), 2);
    // The old snapshot stays valid for readers still holding it.
    assert_eq!(before.len(), 1);
}

#[test]
fn test_contexts_are_independent() {
    let store = TypeStore::new();
    let cache = ExtensionMethodCache::new(vec![Arc::new(Versioned::new("shout")) as Arc<dyn ExtensionSource>]);
    cache.get(LoadingContextId(1), &store);
    cache.get(LoadingContextId(2), &store);
    assert_eq!(cache.snapshot_count(), 2);
    assert_eq!(cache.rebuild_count(), 2);

    cache.invalidate(LoadingContextId(1));
    assert_eq!(cache.snapshot_count(), 1);
    cache.get(LoadingContextId(1), &store);
    assert_eq!(cache.rebuild_count(), 3);
}

#[test]
fn test_snapshots_are_per_store() {
    let first = TypeStore::new();
    let second = TypeStore::new();
    // Shift the second store's interning so its ids diverge from the first.
    let nested = second.array_of(second.array_of(second.string_type()));
    second.class_type(second.well_known().list, &[nested]);

    let cache = ExtensionMethodCache::with_builtins();
    let context = LoadingContextId(0);
    let from_first = cache.get(context, &first);
    let from_second = cache.get(context, &second);
    assert!(!Arc::ptr_eq(&from_first, &from_second));
    assert_eq!(cache.rebuild_count(), 2);
    assert_eq!(cache.snapshot_count(), 2);

    let direct = ExtensionSet::from_methods(BuiltinExtensions.load(context, &second));
    let cached: Vec<TypeId> = from_second.methods_named("collect").map(|(_, m)| m.return_type).collect();
    let loaded: Vec<TypeId> = direct.methods_named("collect").map(|(_, m)| m.return_type).collect();
    assert_eq!(cached, loaded);

    assert!(Arc::ptr_eq(&from_second, &cache.get(context, &second)));
    assert_eq!(cache.rebuild_count(), 2);
}

#[test]
fn test_forget_store_drops_only_its_snapshots() {
    let first = TypeStore::new();
    let second = TypeStore::new();
    let cache = ExtensionMethodCache::new(vec![Arc::new(Versioned::new("shout")) as Arc<dyn ExtensionSource>]);
    cache.get(LoadingContextId(1), &first);
    cache.get(LoadingContextId(2), &first);
    cache.get(LoadingContextId(1), &second);
    assert_eq!(cache.snapshot_count(), 3);

    cache.forget_store(first.store_id());
    assert_eq!(cache.snapshot_count(), 1);
    cache.invalidate(LoadingContextId(1));
    assert_eq!(cache.snapshot_count(), 0);
}
