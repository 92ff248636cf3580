use crate::db::{TypeDatabase, TypeStore};
use crate::hierarchy::{as_supertype, is_subclass};
use crate::types::TypeId;

#[test]
fn test_wrappers_extend_number() {
    let store = TypeStore::new();
    let wk = store.well_known();
    for wrapper in [wk.byte, wk.short, wk.integer, wk.long, wk.float, wk.double] {
        assert!(is_subclass(&store, wrapper, wk.number));
        assert!(is_subclass(&store, wrapper, wk.comparable));
    }
    assert!(is_subclass(&store, wk.big_decimal, wk.number));
    assert!(!is_subclass(&store, wk.character, wk.number));
}

#[test]
fn test_collections_hierarchy() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let string = store.string_type();
    let array_list = store.class_type(wk.array_list, &[string]);

    assert_eq!(
        as_supertype(&store, array_list, wk.iterable),
        Some(store.class_type(wk.iterable, &[string]))
    );
    assert!(is_subclass(&store, wk.linked_hash_map, wk.map));
    assert!(is_subclass(&store, wk.linked_hash_set, wk.set));
}

#[test]
fn test_int_range_is_list_of_integer() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let range = store.class_type(wk.int_range, &[]);
    let integer = store.class_type(wk.integer, &[]);

    assert_eq!(
        as_supertype(&store, range, wk.list),
        Some(store.class_type(wk.list, &[integer]))
    );
}

#[test]
fn test_constants_are_static_final() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let max = store
        .class_def(wk.integer)
        .fields
        .iter()
        .find(|f| &*f.name == "MAX_VALUE")
        .map(|f| f.ty);
    assert_eq!(max, Some(TypeId::INT));
}

#[test]
fn test_exceptions_chain() {
    let store = TypeStore::new();
    let wk = store.well_known();
    assert!(is_subclass(&store, wk.illegal_argument_exception, wk.runtime_exception));
    assert!(is_subclass(&store, wk.io_exception, wk.exception));
    assert!(!is_subclass(&store, wk.io_exception, wk.runtime_exception));
}
