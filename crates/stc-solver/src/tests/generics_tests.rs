use super::*;
use crate::db::TypeStore;

#[test]
fn test_extract_through_nested_generics() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let t = store.placeholder("T");
    let string = store.string_type();

    // List<List<T>> against ArrayList<List<String>>
    let formal = store.class_type(wk.list, &[store.class_type(wk.list, &[t])]);
    let actual = store.class_type(wk.array_list, &[store.class_type(wk.list, &[string])]);

    let connections = extract_connections(&store, actual, formal);
    assert!(connections.is_consistent());
    assert_eq!(connections.bindings.get("T").copied(), Some(string));
}

#[test]
fn test_extract_boxes_primitives_and_walks_arrays() {
    let store = TypeStore::new();
    let t = store.placeholder("T");
    let integer = store.class_type(store.well_known().integer, &[]);

    let connections = extract_connections(&store, TypeId::INT, t);
    assert_eq!(connections.bindings.get("T").copied(), Some(integer));

    let formal = store.array_of(t);
    let actual = store.array_of(store.string_type());
    let connections = extract_connections(&store, actual, formal);
    assert_eq!(connections.bindings.get("T").copied(), Some(store.string_type()));
}

#[test]
fn test_conflicts_are_reported_not_overwritten() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let t = store.placeholder("T");
    let map_tt = store.class_type(wk.map, &[t, t]);
    let integer = store.class_type(wk.integer, &[]);
    let actual = store.class_type(wk.hash_map, &[store.string_type(), integer]);

    let connections = extract_connections(&store, actual, map_tt);
    assert!(!connections.is_consistent());
    assert_eq!(connections.bindings.get("T").copied(), Some(store.string_type()));
    assert_eq!(connections.conflicts.len(), 1);
    assert_eq!(connections.conflicts[0].second, integer);
}

#[test]
fn test_widened_bindings_use_least_upper_bound() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let integer = store.class_type(wk.integer, &[]);
    let long = store.class_type(wk.long, &[]);
    let number = store.class_type(wk.number, &[]);

    let mut connections = Connections::new();
    connections.bind("T".into(), integer);
    connections.bind("T".into(), long);
    let widened = connections.widened_bindings(&store);
    assert_eq!(widened.get("T").copied(), Some(number));
}

#[test]
fn test_dynamic_binding_is_replaced_by_concrete() {
    let store = TypeStore::new();
    let mut connections = Connections::new();
    connections.bind("T".into(), TypeId::DYNAMIC);
    connections.bind("T".into(), store.string_type());
    connections.bind("T".into(), TypeId::NULL);
    assert!(connections.is_consistent());
    assert_eq!(connections.bindings.get("T").copied(), Some(store.string_type()));
}

#[test]
fn test_closure_return_connects_to_sam_return() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let t = store.placeholder("T");
    let r = store.placeholder("R");
    let integer = store.class_type(wk.integer, &[]);

    let formal = store.class_type(wk.function, &[t, r]);
    let closure = store.class_type(wk.closure, &[integer]);
    let connections = extract_connections(&store, closure, formal);
    assert_eq!(connections.bindings.get("R").copied(), Some(integer));
    assert_eq!(connections.bindings.get("T"), None);
}

#[test]
fn test_substitute_preserves_unbound() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let k = store.placeholder("K");
    let v = store.placeholder("V");
    let map_kv = store.class_type(wk.map, &[k, v]);

    let mut bindings = Bindings::default();
    bindings.insert("K".into(), store.string_type());
    let result = substitute(&store, &bindings, map_kv);
    assert_eq!(result, store.class_type(wk.map, &[store.string_type(), v]));
    assert!(contains_placeholders(&store, result));
}

#[test]
fn test_erase_placeholders_uses_first_bound() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let t = store.placeholder("T");
    let number = store.class_type(wk.number, &[]);
    let list_t = store.class_type(wk.list, &[t]);

    let bounded = [GenericParam::bounded("T", number)];
    assert_eq!(
        erase_placeholders(&store, list_t, &bounded),
        store.class_type(wk.list, &[number])
    );
    assert_eq!(erase_placeholders(&store, t, &[]), store.object_type());
}

#[test]
fn test_check_bounds() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let number = store.class_type(wk.number, &[]);
    let params = [GenericParam::bounded("T", number)];

    let mut ok = Bindings::default();
    ok.insert("T".into(), store.class_type(wk.integer, &[]));
    assert!(check_bounds(&store, &params, &ok).is_empty());

    let mut bad = Bindings::default();
    bad.insert("T".into(), store.string_type());
    let violations = check_bounds(&store, &params, &bad);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].bound, number);
}

#[test]
fn test_invariant_conflict_with_unrelated_type_is_violation() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let t = store.placeholder("T");
    let integer = store.class_type(wk.integer, &[]);
    let list_of_strings = store.class_type(wk.list, &[store.string_type()]);

    // (T a, List<T> b) called with (Integer, List<String>)
    let mut connections = extract_connections(&store, integer, t);
    connections.merge(extract_connections(&store, list_of_strings, store.class_type(wk.list, &[t])));

    assert_eq!(connections.conflicts.len(), 1);
    let conflict = &connections.conflicts[0];
    assert!(!conflict.first_invariant);
    assert!(conflict.second_invariant);
    assert_eq!(connections.violations(&store).count(), 1);
}

#[test]
fn test_loose_subtype_of_invariant_binding_is_not_violation() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let integer = store.class_type(wk.integer, &[]);
    let number = store.class_type(wk.number, &[]);

    let mut connections = Connections::new();
    connections.bind_invariant("T".into(), number);
    connections.bind("T".into(), integer);
    assert!(!connections.is_consistent());
    assert_eq!(connections.violations(&store).count(), 0);

    connections.bind_invariant("T".into(), store.string_type());
    assert_eq!(connections.violations(&store).count(), 1);
}

#[test]
fn test_loose_conflicts_widen_without_violation() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let mut connections = Connections::new();
    connections.bind("T".into(), store.class_type(wk.integer, &[]));
    connections.bind("T".into(), store.string_type());
    assert_eq!(connections.conflicts.len(), 1);
    assert_eq!(connections.violations(&store).count(), 0);
}
