use super::*;
use stc_solver::TypeStore;

#[test]
fn test_store_type_widens_to_lub() {
    let store = TypeStore::new();
    let wk = store.well_known().clone();
    let mut table = MetadataTable::new();
    let node = NodeIndex(3);

    table.store_type(&store, node, store.class_type(wk.integer, &[]));
    let widened = table.store_type(&store, node, store.class_type(wk.long, &[]));

    assert_eq!(widened, store.class_type(wk.number, &[]));
    assert_eq!(table.inferred_type(node), Some(widened));
}

#[test]
fn test_store_same_type_keeps_it() {
    let store = TypeStore::new();
    let mut table = MetadataTable::new();
    let node = NodeIndex(0);

    table.store_type(&store, node, TypeId::INT);
    table.store_type(&store, node, TypeId::INT);

    assert_eq!(table.inferred_type(node), Some(TypeId::INT));
}

#[test]
fn test_target_method_only_for_declared_members() {
    let mut table = MetadataTable::new();
    let call = NodeIndex(2);
    let created = NodeIndex(4);
    let indexed = NodeIndex(5);

    table.set_target(call, CallTarget::Method(MethodId(9)));
    table.set_target(created, CallTarget::ImplicitConstructor(ClassId(3)));
    table.set_target(
        indexed,
        CallTarget::Extension {
            index: 0,
            name: "getAt".to_string(),
            source: "DefaultGroovyMethods".to_string(),
        },
    );

    assert_eq!(table.target_method(call), Some(MethodId(9)));
    assert_eq!(table.target_method(created), None);
    assert_eq!(table.target(created), Some(&CallTarget::ImplicitConstructor(ClassId(3))));
    assert_eq!(table.target_method(indexed), None);
    assert!(table.target(NodeIndex(6)).is_none());
}

#[test]
fn test_other_slots_are_independent() {
    let store = TypeStore::new();
    let mut table = MetadataTable::new();
    let node = NodeIndex(1);

    table.set_read_only(node);
    table.set_implicit_receiver(node, "delegate".to_string());
    table.set_closure_arg_types(node, vec![TypeId::INT]);
    table.store_return_type(&store, node, store.string_type());

    let meta = table.get(node).expect("entry");
    assert!(meta.read_only_property);
    assert_eq!(meta.implicit_receiver.as_deref(), Some("delegate"));
    assert_eq!(meta.closure_arg_types.as_deref(), Some(&[TypeId::INT][..]));
    assert_eq!(meta.inferred_type, None);
    assert_eq!(table.inferred_return_type(node), Some(store.string_type()));
    assert_eq!(table.len(), 1);
}
