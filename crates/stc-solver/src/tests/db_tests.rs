use super::*;
use crate::types::MemberFlags;

#[test]
fn test_builtin_names_resolve() {
    let store = TypeStore::new();
    let wk = store.well_known();

    assert_eq!(store.class_by_name("java.lang.String"), Some(wk.string));
    assert_eq!(store.class_by_name("String"), Some(wk.string));
    assert_eq!(store.class_by_name("Map.Entry"), Some(wk.map_entry));
    assert_eq!(store.class_by_name("Entry"), Some(wk.map_entry));
    assert_eq!(store.class_by_name("NoSuchClass"), None);
}

#[test]
fn test_add_class_defaults_super_to_object() {
    let mut store = TypeStore::new();
    let foo = store.declare_class("com.example.Foo", ClassKind::Class);
    let iface = store.declare_class("com.example.Shape", ClassKind::Interface);

    assert_eq!(store.class_def(foo).super_class, Some(store.object_type()));
    assert_eq!(store.class_def(iface).super_class, None);
    assert_eq!(store.class_by_name("Foo"), Some(foo));
}

#[test]
fn test_add_method_sets_declaring_class() {
    let mut store = TypeStore::new();
    let foo = store.declare_class("Foo", ClassKind::Class);
    let method = store.add_method(
        foo,
        MethodDef::new("bar", vec![ParamDef::new("x", TypeId::INT)], TypeId::VOID)
            .with_flags(MemberFlags::STATIC),
    );
    let ctor = store.add_constructor(foo, Vec::new());

    assert_eq!(store.method_def(method).declaring, foo);
    assert!(store.method_def(method).is_static());
    assert_eq!(store.class_def(foo).methods, vec![method]);
    assert_eq!(store.class_def(foo).constructors, vec![ctor]);
    assert_eq!(&*store.method_def(ctor).name, "<init>");
}

#[test]
fn test_inferred_return_memo() {
    let mut store = TypeStore::new();
    let foo = store.declare_class("Foo", ClassKind::Class);
    let method = store.add_method(foo, MethodDef::new("bar", Vec::new(), TypeId::DYNAMIC));

    assert_eq!(store.inferred_return_type(method), None);
    store.record_inferred_return_type(method, TypeId::INT);
    assert_eq!(store.inferred_return_type(method), Some(TypeId::INT));
}

#[test]
fn test_class_type_is_interned() {
    let store = TypeStore::new();
    let wk = store.well_known();
    let a = store.class_type(wk.list, &[store.string_type()]);
    let b = store.class_type(wk.list, &[store.string_type()]);
    assert_eq!(a, b);
    assert_eq!(store.class_of(a), Some(wk.list));
    assert_eq!(store.class_of(TypeId::INT), None);
}
