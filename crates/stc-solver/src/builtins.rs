//! Builtin runtime model.
//!
//! The checker needs a fixed set of JDK/runtime classes to type literals,
//! operators and loops. They are declared here with the members the checker
//! and the builtin extension methods rely on.

use crate::db::{TypeDatabase, TypeStore};
use crate::types::{
    ClassDef, ClassId, ClassKind, FieldDef, GenericParam, MemberFlags, MethodDef, MethodId,
    ParamDef, TypeId,
};
use std::sync::Arc;

struct Bootstrap<'a> {
    store: &'a mut TypeStore,
}

impl Bootstrap<'_> {
    fn class(&mut self, name: &str, kind: ClassKind, params: &[&str]) -> ClassId {
        let mut def = ClassDef::new(name, kind);
        def.type_params = params.iter().map(|p| GenericParam::new(p)).collect();
        self.store.add_class(def)
    }

    fn ty(&self, class: ClassId, args: &[TypeId]) -> TypeId {
        self.store.class_type(class, args)
    }

    fn raw(&self, class: ClassId) -> TypeId {
        self.store.class_type(class, &[])
    }

    fn ph(&self, name: &str) -> TypeId {
        self.store.placeholder(name)
    }

    fn extends(&mut self, class: ClassId, super_class: TypeId) {
        self.store.class_mut(class).super_class = Some(super_class);
    }

    fn implements(&mut self, class: ClassId, interfaces: &[TypeId]) {
        self.store
            .class_mut(class)
            .interfaces
            .extend_from_slice(interfaces);
    }

    fn params(list: &[(&str, TypeId)]) -> Vec<ParamDef> {
        list.iter().map(|(name, ty)| ParamDef::new(name, *ty)).collect()
    }

    fn method(
        &mut self,
        class: ClassId,
        name: &str,
        params: &[(&str, TypeId)],
        ret: TypeId,
    ) -> MethodId {
        self.store
            .add_method(class, MethodDef::new(name, Self::params(params), ret))
    }

    fn abstract_method(
        &mut self,
        class: ClassId,
        name: &str,
        params: &[(&str, TypeId)],
        ret: TypeId,
    ) -> MethodId {
        self.store.add_method(
            class,
            MethodDef::new(name, Self::params(params), ret).with_flags(MemberFlags::ABSTRACT),
        )
    }

    fn static_method(
        &mut self,
        class: ClassId,
        name: &str,
        params: &[(&str, TypeId)],
        ret: TypeId,
    ) -> MethodId {
        self.store.add_method(
            class,
            MethodDef::new(name, Self::params(params), ret).with_flags(MemberFlags::STATIC),
        )
    }

    fn ctor(&mut self, class: ClassId, params: &[(&str, TypeId)]) -> MethodId {
        self.store.add_constructor(class, Self::params(params))
    }

    fn constant(&mut self, class: ClassId, name: &str, ty: TypeId) {
        self.store.class_mut(class).fields.push(FieldDef {
            name: Arc::from(name),
            ty,
            flags: MemberFlags::STATIC | MemberFlags::FINAL,
        });
    }
}

/// Populate an empty store with the builtin classes.
pub(crate) fn bootstrap(store: &mut TypeStore) {
    let mut b = Bootstrap { store };
    use ClassKind::{AbstractClass, Class, Interface};

    // Root and marker interfaces
    let object = b.class("java.lang.Object", Class, &[]);
    b.store.well_known_mut().object = object;
    let object_ty = b.raw(object);
    let serializable = b.class("java.io.Serializable", Interface, &[]);
    let cloneable = b.class("java.lang.Cloneable", Interface, &[]);
    let comparable = b.class("java.lang.Comparable", Interface, &["T"]);
    let char_sequence = b.class("java.lang.CharSequence", Interface, &[]);
    let serializable_ty = b.raw(serializable);
    let cloneable_ty = b.raw(cloneable);

    // Collections
    let iterable = b.class("java.lang.Iterable", Interface, &["T"]);
    let iterator = b.class("java.util.Iterator", Interface, &["E"]);
    let collection = b.class("java.util.Collection", Interface, &["E"]);
    let list = b.class("java.util.List", Interface, &["E"]);
    let set = b.class("java.util.Set", Interface, &["E"]);
    let map = b.class("java.util.Map", Interface, &["K", "V"]);
    let map_entry = b.class("java.util.Map.Entry", Interface, &["K", "V"]);
    b.store.register_alias("Map.Entry", map_entry);
    let abstract_list = b.class("java.util.AbstractList", AbstractClass, &["E"]);
    let array_list = b.class("java.util.ArrayList", Class, &["E"]);
    let linked_list = b.class("java.util.LinkedList", Class, &["E"]);
    let hash_set = b.class("java.util.HashSet", Class, &["E"]);
    let linked_hash_set = b.class("java.util.LinkedHashSet", Class, &["E"]);
    let hash_map = b.class("java.util.HashMap", Class, &["K", "V"]);
    let linked_hash_map = b.class("java.util.LinkedHashMap", Class, &["K", "V"]);

    // Functional interfaces
    let runnable = b.class("java.lang.Runnable", Interface, &[]);
    let function = b.class("java.util.function.Function", Interface, &["T", "R"]);
    let comparator = b.class("java.util.Comparator", Interface, &["T"]);

    // Strings, numbers and other value types
    let string = b.class("java.lang.String", Class, &[]);
    let gstring = b.class("groovy.lang.GString", AbstractClass, &[]);
    let number = b.class("java.lang.Number", AbstractClass, &[]);
    let byte = b.class("java.lang.Byte", Class, &[]);
    let short = b.class("java.lang.Short", Class, &[]);
    let integer = b.class("java.lang.Integer", Class, &[]);
    let long = b.class("java.lang.Long", Class, &[]);
    let float = b.class("java.lang.Float", Class, &[]);
    let double = b.class("java.lang.Double", Class, &[]);
    let character = b.class("java.lang.Character", Class, &[]);
    let boolean = b.class("java.lang.Boolean", Class, &[]);
    let void = b.class("java.lang.Void", Class, &[]);
    let big_integer = b.class("java.math.BigInteger", Class, &[]);
    let big_decimal = b.class("java.math.BigDecimal", Class, &[]);

    let range = b.class("groovy.lang.Range", Interface, &["T"]);
    let int_range = b.class("groovy.lang.IntRange", Class, &[]);
    let closure = b.class("groovy.lang.Closure", AbstractClass, &["V"]);
    let class = b.class("java.lang.Class", Class, &["T"]);

    let throwable = b.class("java.lang.Throwable", Class, &[]);
    let exception = b.class("java.lang.Exception", Class, &[]);
    let runtime_exception = b.class("java.lang.RuntimeException", Class, &[]);
    let illegal_argument_exception =
        b.class("java.lang.IllegalArgumentException", Class, &[]);
    let io_exception = b.class("java.io.IOException", Class, &[]);

    {
        let wk = b.store.well_known_mut();
        wk.comparable = comparable;
        wk.serializable = serializable;
        wk.cloneable = cloneable;
        wk.char_sequence = char_sequence;
        wk.string = string;
        wk.gstring = gstring;
        wk.number = number;
        wk.byte = byte;
        wk.short = short;
        wk.integer = integer;
        wk.long = long;
        wk.float = float;
        wk.double = double;
        wk.character = character;
        wk.boolean = boolean;
        wk.void = void;
        wk.big_integer = big_integer;
        wk.big_decimal = big_decimal;
        wk.iterable = iterable;
        wk.iterator = iterator;
        wk.collection = collection;
        wk.list = list;
        wk.abstract_list = abstract_list;
        wk.array_list = array_list;
        wk.linked_list = linked_list;
        wk.set = set;
        wk.hash_set = hash_set;
        wk.linked_hash_set = linked_hash_set;
        wk.map = map;
        wk.map_entry = map_entry;
        wk.hash_map = hash_map;
        wk.linked_hash_map = linked_hash_map;
        wk.range = range;
        wk.int_range = int_range;
        wk.closure = closure;
        wk.class = class;
        wk.runnable = runnable;
        wk.function = function;
        wk.comparator = comparator;
        wk.throwable = throwable;
        wk.exception = exception;
        wk.runtime_exception = runtime_exception;
        wk.illegal_argument_exception = illegal_argument_exception;
        wk.io_exception = io_exception;
    }

    let string_ty = b.raw(string);
    let int = TypeId::INT;
    let boolean_p = TypeId::BOOLEAN;
    let (t, e, k, v, r) = (b.ph("T"), b.ph("E"), b.ph("K"), b.ph("V"), b.ph("R"));
    let wildcard = b.store.interner().wildcard(None, None);

    // Object
    b.ctor(object, &[]);
    b.method(object, "equals", &[("other", object_ty)], boolean_p);
    b.method(object, "hashCode", &[], int);
    b.method(object, "toString", &[], string_ty);
    let any_class = b.ty(class, &[wildcard]);
    b.method(object, "getClass", &[], any_class);

    // Comparable / CharSequence
    b.abstract_method(comparable, "compareTo", &[("other", t)], int);
    b.abstract_method(char_sequence, "length", &[], int);
    b.abstract_method(char_sequence, "charAt", &[("index", int)], TypeId::CHAR);

    // Iterable / Iterator
    let iterator_t = b.ty(iterator, &[t]);
    b.abstract_method(iterable, "iterator", &[], iterator_t);
    b.abstract_method(iterator, "hasNext", &[], boolean_p);
    b.abstract_method(iterator, "next", &[], e);

    // Collection<E> extends Iterable<E>
    let iterable_e = b.ty(iterable, &[e]);
    b.implements(collection, &[iterable_e]);
    let extends_e = b.store.interner().wildcard(Some(e), None);
    let collection_ext_e = b.ty(collection, &[extends_e]);
    b.abstract_method(collection, "size", &[], int);
    b.abstract_method(collection, "isEmpty", &[], boolean_p);
    b.abstract_method(collection, "contains", &[("o", object_ty)], boolean_p);
    b.abstract_method(collection, "add", &[("e", e)], boolean_p);
    b.abstract_method(collection, "addAll", &[("c", collection_ext_e)], boolean_p);
    b.abstract_method(collection, "remove", &[("o", object_ty)], boolean_p);
    b.abstract_method(collection, "clear", &[], TypeId::VOID);
    let iterator_e = b.ty(iterator, &[e]);
    b.abstract_method(collection, "iterator", &[], iterator_e);

    // List<E> / Set<E>
    let collection_e = b.ty(collection, &[e]);
    b.implements(list, &[collection_e]);
    b.implements(set, &[collection_e]);
    let list_e = b.ty(list, &[e]);
    b.abstract_method(list, "get", &[("index", int)], e);
    b.abstract_method(list, "set", &[("index", int), ("element", e)], e);
    b.abstract_method(list, "add", &[("index", int), ("element", e)], TypeId::VOID);
    b.abstract_method(list, "indexOf", &[("o", object_ty)], int);
    b.abstract_method(list, "remove", &[("index", int)], e);
    b.abstract_method(list, "subList", &[("from", int), ("to", int)], list_e);

    // Map<K, V> and Map.Entry<K, V>
    let entry_kv = b.ty(map_entry, &[k, v]);
    let set_k = b.ty(set, &[k]);
    let set_entry = b.ty(set, &[entry_kv]);
    let collection_v = b.ty(collection, &[v]);
    b.abstract_method(map, "get", &[("key", object_ty)], v);
    b.abstract_method(map, "put", &[("key", k), ("value", v)], v);
    b.abstract_method(map, "containsKey", &[("key", object_ty)], boolean_p);
    b.abstract_method(map, "remove", &[("key", object_ty)], v);
    b.abstract_method(map, "size", &[], int);
    b.abstract_method(map, "isEmpty", &[], boolean_p);
    b.abstract_method(map, "keySet", &[], set_k);
    b.abstract_method(map, "values", &[], collection_v);
    b.abstract_method(map, "entrySet", &[], set_entry);
    b.abstract_method(map_entry, "getKey", &[], k);
    b.abstract_method(map_entry, "getValue", &[], v);
    b.abstract_method(map_entry, "setValue", &[("value", v)], v);

    // Concrete collections
    let list_e = b.ty(list, &[e]);
    b.implements(abstract_list, &[list_e]);
    let abstract_list_e = b.ty(abstract_list, &[e]);
    for concrete in [array_list, linked_list] {
        b.extends(concrete, abstract_list_e);
        b.implements(concrete, &[list_e, cloneable_ty, serializable_ty]);
        b.ctor(concrete, &[]);
        b.ctor(concrete, &[("c", collection_ext_e)]);
    }
    b.ctor(array_list, &[("initialCapacity", int)]);
    b.method(linked_list, "addFirst", &[("e", e)], TypeId::VOID);
    b.method(linked_list, "getFirst", &[], e);

    let set_e = b.ty(set, &[e]);
    b.implements(hash_set, &[set_e, cloneable_ty, serializable_ty]);
    let hash_set_e = b.ty(hash_set, &[e]);
    b.extends(linked_hash_set, hash_set_e);
    b.implements(linked_hash_set, &[set_e]);
    for concrete in [hash_set, linked_hash_set] {
        b.ctor(concrete, &[]);
        b.ctor(concrete, &[("c", collection_ext_e)]);
    }

    let map_kv = b.ty(map, &[k, v]);
    b.implements(hash_map, &[map_kv, cloneable_ty, serializable_ty]);
    let hash_map_kv = b.ty(hash_map, &[k, v]);
    b.extends(linked_hash_map, hash_map_kv);
    b.implements(linked_hash_map, &[map_kv]);
    let extends_k = b.store.interner().wildcard(Some(k), None);
    let extends_v = b.store.interner().wildcard(Some(v), None);
    let map_ext = b.ty(map, &[extends_k, extends_v]);
    for concrete in [hash_map, linked_hash_map] {
        b.ctor(concrete, &[]);
        b.ctor(concrete, &[("m", map_ext)]);
    }

    // Functional interfaces
    b.abstract_method(runnable, "run", &[], TypeId::VOID);
    b.abstract_method(function, "apply", &[("t", t)], r);
    b.abstract_method(comparator, "compare", &[("a", t), ("b", t)], int);

    // String
    let comparable_string = b.ty(comparable, &[string_ty]);
    let char_sequence_ty = b.raw(char_sequence);
    b.implements(
        string,
        &[serializable_ty, comparable_string, char_sequence_ty],
    );
    b.ctor(string, &[]);
    b.ctor(string, &[("original", string_ty)]);
    b.method(string, "length", &[], int);
    b.method(string, "charAt", &[("index", int)], TypeId::CHAR);
    b.method(string, "substring", &[("begin", int)], string_ty);
    b.method(string, "substring", &[("begin", int), ("end", int)], string_ty);
    b.method(string, "toUpperCase", &[], string_ty);
    b.method(string, "toLowerCase", &[], string_ty);
    b.method(string, "trim", &[], string_ty);
    b.method(string, "isEmpty", &[], boolean_p);
    b.method(string, "startsWith", &[("prefix", string_ty)], boolean_p);
    b.method(string, "endsWith", &[("suffix", string_ty)], boolean_p);
    b.method(string, "contains", &[("s", char_sequence_ty)], boolean_p);
    b.method(string, "indexOf", &[("s", string_ty)], int);
    b.method(string, "concat", &[("s", string_ty)], string_ty);
    let string_array = b.store.array_of(string_ty);
    b.method(string, "split", &[("regex", string_ty)], string_array);
    b.method(string, "compareTo", &[("other", string_ty)], int);
    b.static_method(string, "valueOf", &[("value", object_ty)], string_ty);
    let object_array = b.store.array_of(object_ty);
    b.static_method(
        string,
        "format",
        &[("format", string_ty), ("args", object_array)],
        string_ty,
    );

    // GString
    b.implements(gstring, &[char_sequence_ty, serializable_ty]);
    b.method(gstring, "toString", &[], string_ty);
    b.method(gstring, "getValues", &[], object_array);
    b.method(gstring, "length", &[], int);
    b.method(gstring, "charAt", &[("index", int)], TypeId::CHAR);

    // Number and wrappers
    b.implements(number, &[serializable_ty]);
    b.abstract_method(number, "intValue", &[], int);
    b.abstract_method(number, "longValue", &[], TypeId::LONG);
    b.abstract_method(number, "floatValue", &[], TypeId::FLOAT);
    b.abstract_method(number, "doubleValue", &[], TypeId::DOUBLE);
    b.method(number, "byteValue", &[], TypeId::BYTE);
    b.method(number, "shortValue", &[], TypeId::SHORT);
    let number_ty = b.raw(number);
    let wrappers = [
        (byte, TypeId::BYTE, "parseByte"),
        (short, TypeId::SHORT, "parseShort"),
        (integer, TypeId::INT, "parseInt"),
        (long, TypeId::LONG, "parseLong"),
        (float, TypeId::FLOAT, "parseFloat"),
        (double, TypeId::DOUBLE, "parseDouble"),
    ];
    for (wrapper, primitive, parse) in wrappers {
        let wrapper_ty = b.raw(wrapper);
        let comparable_self = b.ty(comparable, &[wrapper_ty]);
        b.extends(wrapper, number_ty);
        b.implements(wrapper, &[comparable_self]);
        b.ctor(wrapper, &[("value", primitive)]);
        b.method(wrapper, "intValue", &[], int);
        b.method(wrapper, "longValue", &[], TypeId::LONG);
        b.method(wrapper, "floatValue", &[], TypeId::FLOAT);
        b.method(wrapper, "doubleValue", &[], TypeId::DOUBLE);
        b.method(wrapper, "compareTo", &[("other", wrapper_ty)], int);
        b.static_method(wrapper, "valueOf", &[("value", primitive)], wrapper_ty);
        b.static_method(wrapper, parse, &[("s", string_ty)], primitive);
        b.constant(wrapper, "MAX_VALUE", primitive);
        b.constant(wrapper, "MIN_VALUE", primitive);
    }

    let character_ty = b.raw(character);
    let comparable_character = b.ty(comparable, &[character_ty]);
    b.implements(character, &[serializable_ty, comparable_character]);
    b.method(character, "charValue", &[], TypeId::CHAR);
    b.static_method(character, "isDigit", &[("c", TypeId::CHAR)], boolean_p);
    b.static_method(character, "isLetter", &[("c", TypeId::CHAR)], boolean_p);

    let boolean_ty = b.raw(boolean);
    let comparable_boolean = b.ty(comparable, &[boolean_ty]);
    b.implements(boolean, &[serializable_ty, comparable_boolean]);
    b.method(boolean, "booleanValue", &[], boolean_p);
    b.static_method(boolean, "valueOf", &[("b", boolean_p)], boolean_ty);
    b.static_method(boolean, "parseBoolean", &[("s", string_ty)], boolean_p);

    for big in [big_integer, big_decimal] {
        let big_ty = b.raw(big);
        let comparable_big = b.ty(comparable, &[big_ty]);
        b.extends(big, number_ty);
        b.implements(big, &[comparable_big]);
        b.ctor(big, &[("value", string_ty)]);
        b.method(big, "intValue", &[], int);
        b.method(big, "longValue", &[], TypeId::LONG);
        b.method(big, "floatValue", &[], TypeId::FLOAT);
        b.method(big, "doubleValue", &[], TypeId::DOUBLE);
        b.method(big, "add", &[("other", big_ty)], big_ty);
        b.method(big, "subtract", &[("other", big_ty)], big_ty);
        b.method(big, "multiply", &[("other", big_ty)], big_ty);
        b.method(big, "negate", &[], big_ty);
        b.method(big, "compareTo", &[("other", big_ty)], int);
    }
    let big_integer_ty = b.raw(big_integer);
    b.static_method(big_integer, "valueOf", &[("value", TypeId::LONG)], big_integer_ty);
    let big_decimal_ty = b.raw(big_decimal);
    b.static_method(big_decimal, "valueOf", &[("value", TypeId::DOUBLE)], big_decimal_ty);

    // Range<T extends Comparable> extends List<T>, IntRange
    let comparable_raw = b.raw(comparable);
    b.store.class_mut(range).type_params = vec![GenericParam::bounded("T", comparable_raw)];
    let list_t = b.ty(list, &[t]);
    b.implements(range, &[list_t]);
    b.abstract_method(range, "getFrom", &[], t);
    b.abstract_method(range, "getTo", &[], t);
    b.abstract_method(range, "isReverse", &[], boolean_p);
    let integer_ty = b.raw(integer);
    let abstract_list_int = b.ty(abstract_list, &[integer_ty]);
    let range_int = b.ty(range, &[integer_ty]);
    b.extends(int_range, abstract_list_int);
    b.implements(int_range, &[range_int, serializable_ty]);
    b.ctor(int_range, &[("from", int), ("to", int)]);
    b.method(int_range, "getFromInt", &[], int);
    b.method(int_range, "getToInt", &[], int);

    // Closure<V>
    let runnable_ty = b.raw(runnable);
    b.implements(closure, &[runnable_ty, cloneable_ty, serializable_ty]);
    b.ctor(closure, &[("owner", object_ty)]);
    b.method(closure, "call", &[], v);
    b.method(closure, "call", &[("args", object_array)], v);
    b.method(closure, "run", &[], TypeId::VOID);
    b.method(closure, "getDelegate", &[], object_ty);
    b.method(closure, "setDelegate", &[("delegate", object_ty)], TypeId::VOID);
    b.method(closure, "getOwner", &[], object_ty);
    b.method(closure, "getMaximumNumberOfParameters", &[], int);
    let closure_v = b.ty(closure, &[v]);
    b.method(closure, "curry", &[("args", object_array)], closure_v);

    // Class<T>
    b.method(class, "getName", &[], string_ty);
    b.method(class, "getSimpleName", &[], string_ty);
    b.method(class, "newInstance", &[], t);
    b.method(class, "isInstance", &[("o", object_ty)], boolean_p);

    // Throwables
    b.implements(throwable, &[serializable_ty]);
    let throwable_ty = b.raw(throwable);
    b.method(throwable, "getMessage", &[], string_ty);
    b.method(throwable, "getCause", &[], throwable_ty);
    b.method(throwable, "printStackTrace", &[], TypeId::VOID);
    let exception_ty = b.raw(exception);
    let runtime_exception_ty = b.raw(runtime_exception);
    b.extends(exception, throwable_ty);
    b.extends(runtime_exception, exception_ty);
    b.extends(illegal_argument_exception, runtime_exception_ty);
    b.extends(io_exception, exception_ty);
    for throwable_class in [
        throwable,
        exception,
        runtime_exception,
        illegal_argument_exception,
        io_exception,
    ] {
        b.ctor(throwable_class, &[]);
        b.ctor(throwable_class, &[("message", string_ty)]);
    }
}

#[cfg(test)]
#[path = "tests/builtins_tests.rs"]
mod tests;
