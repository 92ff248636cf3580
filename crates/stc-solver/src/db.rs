//! Type database: the narrow capability every algebra function is written against.
//!
//! `TypeStore` is the concrete implementation. It owns the interner, the class
//! and method declarations, and a concurrent memo of return types inferred for
//! `def` methods. Declarations are added up front (`&mut self`); checking only
//! needs `&self`, so one store can back several checking passes at once.

use crate::intern::TypeInterner;
use crate::types::{
    ClassDef, ClassId, ClassKind, MethodDef, MethodId, ParamDef, TypeData, TypeId,
};
use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Identity of one type store. `TypeId`s are only meaningful within the
/// store that interned them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(pub u64);

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Class ids of the builtin runtime types.
#[derive(Clone, Debug, Default)]
pub struct WellKnown {
    pub object: ClassId,
    pub comparable: ClassId,
    pub serializable: ClassId,
    pub cloneable: ClassId,
    pub char_sequence: ClassId,
    pub string: ClassId,
    pub gstring: ClassId,
    pub number: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
    pub character: ClassId,
    pub boolean: ClassId,
    pub void: ClassId,
    pub big_integer: ClassId,
    pub big_decimal: ClassId,
    pub iterable: ClassId,
    pub iterator: ClassId,
    pub collection: ClassId,
    pub list: ClassId,
    pub abstract_list: ClassId,
    pub array_list: ClassId,
    pub linked_list: ClassId,
    pub set: ClassId,
    pub hash_set: ClassId,
    pub linked_hash_set: ClassId,
    pub map: ClassId,
    pub map_entry: ClassId,
    pub hash_map: ClassId,
    pub linked_hash_map: ClassId,
    pub range: ClassId,
    pub int_range: ClassId,
    pub closure: ClassId,
    pub class: ClassId,
    pub runnable: ClassId,
    pub function: ClassId,
    pub comparator: ClassId,
    pub throwable: ClassId,
    pub exception: ClassId,
    pub runtime_exception: ClassId,
    pub illegal_argument_exception: ClassId,
    pub io_exception: ClassId,
}

pub trait TypeDatabase: Sync {
    fn intern(&self, data: TypeData) -> TypeId;
    fn lookup(&self, id: TypeId) -> TypeData;
    fn class_def(&self, id: ClassId) -> &ClassDef;
    fn method_def(&self, id: MethodId) -> &MethodDef;
    /// Resolve a qualified or simple class name.
    fn class_by_name(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnown;
    fn store_id(&self) -> StoreId;
    /// Return type previously inferred for a `def` method.
    fn inferred_return_type(&self, method: MethodId) -> Option<TypeId>;
    fn record_inferred_return_type(&self, method: MethodId, ty: TypeId);

    fn class_type(&self, class: ClassId, args: &[TypeId]) -> TypeId {
        self.intern(TypeData::Class(crate::types::ClassRef {
            class,
            args: args.iter().copied().collect(),
        }))
    }

    fn array_of(&self, component: TypeId) -> TypeId {
        self.intern(TypeData::Array(component))
    }

    fn placeholder(&self, name: &str) -> TypeId {
        self.intern(TypeData::Placeholder(Arc::from(name)))
    }

    fn object_type(&self) -> TypeId {
        self.class_type(self.well_known().object, &[])
    }

    fn string_type(&self) -> TypeId {
        self.class_type(self.well_known().string, &[])
    }

    /// The class a type refers to, if it is a class reference.
    fn class_of(&self, ty: TypeId) -> Option<ClassId> {
        match self.lookup(ty) {
            TypeData::Class(class_ref) => Some(class_ref.class),
            _ => None,
        }
    }
}

/// Owns declarations and the interner.
pub struct TypeStore {
    id: StoreId,
    interner: TypeInterner,
    classes: Vec<ClassDef>,
    methods: Vec<MethodDef>,
    class_names: FxHashMap<Arc<str>, ClassId>,
    well_known: WellKnown,
    inferred_returns: DashMap<MethodId, TypeId, FxBuildHasher>,
}

impl TypeStore {
    /// A store populated with the builtin runtime types.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self::empty();
        crate::builtins::bootstrap(&mut store);
        store
    }

    pub(crate) fn empty() -> Self {
        Self {
            id: StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed)),
            interner: TypeInterner::new(),
            classes: Vec::new(),
            methods: Vec::new(),
            class_names: FxHashMap::default(),
            well_known: WellKnown::default(),
            inferred_returns: DashMap::with_hasher(FxBuildHasher),
        }
    }

    pub(crate) fn well_known_mut(&mut self) -> &mut WellKnown {
        &mut self.well_known
    }

    #[must_use]
    pub fn interner(&self) -> &TypeInterner {
        &self.interner
    }

    /// Add a class declaration. Classes other than `Object` without an
    /// explicit superclass extend `Object` once the builtins exist.
    pub fn add_class(&mut self, mut def: ClassDef) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        if def.super_class.is_none() && def.kind != ClassKind::Interface && !self.classes.is_empty()
        {
            def.super_class = Some(self.object_type());
        }
        let qualified = def.name.clone();
        let simple: Arc<str> = Arc::from(def.simple_name());
        trace!(class = %qualified, id = id.0, "add_class");
        self.class_names.insert(qualified.clone(), id);
        if simple != qualified {
            self.class_names.entry(simple).or_insert(id);
        }
        self.classes.push(def);
        id
    }

    /// Create an empty declaration to be filled in later with `class_mut`.
    pub fn declare_class(&mut self, name: &str, kind: ClassKind) -> ClassId {
        self.add_class(ClassDef::new(name, kind))
    }

    /// Register an additional lookup name (e.g. `Map.Entry`).
    pub fn register_alias(&mut self, alias: &str, class: ClassId) {
        self.class_names.insert(Arc::from(alias), class);
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.0 as usize]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodDef {
        &mut self.methods[id.0 as usize]
    }

    pub fn add_method(&mut self, class: ClassId, mut def: MethodDef) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        def.declaring = class;
        self.methods.push(def);
        self.classes[class.0 as usize].methods.push(id);
        id
    }

    pub fn add_constructor(&mut self, class: ClassId, params: Vec<ParamDef>) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        let mut def = MethodDef::new("<init>", params, TypeId::VOID);
        def.declaring = class;
        self.methods.push(def);
        self.classes[class.0 as usize].constructors.push(id);
        id
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// All class ids, in declaration order.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len() as u32).map(ClassId)
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDatabase for TypeStore {
    fn intern(&self, data: TypeData) -> TypeId {
        self.interner.intern(data)
    }

    fn lookup(&self, id: TypeId) -> TypeData {
        self.interner.lookup(id)
    }

    fn class_def(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0 as usize]
    }

    fn method_def(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.0 as usize]
    }

    fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    fn store_id(&self) -> StoreId {
        self.id
    }

    fn inferred_return_type(&self, method: MethodId) -> Option<TypeId> {
        self.inferred_returns.get(&method).map(|entry| *entry)
    }

    fn record_inferred_return_type(&self, method: MethodId, ty: TypeId) {
        self.inferred_returns.insert(method, ty);
    }
}

#[cfg(test)]
#[path = "tests/db_tests.rs"]
mod tests;
