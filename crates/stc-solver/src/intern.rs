//! Type interning.
//!
//! Structurally equal `TypeData` values map to the same `TypeId`, which makes
//! type equality a `u32` comparison. The interner is `Sync`: lookups take a
//! read lock on the arena and inserts go through the concurrent map's entry
//! API, so two threads interning the same type agree on its id.

use crate::types::{ClassRef, PrimitiveKind, TypeData, TypeId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::sync::{Arc, PoisonError, RwLock};

pub struct TypeInterner {
    map: DashMap<TypeData, TypeId, FxBuildHasher>,
    types: RwLock<Vec<TypeData>>,
}

impl TypeInterner {
    /// Create an interner with the fixed builtin ids pre-populated.
    #[must_use]
    pub fn new() -> Self {
        let interner = Self {
            map: DashMap::with_hasher(FxBuildHasher),
            types: RwLock::new(Vec::with_capacity(256)),
        };
        for kind in PrimitiveKind::ALL {
            let id = interner.intern(TypeData::Primitive(kind));
            debug_assert_eq!(id, kind.type_id());
        }
        let null = interner.intern(TypeData::Null);
        let dynamic = interner.intern(TypeData::Dynamic);
        debug_assert_eq!(null, TypeId::NULL);
        debug_assert_eq!(dynamic, TypeId::DYNAMIC);
        interner
    }

    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = self.map.get(&data) {
            return *id;
        }
        match self.map.entry(data) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
                let id = TypeId(types.len() as u32);
                types.push(entry.key().clone());
                entry.insert(id);
                id
            }
        }
    }

    /// Look up the data behind an id. Unknown ids read as `Dynamic`.
    #[must_use]
    pub fn lookup(&self, id: TypeId) -> TypeData {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types
            .get(id.0 as usize)
            .cloned()
            .unwrap_or(TypeData::Dynamic)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn class(&self, class: crate::types::ClassId, args: &[TypeId]) -> TypeId {
        self.intern(TypeData::Class(ClassRef {
            class,
            args: SmallVec::from_slice(args),
        }))
    }

    pub fn array(&self, component: TypeId) -> TypeId {
        self.intern(TypeData::Array(component))
    }

    pub fn placeholder(&self, name: &str) -> TypeId {
        self.intern(TypeData::Placeholder(Arc::from(name)))
    }

    pub fn wildcard(&self, upper: Option<TypeId>, lower: Option<TypeId>) -> TypeId {
        self.intern(TypeData::Wildcard { upper, lower })
    }

    /// Intern a union, normalizing members: nested unions are flattened,
    /// members sorted and deduplicated. Zero members yield `NULL` and a
    /// single member is returned as is.
    pub fn union(&self, members: &[TypeId]) -> TypeId {
        let mut flat: SmallVec<[TypeId; 4]> = SmallVec::new();
        for &member in members {
            match self.lookup(member) {
                TypeData::Union(inner) => flat.extend(inner),
                _ => flat.push(member),
            }
        }
        flat.sort_unstable();
        flat.dedup();
        match flat.len() {
            0 => TypeId::NULL,
            1 => flat[0],
            _ => self.intern(TypeData::Union(flat)),
        }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/intern_tests.rs"]
mod tests;
