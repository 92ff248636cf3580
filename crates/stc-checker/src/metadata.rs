//! Per-node inference results handed to code generation.
//!
//! Types only ever widen: storing a second type for a node that already has
//! one keeps the least upper bound of both. A re-visited loop body therefore
//! ends up with types valid for every pass.

use rustc_hash::FxHashMap;
use serde::Serialize;
use stc_ast::NodeIndex;
use stc_solver::{
    CandidateMethod, CandidateOrigin, ClassId, ExtensionSet, MethodId, TypeDatabase, TypeId,
    least_upper_bound,
};

/// What a call, operator or constructor node resolved to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum CallTarget {
    Method(MethodId),
    Constructor(MethodId),
    /// Default constructor of a class that declares none.
    ImplicitConstructor(ClassId),
    /// Entry `index` of the extension snapshot the pass ran with.
    Extension {
        index: usize,
        name: String,
        source: String,
    },
    /// Synthesized `getX`/`isX`/`setX` for a property or field.
    Accessor {
        class: Option<ClassId>,
        name: String,
        setter: bool,
    },
}

impl CallTarget {
    /// Target of a selected candidate. `extensions` is the snapshot the
    /// candidate was resolved against.
    #[must_use]
    pub fn of(candidate: &CandidateMethod, extensions: &ExtensionSet) -> Option<Self> {
        match candidate.origin {
            CandidateOrigin::Declared => candidate.method.map(Self::Method),
            CandidateOrigin::Constructor => candidate.method.map(Self::Constructor),
            CandidateOrigin::ImplicitConstructor => {
                candidate.declaring_class.map(Self::ImplicitConstructor)
            }
            CandidateOrigin::Extension(index) => {
                let method = extensions.get(index)?;
                Some(Self::Extension {
                    index,
                    name: method.name.to_string(),
                    source: method.source.to_string(),
                })
            }
            CandidateOrigin::Getter | CandidateOrigin::Setter => Some(Self::Accessor {
                class: candidate.declaring_class,
                name: candidate.name.to_string(),
                setter: candidate.origin == CandidateOrigin::Setter,
            }),
        }
    }

    /// The declared method or constructor, if the target has one.
    #[must_use]
    pub fn method(&self) -> Option<MethodId> {
        match self {
            Self::Method(id) | Self::Constructor(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NodeMetadata {
    pub inferred_type: Option<TypeId>,
    /// Return type of a closure literal or method declaration.
    pub inferred_return_type: Option<TypeId>,
    /// What a call resolved to.
    pub target: Option<CallTarget>,
    pub read_only_property: bool,
    /// Dotted path to the receiver of an unqualified name (`owner.delegate`).
    pub implicit_receiver: Option<String>,
    /// Parameter types of a closure literal.
    pub closure_arg_types: Option<Vec<TypeId>>,
}

#[derive(Clone, Debug, Default)]
pub struct MetadataTable {
    entries: FxHashMap<NodeIndex, NodeMetadata>,
}

impl MetadataTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, node: NodeIndex) -> Option<&NodeMetadata> {
        self.entries.get(&node)
    }

    #[must_use]
    pub fn inferred_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.entries.get(&node).and_then(|m| m.inferred_type)
    }

    #[must_use]
    pub fn inferred_return_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.entries.get(&node).and_then(|m| m.inferred_return_type)
    }

    #[must_use]
    pub fn target(&self, node: NodeIndex) -> Option<&CallTarget> {
        self.entries.get(&node).and_then(|m| m.target.as_ref())
    }

    /// Declared method or constructor `node` resolved to.
    #[must_use]
    pub fn target_method(&self, node: NodeIndex) -> Option<MethodId> {
        self.target(node).and_then(CallTarget::method)
    }

    fn entry(&mut self, node: NodeIndex) -> &mut NodeMetadata {
        self.entries.entry(node).or_default()
    }

    /// Store the inferred type of `node`, widening any earlier type.
    pub fn store_type(&mut self, db: &dyn TypeDatabase, node: NodeIndex, ty: TypeId) -> TypeId {
        let entry = self.entry(node);
        let stored = match entry.inferred_type {
            Some(old) if old != ty => least_upper_bound(db, &[old, ty]),
            _ => ty,
        };
        entry.inferred_type = Some(stored);
        stored
    }

    pub fn store_return_type(&mut self, db: &dyn TypeDatabase, node: NodeIndex, ty: TypeId) {
        let entry = self.entry(node);
        entry.inferred_return_type = Some(match entry.inferred_return_type {
            Some(old) if old != ty => least_upper_bound(db, &[old, ty]),
            _ => ty,
        });
    }

    pub fn set_target(&mut self, node: NodeIndex, target: CallTarget) {
        self.entry(node).target = Some(target);
    }

    pub fn set_read_only(&mut self, node: NodeIndex) {
        self.entry(node).read_only_property = true;
    }

    pub fn set_implicit_receiver(&mut self, node: NodeIndex, path: String) {
        self.entry(node).implicit_receiver = Some(path);
    }

    pub fn set_closure_arg_types(&mut self, node: NodeIndex, types: Vec<TypeId>) {
        self.entry(node).closure_arg_types = Some(types);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &NodeMetadata)> + '_ {
        self.entries.iter().map(|(&node, meta)| (node, meta))
    }
}

#[cfg(test)]
#[path = "tests/metadata_tests.rs"]
mod tests;
