//! Registering the classes and methods of a compilation unit in the type store.
//!
//! Runs before checking, with mutable access to the store. Classes are
//! declared by name first so signatures may refer to classes declared later
//! in the unit. Method and class declarations remember their AST node
//! (`decl_node`) so `def` return types can be inferred on demand.

use crate::type_resolution::resolve_type_ref;
use rustc_hash::FxHashMap;
use stc_ast::{FieldDecl, NodeArena, NodeIndex, NodeKind, Param, TypeParamDecl, TypeRef};
use stc_common::SourcePos;
use stc_solver::{
    ClassId, ClassKind, FieldDef, GenericParam, MemberFlags, MethodDef, MethodId, ParamDef,
    PropertyDef, TypeDatabase, TypeId, TypeStore,
};
use std::sync::Arc;
use tracing::debug;

/// Name of the class synthesized for top-level script code.
pub const SCRIPT_CLASS_NAME: &str = "Script";

/// What `declare_unit` registered.
#[derive(Clone, Debug, Default)]
pub struct DeclaredUnit {
    pub classes: FxHashMap<NodeIndex, ClassId>,
    pub methods: FxHashMap<NodeIndex, MethodId>,
    /// Class holding the methods declared in the script body.
    pub script_class: Option<ClassId>,
    /// Annotations naming unknown classes.
    pub unresolved: Vec<(SourcePos, String)>,
}

impl DeclaredUnit {
    #[must_use]
    pub fn class_of_node(&self, node: NodeIndex) -> Option<ClassId> {
        self.classes.get(&node).copied()
    }

    #[must_use]
    pub fn method_of_node(&self, node: NodeIndex) -> Option<MethodId> {
        self.methods.get(&node).copied()
    }
}

struct Declarer<'a> {
    store: &'a mut TypeStore,
    arena: &'a NodeArena,
    unit: DeclaredUnit,
}

/// Declare every class, method and constructor of the unit rooted at `root`.
pub fn declare_unit(store: &mut TypeStore, arena: &NodeArena, root: NodeIndex) -> DeclaredUnit {
    let mut declarer = Declarer {
        store,
        arena,
        unit: DeclaredUnit::default(),
    };
    let (classes, script) = match arena.kind(root) {
        Some(NodeKind::CompilationUnit { classes, script }) => (classes.clone(), *script),
        Some(NodeKind::Class { .. }) => (vec![root], NodeIndex::NONE),
        _ => (Vec::new(), root),
    };

    for &class in &classes {
        declarer.declare_class(class);
    }
    for &class in &classes {
        declarer.link_class(class);
    }
    for &class in &classes {
        declarer.declare_members(class);
    }
    if script.is_some() {
        declarer.declare_script(script);
    }
    debug!(
        classes = declarer.unit.classes.len(),
        methods = declarer.unit.methods.len(),
        "declared unit"
    );
    declarer.unit
}

impl Declarer<'_> {
    fn resolve(&mut self, ty: &TypeRef, params: &[Arc<str>], pos: SourcePos) -> TypeId {
        match resolve_type_ref(&*self.store, ty, params) {
            Ok(resolved) => resolved,
            Err(name) => {
                self.unit.unresolved.push((pos, name));
                TypeId::DYNAMIC
            }
        }
    }

    fn declare_class(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(NodeKind::Class {
            name,
            is_interface,
            is_abstract,
            ..
        }) = arena.kind(idx)
        else {
            return;
        };
        let kind = if *is_interface {
            ClassKind::Interface
        } else if *is_abstract {
            ClassKind::AbstractClass
        } else {
            ClassKind::Class
        };
        let class = self.store.declare_class(name, kind);
        self.store.class_mut(class).decl_node = Some(idx.0);
        self.unit.classes.insert(idx, class);
    }

    fn generic_params(
        &mut self,
        decls: &[TypeParamDecl],
        outer: &[Arc<str>],
        pos: SourcePos,
    ) -> Vec<GenericParam> {
        let mut names: Vec<Arc<str>> = outer.to_vec();
        names.extend(decls.iter().map(|d| Arc::from(d.name.as_str())));
        decls
            .iter()
            .map(|decl| {
                let mut param = GenericParam::new(&decl.name);
                param.upper_bounds = decl
                    .upper_bounds
                    .iter()
                    .map(|b| self.resolve(b, &names, pos))
                    .collect();
                param.lower_bound = decl.lower_bound.as_ref().map(|l| self.resolve(l, &names, pos));
                param
            })
            .collect()
    }

    fn class_param_names(&self, class: ClassId) -> Vec<Arc<str>> {
        self.store
            .class_def(class)
            .type_params
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    /// Generic parameters, supertypes and the enclosing class.
    fn link_class(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(class) = self.unit.class_of_node(idx) else {
            return;
        };
        let Some(NodeKind::Class {
            type_params,
            super_class,
            interfaces,
            outer,
            ..
        }) = arena.kind(idx)
        else {
            return;
        };
        let pos = arena.pos(idx);
        let params = self.generic_params(type_params, &[], pos);
        let names: Vec<Arc<str>> = params.iter().map(|p| p.name.clone()).collect();
        let super_type = super_class.as_ref().map(|s| self.resolve(s, &names, pos));
        let interface_types: Vec<TypeId> = interfaces
            .iter()
            .map(|i| self.resolve(i, &names, pos))
            .collect();
        let outer_class = outer.as_deref().and_then(|o| self.store.class_by_name(o));

        let def = self.store.class_mut(class);
        def.type_params = params;
        if let Some(super_type) = super_type.filter(|t| *t != TypeId::DYNAMIC) {
            def.super_class = Some(super_type);
        }
        def.interfaces = interface_types
            .into_iter()
            .filter(|t| *t != TypeId::DYNAMIC)
            .collect();
        def.outer = outer_class;
    }

    fn declare_members(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(class) = self.unit.class_of_node(idx) else {
            return;
        };
        let Some(NodeKind::Class {
            fields,
            members,
            is_interface,
            ..
        }) = arena.kind(idx)
        else {
            return;
        };
        let class_params = self.class_param_names(class);
        for field in fields {
            self.declare_field(class, field, &class_params);
        }
        for &member in members {
            self.declare_member(class, member, &class_params, *is_interface);
        }
    }

    fn declare_field(&mut self, class: ClassId, field: &FieldDecl, class_params: &[Arc<str>]) {
        let ty = field
            .ty
            .as_ref()
            .map_or(TypeId::DYNAMIC, |t| self.resolve(t, class_params, field.pos));
        let mut flags = MemberFlags::empty();
        if field.is_static {
            flags |= MemberFlags::STATIC;
        }
        if field.is_final {
            flags |= MemberFlags::FINAL;
        }
        let name: Arc<str> = Arc::from(field.name.as_str());
        let def = self.store.class_mut(class);
        if field.is_property {
            def.properties.push(PropertyDef { name, ty, flags });
        } else {
            def.fields.push(FieldDef { name, ty, flags });
        }
    }

    fn params(&mut self, params: &[Param], names: &[Arc<str>], pos: SourcePos) -> Vec<ParamDef> {
        let object = self.store.object_type();
        params
            .iter()
            .map(|p| {
                let ty = p
                    .ty
                    .as_ref()
                    .map_or(object, |t| self.resolve(t, names, pos));
                let param = ParamDef::new(&p.name, ty);
                if p.default.is_some() {
                    param.with_default()
                } else {
                    param
                }
            })
            .collect()
    }

    fn declare_member(
        &mut self,
        class: ClassId,
        member: NodeIndex,
        class_params: &[Arc<str>],
        in_interface: bool,
    ) {
        let arena = self.arena;
        let pos = arena.pos(member);
        match arena.kind(member) {
            Some(NodeKind::Method {
                name,
                type_params,
                params,
                return_type,
                is_static,
                is_abstract,
                ..
            }) => {
                let generics = self.generic_params(type_params, class_params, pos);
                let mut names = class_params.to_vec();
                names.extend(generics.iter().map(|g| g.name.clone()));
                let params = self.params(params, &names, pos);
                let ret = return_type
                    .as_ref()
                    .map_or(TypeId::DYNAMIC, |r| self.resolve(r, &names, pos));
                let mut flags = MemberFlags::empty();
                if *is_static {
                    flags |= MemberFlags::STATIC;
                }
                if *is_abstract || (in_interface && !*is_static) {
                    flags |= MemberFlags::ABSTRACT;
                }
                let mut def = MethodDef::new(name, params, ret)
                    .with_flags(flags)
                    .with_type_params(generics);
                def.decl_node = Some(member.0);
                let id = self.store.add_method(class, def);
                self.unit.methods.insert(member, id);
            }
            Some(NodeKind::Constructor { params, .. }) => {
                let params = self.params(params, class_params, pos);
                let id = self.store.add_constructor(class, params);
                self.store.method_mut(id).decl_node = Some(member.0);
                self.unit.methods.insert(member, id);
            }
            _ => {}
        }
    }

    /// Methods written at the top level of a script belong to a synthetic class.
    fn declare_script(&mut self, script: NodeIndex) {
        let class = self.store.declare_class(SCRIPT_CLASS_NAME, ClassKind::Class);
        self.store.class_mut(class).decl_node = Some(script.0);
        self.unit.script_class = Some(class);
        let statements = match self.arena.kind(script) {
            Some(NodeKind::Block { statements }) => statements.clone(),
            _ => return,
        };
        for statement in statements {
            if matches!(self.arena.kind(statement), Some(NodeKind::Method { .. })) {
                self.declare_member(class, statement, &[], false);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/declarations_tests.rs"]
mod tests;
