//! Names and property reads.
//!
//! An unqualified name is looked up as a local (narrowed if an `instanceof`
//! fact applies), then as a property of the implicit receivers, then as a
//! class name. Implicit receivers are, in order: closure delegates that take
//! precedence over their owner, the enclosing class and its outer classes,
//! delegates consulted after their owner, and finally `this` narrowed by an
//! `instanceof` fact.

use crate::extension::{TypeCheckingExtension, UnresolvedPropertyEvent, UnresolvedVariableEvent};
use crate::state::{CheckerState, VisitResult};
use stc_ast::{NodeIndex, NodeKind};
use stc_solver::hierarchy::as_supertype;
use stc_solver::numeric::box_type;
use stc_solver::{
    DelegationStrategy, PropertyInfo, TypeData, TypeId, least_upper_bound, lookup_property,
};

/// One receiver an unqualified name may belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ImplicitReceiver {
    pub ty: TypeId,
    /// How the receiver is reached from the use site (`delegate`,
    /// `owner.delegate`, `this`, `this.outer`).
    pub path: String,
    /// Only static members are reachable.
    pub static_only: bool,
    /// The enclosing class chain rather than a closure delegate.
    pub is_class: bool,
}

impl<'a> CheckerState<'a> {
    pub(crate) fn implicit_receivers(&self) -> Vec<ImplicitReceiver> {
        let db = self.ctx.db;
        let mut receivers = Vec::new();
        let mut deferred = Vec::new();
        for (owners, frame) in self.ctx.delegation_chain.iter().rev().enumerate() {
            let Some(delegate) = frame.delegate else {
                continue;
            };
            let receiver = ImplicitReceiver {
                ty: delegate,
                path: format!("{}delegate", "owner.".repeat(owners)),
                static_only: false,
                is_class: false,
            };
            match frame.strategy {
                DelegationStrategy::DelegateFirst => receivers.push(receiver),
                DelegationStrategy::DelegateOnly => {
                    receivers.push(receiver);
                    return receivers;
                }
                DelegationStrategy::OwnerFirst => deferred.push(receiver),
                DelegationStrategy::OwnerOnly => {}
            }
        }

        let static_only = self.ctx.in_static_context();
        if let Some(frame) = self.ctx.current_class() {
            receivers.push(ImplicitReceiver {
                ty: frame.self_type,
                path: "this".to_string(),
                static_only,
                is_class: true,
            });
            let mut path = String::from("this");
            let mut outer = db.class_def(frame.class).outer;
            while let Some(class) = outer {
                path.push_str(".outer");
                receivers.push(ImplicitReceiver {
                    ty: db.class_type(class, &[]),
                    path: path.clone(),
                    static_only,
                    is_class: true,
                });
                outer = db.class_def(class).outer;
            }
        }
        receivers.extend(deferred);
        if let Some(narrowed) = self.ctx.narrowed_type("this") {
            receivers.push(ImplicitReceiver {
                ty: narrowed,
                path: "this".to_string(),
                static_only: false,
                is_class: true,
            });
        }
        receivers
    }

    /// `name` read as a property of an implicit receiver. Records the
    /// receiver path on `idx`.
    pub(crate) fn implicit_property(&mut self, idx: NodeIndex, name: &str) -> Option<(TypeId, PropertyInfo)> {
        let db = self.ctx.db;
        let found = self.implicit_receivers().into_iter().find_map(|receiver| {
            lookup_property(db, receiver.ty, name, receiver.static_only).map(|info| (receiver, info))
        })?;
        let (receiver, info) = found;
        if info.read_only {
            self.ctx.metadata.set_read_only(idx);
        }
        self.ctx.metadata.set_implicit_receiver(idx, receiver.path);
        Some((receiver.ty, info))
    }

    /// The class `node` names when it is used as a static receiver: a class
    /// literal, or a bare name that is not shadowed by a local or property.
    pub(crate) fn class_reference(&self, node: NodeIndex) -> Option<TypeId> {
        let db = self.ctx.db;
        match self.ctx.arena.kind(node)? {
            NodeKind::ClassLiteral { ty } => {
                let params = self.ctx.type_params_in_scope();
                crate::type_resolution::resolve_type_ref(db, ty, &params)
                    .ok()
                    .filter(|&t| db.class_of(t).is_some())
            }
            NodeKind::Variable { name } => {
                if self.ctx.lookup_variable(name).is_some() {
                    return None;
                }
                let shadowed = self
                    .implicit_receivers()
                    .iter()
                    .any(|r| lookup_property(db, r.ty, name, r.static_only).is_some());
                if shadowed {
                    return None;
                }
                db.class_by_name(name).map(|class| db.class_type(class, &[]))
            }
            _ => None,
        }
    }

    pub(crate) fn visit_variable(&mut self, idx: NodeIndex, name: &str) -> VisitResult {
        if let Some(info) = self.ctx.lookup_variable(name) {
            return Ok(self.ctx.narrowed_type(name).unwrap_or(info.current));
        }
        if let Some((_, info)) = self.implicit_property(idx, name) {
            return Ok(info.ty);
        }
        if let Some(class) = self.ctx.db.class_by_name(name) {
            let db = self.ctx.db;
            return Ok(self.class_literal_type(db.class_type(class, &[])));
        }
        Ok(self.unresolved_variable(idx, name))
    }

    /// Offer an unknown name to the extensions, reporting it if none claims it.
    pub(crate) fn unresolved_variable(&mut self, idx: NodeIndex, name: &str) -> TypeId {
        let mut event = UnresolvedVariableEvent {
            node: idx,
            name: name.to_string(),
            resolved_type: None,
        };
        if self
            .extensions
            .handle_unresolved_variable(self.ctx.db, &mut event)
            .is_handled()
        {
            return event.resolved_type.unwrap_or(TypeId::DYNAMIC);
        }
        self.error_undeclared_variable(name, idx);
        TypeId::DYNAMIC
    }

    pub(crate) fn unresolved_property(&mut self, idx: NodeIndex, receiver: TypeId, name: &str) -> TypeId {
        let mut event = UnresolvedPropertyEvent {
            node: idx,
            receiver,
            name: name.to_string(),
            resolved_type: None,
        };
        if self
            .extensions
            .handle_unresolved_property(self.ctx.db, &mut event)
            .is_handled()
        {
            return event.resolved_type.unwrap_or(TypeId::DYNAMIC);
        }
        self.error_no_such_property(name, receiver, idx);
        TypeId::DYNAMIC
    }

    /// Property lookup that understands unions (every member must have the
    /// property) and static receivers.
    pub(crate) fn lookup_member_property(
        &self,
        receiver: TypeId,
        name: &str,
        static_only: bool,
    ) -> Option<PropertyInfo> {
        let db = self.ctx.db;
        if let TypeData::Union(members) = db.lookup(receiver) {
            let infos = members
                .iter()
                .map(|&m| lookup_property(db, m, name, static_only))
                .collect::<Option<Vec<_>>>()?;
            let types: Vec<TypeId> = infos.iter().map(|i| i.ty).collect();
            let mut merged = infos.into_iter().next()?;
            merged.ty = least_upper_bound(db, &types);
            return Some(merged);
        }
        lookup_property(db, receiver, name, static_only)
    }

    /// Element type when `receiver` is a collection, for implicit spreading.
    fn collection_element(&self, receiver: TypeId) -> Option<TypeId> {
        let db = self.ctx.db;
        let iterable = as_supertype(db, receiver, db.well_known().iterable)?;
        match db.lookup(iterable) {
            TypeData::Class(r) => Some(r.args.first().copied().unwrap_or_else(|| db.object_type())),
            _ => None,
        }
    }

    pub(crate) fn list_of(&self, element: TypeId) -> TypeId {
        let db = self.ctx.db;
        db.class_type(db.well_known().list, &[box_type(db, element)])
    }

    pub(crate) fn visit_property(
        &mut self,
        idx: NodeIndex,
        receiver: NodeIndex,
        name: &str,
        safe: bool,
        spread: bool,
    ) -> VisitResult {
        let db = self.ctx.db;
        if receiver.is_none() {
            if let Some((_, info)) = self.implicit_property(idx, name) {
                return Ok(info.ty);
            }
            let this = self.ctx.current_class().map_or_else(|| db.object_type(), |c| c.self_type);
            return Ok(self.unresolved_property(idx, this, name));
        }

        if let Some(class_type) = self.class_reference(receiver) {
            let class_object = self.class_literal_type(class_type);
            self.ctx.metadata.store_type(db, receiver, class_object);
            let info = lookup_property(db, class_type, name, true)
                .or_else(|| lookup_property(db, class_object, name, false));
            return Ok(match info {
                Some(info) => self.property_result(idx, &info, safe),
                None => self.unresolved_property(idx, class_type, name),
            });
        }

        let receiver_type = self.visit_expr_expecting(receiver, None)?;
        if receiver_type == TypeId::DYNAMIC {
            return Ok(TypeId::DYNAMIC);
        }
        if spread {
            let element = self.element_type(receiver_type);
            if element == TypeId::DYNAMIC {
                return Ok(TypeId::DYNAMIC);
            }
            return Ok(match self.lookup_member_property(element, name, false) {
                Some(info) => {
                    let ty = self.property_result(idx, &info, false);
                    self.list_of(ty)
                }
                None => self.unresolved_property(idx, element, name),
            });
        }
        if let Some(info) = self.lookup_member_property(receiver_type, name, false) {
            return Ok(self.property_result(idx, &info, safe));
        }
        if let Some(element) = self.collection_element(receiver_type) {
            if let Some(info) = self.lookup_member_property(element, name, false) {
                let ty = self.property_result(idx, &info, false);
                return Ok(self.list_of(ty));
            }
        }
        Ok(self.unresolved_property(idx, receiver_type, name))
    }

    fn property_result(&mut self, idx: NodeIndex, info: &PropertyInfo, safe: bool) -> TypeId {
        if info.read_only {
            self.ctx.metadata.set_read_only(idx);
        }
        if safe {
            box_type(self.ctx.db, info.ty)
        } else {
            info.ty
        }
    }
}

#[cfg(test)]
#[path = "tests/property_access_tests.rs"]
mod tests;
