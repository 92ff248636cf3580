//! Overload resolution.
//!
//! Resolution runs in three steps:
//! 1. collect every candidate visible on the receiver: declared and inherited
//!    methods (most derived first, deduplicated by erased signature),
//!    applicable extension methods and synthetic JavaBean accessors;
//! 2. score each candidate against the argument types, trying the exact-arity
//!    shape, then the variadic shape, then a single array in the variadic slot;
//! 3. keep the candidates with the smallest distance and break ties by generic
//!    bound satisfaction and by preferring declared methods over extensions.
//!
//! Member types of a candidate are expressed in terms of the receiver: a method
//! of `List<E>` looked up on `ArrayList<String>` takes and returns `String`.

use crate::assignability::{AssignMode, is_assignable_to};
use crate::db::TypeDatabase;
use crate::distance::get_distance;
use crate::error::SolverError;
use crate::extensions::ExtensionSet;
use crate::format::format_type;
use crate::generics::{
    Bindings, Connections, check_bounds, erase_placeholders, extract_connections, substitute,
};
use crate::hierarchy::{ancestors, as_supertype, own_bindings};
use crate::lub::least_upper_bound;
use crate::members::{decapitalize, find_field_or_property};
use crate::numeric::box_type;
use crate::sam::single_abstract_method;
use crate::types::{
    ClassId, ClosureParamHint, DelegationStrategy, DelegationTarget, GenericParam, MemberFlags,
    MethodId, ParamDef, TypeData, TypeId,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use stc_common::limits::VARIADIC_PENALTY;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CandidateOrigin {
    Declared,
    Constructor,
    /// Default constructor of a class that declares none.
    ImplicitConstructor,
    /// Index into the active `ExtensionSet`.
    Extension(usize),
    Getter,
    Setter,
}

/// A method as seen from one receiver type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateMethod {
    pub name: Arc<str>,
    pub method: Option<MethodId>,
    pub declaring_class: Option<ClassId>,
    /// Receiver view the member types below are expressed in.
    pub self_type: TypeId,
    pub type_params: Vec<GenericParam>,
    pub params: Vec<ParamDef>,
    pub return_type: TypeId,
    pub flags: MemberFlags,
    pub origin: CandidateOrigin,
}

impl CandidateMethod {
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    #[must_use]
    pub fn is_extension(&self) -> bool {
        matches!(self.origin, CandidateOrigin::Extension(_))
    }

    #[must_use]
    pub fn param_types(&self) -> SmallVec<[TypeId; 4]> {
        self.params.iter().map(|p| p.ty).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodShape {
    Exact,
    Variadic,
    /// One array argument passed straight into the variadic slot.
    ArrayVariadic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodMatch {
    pub candidate: CandidateMethod,
    pub receiver: TypeId,
    pub distance: u32,
    pub shape: MethodShape,
    /// Parameter index each argument was matched against.
    pub arg_params: SmallVec<[usize; 4]>,
    /// Formal type each argument was matched against; the component type for
    /// arguments collected into a variadic parameter.
    pub arg_formals: SmallVec<[TypeId; 4]>,
    pub connections: Connections,
    /// One match per member when the receiver is a union.
    pub union_members: Vec<MethodMatch>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodResolution {
    Resolved(Box<MethodMatch>),
    NotFound,
    Ambiguous(Vec<MethodMatch>),
}

impl MethodResolution {
    #[must_use]
    pub fn resolved(&self) -> Option<&MethodMatch> {
        match self {
            Self::Resolved(m) => Some(m),
            _ => None,
        }
    }
}

/// Parameter types a closure argument receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClosureParamTypes {
    Fixed(Vec<TypeId>),
    /// Either one `entry` parameter or a `(key, value)` pair.
    MapEntry {
        key: TypeId,
        value: TypeId,
        entry: TypeId,
    },
}

pub struct MethodResolver<'a> {
    db: &'a dyn TypeDatabase,
    extensions: Option<&'a ExtensionSet>,
}

impl<'a> MethodResolver<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self {
            db,
            extensions: None,
        }
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: &'a ExtensionSet) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// The type members are looked up on: primitives are boxed, placeholders
    /// and `null` stand for `Object`.
    fn lookup_type(&self, receiver: TypeId) -> TypeId {
        match self.db.lookup(receiver) {
            TypeData::Primitive(_) => box_type(self.db, receiver),
            TypeData::Placeholder(_) | TypeData::Null => self.db.object_type(),
            TypeData::Wildcard { upper, .. } => {
                upper.map_or_else(|| self.db.object_type(), |u| self.lookup_type(u))
            }
            _ => receiver,
        }
    }

    /// Bindings of the receiver's type arguments as seen by `method`'s
    /// declaring class.
    ///
    /// # Errors
    /// `DeclaringClassNotInAncestry` when the declaring class is not a
    /// supertype of the receiver.
    pub fn receiver_bindings(
        &self,
        receiver: TypeId,
        method: MethodId,
    ) -> Result<Bindings, SolverError> {
        let def = self.db.method_def(method);
        let receiver = self.lookup_type(receiver);
        match as_supertype(self.db, receiver, def.declaring) {
            Some(view) => Ok(own_bindings(self.db, view)),
            None => Err(SolverError::DeclaringClassNotInAncestry {
                method: def.name.to_string(),
                declaring: self.db.class_def(def.declaring).name.to_string(),
                receiver: format_type(self.db, receiver),
            }),
        }
    }

    /// Candidate for a specific declared method on `receiver`.
    ///
    /// # Errors
    /// See [`Self::receiver_bindings`].
    pub fn candidate_for(
        &self,
        receiver: TypeId,
        method: MethodId,
    ) -> Result<CandidateMethod, SolverError> {
        let bindings = self.receiver_bindings(receiver, method)?;
        let view = as_supertype(
            self.db,
            self.lookup_type(receiver),
            self.db.method_def(method).declaring,
        )
        .unwrap_or(receiver);
        Ok(self.declared_candidate(method, view, &bindings, CandidateOrigin::Declared))
    }

    fn substitute_param(&self, bindings: &Bindings, param: &ParamDef) -> ParamDef {
        let mut out = param.clone();
        out.ty = substitute(self.db, bindings, param.ty);
        out.closure_params = param.closure_params.as_ref().map(|hint| match hint {
            ClosureParamHint::Types(types) => ClosureParamHint::Types(
                types
                    .iter()
                    .map(|&t| substitute(self.db, bindings, t))
                    .collect(),
            ),
            ClosureParamHint::MapEntryOrKeyValue { key, value } => {
                ClosureParamHint::MapEntryOrKeyValue {
                    key: substitute(self.db, bindings, *key),
                    value: substitute(self.db, bindings, *value),
                }
            }
        });
        if let Some(delegate) = out.delegates_to.as_mut() {
            if let DelegationTarget::Type(t) = delegate.target {
                delegate.target = DelegationTarget::Type(substitute(self.db, bindings, t));
            }
        }
        out
    }

    fn declared_candidate(
        &self,
        method: MethodId,
        view: TypeId,
        bindings: &Bindings,
        origin: CandidateOrigin,
    ) -> CandidateMethod {
        let def = self.db.method_def(method);
        CandidateMethod {
            name: def.name.clone(),
            method: Some(method),
            declaring_class: Some(def.declaring),
            self_type: view,
            type_params: def.type_params.clone(),
            params: def
                .params
                .iter()
                .map(|p| self.substitute_param(bindings, p))
                .collect(),
            return_type: substitute(self.db, bindings, def.return_type),
            flags: def.flags,
            origin,
        }
    }

    /// Every candidate named `name` visible on `receiver`.
    #[must_use]
    pub fn collect_candidates(
        &self,
        receiver: TypeId,
        name: &str,
        static_only: bool,
    ) -> Vec<CandidateMethod> {
        let receiver = self.lookup_type(receiver);
        let mut out = Vec::new();
        self.declared_candidates(receiver, name, static_only, &mut out);
        if !static_only {
            self.accessor_candidates(receiver, name, &mut out);
        }
        self.extension_candidates(receiver, name, static_only, &mut out);
        trace!(name, count = out.len(), "collected candidates");
        out
    }

    fn signature_key(&self, params: &[ParamDef]) -> SmallVec<[TypeId; 4]> {
        params
            .iter()
            .map(|p| erase_placeholders(self.db, p.ty, &[]))
            .collect()
    }

    fn declared_candidates(
        &self,
        receiver: TypeId,
        name: &str,
        static_only: bool,
        out: &mut Vec<CandidateMethod>,
    ) {
        let db = self.db;
        let lookup = match db.lookup(receiver) {
            TypeData::Array(_) => db.object_type(),
            _ => receiver,
        };
        let Some(class) = db.class_of(lookup) else {
            return;
        };
        // Erased signature -> (declaring class, index in `out`).
        let mut seen: FxHashMap<SmallVec<[TypeId; 4]>, (ClassId, usize)> = FxHashMap::default();
        for ancestor in ancestors(db, class) {
            let Some(view) = as_supertype(db, lookup, ancestor) else {
                continue;
            };
            let bindings = own_bindings(db, view);
            for &method_id in &db.class_def(ancestor).methods {
                let def = db.method_def(method_id);
                if &*def.name != name || (static_only && !def.is_static()) {
                    continue;
                }
                let candidate =
                    self.declared_candidate(method_id, view, &bindings, CandidateOrigin::Declared);
                let key = self.signature_key(&candidate.params);
                match seen.get(&key).copied() {
                    None => {
                        seen.insert(key, (ancestor, out.len()));
                        out.push(candidate);
                    }
                    Some((owner, index)) if owner == ancestor => {
                        // Covariant duplicate in one class: keep the narrowest return.
                        if is_assignable_to(
                            db,
                            candidate.return_type,
                            out[index].return_type,
                            AssignMode::Exact,
                        ) {
                            out[index] = candidate;
                        }
                    }
                    // Overridden by a more derived declaration.
                    Some(_) => {}
                }
            }
        }
    }

    /// `getX`/`isX`/`setX` for a property or field `x` without an explicit
    /// accessor method.
    fn accessor_candidates(&self, receiver: TypeId, name: &str, out: &mut Vec<CandidateMethod>) {
        if out
            .iter()
            .any(|c| c.origin == CandidateOrigin::Declared && &*c.name == name)
        {
            return;
        }
        let (suffix, origin) = if let Some(rest) = name.strip_prefix("get") {
            (rest, CandidateOrigin::Getter)
        } else if let Some(rest) = name.strip_prefix("is") {
            (rest, CandidateOrigin::Getter)
        } else if let Some(rest) = name.strip_prefix("set") {
            (rest, CandidateOrigin::Setter)
        } else {
            return;
        };
        let Some(property) = decapitalize(suffix) else {
            return;
        };
        let Some(info) = find_field_or_property(self.db, receiver, &property, false) else {
            return;
        };
        let is_boolean_getter = name.starts_with("is");
        if is_boolean_getter
            && box_type(self.db, info.ty) != self.db.class_type(self.db.well_known().boolean, &[])
        {
            return;
        }
        let (params, return_type) = match origin {
            CandidateOrigin::Setter if info.read_only => return,
            CandidateOrigin::Setter => (vec![ParamDef::new("value", info.ty)], TypeId::VOID),
            _ => (Vec::new(), info.ty),
        };
        let mut flags = MemberFlags::SYNTHETIC;
        if info.is_static {
            flags |= MemberFlags::STATIC;
        }
        out.push(CandidateMethod {
            name: Arc::from(name),
            method: None,
            declaring_class: info.declaring,
            self_type: receiver,
            type_params: Vec::new(),
            params,
            return_type,
            flags,
            origin,
        });
    }

    fn extension_applies(&self, receiver: TypeId, self_type: TypeId) -> bool {
        match self.db.lookup(self_type) {
            TypeData::Placeholder(_) => true,
            TypeData::Array(component)
                if matches!(self.db.lookup(component), TypeData::Placeholder(_)) =>
            {
                matches!(self.db.lookup(receiver), TypeData::Array(_))
            }
            _ => is_assignable_to(self.db, receiver, self_type, AssignMode::Exact),
        }
    }

    fn extension_candidates(
        &self,
        receiver: TypeId,
        name: &str,
        static_only: bool,
        out: &mut Vec<CandidateMethod>,
    ) {
        let Some(extensions) = self.extensions else {
            return;
        };
        for (index, ext) in extensions.methods_named(name) {
            if ext.is_static != static_only || !self.extension_applies(receiver, ext.self_type) {
                continue;
            }
            let bindings = extract_connections(self.db, receiver, ext.self_type).bindings;
            let mut flags = MemberFlags::empty();
            if ext.is_static {
                flags |= MemberFlags::STATIC;
            }
            out.push(CandidateMethod {
                name: ext.name.clone(),
                method: None,
                declaring_class: None,
                self_type: substitute(self.db, &bindings, ext.self_type),
                type_params: ext.type_params.clone(),
                params: ext
                    .params
                    .iter()
                    .map(|p| self.substitute_param(&bindings, p))
                    .collect(),
                return_type: substitute(self.db, &bindings, ext.return_type),
                flags,
                origin: CandidateOrigin::Extension(index),
            });
        }
    }

    /// Indices of the parameters that receive `arg_count` arguments when the
    /// rightmost defaulted parameters are elided.
    fn exact_mapping(params: &[ParamDef], arg_count: usize) -> Option<SmallVec<[usize; 4]>> {
        let n = params.len();
        if arg_count > n {
            return None;
        }
        let mut to_elide = n - arg_count;
        let mut elided = vec![false; n];
        for (index, param) in params.iter().enumerate().rev() {
            if to_elide == 0 {
                break;
            }
            if param.has_default {
                elided[index] = true;
                to_elide -= 1;
            }
        }
        if to_elide > 0 {
            return None;
        }
        Some((0..n).filter(|&i| !elided[i]).collect())
    }

    fn score(&self, args: &[TypeId], formals: &[TypeId]) -> Option<u32> {
        let mut total = 0u32;
        for (&arg, &formal) in args.iter().zip(formals) {
            if !is_assignable_to(self.db, arg, formal, AssignMode::Exact) {
                return None;
            }
            total = total.saturating_add(get_distance(self.db, arg, formal));
        }
        Some(total)
    }

    /// Score one candidate against the argument types.
    #[must_use]
    pub fn match_candidate(
        &self,
        candidate: &CandidateMethod,
        receiver: TypeId,
        args: &[TypeId],
    ) -> Option<MethodMatch> {
        let db = self.db;
        let params = &candidate.params;
        let n = params.len();
        let m = args.len();

        let mut found: Option<(MethodShape, u32, SmallVec<[usize; 4]>, SmallVec<[TypeId; 4]>)> =
            None;

        if let Some(mapping) = Self::exact_mapping(params, m) {
            let formals: SmallVec<[TypeId; 4]> = mapping.iter().map(|&i| params[i].ty).collect();
            if let Some(distance) = self.score(args, &formals) {
                found = Some((MethodShape::Exact, distance, mapping, formals));
            }
        }

        let variadic_component = params.last().and_then(|last| match db.lookup(last.ty) {
            TypeData::Array(component) => Some(component),
            _ => None,
        });
        if found.is_none() {
            if let Some(component) = variadic_component {
                if m + 1 >= n {
                    let mapping: SmallVec<[usize; 4]> = (0..m).map(|i| i.min(n - 1)).collect();
                    let formals: SmallVec<[TypeId; 4]> = (0..m)
                        .map(|i| if i + 1 < n { params[i].ty } else { component })
                        .collect();
                    if let Some(distance) = self.score(args, &formals) {
                        found = Some((
                            MethodShape::Variadic,
                            distance.saturating_add(VARIADIC_PENALTY),
                            mapping,
                            formals,
                        ));
                    }
                }
            }
        }

        if found.is_none() && m == n && n > 0 {
            if let (Some(component), TypeData::Array(arg_component)) =
                (variadic_component, db.lookup(args[m - 1]))
            {
                let boxed = box_type(db, arg_component);
                let leading: SmallVec<[TypeId; 4]> = params[..n - 1].iter().map(|p| p.ty).collect();
                if let Some(distance) = self.score(&args[..m - 1], &leading) {
                    if is_assignable_to(db, boxed, component, AssignMode::Exact) {
                        let total = distance
                            .saturating_add(get_distance(db, boxed, component))
                            .saturating_add(VARIADIC_PENALTY);
                        let mut formals = leading;
                        formals.push(params[n - 1].ty);
                        found = Some((
                            MethodShape::ArrayVariadic,
                            total,
                            (0..n).collect(),
                            formals,
                        ));
                    }
                }
            }
        }

        let (shape, mut distance, arg_params, arg_formals) = found?;
        if candidate.is_extension() {
            distance = distance.saturating_add(get_distance(db, receiver, candidate.self_type));
        }
        let mut connections = Connections::new();
        for (&arg, &formal) in args.iter().zip(arg_formals.iter()) {
            connections.merge(extract_connections(db, arg, formal));
        }
        Some(MethodMatch {
            candidate: candidate.clone(),
            receiver,
            distance,
            shape,
            arg_params,
            arg_formals,
            connections,
            union_members: Vec::new(),
        })
    }

    fn generics_satisfied(&self, m: &MethodMatch) -> bool {
        m.connections.is_consistent()
            && check_bounds(self.db, &m.candidate.type_params, &m.connections.bindings).is_empty()
    }

    fn select(&self, matches: Vec<MethodMatch>) -> MethodResolution {
        let Some(best) = matches.iter().map(|m| m.distance).min() else {
            return MethodResolution::NotFound;
        };
        let mut winners: Vec<MethodMatch> =
            matches.into_iter().filter(|m| m.distance == best).collect();
        if winners.len() > 1 {
            let satisfied = winners.iter().filter(|m| self.generics_satisfied(m)).count();
            if satisfied > 0 && satisfied < winners.len() {
                winners.retain(|m| self.generics_satisfied(m));
            }
        }
        if winners.len() > 1 && winners.iter().any(|m| !m.candidate.is_extension()) {
            winners.retain(|m| !m.candidate.is_extension());
        }
        if winners.len() == 1 {
            let winner = winners.remove(0);
            debug!(name = %winner.candidate.name, distance = winner.distance, "resolved");
            MethodResolution::Resolved(Box::new(winner))
        } else {
            debug!(count = winners.len(), distance = best, "ambiguous");
            MethodResolution::Ambiguous(winners)
        }
    }

    fn resolve_among(
        &self,
        candidates: &[CandidateMethod],
        receiver: TypeId,
        args: &[TypeId],
    ) -> MethodResolution {
        let matches: Vec<MethodMatch> = candidates
            .iter()
            .filter_map(|c| self.match_candidate(c, receiver, args))
            .collect();
        self.select(matches)
    }

    /// Resolve `receiver.name(args)`.
    ///
    /// A union receiver resolves only if every member does; the first member's
    /// match is returned with one entry per member in `union_members`.
    #[must_use]
    pub fn resolve_method(&self, receiver: TypeId, name: &str, args: &[TypeId]) -> MethodResolution {
        if receiver == TypeId::DYNAMIC {
            return MethodResolution::NotFound;
        }
        if let TypeData::Union(members) = self.db.lookup(receiver) {
            let mut resolved = Vec::with_capacity(members.len());
            for member in members {
                match self.resolve_method(member, name, args) {
                    MethodResolution::Resolved(m) => resolved.push(*m),
                    other => return other,
                }
            }
            let mut first = resolved[0].clone();
            first.receiver = receiver;
            first.union_members = resolved;
            return MethodResolution::Resolved(Box::new(first));
        }
        let lookup = self.lookup_type(receiver);
        let candidates = self.collect_candidates(lookup, name, false);
        self.resolve_among(&candidates, lookup, args)
    }

    /// Resolve a static call on a class (`Integer.valueOf(1)`).
    #[must_use]
    pub fn resolve_static(&self, class_type: TypeId, name: &str, args: &[TypeId]) -> MethodResolution {
        let candidates = self.collect_candidates(class_type, name, true);
        self.resolve_among(&candidates, class_type, args)
    }

    /// Resolve `new C(args)`. A class without declared constructors has an
    /// implicit no-argument one.
    #[must_use]
    pub fn resolve_constructor(&self, class_type: TypeId, args: &[TypeId]) -> MethodResolution {
        let db = self.db;
        let Some(class) = db.class_of(class_type) else {
            return MethodResolution::NotFound;
        };
        let def = db.class_def(class);
        let bindings = own_bindings(db, class_type);
        let mut candidates: Vec<CandidateMethod> = def
            .constructors
            .iter()
            .map(|&ctor| {
                let mut candidate =
                    self.declared_candidate(ctor, class_type, &bindings, CandidateOrigin::Constructor);
                candidate.return_type = class_type;
                candidate
            })
            .collect();
        if candidates.is_empty() {
            candidates.push(CandidateMethod {
                name: Arc::from("<init>"),
                method: None,
                declaring_class: Some(class),
                self_type: class_type,
                type_params: Vec::new(),
                params: Vec::new(),
                return_type: class_type,
                flags: MemberFlags::SYNTHETIC,
                origin: CandidateOrigin::ImplicitConstructor,
            });
        }
        self.resolve_among(&candidates, class_type, args)
    }

    /// Placeholders a candidate may leave unbound: its own and, for raw
    /// receivers, those of the declaring class.
    fn erasable_params(&self, candidate: &CandidateMethod) -> Vec<GenericParam> {
        let mut params = candidate.type_params.clone();
        if let Some(class) = candidate.declaring_class {
            params.extend(self.db.class_def(class).type_params.iter().cloned());
        }
        params
    }

    /// Replace the candidate's unbound placeholders with their erasure.
    fn erase_unbound(&self, ty: TypeId, candidate: &CandidateMethod) -> TypeId {
        let params = self.erasable_params(candidate);
        if params.is_empty() {
            return ty;
        }
        let mut erasure = Bindings::default();
        for param in &params {
            let erased = param
                .upper_bounds
                .first()
                .map_or_else(|| self.db.object_type(), |&b| erase_placeholders(self.db, b, &params));
            erasure.entry(param.name.clone()).or_insert(erased);
        }
        let out = substitute(self.db, &erasure, ty);
        match self.db.lookup(out) {
            TypeData::Wildcard { upper, .. } => upper.unwrap_or_else(|| self.db.object_type()),
            _ => out,
        }
    }

    /// Bindings for a call: argument connections (conflicts widened to their
    /// least upper bound) completed with those found while matching.
    fn call_bindings(&self, m: &MethodMatch, arg_types: &[TypeId]) -> Bindings {
        let mut connections = Connections::new();
        for (&arg, &formal) in arg_types.iter().zip(m.arg_formals.iter()) {
            connections.merge(extract_connections(self.db, arg, formal));
        }
        let mut bindings = connections.widened_bindings(self.db);
        for (name, &ty) in &m.connections.bindings {
            bindings.entry(name.clone()).or_insert(ty);
        }
        bindings
    }

    /// Return type of a resolved call given the final argument types (closure
    /// arguments typed after visiting them).
    ///
    /// # Errors
    /// `DeclaringClassNotInAncestry` if the method's declaring class is not a
    /// supertype of the receiver.
    pub fn infer_return_type(
        &self,
        m: &MethodMatch,
        arg_types: &[TypeId],
    ) -> Result<TypeId, SolverError> {
        if !m.union_members.is_empty() {
            let mut returns: SmallVec<[TypeId; 4]> = SmallVec::new();
            for member in &m.union_members {
                returns.push(self.infer_return_type(member, arg_types)?);
            }
            return Ok(least_upper_bound(self.db, &returns));
        }
        let candidate = &m.candidate;
        let mut formal_return = candidate.return_type;
        if let (Some(method), CandidateOrigin::Declared) = (candidate.method, candidate.origin) {
            let receiver_bindings = self.receiver_bindings(m.receiver, method)?;
            let def = self.db.method_def(method);
            if def.return_type == TypeId::DYNAMIC {
                if let Some(inferred) = self.db.inferred_return_type(method) {
                    formal_return = substitute(self.db, &receiver_bindings, inferred);
                }
            }
        }
        if formal_return == TypeId::DYNAMIC {
            return Ok(TypeId::DYNAMIC);
        }
        let bindings = self.call_bindings(m, arg_types);
        let ty = substitute(self.db, &bindings, formal_return);
        Ok(self.erase_unbound(ty, candidate))
    }

    /// Parameter types the closure passed as argument `arg_index` receives.
    #[must_use]
    pub fn closure_params(
        &self,
        m: &MethodMatch,
        arg_index: usize,
        arg_types: &[TypeId],
    ) -> Option<ClosureParamTypes> {
        let param = m.candidate.params.get(*m.arg_params.get(arg_index)?)?;
        let bindings = self.call_bindings(m, arg_types);
        let finish = |ty: TypeId| self.erase_unbound(substitute(self.db, &bindings, ty), &m.candidate);
        match &param.closure_params {
            Some(ClosureParamHint::Types(types)) => {
                Some(ClosureParamTypes::Fixed(types.iter().map(|&t| finish(t)).collect()))
            }
            Some(ClosureParamHint::MapEntryOrKeyValue { key, value }) => {
                let key = box_type(self.db, finish(*key));
                let value = box_type(self.db, finish(*value));
                let entry = self
                    .db
                    .class_type(self.db.well_known().map_entry, &[key, value]);
                Some(ClosureParamTypes::MapEntry { key, value, entry })
            }
            None => {
                let formal = finish(*m.arg_formals.get(arg_index)?);
                sam_param_types(self.db, formal).map(ClosureParamTypes::Fixed)
            }
        }
    }

    /// Delegation directive for the closure passed as argument `arg_index`.
    #[must_use]
    pub fn delegation(
        &self,
        m: &MethodMatch,
        arg_index: usize,
        arg_types: &[TypeId],
    ) -> Option<(TypeId, DelegationStrategy)> {
        let param = m.candidate.params.get(*m.arg_params.get(arg_index)?)?;
        let directive = param.delegates_to?;
        let target = match directive.target {
            DelegationTarget::Receiver => m.receiver,
            DelegationTarget::Type(ty) => {
                let bindings = self.call_bindings(m, arg_types);
                self.erase_unbound(substitute(self.db, &bindings, ty), &m.candidate)
            }
        };
        Some((target, directive.strategy))
    }

    /// Formal types for every argument after substitution, for diagnostics.
    #[must_use]
    pub fn formal_types(&self, m: &MethodMatch, arg_types: &[TypeId]) -> Vec<TypeId> {
        let bindings = self.call_bindings(m, arg_types);
        m.arg_formals
            .iter()
            .map(|&f| substitute(self.db, &bindings, f))
            .collect()
    }
}

/// Parameter types of the single abstract method of a functional `target`.
#[must_use]
pub fn sam_param_types(db: &dyn TypeDatabase, target: TypeId) -> Option<Vec<TypeId>> {
    let class = db.class_of(target)?;
    let sam = single_abstract_method(db, class, true)?;
    let def = db.method_def(sam);
    let view = as_supertype(db, target, def.declaring)?;
    let bindings = own_bindings(db, view);
    Some(
        def.params
            .iter()
            .map(|p| {
                let ty = substitute(db, &bindings, p.ty);
                match db.lookup(ty) {
                    TypeData::Wildcard { upper, lower } => {
                        lower.or(upper).unwrap_or_else(|| db.object_type())
                    }
                    _ => ty,
                }
            })
            .collect(),
    )
}

/// Return type of the single abstract method of a functional `target`.
#[must_use]
pub fn sam_return_type(db: &dyn TypeDatabase, target: TypeId) -> Option<TypeId> {
    let class = db.class_of(target)?;
    let sam = single_abstract_method(db, class, true)?;
    let def = db.method_def(sam);
    let view = as_supertype(db, target, def.declaring)?;
    Some(substitute(db, &own_bindings(db, view), def.return_type))
}

/// Render candidates as `C#m(int, String)` for ambiguity diagnostics.
#[must_use]
pub fn describe_candidates(db: &dyn TypeDatabase, matches: &[MethodMatch]) -> String {
    matches
        .iter()
        .map(|m| {
            let owner = m
                .candidate
                .declaring_class
                .map_or_else(|| format_type(db, m.candidate.self_type), |c| {
                    db.class_def(c).name.to_string()
                });
            format!(
                "{owner}#{}({})",
                m.candidate.name,
                crate::format::format_type_list(db, &m.candidate.param_types())
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "tests/resolution_unit_tests.rs"]
mod tests;
