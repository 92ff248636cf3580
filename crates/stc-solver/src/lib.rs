//! Type algebra and overload resolution.
//!
//! This crate owns everything the checker asks about types:
//!
//! - **Interning**: `TypeData` values are hash-consed into `TypeId`s, so type
//!   equality is an integer comparison
//! - **Declarations**: `TypeStore` holds classes and methods (including the
//!   builtin runtime classes) behind the `TypeDatabase` trait
//! - **Relations**: assignability, argument distance and least upper bounds
//! - **Generics**: one-directional placeholder connections and substitution
//! - **Resolution**: candidate collection and overload selection, with
//!   extension methods served from a versioned per-context cache
//!
//! Every algebra function takes `&dyn TypeDatabase` and never mutates
//! declarations; parameterized types are fresh interned values.

pub mod assignability;
mod builtins;
pub mod db;
pub mod distance;
pub mod error;
pub mod extensions;
pub mod format;
pub mod generics;
pub mod hierarchy;
mod intern;
pub mod lub;
pub mod members;
pub mod numeric;
pub mod resolution;
pub mod sam;
pub mod types;

pub use assignability::{AssignMode, is_assignable_to, literal_constructor_for};
pub use db::{StoreId, TypeDatabase, TypeStore, WellKnown};
pub use distance::get_distance;
pub use error::SolverError;
pub use extensions::{
    BuiltinExtensions, ExtensionMethod, ExtensionMethodCache, ExtensionSet, ExtensionSource,
    LoadingContextId,
};
pub use format::{format_type, format_type_list};
pub use generics::{
    Bindings, BoundViolation, Conflict, Connections, check_bounds, erase_placeholders, extract_connections,
    substitute,
};
pub use intern::TypeInterner;
pub use lub::{least_upper_bound, union_of};
pub use members::{PropertyInfo, PropertySource, lookup_property};
pub use resolution::{
    CandidateMethod, CandidateOrigin, ClosureParamTypes, MethodMatch, MethodResolution,
    MethodResolver, MethodShape,
};
pub use types::{
    ClassDef, ClassId, ClassKind, ClosureParamHint, DelegatesTo, DelegationStrategy,
    DelegationTarget, FieldDef, GenericParam, MemberFlags, MethodDef, MethodId, ParamDef,
    PrimitiveKind, PropertyDef, TypeData, TypeId,
};
