//! Centralized limits and thresholds for the type checker.
//!
//! Recursion depths and penalty constants live here so that the solver and the
//! checker agree on them and they can be tuned in one place.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum depth for expression type checking.
///
/// Each nested expression adds a frame to the call stack; past this depth the
/// checker stops descending and types the expression as dynamic.
pub const MAX_EXPR_CHECK_DEPTH: u32 = 500;

/// Maximum depth for structural type walks (assignability, connections,
/// substitution) over nested generic arguments.
pub const MAX_TYPE_WALK_DEPTH: u32 = 64;

/// Maximum number of supertypes visited while walking a class hierarchy.
///
/// Protects against malformed (cyclic) hierarchies handed to us by the host.
pub const MAX_HIERARCHY_WALK: usize = 1_024;

// =============================================================================
// Overload Ranking
// =============================================================================

/// Penalty added when an array is matched against a non-array parameter
/// (and vice versa).
pub const ARRAY_PENALTY: u32 = 256;

/// Penalty added to every variadic match.
///
/// Per-argument distances are capped at [`MAX_ARGUMENT_DISTANCE`], so for any
/// call with fewer than `VARIADIC_PENALTY / MAX_ARGUMENT_DISTANCE` arguments an
/// exact-arity match always ranks ahead of a variadic one.
pub const VARIADIC_PENALTY: u32 = 1 << 20;

/// Upper bound for the distance contributed by a single argument.
pub const MAX_ARGUMENT_DISTANCE: u32 = 4 * ARRAY_PENALTY;

/// Base distance used for `null` arguments; more specific parameters score lower.
pub const NULL_ARGUMENT_BASE: u32 = 64;
