//! Boxing and numeric promotion.
//!
//! Arithmetic follows the dynamic runtime's rules rather than Java's: dividing
//! two integral values yields a `BigDecimal`, and `BigInteger`/`BigDecimal`
//! absorb every narrower numeric type.

use crate::db::TypeDatabase;
use crate::types::{ClassId, PrimitiveKind, TypeData, TypeId};

/// Wrapper class for a primitive (`int` -> `Integer`).
#[must_use]
pub fn wrapper_class(db: &dyn TypeDatabase, kind: PrimitiveKind) -> ClassId {
    let wk = db.well_known();
    match kind {
        PrimitiveKind::Void => wk.void,
        PrimitiveKind::Boolean => wk.boolean,
        PrimitiveKind::Char => wk.character,
        PrimitiveKind::Byte => wk.byte,
        PrimitiveKind::Short => wk.short,
        PrimitiveKind::Int => wk.integer,
        PrimitiveKind::Long => wk.long,
        PrimitiveKind::Float => wk.float,
        PrimitiveKind::Double => wk.double,
    }
}

/// Boxed form of a type; non-primitives are returned unchanged.
#[must_use]
pub fn box_type(db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
    match ty.primitive_kind() {
        Some(PrimitiveKind::Void) | None => ty,
        Some(kind) => db.class_type(wrapper_class(db, kind), &[]),
    }
}

/// Primitive behind a wrapper class type, if any.
#[must_use]
pub fn unboxed_kind(db: &dyn TypeDatabase, ty: TypeId) -> Option<PrimitiveKind> {
    if let Some(kind) = ty.primitive_kind() {
        return Some(kind);
    }
    let class = db.class_of(ty)?;
    PrimitiveKind::ALL
        .into_iter()
        .filter(|kind| *kind != PrimitiveKind::Void)
        .find(|kind| wrapper_class(db, *kind) == class)
}

/// Unboxed form of a wrapper type; other types are returned unchanged.
#[must_use]
pub fn unbox_type(db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
    unboxed_kind(db, ty).map_or(ty, PrimitiveKind::type_id)
}

/// Whether a type is a wrapper class (not a primitive).
#[must_use]
pub fn is_wrapper(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    !ty.is_primitive() && unboxed_kind(db, ty).is_some()
}

/// Numeric category of a type, primitive or boxed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumericKind {
    Byte,
    Short,
    Char,
    Int,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    /// `java.lang.Number` itself: some number of unknown precision.
    Number,
}

impl NumericKind {
    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Char | Self::Int | Self::Long | Self::BigInteger
        )
    }

    /// Rank on the extended widening ladder, with the arbitrary precision
    /// types above `double`.
    #[must_use]
    pub const fn ladder_rank(self) -> u32 {
        match self {
            Self::Byte => 0,
            Self::Short => 1,
            Self::Char | Self::Int => 2,
            Self::Long => 3,
            Self::Float => 4,
            Self::Double => 5,
            Self::BigInteger => 6,
            Self::BigDecimal | Self::Number => 7,
        }
    }
}

#[must_use]
pub fn numeric_kind(db: &dyn TypeDatabase, ty: TypeId) -> Option<NumericKind> {
    if let Some(kind) = unboxed_kind(db, ty) {
        return Some(match kind {
            PrimitiveKind::Byte => NumericKind::Byte,
            PrimitiveKind::Short => NumericKind::Short,
            PrimitiveKind::Char => NumericKind::Char,
            PrimitiveKind::Int => NumericKind::Int,
            PrimitiveKind::Long => NumericKind::Long,
            PrimitiveKind::Float => NumericKind::Float,
            PrimitiveKind::Double => NumericKind::Double,
            PrimitiveKind::Void | PrimitiveKind::Boolean => return None,
        });
    }
    let class = db.class_of(ty)?;
    let wk = db.well_known();
    if class == wk.big_integer {
        Some(NumericKind::BigInteger)
    } else if class == wk.big_decimal {
        Some(NumericKind::BigDecimal)
    } else if class == wk.number {
        Some(NumericKind::Number)
    } else {
        None
    }
}

#[must_use]
pub fn is_numeric(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    numeric_kind(db, ty).is_some()
}

/// Whether a type is `boolean` or `Boolean`.
#[must_use]
pub fn is_boolean(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    ty == TypeId::BOOLEAN || db.class_of(ty) == Some(db.well_known().boolean)
}

/// Whether a type is `String` or `GString`.
#[must_use]
pub fn is_string_like(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    let wk = db.well_known();
    matches!(db.class_of(ty), Some(class) if class == wk.string || class == wk.gstring)
}

/// Arithmetic operators with numeric promotion rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    IntDivide,
    Mod,
    Power,
    Shift,
    Bitwise,
}

fn kind_type(db: &dyn TypeDatabase, kind: NumericKind) -> TypeId {
    let wk = db.well_known();
    match kind {
        NumericKind::Byte | NumericKind::Short | NumericKind::Char | NumericKind::Int => {
            TypeId::INT
        }
        NumericKind::Long => TypeId::LONG,
        NumericKind::Float | NumericKind::Double => TypeId::DOUBLE,
        NumericKind::BigInteger => db.class_type(wk.big_integer, &[]),
        NumericKind::BigDecimal => db.class_type(wk.big_decimal, &[]),
        NumericKind::Number => db.class_type(wk.number, &[]),
    }
}

/// Result type of `left op right` for numeric operands, or `None` when the
/// operator is not defined for the pair.
#[must_use]
pub fn numeric_binary_result(
    db: &dyn TypeDatabase,
    op: NumericOp,
    left: TypeId,
    right: TypeId,
) -> Option<TypeId> {
    if op == NumericOp::Bitwise && is_boolean(db, left) && is_boolean(db, right) {
        return Some(TypeId::BOOLEAN);
    }
    let lk = numeric_kind(db, left)?;
    let rk = numeric_kind(db, right)?;
    let either = |k: NumericKind| lk == k || rk == k;
    let both_integral = lk.is_integral() && rk.is_integral();
    let float_like = |k: NumericKind| matches!(k, NumericKind::Float | NumericKind::Double);

    let result = match op {
        NumericOp::Plus | NumericOp::Minus | NumericOp::Multiply | NumericOp::Mod => {
            if either(NumericKind::Number) {
                NumericKind::Number
            } else if either(NumericKind::BigDecimal) {
                NumericKind::BigDecimal
            } else if float_like(lk) || float_like(rk) {
                NumericKind::Double
            } else if either(NumericKind::BigInteger) {
                NumericKind::BigInteger
            } else if either(NumericKind::Long) {
                NumericKind::Long
            } else {
                NumericKind::Int
            }
        }
        NumericOp::Divide => {
            if float_like(lk) || float_like(rk) {
                NumericKind::Double
            } else if either(NumericKind::Number) {
                NumericKind::Number
            } else {
                NumericKind::BigDecimal
            }
        }
        NumericOp::IntDivide => {
            if !both_integral {
                return None;
            }
            if either(NumericKind::BigInteger) {
                NumericKind::BigInteger
            } else if either(NumericKind::Long) {
                NumericKind::Long
            } else {
                NumericKind::Int
            }
        }
        NumericOp::Power => {
            if either(NumericKind::BigDecimal) {
                NumericKind::BigDecimal
            } else if float_like(lk) || float_like(rk) {
                NumericKind::Double
            } else {
                NumericKind::Number
            }
        }
        NumericOp::Shift => {
            if !both_integral {
                return None;
            }
            match lk {
                NumericKind::BigInteger => NumericKind::BigInteger,
                NumericKind::Long => NumericKind::Long,
                _ => NumericKind::Int,
            }
        }
        NumericOp::Bitwise => {
            if !both_integral {
                return None;
            }
            if either(NumericKind::BigInteger) {
                NumericKind::BigInteger
            } else if either(NumericKind::Long) {
                NumericKind::Long
            } else {
                NumericKind::Int
            }
        }
    };
    Some(kind_type(db, result))
}

/// Component type of an array type.
#[must_use]
pub fn array_component(db: &dyn TypeDatabase, ty: TypeId) -> Option<TypeId> {
    match db.lookup(ty) {
        TypeData::Array(component) => Some(component),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/numeric_tests.rs"]
mod tests;
