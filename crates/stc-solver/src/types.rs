//! Type representation.
//!
//! Types are interned: a `TypeId` is an index into the interner's arena and two
//! structurally equal types always share an id. Class declarations live in the
//! `TypeStore` as `ClassDef`s addressed by `ClassId`; a `TypeData::Class` is a
//! reference to a declaration plus its type arguments, so parameterizing a class
//! never touches the declaration itself.

use bitflags::bitflags;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;

/// Interned type handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const VOID: Self = Self(0);
    pub const BOOLEAN: Self = Self(1);
    pub const CHAR: Self = Self(2);
    pub const BYTE: Self = Self(3);
    pub const SHORT: Self = Self(4);
    pub const INT: Self = Self(5);
    pub const LONG: Self = Self(6);
    pub const FLOAT: Self = Self(7);
    pub const DOUBLE: Self = Self(8);
    /// Type of the `null` literal.
    pub const NULL: Self = Self(9);
    /// Untyped (`def`) values; assignable to and from everything.
    pub const DYNAMIC: Self = Self(10);

    /// First id handed out for non-builtin types.
    pub const FIRST_USER: u32 = 11;

    #[inline]
    #[must_use]
    pub const fn is_primitive(self) -> bool {
        self.0 <= Self::DOUBLE.0
    }

    #[inline]
    #[must_use]
    pub const fn is_numeric_primitive(self) -> bool {
        self.0 >= Self::CHAR.0 && self.0 <= Self::DOUBLE.0
    }

    #[inline]
    #[must_use]
    pub const fn primitive_kind(self) -> Option<PrimitiveKind> {
        Some(match self {
            Self::VOID => PrimitiveKind::Void,
            Self::BOOLEAN => PrimitiveKind::Boolean,
            Self::CHAR => PrimitiveKind::Char,
            Self::BYTE => PrimitiveKind::Byte,
            Self::SHORT => PrimitiveKind::Short,
            Self::INT => PrimitiveKind::Int,
            Self::LONG => PrimitiveKind::Long,
            Self::FLOAT => PrimitiveKind::Float,
            Self::DOUBLE => PrimitiveKind::Double,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Void,
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [Self; 9] = [
        Self::Void,
        Self::Boolean,
        Self::Char,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
    ];

    #[must_use]
    pub const fn type_id(self) -> TypeId {
        match self {
            Self::Void => TypeId::VOID,
            Self::Boolean => TypeId::BOOLEAN,
            Self::Char => TypeId::CHAR,
            Self::Byte => TypeId::BYTE,
            Self::Short => TypeId::SHORT,
            Self::Int => TypeId::INT,
            Self::Long => TypeId::LONG,
            Self::Float => TypeId::FLOAT,
            Self::Double => TypeId::DOUBLE,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Position on the widening ladder `byte < short < int < long < float < double`.
    /// `char` widens like `int` but nothing widens to `char`.
    #[must_use]
    pub const fn widening_rank(self) -> Option<u32> {
        match self {
            Self::Byte => Some(0),
            Self::Short => Some(1),
            Self::Char | Self::Int => Some(2),
            Self::Long => Some(3),
            Self::Float => Some(4),
            Self::Double => Some(5),
            Self::Void | Self::Boolean => None,
        }
    }

    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Char | Self::Byte | Self::Short | Self::Int | Self::Long
        )
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        self.widening_rank().is_some()
    }
}

/// Index of a class declaration in the `TypeStore`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct ClassId(pub u32);

/// Index of a method or constructor declaration in the `TypeStore`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodId(pub u32);

/// Reference to a class with type arguments. Empty `args` means raw.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassRef {
    pub class: ClassId,
    pub args: SmallVec<[TypeId; 2]>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Primitive(PrimitiveKind),
    Class(ClassRef),
    Array(TypeId),
    /// Unresolved generic parameter, by name.
    Placeholder(Arc<str>),
    Wildcard {
        upper: Option<TypeId>,
        lower: Option<TypeId>,
    },
    /// Synthetic least-upper-bound of unrelated types. Members are sorted,
    /// deduplicated and never themselves unions.
    Union(SmallVec<[TypeId; 4]>),
    Null,
    Dynamic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    AbstractClass,
    Interface,
}

/// Declared generic parameter (`T extends A & B`, `T super L`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericParam {
    pub name: Arc<str>,
    pub upper_bounds: Vec<TypeId>,
    pub lower_bound: Option<TypeId>,
}

impl GenericParam {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            upper_bounds: Vec::new(),
            lower_bound: None,
        }
    }

    #[must_use]
    pub fn bounded(name: &str, upper: TypeId) -> Self {
        Self {
            name: Arc::from(name),
            upper_bounds: vec![upper],
            lower_bound: None,
        }
    }
}

bitflags! {
    /// Member modifiers.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u16 {
        const STATIC = 1 << 0;
        const ABSTRACT = 1 << 1;
        const PRIVATE = 1 << 2;
        const PROTECTED = 1 << 3;
        const FINAL = 1 << 4;
        /// Compiler-generated (accessors, default constructors).
        const SYNTHETIC = 1 << 5;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: Arc<str>,
    pub ty: TypeId,
    pub flags: MemberFlags,
}

/// A property: a field with implicit accessors. `FINAL` properties are read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: Arc<str>,
    pub ty: TypeId,
    pub flags: MemberFlags,
}

/// Parameter types a method declares for the closure passed in this slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClosureParamHint {
    /// Fixed parameter list; may mention placeholders of the method or receiver.
    Types(Vec<TypeId>),
    /// Map iteration: one `Map.Entry<K, V>` parameter, or `(K, V)` when the
    /// closure declares two parameters.
    MapEntryOrKeyValue { key: TypeId, value: TypeId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DelegationTarget {
    /// Delegate to the call's receiver (`with`, builders).
    Receiver,
    Type(TypeId),
}

/// Order in which a closure searches its delegate and its owner for
/// unqualified names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DelegationStrategy {
    #[default]
    OwnerFirst,
    DelegateFirst,
    OwnerOnly,
    DelegateOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DelegatesTo {
    pub target: DelegationTarget,
    pub strategy: DelegationStrategy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDef {
    pub name: Arc<str>,
    pub ty: TypeId,
    pub has_default: bool,
    pub closure_params: Option<ClosureParamHint>,
    pub delegates_to: Option<DelegatesTo>,
}

impl ParamDef {
    pub fn new(name: &str, ty: TypeId) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            has_default: false,
            closure_params: None,
            delegates_to: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    #[must_use]
    pub fn with_closure_params(mut self, hint: ClosureParamHint) -> Self {
        self.closure_params = Some(hint);
        self
    }

    #[must_use]
    pub fn with_delegate(mut self, target: DelegationTarget, strategy: DelegationStrategy) -> Self {
        self.delegates_to = Some(DelegatesTo { target, strategy });
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDef {
    pub name: Arc<str>,
    pub declaring: ClassId,
    pub type_params: Vec<GenericParam>,
    pub params: Vec<ParamDef>,
    /// `DYNAMIC` for `def` methods whose return type is inferred on demand.
    pub return_type: TypeId,
    pub flags: MemberFlags,
    /// Host handle of the declaring AST node, if the body is available.
    pub decl_node: Option<u32>,
}

impl MethodDef {
    /// A public instance method. `declaring` is filled in by `TypeStore::add_method`.
    pub fn new(name: &str, params: Vec<ParamDef>, return_type: TypeId) -> Self {
        Self {
            name: Arc::from(name),
            declaring: ClassId::default(),
            type_params: Vec::new(),
            params,
            return_type,
            flags: MemberFlags::empty(),
            decl_node: None,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_type_params(mut self, type_params: Vec<GenericParam>) -> Self {
        self.type_params = type_params;
        self
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MemberFlags::ABSTRACT)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    /// Qualified name (`java.util.List`).
    pub name: Arc<str>,
    pub kind: ClassKind,
    pub type_params: Vec<GenericParam>,
    /// Parameterized in terms of this class's own placeholders.
    pub super_class: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub fields: Vec<FieldDef>,
    pub properties: Vec<PropertyDef>,
    pub methods: Vec<MethodId>,
    pub constructors: Vec<MethodId>,
    /// Lexically enclosing class of an inner class.
    pub outer: Option<ClassId>,
    pub decl_node: Option<u32>,
}

impl ClassDef {
    pub fn new(name: &str, kind: ClassKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            outer: None,
            decl_node: None,
        }
    }

    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit(['.', '$']).next().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, ClassKind::AbstractClass | ClassKind::Interface)
    }
}
