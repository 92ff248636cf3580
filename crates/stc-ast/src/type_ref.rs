//! Type annotations as written in source.
//!
//! A `TypeRef` is unresolved: the checker maps names to primitives, declared
//! classes or in-scope placeholders when it needs the type.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// `int`, `String`, `List<T>`, `Map<>` (diamond).
    Named {
        name: String,
        args: Vec<TypeRef>,
        diamond: bool,
    },
    /// `T[]`
    Array(Box<TypeRef>),
    /// `?`, `? extends T`, `? super T`
    Wildcard {
        upper: Option<Box<TypeRef>>,
        lower: Option<Box<TypeRef>>,
    },
}

impl TypeRef {
    /// A plain named type without arguments.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
            diamond: false,
        }
    }

    /// A parameterized named type.
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self::Named {
            name: name.into(),
            args,
            diamond: false,
        }
    }

    /// `Name<>`
    pub fn diamond(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
            diamond: true,
        }
    }

    pub fn array(component: TypeRef) -> Self {
        Self::Array(Box::new(component))
    }

    pub fn wildcard_extends(upper: TypeRef) -> Self {
        Self::Wildcard {
            upper: Some(Box::new(upper)),
            lower: None,
        }
    }

    pub fn wildcard_super(lower: TypeRef) -> Self {
        Self::Wildcard {
            upper: None,
            lower: Some(Box::new(lower)),
        }
    }

    #[must_use]
    pub fn is_diamond(&self) -> bool {
        matches!(self, Self::Named { diamond: true, .. })
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named {
                name,
                args,
                diamond,
            } => {
                write!(f, "{name}")?;
                if *diamond {
                    write!(f, "<>")?;
                } else if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Self::Array(component) => write!(f, "{component}[]"),
            Self::Wildcard { upper, lower } => match (upper, lower) {
                (Some(upper), _) => write!(f, "? extends {upper}"),
                (None, Some(lower)) => write!(f, "? super {lower}"),
                (None, None) => write!(f, "?"),
            },
        }
    }
}
