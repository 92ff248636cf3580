//! Diagnostic types and message lookup for the type checker.
//!
//! Every recoverable checking problem is reported as a [`Diagnostic`] carrying
//! a numeric code from [`diagnostic_codes`]. Message templates use `{0}`, `{1}`,
//! ... placeholders filled in by [`format_message`].

use crate::position::SourcePos;
use serde::Serialize;
use std::fmt;

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Message = 2,
}

/// A type-checking diagnostic message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub pos: SourcePos,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(file: String, pos: SourcePos, message: String, code: u32) -> Self {
        Self {
            file,
            pos,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
        }
    }

    /// Create a new warning diagnostic.
    #[must_use]
    pub const fn warning(file: String, pos: SourcePos, message: String, code: u32) -> Self {
        Self {
            file,
            pos,
            message_text: message,
            category: DiagnosticCategory::Warning,
            code,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [STC{}] {}\n {}",
            self.file, self.code, self.message_text, self.pos
        )
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

// =============================================================================
// Codes and Templates
// =============================================================================

pub mod diagnostic_codes {
    pub const THE_VARIABLE_IS_UNDECLARED: u32 = 1001;
    pub const NO_SUCH_PROPERTY: u32 = 1002;
    pub const CANNOT_SET_READ_ONLY_PROPERTY: u32 = 1003;
    pub const CANNOT_FIND_MATCHING_METHOD: u32 = 1101;
    pub const CANNOT_FIND_MATCHING_CONSTRUCTOR: u32 = 1102;
    pub const REFERENCE_TO_METHOD_IS_AMBIGUOUS: u32 = 1103;
    pub const NON_STATIC_METHOD_FROM_STATIC_CONTEXT: u32 = 1104;
    pub const CANNOT_ASSIGN_VALUE_OF_TYPE: u32 = 1201;
    pub const CANNOT_RETURN_VALUE_OF_TYPE: u32 = 1202;
    pub const INCONVERTIBLE_TYPES_CANNOT_CAST: u32 = 1203;
    pub const CANNOT_APPLY_OPERATOR: u32 = 1301;
    pub const INCOMPATIBLE_GENERIC_ARGUMENT_TYPES: u32 = 1401;
    pub const TYPE_DOES_NOT_SATISFY_BOUND: u32 = 1402;
    pub const CANNOT_INFER_DIAMOND_TYPE: u32 = 1403;
    pub const UNABLE_TO_RESOLVE_CLASS: u32 = 1501;
}

pub mod diagnostic_messages {
    pub const THE_VARIABLE_IS_UNDECLARED: &str = "The variable [{0}] is undeclared.";
    pub const NO_SUCH_PROPERTY: &str = "No such property: {0} for class: {1}";
    pub const CANNOT_SET_READ_ONLY_PROPERTY: &str = "Cannot set read-only property: {0}";
    pub const CANNOT_FIND_MATCHING_METHOD: &str = "Cannot find matching method {0}#{1}({2}). Please check if the declared type is correct and if the method exists.";
    pub const CANNOT_FIND_MATCHING_CONSTRUCTOR: &str = "Cannot find matching constructor {0}({1})";
    pub const REFERENCE_TO_METHOD_IS_AMBIGUOUS: &str =
        "Reference to method is ambiguous. Cannot choose between [{0}]";
    pub const NON_STATIC_METHOD_FROM_STATIC_CONTEXT: &str =
        "Non-static method {0}#{1} cannot be called from static context";
    pub const CANNOT_ASSIGN_VALUE_OF_TYPE: &str =
        "Cannot assign value of type {0} to variable of type {1}";
    pub const CANNOT_RETURN_VALUE_OF_TYPE: &str =
        "Cannot return value of type {0} for method returning {1}";
    pub const INCONVERTIBLE_TYPES_CANNOT_CAST: &str = "Inconvertible types: cannot cast {0} to {1}";
    pub const CANNOT_APPLY_OPERATOR: &str =
        "Cannot apply operator [{0}] to operands of type {1} and {2}";
    pub const INCOMPATIBLE_GENERIC_ARGUMENT_TYPES: &str =
        "Incompatible generic argument types. Cannot assign {0} to: {1}";
    pub const TYPE_DOES_NOT_SATISFY_BOUND: &str =
        "Type {0} does not satisfy bound {1} of placeholder {2}";
    pub const CANNOT_INFER_DIAMOND_TYPE: &str =
        "Cannot infer generic types for diamond constructor of {0} from target type {1}";
    pub const UNABLE_TO_RESOLVE_CLASS: &str = "unable to resolve class {0}";
}

use diagnostic_codes as c;
use diagnostic_messages as m;

/// All known diagnostic message definitions.
pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: c::THE_VARIABLE_IS_UNDECLARED,
        category: DiagnosticCategory::Error,
        message: m::THE_VARIABLE_IS_UNDECLARED,
    },
    DiagnosticMessage {
        code: c::NO_SUCH_PROPERTY,
        category: DiagnosticCategory::Error,
        message: m::NO_SUCH_PROPERTY,
    },
    DiagnosticMessage {
        code: c::CANNOT_SET_READ_ONLY_PROPERTY,
        category: DiagnosticCategory::Error,
        message: m::CANNOT_SET_READ_ONLY_PROPERTY,
    },
    DiagnosticMessage {
        code: c::CANNOT_FIND_MATCHING_METHOD,
        category: DiagnosticCategory::Error,
        message: m::CANNOT_FIND_MATCHING_METHOD,
    },
    DiagnosticMessage {
        code: c::CANNOT_FIND_MATCHING_CONSTRUCTOR,
        category: DiagnosticCategory::Error,
        message: m::CANNOT_FIND_MATCHING_CONSTRUCTOR,
    },
    DiagnosticMessage {
        code: c::REFERENCE_TO_METHOD_IS_AMBIGUOUS,
        category: DiagnosticCategory::Error,
        message: m::REFERENCE_TO_METHOD_IS_AMBIGUOUS,
    },
    DiagnosticMessage {
        code: c::NON_STATIC_METHOD_FROM_STATIC_CONTEXT,
        category: DiagnosticCategory::Error,
        message: m::NON_STATIC_METHOD_FROM_STATIC_CONTEXT,
    },
    DiagnosticMessage {
        code: c::CANNOT_ASSIGN_VALUE_OF_TYPE,
        category: DiagnosticCategory::Error,
        message: m::CANNOT_ASSIGN_VALUE_OF_TYPE,
    },
    DiagnosticMessage {
        code: c::CANNOT_RETURN_VALUE_OF_TYPE,
        category: DiagnosticCategory::Error,
        message: m::CANNOT_RETURN_VALUE_OF_TYPE,
    },
    DiagnosticMessage {
        code: c::INCONVERTIBLE_TYPES_CANNOT_CAST,
        category: DiagnosticCategory::Error,
        message: m::INCONVERTIBLE_TYPES_CANNOT_CAST,
    },
    DiagnosticMessage {
        code: c::CANNOT_APPLY_OPERATOR,
        category: DiagnosticCategory::Error,
        message: m::CANNOT_APPLY_OPERATOR,
    },
    DiagnosticMessage {
        code: c::INCOMPATIBLE_GENERIC_ARGUMENT_TYPES,
        category: DiagnosticCategory::Error,
        message: m::INCOMPATIBLE_GENERIC_ARGUMENT_TYPES,
    },
    DiagnosticMessage {
        code: c::TYPE_DOES_NOT_SATISFY_BOUND,
        category: DiagnosticCategory::Error,
        message: m::TYPE_DOES_NOT_SATISFY_BOUND,
    },
    DiagnosticMessage {
        code: c::CANNOT_INFER_DIAMOND_TYPE,
        category: DiagnosticCategory::Error,
        message: m::CANNOT_INFER_DIAMOND_TYPE,
    },
    DiagnosticMessage {
        code: c::UNABLE_TO_RESOLVE_CLASS,
        category: DiagnosticCategory::Error,
        message: m::UNABLE_TO_RESOLVE_CLASS,
    },
];

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
///
/// Returns the template string with `{0}`, `{1}`, etc. placeholders.
/// Use `format_message()` to fill in the placeholders.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

#[cfg(test)]
#[path = "tests/diagnostics_tests.rs"]
mod tests;
