//! Checker configuration.

use crate::error::CheckerError;
use serde::{Deserialize, Serialize};
use stc_common::limits::MAX_EXPR_CHECK_DEPTH;

/// Options for one checking pass.
///
/// Every field has a default, so a JSON document only needs the keys it
/// changes: `{"secondPass": false}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckerOptions {
    /// File name reported in diagnostics.
    pub file_name: String,
    /// Nesting depth past which expressions are typed as dynamic.
    pub max_expr_depth: u32,
    /// Re-visit loops and branches once when a tracked variable's merged type
    /// differs from its type before the construct.
    pub second_pass: bool,
    /// Allow closures where a single-abstract-method type is expected.
    pub sam_coercion: bool,
    /// Closures without a parameter list get an implicit `it` parameter.
    pub implicit_it: bool,
    /// Loading context the extension methods are taken from.
    pub loading_context: u64,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            file_name: "Script.groovy".to_string(),
            max_expr_depth: MAX_EXPR_CHECK_DEPTH,
            second_pass: true,
            sam_coercion: true,
            implicit_it: true,
            loading_context: 0,
        }
    }
}

impl CheckerOptions {
    /// Parse options from a JSON document.
    ///
    /// # Errors
    /// `CheckerError::InvalidOptions` when the document is malformed or a key
    /// has the wrong type.
    pub fn from_json(text: &str) -> Result<Self, CheckerError> {
        Ok(serde_json::from_str(text)?)
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

#[cfg(test)]
#[path = "tests/options_tests.rs"]
mod tests;
