//! Line/column source positions.
//!
//! The parser that produces the AST is an external collaborator; it hands us
//! one-based line and column numbers for every node. Diagnostics are keyed by
//! these positions, so a location reports at most once per checking pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A one-based line/column position in a source unit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    /// Position used for synthetic nodes that have no source location.
    pub const SYNTHETIC: Self = Self { line: 0, column: 0 };

    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Whether this position came from real source text.
    pub const fn is_synthetic(self) -> bool {
        self.line == 0 && self.column == 0
    }
}

impl fmt::Debug for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@ line {}, column {}", self.line, self.column)
    }
}
