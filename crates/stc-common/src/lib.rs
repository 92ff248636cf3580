//! Common types and utilities for the stc type checker.
//!
//! This crate provides foundational types used across all stc crates:
//! - Source positions (`SourcePos`) attached to AST nodes and diagnostics
//! - Diagnostics (`Diagnostic`, codes, message templates, `format_message`)
//! - Checker limits and thresholds

// Position types for line/column source locations
pub mod position;
pub use position::SourcePos;

// Diagnostics - codes, categories and message templates
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, format_message};

// Centralized limits and thresholds
pub mod limits;
