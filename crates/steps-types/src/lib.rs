//! Shared types for the Steps language core.
//!
//! This crate defines the AST node types, source spans, the structured
//! error record, and diagnostic collections used by every later stage.

mod error;
mod span;
pub mod ast;
pub mod ast_diff;

pub use error::{
    Diagnostics, ErrorCategory, ErrorCode, Severity, StepsError, CONTEXT_RADIUS, MAX_ERRORS,
};
pub use span::{ContextLine, SourceFile, Span};

/// Result type used throughout the Steps core.
pub type Result<T> = std::result::Result<T, StepsError>;
