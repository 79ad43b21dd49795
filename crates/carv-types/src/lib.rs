//! Shared types for the Carv front end.
//!
//! This crate defines the AST node types, source spans, and diagnostic
//! types used by the lexer, parser and semantic analyzer.

mod error;
mod span;
pub mod ast;

pub use error::{CarvError, CompileErrors, ErrorCategory, ErrorCode, Severity, MAX_ERRORS};
pub use span::{SourceFile, Span};

/// Result type used throughout the Carv front end.
pub type Result<T> = std::result::Result<T, CarvError>;
