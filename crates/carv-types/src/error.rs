use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors stored before further ones are only counted.
pub const MAX_ERRORS: usize = 20;

/// Diagnostic severity.
///
/// Errors block the pipeline; warnings are advisory and never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Type,
    Ownership,
    Borrow,
    Interface,
    Async,
}

/// Numeric diagnostic code (E100–E699).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED_LITERAL: Self = Self(101);
    pub const NESTING_LIMIT: Self = Self(102);

    // ── Type (E200–E299) ──
    pub const UNKNOWN_TYPE: Self = Self(200);
    pub const TYPE_MISMATCH: Self = Self(201);
    pub const WRONG_ARG_COUNT: Self = Self(202);
    pub const UNDEFINED_NAME: Self = Self(203);
    pub const UNKNOWN_MEMBER: Self = Self(204);
    pub const UNKNOWN_MODULE_MEMBER: Self = Self(205);
    pub const INVALID_ASSIGN_TARGET: Self = Self(206);
    pub const CONTROL_OUTSIDE_LOOP: Self = Self(207);

    // ── Ownership (E300–E399) ──
    pub const USE_AFTER_MOVE: Self = Self(300);

    // ── Borrow (E400–E499) ──
    pub const BORROW_CONFLICT: Self = Self(400);
    pub const ASSIGN_WHILE_BORROWED: Self = Self(401);
    pub const BORROW_OF_MOVED: Self = Self(402);
    pub const INVALID_DEREF: Self = Self(403);
    pub const REFERENCE_ESCAPES: Self = Self(404);
    pub const MUTATION_THROUGH_SHARED_REF: Self = Self(405);

    // ── Interface (E500–E599) ──
    pub const MISSING_METHOD: Self = Self(500);
    pub const METHOD_ARITY: Self = Self(501);
    pub const RETURN_TYPE_MISMATCH: Self = Self(502);
    pub const PARAM_TYPE_MISMATCH: Self = Self(503);
    pub const RECEIVER_MISMATCH: Self = Self(504);
    pub const MUT_METHOD_THROUGH_SHARED_REF: Self = Self(505);
    pub const UNKNOWN_IMPL_TARGET: Self = Self(506);

    // ── Async (E600–E699) ──
    pub const AWAIT_OUTSIDE_ASYNC: Self = Self(600);
    pub const AWAIT_NON_FUTURE: Self = Self(601);
    pub const BORROW_ACROSS_AWAIT: Self = Self(602);

    /// Get the category for this code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Syntax,
            200..=299 => ErrorCategory::Type,
            300..=399 => ErrorCategory::Ownership,
            400..=499 => ErrorCategory::Borrow,
            500..=599 => ErrorCategory::Interface,
            600..=699 => ErrorCategory::Async,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Type => write!(f, "type"),
            Self::Ownership => write!(f, "ownership"),
            Self::Borrow => write!(f, "borrow"),
            Self::Interface => write!(f, "interface"),
            Self::Async => write!(f, "async"),
        }
    }
}

/// A structured Carv diagnostic.
///
/// Tools render these from their fields; the message text is for humans.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{span}: {code} [{category}] {message}")]
pub struct CarvError {
    /// Source file name.
    pub file: String,
    /// Diagnostic code (e.g., E201).
    pub code: ErrorCode,
    pub severity: Severity,
    /// Category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CarvError {
    /// Create a new error-severity diagnostic.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Downgrade to a warning.
    pub fn into_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// The structured output of a compilation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<CarvError>,
    pub warnings: Vec<CarvError>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl CompileErrors {
    /// Create an empty result (no errors).
    pub fn empty() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            total_errors: 0,
            total_warnings: 0,
        }
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: CarvError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Add a warning.
    pub fn push_warning(&mut self, warning: CarvError) {
        self.warnings.push(warning);
        self.total_warnings += 1;
    }

    /// Append everything from another collection.
    pub fn extend(&mut self, other: CompileErrors) {
        // Errors past the other side's cap were counted but not stored.
        let unstored = other.total_errors.saturating_sub(other.errors.len());
        for e in other.errors {
            self.push_error(e);
        }
        self.total_errors += unstored;
        for w in other.warnings {
            self.push_warning(w);
        }
    }
}
