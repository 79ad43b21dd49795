//! Carv compiler front end: orchestrates lexing, parsing and semantic
//! checking.
//!
//! ```text
//! Carv Source → Lexer → Parser → Checker (types, moves, borrows, interfaces, await)
//! ```
//!
//! The checker reports two severities. Errors mean the program is unsound
//! and must not run; warnings flag risky ownership or borrow patterns and
//! never block success.

mod async_check;
pub mod borrow;
pub mod builtins;
mod checker;
mod conformance;
pub mod env;
mod issue;
pub mod ownership;
pub mod ty;
pub mod undo;

pub use checker::Checker;
pub use issue::{CheckIssue, CheckOptions, CheckReport, IssueKind};
pub use ty::{Category, ClassType, FnType, InterfaceType, MethodSig, Type};

use carv_types::ast::Program;
use carv_types::{CarvError, CompileErrors, SourceFile, Span};
use thiserror::Error;

/// Failures of the check pipeline itself, as opposed to diagnostics about
/// the checked program.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Lexing or parsing failed; the program was not checked.
    #[error("{file}: {} syntax error(s)", errors.total_errors)]
    Syntax { file: String, errors: CompileErrors },

    /// The report could not be serialized.
    #[error("failed to serialize check report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Check an already parsed program.
pub fn check_program(program: &Program, options: CheckOptions) -> CheckReport {
    Checker::with_options(options).check(program)
}

/// Lex, parse and check `source`, returning the full check report.
///
/// Fails with [`CompileError::Syntax`] if lexing or parsing reported errors.
pub fn check_source(source: &str, file_name: &str) -> Result<CheckReport, CompileError> {
    let source_file = SourceFile::new(file_name, source);
    let parsed = carv_parser::parse_source(&source_file);
    if parsed.errors.has_errors() {
        return Err(CompileError::Syntax {
            file: file_name.to_string(),
            errors: parsed.errors,
        });
    }
    let options = CheckOptions {
        file_name: file_name.to_string(),
        ..CheckOptions::default()
    };
    Ok(check_program(&parsed.program, options))
}

/// Check `source` and render the report as JSON.
pub fn check_source_json(source: &str, file_name: &str) -> Result<String, CompileError> {
    let report = check_source(source, file_name)?;
    Ok(report.to_json()?)
}

/// Run the whole front end and collect every stage's diagnostics.
///
/// Check errors become error-severity [`CarvError`]s and check warnings
/// become warnings, each carrying the offending source line.
pub fn type_check(source: &str, file_name: &str) -> CompileErrors {
    let source_file = SourceFile::new(file_name, source);
    let parsed = carv_parser::parse_source(&source_file);
    if parsed.errors.has_errors() {
        return parsed.errors;
    }

    let options = CheckOptions {
        file_name: file_name.to_string(),
        ..CheckOptions::default()
    };
    let report = check_program(&parsed.program, options);

    let mut errors = parsed.errors;
    for issue in &report.errors {
        errors.push_error(to_carv_error(&source_file, issue));
    }
    for issue in &report.warnings {
        errors.push_warning(to_carv_error(&source_file, issue).into_warning());
    }
    errors
}

fn to_carv_error(source_file: &SourceFile, issue: &CheckIssue) -> CarvError {
    let source_line = source_file.line(issue.line).unwrap_or_default();
    CarvError::new(
        &source_file.name,
        issue.code,
        issue.message.clone(),
        Span::point(issue.line, issue.column),
        source_line,
    )
}
