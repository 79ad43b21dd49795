//! Checker diagnostics, report and options.

use std::collections::HashMap;
use std::fmt;

use carv_types::{ErrorCode, Span};
use serde::{Deserialize, Serialize};

use crate::ty::Type;

/// Severity of a checker diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Definite unsoundness. Blocks success.
    TypeError,
    /// Heuristic risk. Never blocks success.
    Warning,
}

/// A single diagnostic produced by the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIssue {
    pub line: u32,
    pub column: u32,
    pub kind: IssueKind,
    pub code: ErrorCode,
    pub message: String,
}

impl fmt::Display for CheckIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            IssueKind::TypeError => "error",
            IssueKind::Warning => "warning",
        };
        write!(
            f,
            "{}:{}: {label}[{}]: {}",
            self.line, self.column, self.code, self.message
        )
    }
}

/// Everything a check run produces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub errors: Vec<CheckIssue>,
    pub warnings: Vec<CheckIssue>,
    /// Inferred type per expression span. Empty unless
    /// [`CheckOptions::record_expr_types`] is set.
    #[serde(skip)]
    pub expr_types: HashMap<Span, Type>,
}

impl CheckReport {
    /// True iff no errors were reported. Warnings do not count.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors then warnings, each in encounter order.
    pub fn issues(&self) -> impl Iterator<Item = &CheckIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.issues().any(|issue| issue.code == code)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Checker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// File name used in logs and converted diagnostics.
    pub file_name: String,
    /// Populate [`CheckReport::expr_types`].
    pub record_expr_types: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            file_name: "main.carv".to_string(),
            record_expr_types: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(kind: IssueKind, code: ErrorCode) -> CheckIssue {
        CheckIssue {
            line: 2,
            column: 5,
            kind,
            code,
            message: "msg".into(),
        }
    }

    #[test]
    fn test_report_ok_ignores_warnings() {
        let report = CheckReport {
            warnings: vec![issue(IssueKind::Warning, ErrorCode::USE_AFTER_MOVE)],
            ..Default::default()
        };
        assert!(report.is_ok());
        assert!(report.has_code(ErrorCode::USE_AFTER_MOVE));
    }

    #[test]
    fn test_issues_lists_errors_first() {
        let report = CheckReport {
            errors: vec![issue(IssueKind::TypeError, ErrorCode::TYPE_MISMATCH)],
            warnings: vec![issue(IssueKind::Warning, ErrorCode::BORROW_CONFLICT)],
            ..Default::default()
        };
        let kinds: Vec<_> = report.issues().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::TypeError, IssueKind::Warning]);
        assert!(!report.is_ok());
    }

    #[test]
    fn test_issue_kind_serializes_snake_case() {
        let json = serde_json::to_string(&IssueKind::TypeError).unwrap_or_default();
        assert_eq!(json, "\"type_error\"");
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: CheckOptions =
            serde_json::from_str(r#"{"record_expr_types": true}"#).unwrap_or_default();
        assert!(opts.record_expr_types);
        assert_eq!(opts.file_name, "main.carv");
    }

    #[test]
    fn test_display() {
        let text = issue(IssueKind::Warning, ErrorCode::USE_AFTER_MOVE).to_string();
        assert_eq!(text, "2:5: warning[E300]: msg");
    }
}
