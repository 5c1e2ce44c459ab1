use serde::Serialize;
use thiserror::Error;

/// Machine-distinguishable category of a manifest rule violation.
///
/// - `Structural`: a required field is missing or has the wrong type
/// - `Referential`: a dangling, duplicate, or cyclic reference
/// - `Invariant`: a semantic rule violation (e.g. two open worklog
///   sessions, a punch-out before its punch-in)
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    Structural,
    Referential,
    Invariant,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Referential => "referential",
            Self::Invariant => "invariant",
        }
    }
}

/// A single violated manifest rule.
///
/// `path` is a dotted location into the manifest document
/// (e.g. `artifacts.fig1.status`, `worklog.tasks[2].parent`).
#[derive(Debug, Clone, Serialize, Error, PartialEq, Eq)]
#[error("{path}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn structural(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind: ValidationErrorKind::Structural,
        }
    }

    pub fn referential(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind: ValidationErrorKind::Referential,
        }
    }

    pub fn invariant(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind: ValidationErrorKind::Invariant,
        }
    }
}

/// Format a list of violations for terminal display, one rule per line.
pub fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  • {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
