// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Rendering for escape checker results.
//!
//! Checker errors are converted into one `Diagnostic` type through the
//! `ToDiagnostic` trait. Terminal output and JSON reports both consume that
//! type, so the checker crate stays free of presentation concerns.

pub mod codes;
pub mod convert;
pub mod formatter;
pub mod json;
pub mod suggestions;

use serde::Serialize;
use spanscope_ast::Span;
use spanscope_escape::EscapeLevel;

// ============================================================================
// Core Types
// ============================================================================

/// A renderable diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<ErrorCode>,
    pub message: String,
    pub labels: Vec<Label>,
    /// Dotted child path from the body root, when the problem has a node.
    pub node_path: Option<String>,
    /// Required and actual levels, for errors that compare levels.
    pub levels: Option<LevelPair>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Label {
    pub span: Span,
    pub primary: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A registered error code like E0903.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelPair {
    pub required: EscapeLevel,
    pub actual: EscapeLevel,
}

// ============================================================================
// Builder API
// ============================================================================

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            node_path: None,
            levels: None,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(ErrorCode(code.into()));
        self
    }

    pub fn with_primary(mut self, span: Span, msg: impl Into<String>) -> Self {
        self.labels.push(Label { span, primary: true, message: msg.into() });
        self
    }

    pub fn with_secondary(mut self, span: Span, msg: impl Into<String>) -> Self {
        self.labels.push(Label { span, primary: false, message: msg.into() });
        self
    }

    pub fn with_path(mut self, path: impl std::fmt::Display) -> Self {
        self.node_path = Some(path.to_string());
        self
    }

    pub fn with_levels(mut self, required: Option<EscapeLevel>, actual: Option<EscapeLevel>) -> Self {
        if let (Some(required), Some(actual)) = (required, actual) {
            self.levels = Some(LevelPair { required, actual });
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// First primary label's span, falling back to the first label.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.primary)
            .or(self.labels.first())
            .map(|l| l.span)
    }
}

// ============================================================================
// Conversion Trait
// ============================================================================

/// Convert a checker error into a renderable diagnostic.
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}

/// Convert every error of a report, keeping evaluation order.
pub fn report_diagnostics(report: &spanscope_escape::EscapeReport) -> Vec<Diagnostic> {
    report.errors.iter().map(ToDiagnostic::to_diagnostic).collect()
}
