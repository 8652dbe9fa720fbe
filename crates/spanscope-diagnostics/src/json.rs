// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JSON diagnostic output for machine consumption.
//!
//! One report per checked body. Locations are 1-based line/column pairs
//! when source text is available, and every escape diagnostic carries its
//! node path and the levels it compared.

use serde::Serialize;
use spanscope_ast::LineIndex;
use spanscope_escape::EscapeLevel;

use crate::{codes::ErrorCodeRegistry, Diagnostic, Severity};

/// A complete JSON report for one body.
#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    /// Schema version for forward compatibility.
    pub version: u32,
    /// Name of the checked body.
    pub body: String,
    pub success: bool,
    pub diagnostics: Vec<JsonDiagnostic>,
    pub error_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Registry category ("Escape", "Resolution", "Frontend").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub message: String,
    /// Dotted child path from the body root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_level: Option<EscapeLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_level: Option<EscapeLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    pub labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// A source location (1-based).
#[derive(Debug, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
    pub source_line: String,
}

#[derive(Debug, Serialize)]
pub struct JsonLabel {
    /// "primary" or "secondary".
    pub role: &'static str,
    pub message: String,
    pub start: usize,
    pub end: usize,
}

/// Convert diagnostics to a JSON report. `source` may be empty, in which
/// case locations are omitted.
pub fn to_json_report(diagnostics: &[Diagnostic], source: &str, body: &str) -> DiagnosticReport {
    let registry = ErrorCodeRegistry::default();
    let lines = LineIndex::new(source);

    let error_count = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    let warning_count = diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();

    DiagnosticReport {
        version: 1,
        body: body.to_string(),
        success: error_count == 0,
        diagnostics: diagnostics
            .iter()
            .map(|d| to_json_diagnostic(d, source, &lines, &registry))
            .collect(),
        error_count,
        warning_count,
    }
}

fn to_json_diagnostic(
    diag: &Diagnostic,
    source: &str,
    lines: &LineIndex,
    registry: &ErrorCodeRegistry,
) -> JsonDiagnostic {
    let code = diag.code.as_ref().map(|c| c.0.clone());
    let category = code
        .as_deref()
        .and_then(|c| registry.get(c))
        .map(|info| info.category.to_string());

    let location = diag.primary_span().filter(|_| !source.is_empty()).map(|span| {
        let (line, column) = lines.locate(span.start);
        SourceLocation {
            line,
            column,
            byte_offset: span.start,
            source_line: lines.line(source, line).unwrap_or("").to_string(),
        }
    });

    JsonDiagnostic {
        severity: diag.severity,
        code,
        category,
        message: diag.message.clone(),
        path: diag.node_path.clone(),
        required_level: diag.levels.map(|l| l.required),
        actual_level: diag.levels.map(|l| l.actual),
        location,
        labels: diag
            .labels
            .iter()
            .map(|l| JsonLabel {
                role: if l.primary { "primary" } else { "secondary" },
                message: l.message.clone(),
                start: l.span.start,
                end: l.span.end,
            })
            .collect(),
        notes: diag.notes.clone(),
        help: diag.help.clone(),
    }
}

/// Serialize a report to pretty JSON.
pub fn to_json_string(report: &DiagnosticReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}
