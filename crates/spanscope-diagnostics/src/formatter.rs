// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal formatter for diagnostics.
//!
//! ```text
//! error[E0903]: returned value may refer to the current stack frame
//!   --> bodies.cs:4:12
//!     |
//!   4 |     return notsafe.GetTVal();
//!     |            ^^^^^^^^^^^^^^^^^ this is stack-only
//!     |
//!     = at: 2
//!     = levels: requires value-scoped, found stack-only
//!     = note: returning by value requires value-scoped or better
//! ```

use colored::Colorize;

use spanscope_ast::LineIndex;

use crate::{Diagnostic, Label, Severity};

/// Formats diagnostics for terminal output.
pub struct DiagnosticFormatter<'a> {
    source: &'a str,
    file_name: Option<&'a str>,
    lines: LineIndex,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, file_name: None, lines: LineIndex::new(source) }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        self.format_header(&mut out, diagnostic);

        // Labels are rendered in line order, primary before secondary.
        let mut labels: Vec<&Label> = diagnostic.labels.iter().collect();
        labels.sort_by_key(|l| (self.lines.locate(l.span.start).0, !l.primary));

        let gutter = labels
            .iter()
            .map(|l| self.lines.locate(l.span.start).0)
            .max()
            .map_or(2, |n| n.to_string().len().max(2));

        if !self.source.is_empty() {
            if let Some(span) = diagnostic.primary_span() {
                let (line, col) = self.lines.locate(span.start);
                out.push_str(&format!(
                    "{}{} {}:{}:{}\n",
                    " ".repeat(gutter),
                    "-->".blue(),
                    self.file_name.unwrap_or("<source>"),
                    line,
                    col
                ));
                out.push_str(&format!("{} {}\n", " ".repeat(gutter + 1), "|".blue()));
                for label in &labels {
                    self.format_label(&mut out, label, gutter);
                }
                out.push_str(&format!("{} {}\n", " ".repeat(gutter + 1), "|".blue()));
            }
        }

        self.format_footer(&mut out, diagnostic, gutter);
        out
    }

    fn format_header(&self, out: &mut String, diagnostic: &Diagnostic) {
        let severity = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Note => "note".blue().bold(),
        };

        match &diagnostic.code {
            Some(code) => out.push_str(&format!(
                "{}[{}]: {}\n",
                severity,
                code.0.red().bold(),
                diagnostic.message.bold()
            )),
            None => out.push_str(&format!("{}: {}\n", severity, diagnostic.message.bold())),
        }
    }

    fn format_label(&self, out: &mut String, label: &Label, gutter: usize) {
        let (line, col) = self.lines.locate(label.span.start);
        let text = self.lines.line(self.source, line).unwrap_or("");
        let (end_line, end_col) = self.lines.locate(label.span.end);

        // Multi-line spans are underlined to the end of their first line.
        let width = if end_line == line {
            end_col.saturating_sub(col)
        } else {
            (text.len() + 1).saturating_sub(col)
        }
        .max(1);

        let number = format!("{:>w$}", line, w = gutter + 1);
        out.push_str(&format!("{} {} {}\n", number.blue().bold(), "|".blue(), text));

        let (marks, message) = if label.primary {
            ("^".repeat(width).red().bold(), label.message.red().bold())
        } else {
            ("-".repeat(width).blue(), label.message.blue())
        };
        out.push_str(&format!(
            "{} {} {}{} {}\n",
            " ".repeat(gutter + 1),
            "|".blue(),
            " ".repeat(col - 1),
            marks,
            message
        ));
    }

    fn format_footer(&self, out: &mut String, diagnostic: &Diagnostic, gutter: usize) {
        let pad = " ".repeat(gutter + 1);
        let mut line = |key: colored::ColoredString, text: &str| {
            out.push_str(&format!("{} {} {}: {}\n", pad, "=".cyan(), key, text));
        };

        if let Some(path) = &diagnostic.node_path {
            line("at".cyan().bold(), path.as_str());
        }
        if let Some(levels) = &diagnostic.levels {
            line(
                "levels".cyan().bold(),
                &format!("requires {}, found {}", levels.required, levels.actual),
            );
        }
        for note in &diagnostic.notes {
            line("note".cyan().bold(), note.as_str());
        }
        if let Some(help) = &diagnostic.help {
            line("help".green().bold(), help.as_str());
        }
    }
}
