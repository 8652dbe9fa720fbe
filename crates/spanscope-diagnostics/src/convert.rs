// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversions from checker error types to `Diagnostic`.

use spanscope_ast::{Access, Body};
use spanscope_escape::{EscapeError, EscapeErrorKind, EscapeLevel, MalformedTree};

use crate::suggestions::{available, did_you_mean};
use crate::{Diagnostic, ToDiagnostic};

// ============================================================================
// Escape Errors
// ============================================================================

impl ToDiagnostic for EscapeError {
    fn to_diagnostic(&self) -> Diagnostic {
        use EscapeErrorKind::*;

        let diag = match &self.kind {
            UnknownBinding { name, in_scope } => {
                let mut diag = Diagnostic::error(format!("unknown binding `{}`", name))
                    .with_code("E0900")
                    .with_primary(self.span, "not a parameter or local");
                if let Some(note) = available("names", in_scope, 8) {
                    diag = diag.with_note(note);
                }
                with_suggestion(diag, name, in_scope)
            }

            UnknownMember { shape, member, candidates } => {
                let mut diag = Diagnostic::error(format!("`{}` has no member `{}`", shape, member))
                    .with_code("E0901")
                    .with_primary(self.span, "unknown member");
                if let Some(note) = available("members", candidates, 8) {
                    diag = diag.with_note(note);
                }
                with_suggestion(diag, member, candidates)
            }

            UnknownShape { name, candidates } => {
                let diag = Diagnostic::error(format!("unknown shape `{}`", name))
                    .with_code("E0902")
                    .with_primary(self.span, "no shape with this name was registered");
                with_suggestion(diag, name, candidates)
            }

            NotReturnable { mode, required, actual } => {
                let what = match mode {
                    Access::Value => "returned value",
                    Access::Ref => "returned reference",
                };
                Diagnostic::error(format!("{} may refer to the current stack frame", what))
                    .with_code("E0903")
                    .with_primary(self.span, format!("this is {}", actual))
                    .with_note(format!("returning {} requires {} or better", mode_word(*mode), required))
                    .with_help(return_help(*mode, *actual))
            }

            SelfReferentialFieldReturn { method } => Diagnostic::error(format!(
                "cannot return the result of `{}` by reference",
                method
            ))
            .with_code("E0904")
            .with_primary(self.span, "refers to a field of the receiver")
            .with_note("the receiver is a temporary copy that dies with this frame")
            .with_help("return the value by copy instead"),

            MixedRefUnsafeArguments { ref_position, unsafe_position } => Diagnostic::error(
                "call mixes a caller-owned reference with stack-only data",
            )
            .with_code("E0905")
            .with_primary(self.span, "in this call")
            .with_note(format!(
                "{} is passed by reference from the caller",
                position_word(*ref_position)
            ))
            .with_note(format!("{} may refer to this frame", position_word(*unsafe_position)))
            .with_help("the callee could store the stack data through the reference"),

            EscapingAssignment { mode, required, actual } => {
                let diag = Diagnostic::error(format!("cannot store a {} value here", actual))
                    .with_code("E0906")
                    .with_primary(self.span, "stored value outlives its storage")
                    .with_note(format!("the target needs {} or better", required));
                match mode {
                    Access::Ref => diag.with_help("ref stores also need the value to be at least ref-scoped"),
                    Access::Value => diag,
                }
            }
        };

        diag.with_path(&self.path)
            .with_levels(self.required_level(), self.actual_level())
    }
}

fn with_suggestion(diag: Diagnostic, name: &str, candidates: &[String]) -> Diagnostic {
    match did_you_mean(name, candidates.iter().map(String::as_str)) {
        Some(hint) => diag.with_help(hint),
        None => diag,
    }
}

fn mode_word(mode: Access) -> &'static str {
    match mode {
        Access::Value => "by value",
        Access::Ref => "by reference",
    }
}

fn position_word(position: usize) -> String {
    if position == 0 {
        "the receiver".to_string()
    } else {
        format!("argument {}", position)
    }
}

fn return_help(mode: Access, actual: EscapeLevel) -> &'static str {
    match (mode, actual) {
        (_, EscapeLevel::StackOnly) => "build the value from heap data or from the parameters",
        (Access::Value, EscapeLevel::RefScoped) => "return it by reference, or copy the data out",
        _ => "copy the data out before returning",
    }
}

// ============================================================================
// Malformed Trees
// ============================================================================

impl ToDiagnostic for MalformedTree {
    fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(format!("malformed expression tree: {}", self))
            .with_code("E0950")
            .with_note(format!("found at node {}", self.node()))
            .with_help("this is a bug in the front end that built the tree")
    }
}

/// Like `to_diagnostic`, labeled with the node's span when the body has it.
pub fn malformed_in(err: &MalformedTree, body: &Body) -> Diagnostic {
    let diag = err.to_diagnostic();
    match body.get(err.node()) {
        Some(expr) => diag.with_primary(expr.span, format!("in {}", expr.kind.describe())),
        None => diag,
    }
}
