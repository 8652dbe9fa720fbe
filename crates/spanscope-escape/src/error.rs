// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Escape diagnostics and malformed-input errors.

use spanscope_ast::{Access, ExprId, Span};
use thiserror::Error;

use crate::level::EscapeLevel;
use crate::state::NodePath;

/// A property of the checked program that makes it unsafe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeError {
    pub kind: EscapeErrorKind,
    pub node: ExprId,
    pub path: NodePath,
    pub span: Span,
}

impl EscapeError {
    /// Level the context demanded, for kinds that compare levels.
    pub fn required_level(&self) -> Option<EscapeLevel> {
        match &self.kind {
            EscapeErrorKind::NotReturnable { required, .. }
            | EscapeErrorKind::EscapingAssignment { required, .. } => Some(*required),
            EscapeErrorKind::SelfReferentialFieldReturn { .. } => Some(EscapeLevel::RefScoped),
            EscapeErrorKind::MixedRefUnsafeArguments { .. } => Some(EscapeLevel::RefScoped),
            _ => None,
        }
    }

    /// Level the offending value actually had.
    pub fn actual_level(&self) -> Option<EscapeLevel> {
        match &self.kind {
            EscapeErrorKind::NotReturnable { actual, .. }
            | EscapeErrorKind::EscapingAssignment { actual, .. } => Some(*actual),
            EscapeErrorKind::SelfReferentialFieldReturn { .. }
            | EscapeErrorKind::MixedRefUnsafeArguments { .. } => Some(EscapeLevel::StackOnly),
            _ => None,
        }
    }
}

impl std::fmt::Display for EscapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at {})", self.kind, self.path)
    }
}

impl std::error::Error for EscapeError {}

/// The kind of escape diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeErrorKind {
    /// Reference to a name that is neither a binding nor a local.
    #[error("unknown binding `{name}`")]
    UnknownBinding {
        name: String,
        /// Names that were visible, sorted.
        in_scope: Vec<String>,
    },

    /// Field, method or indexer the receiver's shape does not declare.
    #[error("`{shape}` has no member `{member}`")]
    UnknownMember {
        shape: String,
        member: String,
        candidates: Vec<String>,
    },

    /// Constructor or allocation of a shape nobody registered.
    #[error("unknown shape `{name}`")]
    UnknownShape {
        name: String,
        candidates: Vec<String>,
    },

    /// Returned value may outlive the storage it points at.
    #[error("{actual} value cannot be returned {}; it must be at least {required}", return_word(.mode))]
    NotReturnable {
        mode: Access,
        required: EscapeLevel,
        actual: EscapeLevel,
    },

    /// A reference to the receiver's own field is returned by reference.
    #[error("`{method}` returns a reference into its receiver, which cannot be returned by reference")]
    SelfReferentialFieldReturn {
        method: String,
    },

    /// A call passes a caller-owned reference together with stack-only data.
    /// Positions count the receiver as 0.
    #[error("argument {unsafe_position} is stack-only but argument {ref_position} is a reference the caller owns")]
    MixedRefUnsafeArguments {
        ref_position: usize,
        unsafe_position: usize,
    },

    /// Stored value does not live as long as the target's storage.
    #[error("cannot store {actual} value {}; the target needs at least {required}", store_word(.mode))]
    EscapingAssignment {
        mode: Access,
        required: EscapeLevel,
        actual: EscapeLevel,
    },
}

fn return_word(mode: &Access) -> &'static str {
    match mode {
        Access::Value => "by value",
        Access::Ref => "by reference",
    }
}

fn store_word(mode: &Access) -> &'static str {
    match mode {
        Access::Value => "here",
        Access::Ref => "by reference here",
    }
}

/// The tree handed over by the front end is not a tree the checker can
/// evaluate. This is a front end bug, not a property of the program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedTree {
    #[error("root {root} is not a node of a {len}-node body")]
    MissingRoot { root: ExprId, len: usize },

    #[error("node {parent} refers to missing child {child}")]
    DanglingChild { parent: ExprId, child: ExprId },

    #[error("node {node} is reachable more than once")]
    SharedNode { node: ExprId },

    #[error("assignment {node} targets a {found}, which is not a place")]
    NotAPlace { node: ExprId, found: &'static str },

    #[error("node {node} is nested deeper than {limit} levels")]
    TooDeep { node: ExprId, limit: usize },
}

impl MalformedTree {
    /// Node the problem was found at.
    pub fn node(&self) -> ExprId {
        match self {
            MalformedTree::MissingRoot { root, .. } => *root,
            MalformedTree::DanglingChild { parent, .. } => *parent,
            MalformedTree::SharedNode { node }
            | MalformedTree::NotAPlace { node, .. }
            | MalformedTree::TooDeep { node, .. } => *node,
        }
    }
}
