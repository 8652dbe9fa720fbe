// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Evaluation state: resolved values, place roots, local scopes, node paths.

use std::collections::HashMap;

use crate::level::EscapeLevel;

/// Child positions from the body's root down to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodePath(pub Vec<u32>);

impl NodePath {
    pub fn steps(&self) -> &[u32] {
        &self.0
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        let steps: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{}", steps.join("."))
    }
}

/// Storage a place expression is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Root {
    /// A by-reference parameter: the caller owns the storage.
    RefParam(String),
    /// A local or by-value parameter: the storage is this frame.
    Local(String),
    /// Call results and other values with no storage of their own.
    Temporary,
}

/// What evaluating one node produced.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub level: EscapeLevel,
    pub shape: Option<String>,
    pub root: Root,
    /// Set when the value is a reference into a receiver's own field;
    /// holds the member that produced it.
    pub self_field: Option<String>,
    /// Already diagnosed. Evaluates as `StackOnly` without further reports.
    pub poisoned: bool,
}

impl Resolved {
    pub fn value(level: EscapeLevel, shape: Option<String>) -> Self {
        Self { level, shape, root: Root::Temporary, self_field: None, poisoned: false }
    }

    pub fn unit() -> Self {
        Self::value(EscapeLevel::Heap, None)
    }

    pub fn poisoned() -> Self {
        Self {
            level: EscapeLevel::StackOnly,
            shape: None,
            root: Root::Temporary,
            self_field: None,
            poisoned: true,
        }
    }

    pub fn is_ref_param_place(&self) -> bool {
        matches!(self.root, Root::RefParam(_))
    }
}

/// A name introduced by `Let` inside the body.
#[derive(Debug, Clone)]
pub struct Local {
    pub level: EscapeLevel,
    pub shape: Option<String>,
    pub poisoned: bool,
}

/// Stack of block scopes holding body-local names.
#[derive(Debug, Default)]
pub struct Scopes {
    frames: Vec<HashMap<String, Local>>,
}

impl Scopes {
    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Declares in the innermost scope, opening one if none is open.
    pub fn declare(&mut self, name: String, local: Local) {
        if self.frames.is_empty() {
            self.push();
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name, local);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Local> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().flat_map(|frame| frame.keys().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display() {
        assert_eq!(NodePath::default().to_string(), "<root>");
        assert_eq!(NodePath(vec![2, 0, 1]).to_string(), "2.0.1");
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let mut scopes = Scopes::default();
        scopes.push();
        scopes.declare("x".into(), Local { level: EscapeLevel::Heap, shape: None, poisoned: false });
        scopes.push();
        scopes.declare("x".into(), Local { level: EscapeLevel::StackOnly, shape: None, poisoned: false });
        assert_eq!(scopes.lookup("x").map(|l| l.level), Some(EscapeLevel::StackOnly));
        scopes.pop();
        assert_eq!(scopes.lookup("x").map(|l| l.level), Some(EscapeLevel::Heap));
        scopes.pop();
        assert!(scopes.lookup("x").is_none());
    }
}
