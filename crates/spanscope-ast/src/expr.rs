// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression nodes.

use crate::{ExprId, Span};

/// A node in a function body.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Whether a value moves by copy or a reference to its storage is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Access {
    Value,
    Ref,
}

/// Where an allocation expression places its memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    /// `stackalloc T[n]`
    Stack,
    /// `new T[n]`
    Heap,
}

/// The kind of expression.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    /// Plain data (numbers, unit values)
    Literal,
    /// Fresh buffer, optionally typed with a shape name
    Alloc {
        region: Region,
        shape: Option<String>,
    },
    /// Variable or parameter reference
    Var(String),
    /// Field access `base.field`
    Field {
        base: ExprId,
        field: String,
    },
    /// Method call `receiver.method(args)`
    MethodCall {
        receiver: ExprId,
        method: String,
        args: Vec<ExprId>,
    },
    /// Indexer `base[index]`, by value or by reference
    Index {
        base: ExprId,
        index: ExprId,
        access: Access,
    },
    /// Sub-slicing `base.Slice(args)`
    Slice {
        base: ExprId,
        args: Vec<ExprId>,
    },
    /// `target = value` or `target = ref value`
    Assign {
        target: ExprId,
        value: ExprId,
        mode: Access,
    },
    /// `new Shape(args)`
    Construct {
        shape: String,
        args: Vec<ExprId>,
    },
    /// Local declaration, visible to the rest of the enclosing block
    Let {
        name: String,
        init: ExprId,
    },
    /// Statement sequence; evaluates to its last element
    Block(Vec<ExprId>),
    /// `return value` or `return ref value`
    Return {
        value: ExprId,
        mode: Access,
    },
}

impl ExprKind {
    /// Child nodes in evaluation order. A child's position in this list is
    /// its step in a node path.
    pub fn children(&self) -> Vec<ExprId> {
        match self {
            ExprKind::Literal | ExprKind::Alloc { .. } | ExprKind::Var(_) => Vec::new(),
            ExprKind::Field { base, .. } => vec![*base],
            ExprKind::MethodCall { receiver, args, .. } => {
                std::iter::once(*receiver).chain(args.iter().copied()).collect()
            }
            ExprKind::Index { base, index, .. } => vec![*base, *index],
            ExprKind::Slice { base, args } => {
                std::iter::once(*base).chain(args.iter().copied()).collect()
            }
            ExprKind::Assign { target, value, .. } => vec![*target, *value],
            ExprKind::Construct { args, .. } => args.clone(),
            ExprKind::Let { init, .. } => vec![*init],
            ExprKind::Block(stmts) => stmts.clone(),
            ExprKind::Return { value, .. } => vec![*value],
        }
    }

    /// Places denote storage: variables, fields of places, and indexers.
    pub fn is_place(&self) -> bool {
        matches!(self, ExprKind::Var(_) | ExprKind::Field { .. } | ExprKind::Index { .. })
    }

    /// Short node name for logs and diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            ExprKind::Literal => "literal",
            ExprKind::Alloc { region: Region::Stack, .. } => "stack allocation",
            ExprKind::Alloc { region: Region::Heap, .. } => "heap allocation",
            ExprKind::Var(_) => "variable",
            ExprKind::Field { .. } => "field access",
            ExprKind::MethodCall { .. } => "method call",
            ExprKind::Index { access: Access::Value, .. } => "indexer",
            ExprKind::Index { access: Access::Ref, .. } => "ref indexer",
            ExprKind::Slice { .. } => "slice",
            ExprKind::Assign { .. } => "assignment",
            ExprKind::Construct { .. } => "constructor call",
            ExprKind::Let { .. } => "local declaration",
            ExprKind::Block(_) => "block",
            ExprKind::Return { mode: Access::Value, .. } => "return",
            ExprKind::Return { mode: Access::Ref, .. } => "ref return",
        }
    }
}

/// One function body: a node arena plus the root node.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Body {
    pub name: String,
    nodes: Vec<Expr>,
    root: ExprId,
}

impl Body {
    /// Assemble a body from a front end's node list. Nothing is validated
    /// here; the checker rejects dangling or shared children.
    pub fn from_parts(name: impl Into<String>, nodes: Vec<Expr>, root: ExprId) -> Self {
        Self { name: name.into(), nodes, root }
    }

    pub fn root(&self) -> ExprId {
        self.root
    }

    pub fn get(&self, id: ExprId) -> Option<&Expr> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
