// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Incremental construction of a [`Body`].
//!
//! Each method appends one node and returns its id, so children always exist
//! before their parent. Front ends that already have spans use [`BodyBuilder::at`].

use crate::expr::{Access, Body, Expr, ExprKind, Region};
use crate::{ExprId, Span};

pub struct BodyBuilder {
    name: String,
    nodes: Vec<Expr>,
    span: Span,
}

impl BodyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), nodes: Vec::new(), span: Span::default() }
    }

    /// Span attached to the nodes created from now on.
    pub fn at(&mut self, span: Span) -> &mut Self {
        self.span = span;
        self
    }

    pub fn push(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(Expr { kind, span: self.span });
        id
    }

    pub fn literal(&mut self) -> ExprId {
        self.push(ExprKind::Literal)
    }

    pub fn stackalloc(&mut self, shape: &str) -> ExprId {
        self.push(ExprKind::Alloc { region: Region::Stack, shape: Some(shape.to_string()) })
    }

    pub fn heap_alloc(&mut self, shape: &str) -> ExprId {
        self.push(ExprKind::Alloc { region: Region::Heap, shape: Some(shape.to_string()) })
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        self.push(ExprKind::Var(name.to_string()))
    }

    pub fn field(&mut self, base: ExprId, field: &str) -> ExprId {
        self.push(ExprKind::Field { base, field: field.to_string() })
    }

    pub fn call(&mut self, receiver: ExprId, method: &str, args: Vec<ExprId>) -> ExprId {
        self.push(ExprKind::MethodCall { receiver, method: method.to_string(), args })
    }

    pub fn index(&mut self, base: ExprId, index: ExprId) -> ExprId {
        self.push(ExprKind::Index { base, index, access: Access::Value })
    }

    pub fn index_ref(&mut self, base: ExprId, index: ExprId) -> ExprId {
        self.push(ExprKind::Index { base, index, access: Access::Ref })
    }

    pub fn slice(&mut self, base: ExprId, args: Vec<ExprId>) -> ExprId {
        self.push(ExprKind::Slice { base, args })
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        self.push(ExprKind::Assign { target, value, mode: Access::Value })
    }

    pub fn assign_ref(&mut self, target: ExprId, value: ExprId) -> ExprId {
        self.push(ExprKind::Assign { target, value, mode: Access::Ref })
    }

    pub fn construct(&mut self, shape: &str, args: Vec<ExprId>) -> ExprId {
        self.push(ExprKind::Construct { shape: shape.to_string(), args })
    }

    pub fn let_(&mut self, name: &str, init: ExprId) -> ExprId {
        self.push(ExprKind::Let { name: name.to_string(), init })
    }

    pub fn block(&mut self, stmts: Vec<ExprId>) -> ExprId {
        self.push(ExprKind::Block(stmts))
    }

    pub fn ret(&mut self, value: ExprId) -> ExprId {
        self.push(ExprKind::Return { value, mode: Access::Value })
    }

    pub fn ret_ref(&mut self, value: ExprId) -> ExprId {
        self.push(ExprKind::Return { value, mode: Access::Ref })
    }

    /// Finish with `root` as the body's entry node.
    pub fn finish(self, root: ExprId) -> Body {
        Body::from_parts(self.name, self.nodes, root)
    }
}
