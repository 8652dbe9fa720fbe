// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression trees for the spanscope escape checker.
//!
//! A checked unit is one function body, stored as an arena of nodes.
//! Children are referenced by [`ExprId`], so a front end can hand over a
//! flat node list and the checker can validate it before evaluation.

pub mod span;
pub mod expr;
pub mod builder;

pub use span::{Span, LineIndex};
pub use expr::{Access, Body, Expr, ExprKind, Region};
pub use builder::BodyBuilder;

/// Index of a node inside its [`Body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExprId(pub u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ExprId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
