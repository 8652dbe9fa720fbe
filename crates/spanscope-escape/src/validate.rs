// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Structural validation run before evaluation.
//!
//! The walk is iterative so that a cyclic or absurdly deep input is rejected
//! without recursing into it.

use spanscope_ast::{Body, ExprId, ExprKind};

use crate::error::MalformedTree;

pub fn validate(body: &Body, max_depth: usize) -> Result<(), MalformedTree> {
    let root = body.root();
    if body.get(root).is_none() {
        return Err(MalformedTree::MissingRoot { root, len: body.len() });
    }

    let mut seen = vec![false; body.len()];
    let mut stack = vec![(root, 0usize)];

    while let Some((id, depth)) = stack.pop() {
        if depth > max_depth {
            return Err(MalformedTree::TooDeep { node: id, limit: max_depth });
        }
        // Only ids that exist are ever pushed.
        let Some(expr) = body.get(id) else { continue };
        if std::mem::replace(&mut seen[id.index()], true) {
            return Err(MalformedTree::SharedNode { node: id });
        }

        let children = expr.kind.children();
        for &child in &children {
            if body.get(child).is_none() {
                return Err(MalformedTree::DanglingChild { parent: id, child });
            }
        }
        if let ExprKind::Assign { target, .. } = &expr.kind {
            check_place(body, id, *target)?;
        }
        stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
    }
    Ok(())
}

fn check_place(body: &Body, assign: ExprId, target: ExprId) -> Result<(), MalformedTree> {
    match body.get(target) {
        Some(expr) if expr.kind.is_place() => Ok(()),
        Some(expr) => Err(MalformedTree::NotAPlace { node: assign, found: expr.kind.describe() }),
        None => Err(MalformedTree::DanglingChild { parent: assign, child: target }),
    }
}
