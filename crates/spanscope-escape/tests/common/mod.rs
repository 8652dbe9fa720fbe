// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Shared fixtures: a `Span` and the span-like struct wrapping it.

#![allow(dead_code)]

use spanscope_ast::{Access, Body, BodyBuilder, ExprId};
use spanscope_escape::{
    check_escapes, Binding, Bindings, EscapeErrorKind, EscapeLevel, EscapeReport, MemberSig,
    ReturnKind, ShapeRegistry, ValueShape,
};

pub fn shapes() -> ShapeRegistry {
    ShapeRegistry::new()
        .with(
            ValueShape::new("Span")
                .with_indexer(None, ReturnKind::Ref)
                .method(MemberSig::new("Slice", ReturnKind::Value).readonly().returning("Span")),
        )
        .with(
            ValueShape::new("MySpanLike")
                .field("f", EscapeLevel::Heap, Some("Span"))
                .method(MemberSig::new("GetTVal", ReturnKind::Value))
                .method(MemberSig::new("GetTRef", ReturnKind::RefIndependent))
                .method(MemberSig::new("GetSpanVal", ReturnKind::Value).returning("Span"))
                .method(
                    MemberSig::new("GetSpanRef", ReturnKind::RefToSelfField)
                        .params([Access::Ref])
                        .returning("Span"),
                )
                .method(MemberSig::new("Assign", ReturnKind::Unit)),
        )
}

/// `safe` wraps a heap array, `notsafe` wraps a stackalloc.
pub fn locals() -> Bindings {
    Bindings::new()
        .with("safe", Binding::local(EscapeLevel::Heap).with_shape("MySpanLike"))
        .with("notsafe", Binding::local(EscapeLevel::StackOnly).with_shape("MySpanLike"))
}

/// `safe` is a by-reference parameter instead of a local.
pub fn ref_param_safe() -> Bindings {
    Bindings::new()
        .with("safe", Binding::ref_param(EscapeLevel::RefScoped).with_shape("MySpanLike"))
        .with("notsafe", Binding::local(EscapeLevel::StackOnly).with_shape("MySpanLike"))
}

/// Body holding a single `return recv.method()` (or `return ref`).
pub fn return_call(recv: &str, method: &str, mode: Access) -> (Body, ExprId) {
    let mut b = BodyBuilder::new(format!("return_{recv}_{method}"));
    let r = b.var(recv);
    let call = b.call(r, method, vec![]);
    let ret = match mode {
        Access::Value => b.ret(call),
        Access::Ref => b.ret_ref(call),
    };
    (b.finish(ret), ret)
}

pub fn check(body: &Body, bindings: &Bindings) -> EscapeReport {
    check_escapes(body, bindings, &shapes()).expect("well-formed body")
}

pub fn kinds(report: &EscapeReport) -> Vec<EscapeErrorKind> {
    report.errors.iter().map(|e| e.kind.clone()).collect()
}
