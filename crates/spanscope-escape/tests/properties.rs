// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Whole-checker properties: determinism, monotonicity, composite levels,
//! diagnostics collection, and malformed input.

mod common;

use std::collections::HashSet;
use std::mem::Discriminant;

use common::{check, kinds, locals, shapes};
use spanscope_ast::{Access, Body, BodyBuilder, Expr, ExprId, ExprKind, Span};
use spanscope_escape::{
    check_escapes, check_escapes_with, Binding, Bindings, EscapeConfig, EscapeErrorKind,
    EscapeLevel, EscapeReport, MalformedTree,
};

/// A body exercising every rule that compares levels.
///
/// ```text
/// {
///     return a.GetSpanVal();
///     return ref b.f[0];
///     p.f = c.f;
///     p.Assign(b);
///     return new MySpanLike(a.f, c.f);
///     return ref c.GetTRef();
/// }
/// ```
fn mixed_body() -> Body {
    let mut b = BodyBuilder::new("mixed");
    let a = b.var("a");
    let get = b.call(a, "GetSpanVal", vec![]);
    let r0 = b.ret(get);

    let bv = b.var("b");
    let f = b.field(bv, "f");
    let zero = b.literal();
    let elem = b.index_ref(f, zero);
    let r1 = b.ret_ref(elem);

    let p = b.var("p");
    let pf = b.field(p, "f");
    let c = b.var("c");
    let cf = b.field(c, "f");
    let store = b.assign(pf, cf);

    let p = b.var("p");
    let bv = b.var("b");
    let assign = b.call(p, "Assign", vec![bv]);

    let a = b.var("a");
    let af = b.field(a, "f");
    let c = b.var("c");
    let cf = b.field(c, "f");
    let ctor = b.construct("MySpanLike", vec![af, cf]);
    let r2 = b.ret(ctor);

    let c = b.var("c");
    let tref = b.call(c, "GetTRef", vec![]);
    let r3 = b.ret_ref(tref);

    let block = b.block(vec![r0, r1, store, assign, r2, r3]);
    b.finish(block)
}

fn bindings(a: EscapeLevel, b: EscapeLevel, c: EscapeLevel, p: EscapeLevel) -> Bindings {
    Bindings::new()
        .with("a", Binding::local(a).with_shape("MySpanLike"))
        .with("b", Binding::ref_param(b).with_shape("MySpanLike"))
        .with("c", Binding::local(c).with_shape("MySpanLike"))
        .with("p", Binding::ref_param(p).with_shape("MySpanLike"))
}

fn diagnostic_set(report: &EscapeReport) -> HashSet<(ExprId, Discriminant<EscapeErrorKind>)> {
    report
        .errors
        .iter()
        .map(|e| (e.node, std::mem::discriminant(&e.kind)))
        .collect()
}

fn all_assignments() -> Vec<[EscapeLevel; 4]> {
    let mut out = Vec::new();
    for a in EscapeLevel::ALL {
        for b in EscapeLevel::ALL {
            for c in EscapeLevel::ALL {
                for p in EscapeLevel::ALL {
                    out.push([a, b, c, p]);
                }
            }
        }
    }
    out
}

#[test]
fn checking_twice_gives_identical_reports() {
    let body = mixed_body();
    for [a, b, c, p] in all_assignments() {
        let env = bindings(a, b, c, p);
        assert_eq!(check(&body, &env), check(&body, &env));
    }
}

#[test]
fn lowering_a_binding_never_removes_a_diagnostic() {
    let body = mixed_body();
    let levels = all_assignments();
    let reports: Vec<_> = levels
        .iter()
        .map(|&[a, b, c, p]| diagnostic_set(&check(&body, &bindings(a, b, c, p))))
        .collect();

    for (i, low) in levels.iter().enumerate() {
        for (j, high) in levels.iter().enumerate() {
            let pointwise_lower = low.iter().zip(high).all(|(l, h)| l <= h);
            if pointwise_lower {
                assert!(
                    reports[j].is_subset(&reports[i]),
                    "raising {low:?} to {high:?} added diagnostics"
                );
            }
        }
    }
}

#[test]
fn all_heap_body_only_reports_structural_errors() {
    use EscapeLevel::Heap;
    let report = check(&mixed_body(), &bindings(Heap, Heap, Heap, Heap));
    assert!(report.is_ok(), "{:?}", report.errors);
}

#[test]
fn all_stack_body_collects_every_violation() {
    use EscapeLevel::StackOnly;
    let report = check(&mixed_body(), &bindings(StackOnly, StackOnly, StackOnly, StackOnly));
    let summary: Vec<(String, &'static str)> = report
        .errors
        .iter()
        .map(|e| {
            let kind = match &e.kind {
                EscapeErrorKind::NotReturnable { .. } => "not-returnable",
                EscapeErrorKind::EscapingAssignment { .. } => "escaping-assignment",
                EscapeErrorKind::MixedRefUnsafeArguments { .. } => "mixed",
                _ => "other",
            };
            (e.path.to_string(), kind)
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("0".to_string(), "not-returnable"),
            ("1".to_string(), "not-returnable"),
            ("2".to_string(), "escaping-assignment"),
            ("3".to_string(), "mixed"),
            ("4".to_string(), "not-returnable"),
        ]
    );
}

#[test]
fn construct_is_min_of_its_arguments() {
    for x in EscapeLevel::ALL {
        for y in EscapeLevel::ALL {
            let mut b = BodyBuilder::new("ctor");
            let xv = b.var("x");
            let yv = b.var("y");
            let ctor = b.construct("MySpanLike", vec![xv, yv]);
            let body = b.finish(ctor);
            let env = Bindings::new()
                .with("x", Binding::local(x))
                .with("y", Binding::local(y));
            assert_eq!(check(&body, &env).level_of(ctor), Some(x.min(y)));
        }
    }
}

#[test]
fn field_is_never_safer_than_its_receiver_or_declaration() {
    let shapes = shapes().with(
        spanscope_escape::ValueShape::new("Capped").field("inner", EscapeLevel::RefScoped, None),
    );
    for recv in EscapeLevel::ALL {
        let mut b = BodyBuilder::new("field");
        let v = b.var("v");
        let field = b.field(v, "inner");
        let body = b.finish(field);
        let env = Bindings::new().with("v", Binding::local(recv).with_shape("Capped"));
        let report = check_escapes(&body, &env, &shapes).unwrap();
        assert_eq!(report.level_of(field), Some(recv.min(EscapeLevel::RefScoped)));
    }
}

#[test]
fn reports_are_independent_across_threads() {
    let body = mixed_body();
    let env = bindings(
        EscapeLevel::StackOnly,
        EscapeLevel::RefScoped,
        EscapeLevel::ValueScoped,
        EscapeLevel::Heap,
    );
    let shapes = shapes();
    let expected = check_escapes(&body, &env, &shapes).unwrap();
    let (body, env, shapes) = (&body, &env, &shapes);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(move || check_escapes(body, env, shapes).unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

// ── Diagnostics and recovery ────────────────────────────────

#[test]
fn unknown_binding_lists_visible_names_and_does_not_cascade() {
    let mut b = BodyBuilder::new("f");
    let missing = b.var("notsaef");
    let call = b.call(missing, "GetTVal", vec![]);
    let ret = b.ret(call);
    let body = b.finish(ret);

    let report = check(&body, &locals());
    assert_eq!(
        kinds(&report),
        vec![EscapeErrorKind::UnknownBinding {
            name: "notsaef".into(),
            in_scope: vec!["notsafe".into(), "safe".into()],
        }]
    );
    assert_eq!(report.errors[0].path.to_string(), "0.0");
    assert_eq!(report.level_of(call), Some(EscapeLevel::StackOnly));
}

#[test]
fn unknown_member_lists_candidates() {
    let mut b = BodyBuilder::new("f");
    let safe = b.var("safe");
    let call = b.call(safe, "GetVal", vec![]);
    let body = b.finish(call);

    let report = check(&body, &locals());
    match &report.errors[..] {
        [err] => match &err.kind {
            EscapeErrorKind::UnknownMember { shape, member, candidates } => {
                assert_eq!(shape, "MySpanLike");
                assert_eq!(member, "GetVal");
                assert!(candidates.contains(&"GetTVal".to_string()));
            }
            other => panic!("unexpected {other:?}"),
        },
        other => panic!("expected one error, got {other:?}"),
    }
}

#[test]
fn unknown_shape_in_constructor() {
    let mut b = BodyBuilder::new("f");
    let ctor = b.construct("Spam", vec![]);
    let body = b.finish(ctor);
    let report = check(&body, &locals());
    assert!(matches!(
        &report.errors[0].kind,
        EscapeErrorKind::UnknownShape { name, .. } if name == "Spam"
    ));
}

#[test]
fn arguments_are_still_checked_when_receiver_is_unknown() {
    let mut b = BodyBuilder::new("f");
    let missing = b.var("nothing");
    let also_missing = b.var("nobody");
    let call = b.call(missing, "Assign", vec![also_missing]);
    let body = b.finish(call);
    assert_eq!(check(&body, &locals()).errors.len(), 2);
}

// ── Assignments ─────────────────────────────────────────────

fn store(target_root: &str, source: &str, mode: Access) -> Body {
    let mut b = BodyBuilder::new("store");
    let t = b.var(target_root);
    let tf = b.field(t, "f");
    let s = b.var(source);
    let sf = b.field(s, "f");
    let assign = match mode {
        Access::Value => b.assign(tf, sf),
        Access::Ref => b.assign_ref(tf, sf),
    };
    b.finish(assign)
}

#[test]
fn storing_stack_data_into_caller_storage_is_rejected() {
    let env = locals().with("out", Binding::ref_param(EscapeLevel::Heap).with_shape("MySpanLike"));
    let report = check(&store("out", "notsafe", Access::Value), &env);
    assert_eq!(
        kinds(&report),
        vec![EscapeErrorKind::EscapingAssignment {
            mode: Access::Value,
            required: EscapeLevel::ValueScoped,
            actual: EscapeLevel::StackOnly,
        }]
    );
    assert!(check(&store("out", "safe", Access::Value), &env).is_ok());
}

fn store_element(target_root: &str, source: &str) -> Body {
    let mut b = BodyBuilder::new("store_element");
    let t = b.var(target_root);
    let tf = b.field(t, "f");
    let zero = b.literal();
    let elem = b.index(tf, zero);
    let s = b.var(source);
    let sf = b.field(s, "f");
    let assign = b.assign(elem, sf);
    b.finish(assign)
}

#[test]
fn storing_stack_data_into_a_caller_element_is_rejected() {
    let env = locals().with("out", Binding::ref_param(EscapeLevel::Heap).with_shape("MySpanLike"));
    let report = check(&store_element("out", "notsafe"), &env);
    assert_eq!(
        kinds(&report),
        vec![EscapeErrorKind::EscapingAssignment {
            mode: Access::Value,
            required: EscapeLevel::ValueScoped,
            actual: EscapeLevel::StackOnly,
        }]
    );
    assert_eq!(report.errors[0].path, spanscope_escape::NodePath::default());
    assert!(check(&store_element("out", "safe"), &env).is_ok());
}

#[test]
fn storing_stack_data_into_a_local_element_is_fine() {
    assert!(check(&store_element("safe", "notsafe"), &locals()).is_ok());
}

#[test]
fn storing_into_a_local_never_fails_by_value() {
    let report = check(&store("safe", "notsafe", Access::Value), &locals());
    assert!(report.is_ok());
}

#[test]
fn ref_assignment_needs_ref_scoped_source() {
    let report = check(&store("safe", "notsafe", Access::Ref), &locals());
    assert_eq!(
        kinds(&report),
        vec![EscapeErrorKind::EscapingAssignment {
            mode: Access::Ref,
            required: EscapeLevel::RefScoped,
            actual: EscapeLevel::StackOnly,
        }]
    );
}

// ── Ref returns of places ───────────────────────────────────

#[test]
fn ref_return_of_local_storage_is_rejected_even_when_heap() {
    let mut b = BodyBuilder::new("f");
    let safe = b.var("safe");
    let f = b.field(safe, "f");
    let ret = b.ret_ref(f);
    let body = b.finish(ret);
    let report = check(&body, &locals());
    assert_eq!(report.errors[0].actual_level(), Some(EscapeLevel::StackOnly));
    assert_eq!(report.errors[0].required_level(), Some(EscapeLevel::RefScoped));
}

#[test]
fn ref_return_of_ref_parameter_field_is_allowed() {
    let mut b = BodyBuilder::new("f");
    let p = b.var("p");
    let f = b.field(p, "f");
    let ret = b.ret_ref(f);
    let body = b.finish(ret);
    let env = Bindings::new().with("p", Binding::ref_param(EscapeLevel::RefScoped).with_shape("MySpanLike"));
    assert!(check(&body, &env).is_ok());
}

#[test]
fn ref_indexer_into_heap_span_is_returnable() {
    let mut b = BodyBuilder::new("f");
    let safe = b.var("safe");
    let f = b.field(safe, "f");
    let zero = b.literal();
    let elem = b.index_ref(f, zero);
    let ret = b.ret_ref(elem);
    let body = b.finish(ret);
    assert!(check(&body, &locals()).is_ok());
}

// ── Malformed input ─────────────────────────────────────────

#[test]
fn malformed_trees_are_rejected_before_evaluation() {
    let body = Body::from_parts(
        "broken",
        vec![Expr {
            kind: ExprKind::Return { value: ExprId(3), mode: Access::Value },
            span: Span::default(),
        }],
        ExprId(0),
    );
    assert_eq!(
        check_escapes(&body, &locals(), &shapes()),
        Err(MalformedTree::DanglingChild { parent: ExprId(0), child: ExprId(3) })
    );
}

#[test]
fn depth_limit_comes_from_config() {
    let mut b = BodyBuilder::new("deep");
    let mut e = b.var("safe");
    for _ in 0..10 {
        e = b.field(e, "f");
    }
    let body = b.finish(e);
    let config = EscapeConfig::default().max_depth(5);
    let err = check_escapes_with(&body, &locals(), &shapes(), &config).unwrap_err();
    assert!(matches!(err, MalformedTree::TooDeep { limit: 5, .. }));
}
