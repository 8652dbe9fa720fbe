// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Returnability checking for stack-referring values.
//!
//! This crate decides, for one function body, whether values that may point
//! into a call frame escape it:
//! - Every node resolves to an [`EscapeLevel`], the minimum of its parts
//! - Returns, stores into caller-owned places, and call sites are checked
//!   against the level they need
//! - Every violation in the body is reported in one pass

mod binding;
mod config;
mod error;
mod level;
mod shape;
mod state;
mod validate;

pub use binding::{Binding, Bindings};
pub use config::EscapeConfig;
pub use error::{EscapeError, EscapeErrorKind, MalformedTree};
pub use level::EscapeLevel;
pub use shape::{FieldDecl, Indexer, MemberSig, ReturnKind, ShapeRegistry, ValueShape};
pub use state::NodePath;

use spanscope_ast::{Access, Body, ExprId, ExprKind, Region};

use state::{Local, Resolved, Root, Scopes};

/// Result of checking one body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeReport {
    pub body: String,
    /// Diagnostics in evaluation order.
    pub errors: Vec<EscapeError>,
    levels: Vec<Option<EscapeLevel>>,
}

impl EscapeReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Level a node resolved to. `None` for nodes not reachable from the root.
    pub fn level_of(&self, id: ExprId) -> Option<EscapeLevel> {
        self.levels.get(id.index()).copied().flatten()
    }
}

/// Escape checker for a single body.
pub struct EscapeChecker<'a> {
    body: &'a Body,
    bindings: &'a Bindings,
    shapes: &'a ShapeRegistry,
    config: &'a EscapeConfig,
    /// Names declared by `Let` inside the body.
    scopes: Scopes,
    /// Child positions from the root to the node being evaluated.
    path: Vec<u32>,
    levels: Vec<Option<EscapeLevel>>,
    errors: Vec<EscapeError>,
}

impl<'a> EscapeChecker<'a> {
    pub fn new(
        body: &'a Body,
        bindings: &'a Bindings,
        shapes: &'a ShapeRegistry,
        config: &'a EscapeConfig,
    ) -> Self {
        Self {
            body,
            bindings,
            shapes,
            config,
            scopes: Scopes::default(),
            path: Vec::new(),
            levels: vec![None; body.len()],
            errors: Vec::new(),
        }
    }

    /// Validate the tree, then evaluate it bottom-up once.
    pub fn check(mut self) -> Result<EscapeReport, MalformedTree> {
        let _span = tracing::debug_span!(
            "escape_check",
            body = %self.body.name,
            nodes = self.body.len()
        )
        .entered();

        validate::validate(self.body, self.config.max_depth)?;
        self.eval(self.body.root());

        tracing::debug!(errors = self.errors.len(), "escape check finished");
        Ok(EscapeReport {
            body: self.body.name.clone(),
            errors: self.errors,
            levels: self.levels,
        })
    }

    fn eval(&mut self, id: ExprId) -> Resolved {
        let body = self.body;
        let Some(expr) = body.get(id) else {
            return Resolved::poisoned();
        };

        let resolved = match &expr.kind {
            ExprKind::Literal => Resolved::unit(),

            ExprKind::Alloc { region, shape } => {
                let level = match region {
                    Region::Stack => EscapeLevel::StackOnly,
                    Region::Heap => EscapeLevel::Heap,
                };
                match shape {
                    Some(name) => match self.lookup_shape(id, name) {
                        Some(s) => Resolved::value(level.meet(s.composite_level()), Some(name.clone())),
                        None => Resolved::poisoned(),
                    },
                    None => Resolved::value(level, None),
                }
            }

            ExprKind::Var(name) => self.eval_var(id, name),

            ExprKind::Field { base, field } => {
                let base = self.eval_child(0, *base);
                self.eval_field(id, base, field)
            }

            ExprKind::MethodCall { receiver, method, args } => {
                let recv = self.eval_child(0, *receiver);
                let args: Vec<Resolved> = args
                    .iter()
                    .enumerate()
                    .map(|(i, a)| self.eval_child(i + 1, *a))
                    .collect();
                self.eval_method_call(id, recv, method, &args)
            }

            ExprKind::Index { base, index, access } => {
                let base = self.eval_child(0, *base);
                let index = self.eval_child(1, *index);
                self.eval_index(id, base, index, *access)
            }

            ExprKind::Slice { base, args } => {
                let base = self.eval_child(0, *base);
                for (i, a) in args.iter().enumerate() {
                    self.eval_child(i + 1, *a);
                }
                // No promise of independence: a slice is a view of its receiver.
                if base.poisoned {
                    Resolved::poisoned()
                } else {
                    Resolved::value(base.level, base.shape)
                }
            }

            ExprKind::Assign { target, value, mode } => {
                let target = self.eval_child(0, *target);
                let value = self.eval_child(1, *value);
                self.check_assignment(id, &target, &value, *mode);
                Resolved::unit()
            }

            ExprKind::Construct { shape, args } => {
                let args: Vec<Resolved> = args
                    .iter()
                    .enumerate()
                    .map(|(i, a)| self.eval_child(i, *a))
                    .collect();
                match self.lookup_shape(id, shape) {
                    Some(_) if args.iter().any(|a| a.poisoned) => Resolved::poisoned(),
                    Some(s) => {
                        let level = EscapeLevel::meet_all(args.iter().map(|a| a.level))
                            .meet(s.composite_level());
                        Resolved::value(level, Some(shape.clone()))
                    }
                    None => Resolved::poisoned(),
                }
            }

            ExprKind::Let { name, init } => {
                let init = self.eval_child(0, *init);
                self.scopes.declare(
                    name.clone(),
                    Local { level: init.level, shape: init.shape, poisoned: init.poisoned },
                );
                Resolved::unit()
            }

            ExprKind::Block(stmts) => {
                self.scopes.push();
                let mut last = Resolved::unit();
                for (i, s) in stmts.iter().enumerate() {
                    last = self.eval_child(i, *s);
                }
                self.scopes.pop();
                last
            }

            ExprKind::Return { value, mode } => {
                let value = self.eval_child(0, *value);
                self.check_return(id, &value, *mode);
                Resolved::unit()
            }
        };

        tracing::trace!(
            node = %id,
            kind = expr.kind.describe(),
            level = %resolved.level,
            poisoned = resolved.poisoned,
            "resolved"
        );
        self.levels[id.index()] = Some(resolved.level);
        resolved
    }

    fn eval_child(&mut self, position: usize, id: ExprId) -> Resolved {
        self.path.push(position as u32);
        let resolved = self.eval(id);
        self.path.pop();
        resolved
    }

    fn eval_var(&mut self, id: ExprId, name: &str) -> Resolved {
        if let Some(local) = self.scopes.lookup(name) {
            if local.poisoned {
                return Resolved::poisoned();
            }
            return Resolved {
                level: local.level,
                shape: local.shape.clone(),
                root: Root::Local(name.to_string()),
                self_field: None,
                poisoned: false,
            };
        }

        match self.bindings.get(name) {
            Some(binding) => Resolved {
                level: binding.level,
                shape: binding.shape.clone(),
                root: if binding.is_ref_param {
                    Root::RefParam(name.to_string())
                } else {
                    Root::Local(name.to_string())
                },
                self_field: None,
                poisoned: false,
            },
            None => {
                let mut in_scope: Vec<String> = self.bindings.names().map(str::to_string).collect();
                in_scope.extend(self.scopes.names().map(str::to_string));
                in_scope.sort();
                in_scope.dedup();
                self.report(id, EscapeErrorKind::UnknownBinding { name: name.to_string(), in_scope });
                Resolved::poisoned()
            }
        }
    }

    /// A field is never safer than the receiver that produced it.
    fn eval_field(&mut self, id: ExprId, base: Resolved, field: &str) -> Resolved {
        if base.poisoned {
            return Resolved::poisoned();
        }
        let Some(shape) = self.shape_of(id, &base, field) else {
            return Resolved::poisoned();
        };
        match shape.get_field(field) {
            Some(decl) => Resolved {
                level: base.level.meet(decl.level),
                shape: decl.shape.clone(),
                root: base.root,
                self_field: None,
                poisoned: false,
            },
            None => {
                self.unknown_member(id, shape, field);
                Resolved::poisoned()
            }
        }
    }

    fn eval_method_call(
        &mut self,
        id: ExprId,
        recv: Resolved,
        method: &str,
        args: &[Resolved],
    ) -> Resolved {
        if recv.poisoned {
            return Resolved::poisoned();
        }
        let Some(shape) = self.shape_of(id, &recv, method) else {
            return Resolved::poisoned();
        };
        let Some(sig) = shape.get_method(method) else {
            self.unknown_member(id, shape, method);
            return Resolved::poisoned();
        };

        let positions: Vec<(Access, &Resolved)> = std::iter::once((sig.receiver, &recv))
            .chain(args.iter().enumerate().map(|(i, a)| (sig.param_mode(i), a)))
            .collect();
        self.check_argument_mixing(id, &positions);

        self.call_result(&recv, sig.returns, sig.result_shape.clone(), method)
    }

    fn eval_index(&mut self, id: ExprId, base: Resolved, index: Resolved, access: Access) -> Resolved {
        if base.poisoned {
            return Resolved::poisoned();
        }
        let Some(shape) = self.shape_of(id, &base, "[]") else {
            return Resolved::poisoned();
        };
        let Some(indexer) = &shape.indexer else {
            self.unknown_member(id, shape, "[]");
            return Resolved::poisoned();
        };

        self.check_argument_mixing(id, &[(access, &base), (Access::Value, &index)]);

        let mut element = match access {
            Access::Value => Resolved::value(base.level, indexer.element_shape.clone()),
            Access::Ref => self.call_result(&base, indexer.by_ref, indexer.element_shape.clone(), "[]"),
        };
        // Elements live in the storage the base points into, never in a
        // local's own slot. Only caller-owned storage carries over.
        if base.is_ref_param_place() && element.self_field.is_none() {
            element.root = base.root;
        }
        element
    }

    /// Level of a member's result given what the member promises.
    fn call_result(
        &self,
        recv: &Resolved,
        returns: ReturnKind,
        shape: Option<String>,
        member: &str,
    ) -> Resolved {
        match returns {
            ReturnKind::Unit => Resolved::unit(),
            ReturnKind::Value | ReturnKind::Ref => Resolved::value(recv.level, shape),
            ReturnKind::RefIndependent if self.config.trust_independent_refs => {
                Resolved::value(EscapeLevel::ValueScoped, shape)
            }
            ReturnKind::RefIndependent => Resolved::value(recv.level, shape),
            ReturnKind::RefToSelfField => Resolved {
                level: EscapeLevel::StackOnly,
                shape,
                root: Root::Temporary,
                self_field: Some(member.to_string()),
                poisoned: false,
            },
        }
    }

    /// A reference the caller owns, passed by reference, must not be mixed
    /// with stack-only data in the same call: the callee may store one into
    /// the other.
    fn check_argument_mixing(&mut self, id: ExprId, positions: &[(Access, &Resolved)]) {
        if !self.config.check_argument_mixing {
            return;
        }
        let Some(ref_position) = positions
            .iter()
            .position(|(mode, r)| *mode == Access::Ref && r.is_ref_param_place())
        else {
            return;
        };
        let unsafe_position = positions.iter().enumerate().position(|(i, (_, r))| {
            i != ref_position && !r.poisoned && r.level == EscapeLevel::StackOnly
        });
        if let Some(unsafe_position) = unsafe_position {
            self.report(
                id,
                EscapeErrorKind::MixedRefUnsafeArguments { ref_position, unsafe_position },
            );
        }
    }

    /// Caller-owned places outlive the frame; locals only need to outlive
    /// the statement. Assigning never changes the target's declared level.
    fn check_assignment(&mut self, id: ExprId, target: &Resolved, value: &Resolved, mode: Access) {
        if target.poisoned || value.poisoned {
            return;
        }
        let mut required = if target.is_ref_param_place() {
            EscapeLevel::ValueScoped
        } else {
            EscapeLevel::StackOnly
        };
        if mode == Access::Ref {
            required = required.max(EscapeLevel::RefScoped);
        }
        if value.level < required {
            self.report(
                id,
                EscapeErrorKind::EscapingAssignment { mode, required, actual: value.level },
            );
        }
    }

    fn check_return(&mut self, id: ExprId, value: &Resolved, mode: Access) {
        if value.poisoned {
            return;
        }
        if let (Access::Ref, Some(method)) = (mode, &value.self_field) {
            self.report(id, EscapeErrorKind::SelfReferentialFieldReturn { method: method.clone() });
            return;
        }

        // A reference to a local's own storage dies with the frame.
        let actual = match (mode, &value.root) {
            (Access::Ref, Root::Local(_)) => EscapeLevel::StackOnly,
            _ => value.level,
        };
        let required = EscapeLevel::required_for_return(mode);
        if actual < required {
            self.report(id, EscapeErrorKind::NotReturnable { mode, required, actual });
        }
    }

    fn shape_of(&mut self, id: ExprId, value: &Resolved, member: &str) -> Option<&'a ValueShape> {
        match &value.shape {
            Some(name) => self.lookup_shape(id, name),
            None => {
                self.report(
                    id,
                    EscapeErrorKind::UnknownMember {
                        shape: "value without members".to_string(),
                        member: member.to_string(),
                        candidates: Vec::new(),
                    },
                );
                None
            }
        }
    }

    fn lookup_shape(&mut self, id: ExprId, name: &str) -> Option<&'a ValueShape> {
        let shapes = self.shapes;
        let shape = shapes.get(name);
        if shape.is_none() {
            let mut candidates: Vec<String> = shapes.names().map(str::to_string).collect();
            candidates.sort();
            self.report(id, EscapeErrorKind::UnknownShape { name: name.to_string(), candidates });
        }
        shape
    }

    fn unknown_member(&mut self, id: ExprId, shape: &ValueShape, member: &str) {
        let mut candidates = shape.member_names();
        candidates.sort();
        self.report(
            id,
            EscapeErrorKind::UnknownMember {
                shape: shape.name.clone(),
                member: member.to_string(),
                candidates,
            },
        );
    }

    fn report(&mut self, id: ExprId, kind: EscapeErrorKind) {
        let path = NodePath(self.path.clone());
        tracing::debug!(node = %id, path = %path, error = %kind, "escape diagnostic");
        self.errors.push(EscapeError {
            kind,
            node: id,
            path,
            span: self.body.get(id).map(|e| e.span).unwrap_or_default(),
        });
    }
}

/// Check one body with the default configuration.
pub fn check_escapes(
    body: &Body,
    bindings: &Bindings,
    shapes: &ShapeRegistry,
) -> Result<EscapeReport, MalformedTree> {
    check_escapes_with(body, bindings, shapes, &EscapeConfig::default())
}

pub fn check_escapes_with(
    body: &Body,
    bindings: &Bindings,
    shapes: &ShapeRegistry,
    config: &EscapeConfig,
) -> Result<EscapeReport, MalformedTree> {
    EscapeChecker::new(body, bindings, shapes, config).check()
}
