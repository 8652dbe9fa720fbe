// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Struct-like value shapes and the signatures of their members.
//!
//! A shape is the checker's view of a span-like struct: which fields it has,
//! how far each field may escape, and what each method promises about its
//! result. Those promises are the only place the checker trusts code it does
//! not see, so they are spelled out per member as a [`ReturnKind`].

use std::collections::HashMap;

use spanscope_ast::Access;

use crate::level::EscapeLevel;

/// What a member's result is allowed to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    /// Returns nothing.
    Unit,
    /// By-value result. No independence from the receiver is claimed.
    Value,
    /// By-reference result. No independence from the receiver is claimed.
    Ref,
    /// By-reference result that never points into the receiver's own
    /// storage. Trusted annotation: the result does not inherit the
    /// receiver's level.
    RefIndependent,
    /// Returns a reference to one of the receiver's fields.
    RefToSelfField,
}

impl ReturnKind {
    pub fn is_ref(self) -> bool {
        matches!(self, ReturnKind::Ref | ReturnKind::RefIndependent | ReturnKind::RefToSelfField)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    /// Upper bound for anything read through this field.
    pub level: EscapeLevel,
    pub shape: Option<String>,
}

/// Signature of a method as far as escape checking cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSig {
    pub name: String,
    /// Struct methods take their receiver by reference unless readonly.
    pub receiver: Access,
    /// Pass mode of each argument. Missing entries mean by value.
    pub params: Vec<Access>,
    pub returns: ReturnKind,
    pub result_shape: Option<String>,
}

impl MemberSig {
    pub fn new(name: impl Into<String>, returns: ReturnKind) -> Self {
        Self {
            name: name.into(),
            receiver: Access::Ref,
            params: Vec::new(),
            returns,
            result_shape: None,
        }
    }

    pub fn readonly(mut self) -> Self {
        self.receiver = Access::Value;
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = Access>) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    pub fn returning(mut self, shape: impl Into<String>) -> Self {
        self.result_shape = Some(shape.into());
        self
    }

    pub fn param_mode(&self, i: usize) -> Access {
        self.params.get(i).copied().unwrap_or(Access::Value)
    }
}

/// `this[index]` on a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexer {
    pub element_shape: Option<String>,
    /// Promise made by the by-reference form. The by-value form always
    /// inherits the receiver.
    pub by_ref: ReturnKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueShape {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MemberSig>,
    pub indexer: Option<Indexer>,
}

impl ValueShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new(), methods: Vec::new(), indexer: None }
    }

    pub fn field(mut self, name: impl Into<String>, level: EscapeLevel, shape: Option<&str>) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            level,
            shape: shape.map(str::to_string),
        });
        self
    }

    pub fn method(mut self, sig: MemberSig) -> Self {
        self.methods.push(sig);
        self
    }

    pub fn with_indexer(mut self, element_shape: Option<&str>, by_ref: ReturnKind) -> Self {
        self.indexer = Some(Indexer {
            element_shape: element_shape.map(str::to_string),
            by_ref,
        });
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn get_method(&self, name: &str) -> Option<&MemberSig> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// A struct is only as safe as its least safe field.
    pub fn composite_level(&self) -> EscapeLevel {
        EscapeLevel::meet_all(self.fields.iter().map(|f| f.level))
    }

    /// Names of all fields and methods, for suggestions.
    pub fn member_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| f.name.clone())
            .chain(self.methods.iter().map(|m| m.name.clone()))
            .collect()
    }
}

/// Every shape a body may mention.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    shapes: HashMap<String, ValueShape>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, shape: ValueShape) -> Option<ValueShape> {
        self.shapes.insert(shape.name.clone(), shape)
    }

    pub fn with(mut self, shape: ValueShape) -> Self {
        self.register(shape);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ValueShape> {
        self.shapes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shapes.keys().map(String::as_str)
    }

    /// `Shape.member` for every member whose result is trusted not to alias
    /// its receiver, sorted. Indexers are listed as `Shape[]`.
    pub fn trusted_members(&self) -> Vec<String> {
        let mut out = Vec::new();
        for shape in self.shapes.values() {
            for m in &shape.methods {
                if m.returns == ReturnKind::RefIndependent {
                    out.push(format!("{}.{}", shape.name, m.name));
                }
            }
            if matches!(&shape.indexer, Some(ix) if ix.by_ref == ReturnKind::RefIndependent) {
                out.push(format!("{}[]", shape.name));
            }
        }
        out.sort();
        out
    }
}
