// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Names visible to a checked body.

use std::collections::HashMap;

use crate::level::EscapeLevel;

/// A local or parameter as declared by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub level: EscapeLevel,
    /// By-reference parameter. Its level is whatever the caller's argument
    /// guarantees, and places rooted at it are caller-owned storage.
    pub is_ref_param: bool,
    /// Shape of the bound value, when it has members.
    pub shape: Option<String>,
}

impl Binding {
    pub fn local(level: EscapeLevel) -> Self {
        Self { level, is_ref_param: false, shape: None }
    }

    pub fn ref_param(level: EscapeLevel) -> Self {
        Self { level, is_ref_param: true, shape: None }
    }

    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = Some(shape.into());
        self
    }
}

/// Name to binding map supplied alongside a body. Never mutated by checking.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    map: HashMap<String, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.map.insert(name.into(), binding)
    }

    pub fn with(mut self, name: impl Into<String>, binding: Binding) -> Self {
        self.insert(name, binding);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.map.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(String, Binding)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, Binding)>>(iter: I) -> Self {
        Self { map: iter.into_iter().collect() }
    }
}
