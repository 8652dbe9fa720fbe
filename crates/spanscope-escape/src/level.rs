// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The escape level lattice.

use spanscope_ast::Access;

/// How far a value may travel past the frame that produced it.
///
/// Ordered low to high:
///
/// ```text
/// StackOnly < RefScoped < ValueScoped < Heap
/// ```
///
/// Combining values takes the minimum: a composite is only as safe as its
/// least safe part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum EscapeLevel {
    /// May point into a frame that dies at return. Never escapes.
    StackOnly,
    /// Returnable by reference when derived from a by-reference parameter.
    RefScoped,
    /// Returnable by value.
    ValueScoped,
    /// Backed by storage that outlives every frame.
    Heap,
}

impl EscapeLevel {
    pub const ALL: [EscapeLevel; 4] = [
        EscapeLevel::StackOnly,
        EscapeLevel::RefScoped,
        EscapeLevel::ValueScoped,
        EscapeLevel::Heap,
    ];

    /// Greatest lower bound.
    pub fn meet(self, other: EscapeLevel) -> EscapeLevel {
        std::cmp::min(self, other)
    }

    /// Meet of every level in `levels`; `Heap` when there are none.
    pub fn meet_all(levels: impl IntoIterator<Item = EscapeLevel>) -> EscapeLevel {
        levels.into_iter().fold(EscapeLevel::Heap, EscapeLevel::meet)
    }

    /// Level a `return` of the given kind demands.
    pub fn required_for_return(mode: Access) -> EscapeLevel {
        match mode {
            Access::Value => EscapeLevel::ValueScoped,
            Access::Ref => EscapeLevel::RefScoped,
        }
    }

    pub fn is_returnable(self, mode: Access) -> bool {
        self >= Self::required_for_return(mode)
    }
}

impl std::fmt::Display for EscapeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscapeLevel::StackOnly => write!(f, "stack-only"),
            EscapeLevel::RefScoped => write!(f, "ref-scoped"),
            EscapeLevel::ValueScoped => write!(f, "value-scoped"),
            EscapeLevel::Heap => write!(f, "heap"),
        }
    }
}
