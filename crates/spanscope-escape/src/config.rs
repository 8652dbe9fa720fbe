// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Checker configuration.

/// Knobs for one checker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeConfig {
    /// Honor `RefIndependent` member annotations. When off they are treated
    /// like plain `Ref` members and the result inherits the receiver.
    pub trust_independent_refs: bool,
    /// Report `MixedRefUnsafeArguments` at call sites.
    pub check_argument_mixing: bool,
    /// Deepest node nesting accepted before the tree is rejected.
    pub max_depth: usize,
}

impl Default for EscapeConfig {
    fn default() -> Self {
        Self {
            trust_independent_refs: true,
            check_argument_mixing: true,
            max_depth: 512,
        }
    }
}

impl EscapeConfig {
    pub fn trust_independent_refs(mut self, on: bool) -> Self {
        self.trust_independent_refs = on;
        self
    }

    pub fn check_argument_mixing(mut self, on: bool) -> Self {
        self.check_argument_mixing = on;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
