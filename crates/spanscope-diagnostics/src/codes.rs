// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error code registry.
//!
//! Maps error codes (E0900, E0950, etc.) to titles and categories.

use std::collections::HashMap;

/// Registry of all known error codes.
pub struct ErrorCodeRegistry {
    codes: HashMap<&'static str, ErrorCodeInfo>,
}

/// Information about a single error code.
pub struct ErrorCodeInfo {
    pub code: &'static str,
    pub title: &'static str,
    pub category: ErrorCategory,
}

/// Error category for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Resolution,
    Escape,
    Frontend,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Resolution => write!(f, "Resolution"),
            ErrorCategory::Escape => write!(f, "Escape"),
            ErrorCategory::Frontend => write!(f, "Frontend"),
        }
    }
}

macro_rules! register_codes {
    ($($code:literal => ($title:literal, $cat:expr)),* $(,)?) => {{
        let mut map = HashMap::new();
        $(
            map.insert($code, ErrorCodeInfo {
                code: $code,
                title: $title,
                category: $cat,
            });
        )*
        map
    }};
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        use ErrorCategory::*;

        Self {
            codes: register_codes! {
                // Lookup failures (E090x, first three)
                "E0900" => ("unknown binding", Resolution),
                "E0901" => ("unknown member", Resolution),
                "E0902" => ("unknown shape", Resolution),

                // Escape violations
                "E0903" => ("value not returnable", Escape),
                "E0904" => ("reference to receiver field returned", Escape),
                "E0905" => ("caller reference mixed with stack data", Escape),
                "E0906" => ("assignment escapes", Escape),

                // Bad input from the front end
                "E0950" => ("malformed expression tree", Frontend),
            },
        }
    }
}

impl ErrorCodeRegistry {
    pub fn get(&self, code: &str) -> Option<&ErrorCodeInfo> {
        self.codes.get(code)
    }

    pub fn all(&self) -> impl Iterator<Item = &ErrorCodeInfo> {
        self.codes.values()
    }
}
