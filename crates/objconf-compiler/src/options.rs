//! Compiler configuration.

/// Options controlling [`ConfigItemBuilder::compile`](crate::ConfigItemBuilder::compile).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Run compiler self-checks (every concrete object imports its default
    /// templates). On by default in debug builds and with the
    /// `invariant-checks` feature.
    pub check_invariants: bool,
}

impl CompilerOptions {
    /// Options with self-checks forced on.
    pub fn checked() -> Self {
        Self {
            check_invariants: true,
        }
    }

    /// Options with self-checks forced off; the invariants are trusted.
    pub fn unchecked() -> Self {
        Self {
            check_invariants: false,
        }
    }
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            check_invariants: cfg!(any(debug_assertions, feature = "invariant-checks")),
        }
    }
}
