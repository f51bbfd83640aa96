//! Error types shared across the workspace.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CompilationError  - a declaration could not be compiled into a config item
//! ValueError        - an operator was applied to values it does not support
//! ```
//!
//! Evaluation and loading errors wrap these in the crates that produce them.

use thiserror::Error;

use crate::DebugInfo;

// ============================================================================
// Compilation Errors
// ============================================================================

/// Categories of compilation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompilationErrorKind {
    /// No type was set on the declaration.
    MissingType,
    /// The type exists but cannot be used for config objects.
    UnsupportedType,
    /// The object name contains the reserved `!` separator.
    InvalidName,
    /// A compiler self-check failed. Indicates a bug in the compiler or its
    /// caller, not a problem with the configuration.
    InternalInvariantViolation,
}

impl CompilationErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilationErrorKind::MissingType => "missing type",
            CompilationErrorKind::UnsupportedType => "unsupported type",
            CompilationErrorKind::InvalidName => "invalid name",
            CompilationErrorKind::InternalInvariantViolation => "internal invariant violation",
        }
    }
}

impl std::fmt::Display for CompilationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declaration that failed to compile.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (in {debug_info})")]
pub struct CompilationError {
    /// The category of this error.
    pub kind: CompilationErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Where the offending declaration is.
    pub debug_info: DebugInfo,
}

impl CompilationError {
    /// Create a new compilation error.
    pub fn new(
        kind: CompilationErrorKind,
        message: impl Into<String>,
        debug_info: DebugInfo,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            debug_info,
        }
    }

    /// No type was specified for the object.
    pub fn missing_type(debug_info: DebugInfo) -> Self {
        Self::new(
            CompilationErrorKind::MissingType,
            "The type of an object must be specified",
            debug_info,
        )
    }

    /// The type cannot be used for config objects.
    pub fn unsupported_type(type_name: &str, debug_info: DebugInfo) -> Self {
        Self::new(
            CompilationErrorKind::UnsupportedType,
            format!("The type '{type_name}' cannot be used for config objects"),
            debug_info,
        )
    }

    /// The object name contains `!`.
    pub fn invalid_name(name: &str, type_name: &str, debug_info: DebugInfo) -> Self {
        Self::new(
            CompilationErrorKind::InvalidName,
            format!(
                "Name for object '{name}' of type '{type_name}' is invalid: Object names may not contain '!'"
            ),
            debug_info,
        )
    }

    /// A concrete object did not import its type's default templates.
    pub fn missing_default_import(name: &str, type_name: &str, debug_info: DebugInfo) -> Self {
        Self::new(
            CompilationErrorKind::InternalInvariantViolation,
            format!(
                "Object '{name}' of type '{type_name}' does not import the default templates"
            ),
            debug_info,
        )
    }

    /// Whether this is a compiler self-check failure rather than a user error.
    #[inline]
    pub fn is_internal(&self) -> bool {
        self.kind == CompilationErrorKind::InternalInvariantViolation
    }
}

// ============================================================================
// Value Errors
// ============================================================================

/// Errors from operations on [`Value`](crate::Value)s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The operator is not defined for these operand types.
    #[error("operator {op} cannot be applied to values of type '{left}' and '{right}'")]
    InvalidOperands {
        /// The operator.
        op: &'static str,
        /// Type of the left operand.
        left: &'static str,
        /// Type of the right operand.
        right: &'static str,
    },

    /// The value cannot be indexed.
    #[error("values of type '{0}' cannot be indexed")]
    NotIndexable(&'static str),
}
