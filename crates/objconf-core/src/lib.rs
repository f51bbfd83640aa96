//! Core types for the objconf configuration compiler.
//!
//! - [`DebugInfo`]: source provenance attached to declarations and expressions
//! - [`Value`] / [`Dictionary`]: runtime values
//! - [`TypeEntry`] / [`TypeFlags`] / [`TypeHash`]: type descriptors and identity
//! - [`CompilationError`] / [`ValueError`]: shared error types

mod debug_info;
mod error;
mod type_entry;
mod type_hash;
mod value;

pub use debug_info::DebugInfo;
pub use error::{CompilationError, CompilationErrorKind, ValueError};
pub use type_entry::{TypeEntry, TypeFlags, TypeKind};
pub use type_hash::TypeHash;
pub use value::{Dictionary, Value};

/// Separator joining a type name and an object name into a global key.
/// Object names may not contain it.
pub const NAME_SEPARATOR: char = '!';
