//! objconf type registry.
//!
//! Maps the type names used in declarations to [`TypeEntry`] descriptors.

mod registry;

pub use registry::{RegistrationError, TypeRegistry};

pub use objconf_core::{TypeEntry, TypeFlags, TypeHash, TypeKind};
