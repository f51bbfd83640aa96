//! TypeRegistry - the set of types declarations may name.
//!
//! # Thread Safety
//!
//! Types are registered single-threaded while the daemon starts up. After that
//! the registry is only read, and concurrent `resolve` calls from parallel
//! compilations need no locking: entries are handed out as `Arc<TypeEntry>`.
//!
//! # Example
//!
//! ```
//! use objconf_registry::TypeRegistry;
//!
//! let registry = TypeRegistry::with_builtin_types();
//!
//! let host = registry.resolve("Host").unwrap();
//! assert!(host.is_object_compilable());
//!
//! let string = registry.resolve("String").unwrap();
//! assert!(!string.is_object_compilable());
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use objconf_core::{TypeEntry, TypeFlags, TypeHash, TypeKind};

/// Errors that occur while registering types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A type with this name already exists.
    #[error("duplicate type: {0}")]
    DuplicateType(String),

    /// The declared base type is not registered.
    #[error("type '{type_name}' derives from unknown base {base}")]
    UnknownBase {
        /// The type being registered.
        type_name: String,
        /// Hash of the missing base.
        base: TypeHash,
    },
}

/// Monitoring object types registered by [`TypeRegistry::with_builtin_types`].
const BUILTIN_OBJECT_TYPES: &[&str] = &[
    "ApiUser",
    "CheckCommand",
    "Dependency",
    "Endpoint",
    "EventCommand",
    "Host",
    "HostGroup",
    "Notification",
    "NotificationCommand",
    "ScheduledDowntime",
    "Service",
    "ServiceGroup",
    "TimePeriod",
    "User",
    "UserGroup",
    "Zone",
];

/// Types that can be assigned to `apply` rules.
const APPLY_TARGETS: &[&str] = &["Dependency", "Notification", "ScheduledDowntime", "Service"];

/// Registry of known types, keyed by name with a hash index.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<String, Arc<TypeEntry>>,
    by_hash: FxHashMap<TypeHash, Arc<TypeEntry>>,
}

impl TypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the value types and the monitoring object types.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_types();
        registry
    }

    /// Register the value types and the monitoring object types.
    ///
    /// Object types derive from the abstract, non-compilable `ConfigObject`.
    pub fn register_builtin_types(&mut self) {
        let values = [
            ("Boolean", TypeKind::Primitive),
            ("Number", TypeKind::Primitive),
            ("String", TypeKind::Primitive),
            ("Array", TypeKind::Container),
            ("Dictionary", TypeKind::Container),
            ("Function", TypeKind::Function),
        ];
        for (name, kind) in values {
            self.insert(TypeEntry::new(name, kind));
        }

        let base = TypeEntry::new("ConfigObject", TypeKind::Object).with_flags(TypeFlags::ABSTRACT);
        let base_hash = base.type_hash();
        self.insert(base);

        for name in BUILTIN_OBJECT_TYPES {
            let mut entry = TypeEntry::config_object(*name).with_base(base_hash);
            if APPLY_TARGETS.contains(name) {
                entry = entry.with_flags(TypeFlags::APPLY_TARGET);
            }
            self.insert(entry);
        }
    }

    fn insert(&mut self, entry: TypeEntry) -> Arc<TypeEntry> {
        let entry = Arc::new(entry);
        self.by_hash.insert(entry.type_hash(), entry.clone());
        self.types.insert(entry.name.clone(), entry.clone());
        entry
    }

    /// Register a type.
    ///
    /// Fails if the name is taken or the base type is unknown.
    pub fn register(&mut self, entry: TypeEntry) -> Result<Arc<TypeEntry>, RegistrationError> {
        if self.types.contains_key(&entry.name) {
            return Err(RegistrationError::DuplicateType(entry.name));
        }

        if let Some(base) = entry.base {
            if !self.by_hash.contains_key(&base) {
                return Err(RegistrationError::UnknownBase {
                    type_name: entry.name,
                    base,
                });
            }
        }

        Ok(self.insert(entry))
    }

    /// Resolve a type by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<TypeEntry>> {
        self.types.get(name).cloned()
    }

    /// Check if a type exists by name.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
