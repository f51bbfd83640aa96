//! Type descriptors.
//!
//! A [`TypeEntry`] is what the type registry hands back when a declaration
//! names its type (`object Host "example.com" { ... }`). Only entries flagged
//! [`TypeFlags::CONFIG_OBJECT`] may be used for object and template
//! declarations.

use bitflags::bitflags;

use crate::TypeHash;

bitflags! {
    /// Capabilities of a registered type.
    ///
    /// ```
    /// use objconf_core::TypeFlags;
    ///
    /// let host = TypeFlags::CONFIG_OBJECT | TypeFlags::APPLY_TARGET;
    /// assert!(host.contains(TypeFlags::CONFIG_OBJECT));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        /// Declarations of this type compile into config items.
        const CONFIG_OBJECT = 1 << 0;
        /// The type itself cannot be instantiated, only derived from.
        const ABSTRACT = 1 << 1;
        /// Objects of this type can be created by `apply` rules.
        const APPLY_TARGET = 1 << 2;
    }
}

/// Broad category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Scalar values (`String`, `Number`, `Boolean`).
    Primitive,
    /// Containers (`Array`, `Dictionary`).
    Container,
    /// Callables.
    Function,
    /// Monitoring objects (`Host`, `Service`, ...).
    Object,
}

impl TypeKind {
    /// Returns a human-readable name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Primitive => "primitive",
            TypeKind::Container => "container",
            TypeKind::Function => "function",
            TypeKind::Object => "object",
        }
    }
}

/// A registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    /// Type name as written in configuration files.
    pub name: String,
    /// Hash of `name`.
    pub type_hash: TypeHash,
    /// Broad category.
    pub kind: TypeKind,
    /// Capabilities.
    pub flags: TypeFlags,
    /// Parent type, if any.
    pub base: Option<TypeHash>,
}

impl TypeEntry {
    /// Create a type entry with no flags and no base.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        let name = name.into();
        Self {
            type_hash: TypeHash::from_name(&name),
            name,
            kind,
            flags: TypeFlags::empty(),
            base: None,
        }
    }

    /// Create a compilable object type.
    pub fn config_object(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Object).with_flags(TypeFlags::CONFIG_OBJECT)
    }

    /// Add flags.
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the parent type.
    pub fn with_base(mut self, base: TypeHash) -> Self {
        self.base = Some(base);
        self
    }

    /// Get the type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the type hash.
    #[inline]
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Whether declarations of this type can be compiled into config items.
    #[inline]
    pub fn is_object_compilable(&self) -> bool {
        self.flags.contains(TypeFlags::CONFIG_OBJECT)
    }

    /// Whether the type itself is abstract.
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }
}
