//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is a 64-bit hash computed from a type name. The same name
//! always produces the same hash, so a type can be referred to before it is
//! registered and lookups need no secondary id tables.
//!
//! # Examples
//!
//! ```
//! use objconf_core::TypeHash;
//!
//! let host = TypeHash::from_name("Host");
//! assert_eq!(host, TypeHash::from_name("Host"));
//! assert_ne!(host, TypeHash::from_name("Service"));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain marker mixed into every type hash.
const TYPE_DOMAIN: u64 = 0x2fac10b63a6cc57c;

/// A deterministic 64-bit hash identifying a configuration type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Create a type hash from a type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(TYPE_DOMAIN ^ xxh64(name.as_bytes(), 0))
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
