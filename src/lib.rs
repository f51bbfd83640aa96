//! objconf - object-definition compiler for a monitoring configuration language.
//!
//! This crate ties the workspace together:
//!
//! - [`objconf_core`]: provenance, values, type descriptors, errors
//! - [`objconf_registry`]: the type registry
//! - [`objconf_compiler`]: the item compiler, compiled items and the evaluator
//! - [`ItemRegistry`] and [`ConfigLoader`]: registration and batch loading
//!
//! # Example
//!
//! ```
//! use objconf::{ConfigItemBuilder, ConfigLoader, DebugInfo, Expr, TypeRegistry};
//!
//! let types = TypeRegistry::with_builtin_types();
//! let di = DebugInfo::point("hosts.conf", 1, 1);
//!
//! let mut template = ConfigItemBuilder::new(di.clone());
//! template.set_type(types.resolve("Host").unwrap());
//! template.set_name("generic-host");
//! template.set_abstract(true);
//!
//! let mut host = ConfigItemBuilder::new(di.clone());
//! host.set_type(types.resolve("Host").unwrap());
//! host.set_name("example.com");
//! host.add_expression(Expr::import(Expr::literal("generic-host", di.clone()), di.clone()));
//! host.add_expression(Expr::import_default_templates(di.clone()));
//!
//! let mut loader = ConfigLoader::new();
//! loader.load([template, host]).unwrap();
//!
//! let report = loader.commit().unwrap();
//! assert_eq!(report.objects.len(), 1);
//! assert_eq!(
//!     report.objects[0].attributes["templates"].to_string(),
//!     r#"[ "example.com", "generic-host" ]"#
//! );
//! ```

mod item_registry;
mod loader;

pub use item_registry::{ItemRegistrationError, ItemRegistry};
pub use loader::{ActivatedObject, CommitReport, ConfigLoader, LoadError, LoadReport};

pub use objconf_compiler::{
    CompilerOptions, ConfigItem, ConfigItemBuilder, EvalError, Expr, ItemFlags, NoTemplates,
    ScopeSpecifier, SetOp, TemplateResolver,
};
pub use objconf_core::{
    CompilationError, CompilationErrorKind, DebugInfo, Dictionary, TypeEntry, TypeFlags, TypeHash,
    TypeKind, Value,
};
pub use objconf_registry::{RegistrationError, TypeRegistry};
