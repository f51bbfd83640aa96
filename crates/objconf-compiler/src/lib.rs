//! objconf item compiler.
//!
//! Compiles parsed object and template declarations into deferred-evaluation
//! config items.
//!
//! ## Modules
//!
//! - [`builder`]: [`ConfigItemBuilder`], validation and tree synthesis
//! - [`item`]: [`ConfigItem`], the immutable compiled output
//! - [`expr`]: expression tree nodes
//! - [`eval`]: reference evaluator for compiled trees
//! - [`options`]: [`CompilerOptions`]
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use objconf_compiler::{ConfigItemBuilder, DebugInfo, Expr, NoTemplates, ScopeSpecifier, SetOp};
//! use objconf_registry::TypeRegistry;
//!
//! let registry = TypeRegistry::with_builtin_types();
//! let di = DebugInfo::point("hosts.conf", 1, 1);
//!
//! let mut builder = ConfigItemBuilder::new(di.clone());
//! builder.set_type(registry.resolve("Host").unwrap());
//! builder.set_name("example.com");
//! builder.add_expression(Expr::import_default_templates(di.clone()));
//! builder.add_expression(Expr::set(
//!     Expr::indexer(ScopeSpecifier::This, "address", di.clone()),
//!     SetOp::Set,
//!     Expr::literal("10.0.0.1", di.clone()),
//!     di.clone(),
//! ));
//!
//! let item = builder.compile().unwrap();
//! let object = item.instantiate(&NoTemplates).unwrap();
//! assert_eq!(object["address"].as_str(), Some("10.0.0.1"));
//! ```

pub mod builder;
pub mod eval;
pub mod expr;
pub mod item;
pub mod options;

pub use builder::{ConfigItemBuilder, TEMPLATES_ATTRIBUTE};
pub use eval::{EvalError, Frame, MAX_IMPORT_DEPTH, NoTemplates, TemplateResolver};
pub use expr::{
    ArrayExpr, DictExpr, Expr, ImportDefaultTemplatesExpr, ImportExpr, IndexExpr, LiteralExpr,
    ScopeExpr, ScopeSpecifier, SetExpr, SetOp, VariableExpr,
};
pub use item::{ConfigItem, ItemFlags};
pub use options::CompilerOptions;

pub use objconf_core::{CompilationError, CompilationErrorKind, DebugInfo, Dictionary, Value};
