//! Item compiler.
//!
//! [`ConfigItemBuilder`] accumulates one object or template declaration as the
//! parser reads it, then [`compile`](ConfigItemBuilder::compile)s it into a
//! [`ConfigItem`]. The compiled tree has a fixed shape:
//!
//! ```text
//! Dict (inline)
//! ├── Set  this["templates"] += [ <name> ]      self-registration
//! └── Dict (inline)                              declaration body
//!     ├── <body expression 1>
//!     └── ...
//! ```
//!
//! The self-registration runs before the body, so imported templates append
//! their names after the item's own.

use std::sync::Arc;

use tracing::{debug, error};

use objconf_core::{CompilationError, DebugInfo, Dictionary, TypeEntry, Value, NAME_SEPARATOR};

use crate::expr::{Expr, ScopeSpecifier, SetOp};
use crate::item::{ConfigItem, ItemFlags};
use crate::options::CompilerOptions;

/// Attribute every item registers its own name into.
pub const TEMPLATES_ATTRIBUTE: &str = "templates";

/// A declaration being assembled by the parser.
///
/// The builder is consumed by [`compile`](Self::compile); a declaration cannot
/// be compiled twice:
///
/// ```compile_fail
/// use objconf_compiler::{ConfigItemBuilder, DebugInfo};
///
/// let builder = ConfigItemBuilder::new(DebugInfo::default());
/// let _first = builder.compile();
/// let _second = builder.compile();
/// ```
#[derive(Debug)]
pub struct ConfigItemBuilder {
    type_entry: Option<Arc<TypeEntry>>,
    name: String,
    flags: ItemFlags,
    scope: Option<Arc<Dictionary>>,
    zone: Option<String>,
    package: Option<String>,
    filter: Option<Arc<Expr>>,
    expressions: Vec<Expr>,
    debug_info: DebugInfo,
    options: CompilerOptions,
}

impl ConfigItemBuilder {
    /// Start a declaration written at `debug_info`.
    pub fn new(debug_info: DebugInfo) -> Self {
        Self {
            type_entry: None,
            name: String::new(),
            flags: ItemFlags::empty(),
            scope: None,
            zone: None,
            package: None,
            filter: None,
            expressions: Vec::new(),
            debug_info,
            options: CompilerOptions::default(),
        }
    }

    /// Override the compiler options.
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the object type. Must be set before compiling.
    pub fn set_type(&mut self, type_entry: Arc<TypeEntry>) {
        self.type_entry = Some(type_entry);
    }

    /// Set the object or template name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Mark the declaration as a template.
    pub fn set_abstract(&mut self, is_abstract: bool) {
        self.flags.set(ItemFlags::ABSTRACT, is_abstract);
    }

    /// Set the closure variables visible to the body and the filter.
    pub fn set_scope(&mut self, scope: Arc<Dictionary>) {
        self.scope = Some(scope);
    }

    /// Set the zone the declaration belongs to.
    pub fn set_zone(&mut self, zone: impl Into<String>) {
        self.zone = Some(zone.into());
    }

    /// Set the config package the declaration came from.
    pub fn set_package(&mut self, package: impl Into<String>) {
        self.package = Some(package.into());
    }

    /// Append a body expression. Order is preserved into the compiled tree.
    pub fn add_expression(&mut self, expr: Expr) {
        self.expressions.push(expr);
    }

    /// Set the activation filter.
    pub fn set_filter(&mut self, filter: Arc<Expr>) {
        self.filter = Some(filter);
    }

    /// Mark the template as imported by every object of its type.
    pub fn set_default_template(&mut self, default_template: bool) {
        self.flags.set(ItemFlags::DEFAULT_TEMPLATE, default_template);
    }

    /// Skip the item instead of failing the load when it errors.
    pub fn set_ignore_on_error(&mut self, ignore_on_error: bool) {
        self.flags.set(ItemFlags::IGNORE_ON_ERROR, ignore_on_error);
    }

    /// Whether the item may be skipped when it fails.
    pub fn ignore_on_error(&self) -> bool {
        self.flags.contains(ItemFlags::IGNORE_ON_ERROR)
    }

    /// Where the declaration was written.
    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }

    /// Whether the body contains the default-template import marker.
    pub fn imports_default_templates(&self) -> bool {
        self.expressions
            .iter()
            .any(Expr::is_import_default_templates)
    }

    /// Validate the declaration and build its config item.
    ///
    /// # Errors
    ///
    /// Checked in order:
    /// - `MissingType` if no type was set
    /// - `UnsupportedType` if the type cannot be used for config objects
    /// - `InvalidName` if the name contains `!`
    /// - `InternalInvariantViolation` if self-checks are enabled and a concrete
    ///   object does not import its default templates
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(self) -> Result<ConfigItem, CompilationError> {
        let Some(type_entry) = self.type_entry.clone() else {
            return Err(CompilationError::missing_type(self.debug_info));
        };

        if !type_entry.is_object_compilable() {
            return Err(CompilationError::unsupported_type(
                type_entry.name(),
                self.debug_info,
            ));
        }

        if self.name.contains(NAME_SEPARATOR) {
            return Err(CompilationError::invalid_name(
                &self.name,
                type_entry.name(),
                self.debug_info,
            ));
        }

        if self.options.check_invariants
            && !self.flags.contains(ItemFlags::ABSTRACT)
            && !self.imports_default_templates()
        {
            error!(
                type_name = type_entry.name(),
                name = %self.name,
                location = %self.debug_info,
                "concrete object compiled without default template import"
            );
            return Err(CompilationError::missing_default_import(
                &self.name,
                type_entry.name(),
                self.debug_info,
            ));
        }

        let registration = Expr::set(
            Expr::indexer(ScopeSpecifier::This, TEMPLATES_ATTRIBUTE, self.debug_info.clone()),
            SetOp::Add,
            Expr::literal(
                Value::Array(vec![Value::String(self.name.clone())]),
                self.debug_info.clone(),
            ),
            self.debug_info.clone(),
        );
        let body = Expr::inline_dict(self.expressions, self.debug_info.clone());
        let expression = Expr::inline_dict(vec![registration, body], self.debug_info.clone());

        debug!(
            type_name = type_entry.name(),
            name = %self.name,
            is_abstract = self.flags.contains(ItemFlags::ABSTRACT),
            "compiled config item"
        );

        Ok(ConfigItem {
            type_entry,
            name: self.name,
            flags: self.flags,
            expression,
            filter: self.filter,
            debug_info: self.debug_info,
            scope: self.scope,
            zone: self.zone,
            package: self.package,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{DictExpr, LiteralExpr, SetExpr};
    use objconf_core::{CompilationErrorKind, TypeKind};

    fn di() -> DebugInfo {
        DebugInfo::new("hosts.conf", 1, 1, 4, 1)
    }

    fn host() -> Arc<TypeEntry> {
        Arc::new(TypeEntry::config_object("Host"))
    }

    fn builder(name: &str) -> ConfigItemBuilder {
        let mut b = ConfigItemBuilder::new(di()).with_options(CompilerOptions::checked());
        b.set_type(host());
        b.set_name(name);
        b.add_expression(Expr::import_default_templates(di()));
        b
    }

    fn parts(item: &ConfigItem) -> (&SetExpr, &DictExpr) {
        let Expr::Dict(root) = item.expression() else {
            panic!("root must be a dict");
        };
        assert!(root.inline);
        assert_eq!(root.exprs.len(), 2);
        let Expr::Set(registration) = &root.exprs[0] else {
            panic!("first element must be the self-registration");
        };
        let Expr::Dict(body) = &root.exprs[1] else {
            panic!("second element must be the body");
        };
        (registration, body)
    }

    #[test]
    fn missing_type() {
        let mut b = ConfigItemBuilder::new(di());
        b.set_name("bad!name");
        let err = b.compile().unwrap_err();
        assert_eq!(err.kind, CompilationErrorKind::MissingType);
        assert_eq!(err.debug_info, di());
    }

    #[test]
    fn unsupported_type() {
        let mut b = builder("example.com");
        b.set_type(Arc::new(TypeEntry::new("String", TypeKind::Primitive)));
        let err = b.compile().unwrap_err();
        assert_eq!(err.kind, CompilationErrorKind::UnsupportedType);
        assert_eq!(err.message, "The type 'String' cannot be used for config objects");
    }

    #[test]
    fn invalid_name() {
        let err = builder("bad!name").compile().unwrap_err();
        assert_eq!(err.kind, CompilationErrorKind::InvalidName);
        assert_eq!(err.debug_info, di());
    }

    #[test]
    fn invalid_name_checked_before_invariant() {
        let mut b = ConfigItemBuilder::new(di()).with_options(CompilerOptions::checked());
        b.set_type(host());
        b.set_name("a!b");
        assert_eq!(b.compile().unwrap_err().kind, CompilationErrorKind::InvalidName);
    }

    #[test]
    fn concrete_without_default_import_fails_when_checked() {
        let mut b = ConfigItemBuilder::new(di()).with_options(CompilerOptions::checked());
        b.set_type(host());
        b.set_name("example.com");
        let err = b.compile().unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn concrete_without_default_import_passes_when_unchecked() {
        let mut b = ConfigItemBuilder::new(di()).with_options(CompilerOptions::unchecked());
        b.set_type(host());
        b.set_name("example.com");
        assert!(b.compile().is_ok());
    }

    #[test]
    fn abstract_without_default_import_compiles() {
        let mut b = ConfigItemBuilder::new(di()).with_options(CompilerOptions::checked());
        b.set_type(host());
        b.set_name("generic-host");
        b.set_abstract(true);
        let item = b.compile().unwrap();
        assert!(item.is_abstract());
    }

    #[test]
    fn self_registration_payload() {
        let item = builder("generic-host").compile().unwrap();
        let (registration, _) = parts(&item);

        assert_eq!(registration.op, SetOp::Add);
        assert_eq!(
            registration.target,
            Expr::indexer(ScopeSpecifier::This, "templates", di())
        );
        let Expr::Literal(LiteralExpr { value, .. }) = &registration.operand else {
            panic!("operand must be a literal");
        };
        assert_eq!(value, &Value::Array(vec![Value::from("generic-host")]));
    }

    #[test]
    fn body_is_inline_and_ordered() {
        let mut b = builder("example.com");
        b.add_expression(Expr::set(
            Expr::indexer(ScopeSpecifier::This, "address", di()),
            SetOp::Set,
            Expr::literal("10.0.0.1", di()),
            di(),
        ));
        let item = b.compile().unwrap();
        let (_, body) = parts(&item);

        assert!(body.inline);
        assert_eq!(body.exprs.len(), 2);
        assert!(body.exprs[0].is_import_default_templates());
        assert!(matches!(body.exprs[1], Expr::Set(_)));
    }

    #[test]
    fn metadata_is_carried_through() {
        let mut b = builder("example.com");
        let mut scope = Dictionary::default();
        scope.insert("x".into(), Value::from(1i64));
        b.set_scope(Arc::new(scope));
        b.set_zone("master");
        b.set_package("_etc");
        b.set_filter(Arc::new(Expr::literal(true, di())));
        b.set_ignore_on_error(true);
        b.set_default_template(false);

        let item = b.compile().unwrap();
        assert_eq!(item.name(), "example.com");
        assert_eq!(item.type_name(), "Host");
        assert!(!item.is_abstract());
        assert!(item.ignore_on_error());
        assert!(!item.is_default_template());
        assert_eq!(item.zone(), Some("master"));
        assert_eq!(item.package(), Some("_etc"));
        assert!(item.has_filter());
        assert_eq!(item.scope().unwrap()["x"], Value::from(1i64));
        assert_eq!(item.debug_info(), &di());
    }

    #[test]
    fn flags_toggle() {
        let mut b = ConfigItemBuilder::new(di());
        b.set_ignore_on_error(true);
        assert!(b.ignore_on_error());
        b.set_ignore_on_error(false);
        assert!(!b.ignore_on_error());
    }

    #[test]
    fn empty_name_compiles() {
        let mut b = ConfigItemBuilder::new(di()).with_options(CompilerOptions::unchecked());
        b.set_type(host());
        let item = b.compile().unwrap();
        assert_eq!(item.name(), "");
    }
}
