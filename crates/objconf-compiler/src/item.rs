//! Compiled config items.
//!
//! A [`ConfigItem`] is the immutable output of
//! [`ConfigItemBuilder::compile`](crate::ConfigItemBuilder::compile): a type, a
//! name, and an expression tree that, evaluated against a fresh object,
//! produces that object's attributes. Items are shared as `Arc<ConfigItem>`
//! between the item registry and any number of evaluating threads.

use std::sync::Arc;

use bitflags::bitflags;

use objconf_core::{DebugInfo, Dictionary, TypeEntry, NAME_SEPARATOR};

use crate::eval::{EvalError, Frame, TemplateResolver};
use crate::expr::Expr;

bitflags! {
    /// Boolean attributes of a declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ItemFlags: u8 {
        /// Template, not an instantiable object.
        const ABSTRACT = 1 << 0;
        /// Template imported into every object of its type.
        const DEFAULT_TEMPLATE = 1 << 1;
        /// Evaluation failures of this item do not abort the load.
        const IGNORE_ON_ERROR = 1 << 2;
    }
}

/// A compiled object or template declaration.
#[derive(Debug)]
pub struct ConfigItem {
    pub(crate) type_entry: Arc<TypeEntry>,
    pub(crate) name: String,
    pub(crate) flags: ItemFlags,
    pub(crate) expression: Expr,
    pub(crate) filter: Option<Arc<Expr>>,
    pub(crate) debug_info: DebugInfo,
    pub(crate) scope: Option<Arc<Dictionary>>,
    pub(crate) zone: Option<String>,
    pub(crate) package: Option<String>,
}

impl ConfigItem {
    /// The object type.
    pub fn type_entry(&self) -> &Arc<TypeEntry> {
        &self.type_entry
    }

    /// Name of the object type.
    pub fn type_name(&self) -> &str {
        self.type_entry.name()
    }

    /// The object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Global key of this item: `Type!name`.
    pub fn key(&self) -> String {
        format!("{}{}{}", self.type_name(), NAME_SEPARATOR, self.name)
    }

    /// All boolean attributes.
    pub fn flags(&self) -> ItemFlags {
        self.flags
    }

    /// Whether this is a template.
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(ItemFlags::ABSTRACT)
    }

    /// Whether this template is imported into every object of its type.
    pub fn is_default_template(&self) -> bool {
        self.flags.contains(ItemFlags::DEFAULT_TEMPLATE)
    }

    /// Whether evaluation failures of this item may be skipped.
    pub fn ignore_on_error(&self) -> bool {
        self.flags.contains(ItemFlags::IGNORE_ON_ERROR)
    }

    /// The synthesized root expression.
    pub fn expression(&self) -> &Expr {
        &self.expression
    }

    /// The activation filter.
    pub fn filter(&self) -> Option<&Arc<Expr>> {
        self.filter.as_ref()
    }

    /// Whether an activation filter is set.
    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Where the declaration was written.
    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }

    /// Closure variables captured by the declaration.
    pub fn scope(&self) -> Option<&Arc<Dictionary>> {
        self.scope.as_ref()
    }

    /// Owning cluster zone.
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Configuration package the declaration came from.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Evaluate this item's tree into `target`.
    pub fn evaluate(
        &self,
        resolver: &dyn TemplateResolver,
        target: &mut Dictionary,
    ) -> Result<(), EvalError> {
        let mut frame = Frame::new(
            self.type_name(),
            target,
            self.scope.as_deref(),
            resolver,
        );
        self.expression.evaluate(&mut frame)?;
        Ok(())
    }

    /// Evaluate this item's tree into a fresh object.
    pub fn instantiate(&self, resolver: &dyn TemplateResolver) -> Result<Dictionary, EvalError> {
        let mut object = Dictionary::default();
        self.evaluate(resolver, &mut object)?;
        Ok(object)
    }

    /// Evaluate the activation filter for a candidate.
    ///
    /// The candidate's attributes are visible as variables on top of the
    /// item's closure scope. Items without a filter match everything.
    pub fn matches_filter(
        &self,
        resolver: &dyn TemplateResolver,
        candidate: &Dictionary,
    ) -> Result<bool, EvalError> {
        let Some(filter) = &self.filter else {
            return Ok(true);
        };

        let mut locals = self.scope.as_deref().cloned().unwrap_or_default();
        locals.extend(candidate.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut scratch = Dictionary::default();
        let mut frame = Frame::new(self.type_name(), &mut scratch, Some(&locals), resolver);
        Ok(filter.evaluate(&mut frame)?.is_truthy())
    }

    /// Build the object this item declares, if its filter lets it through.
    ///
    /// The tree is evaluated first; the filter then sees the resulting
    /// attributes as its candidate. Returns `Ok(None)` when the filter
    /// rejects the object.
    pub fn activate(&self, resolver: &dyn TemplateResolver) -> Result<Option<Dictionary>, EvalError> {
        let object = self.instantiate(resolver)?;
        if !self.matches_filter(resolver, &object)? {
            return Ok(None);
        }
        Ok(Some(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoTemplates;
    use objconf_core::Value;

    fn item(name: &str, filter: Option<Expr>) -> ConfigItem {
        ConfigItem {
            type_entry: Arc::new(TypeEntry::config_object("Service")),
            name: name.to_string(),
            flags: ItemFlags::ABSTRACT,
            expression: Expr::inline_dict(vec![], DebugInfo::default()),
            filter: filter.map(Arc::new),
            debug_info: DebugInfo::default(),
            scope: None,
            zone: Some("master".into()),
            package: None,
        }
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn item_is_send_sync() {
        assert_send_sync::<ConfigItem>();
        assert_send_sync::<Arc<ConfigItem>>();
    }

    #[test]
    fn key_joins_type_and_name() {
        assert_eq!(item("ping4", None).key(), "Service!ping4");
    }

    #[test]
    fn flag_accessors() {
        let item = item("ping4", None);
        assert!(item.is_abstract());
        assert!(!item.is_default_template());
        assert!(!item.ignore_on_error());
        assert_eq!(item.zone(), Some("master"));
        assert_eq!(item.package(), None);
    }

    #[test]
    fn no_filter_matches() {
        let item = item("ping4", None);
        assert!(!item.has_filter());
        assert!(item.matches_filter(&NoTemplates, &Dictionary::default()).unwrap());
    }

    #[test]
    fn filter_sees_candidate_attributes() {
        let filter = Expr::variable("enabled", DebugInfo::default());
        let item = item("ping4", Some(filter));

        let mut candidate = Dictionary::default();
        candidate.insert("enabled".into(), Value::from(false));
        assert!(!item.matches_filter(&NoTemplates, &candidate).unwrap());

        candidate.insert("enabled".into(), Value::from(true));
        assert!(item.matches_filter(&NoTemplates, &candidate).unwrap());
    }

    #[test]
    fn activate_honors_filter() {
        let rejected = item("ping4", Some(Expr::literal(false, DebugInfo::default())));
        assert_eq!(rejected.activate(&NoTemplates).unwrap(), None);

        let accepted = item("ping6", Some(Expr::literal(true, DebugInfo::default())));
        assert_eq!(accepted.activate(&NoTemplates).unwrap(), Some(Dictionary::default()));

        assert!(item("ssh", None).activate(&NoTemplates).unwrap().is_some());
    }

    #[test]
    fn activate_filter_sees_own_attributes() {
        let mut item = item("ping4", Some(Expr::variable("address", DebugInfo::default())));
        item.expression = Expr::set(
            Expr::indexer(crate::ScopeSpecifier::This, "address", DebugInfo::default()),
            crate::SetOp::Set,
            Expr::literal("10.0.0.1", DebugInfo::default()),
            DebugInfo::default(),
        );

        let object = item.activate(&NoTemplates).unwrap().unwrap();
        assert_eq!(object["address"], Value::from("10.0.0.1"));
    }

    #[test]
    fn filter_errors_propagate() {
        let filter = Expr::variable("missing", DebugInfo::default());
        let item = item("ping4", Some(filter));
        assert!(item.matches_filter(&NoTemplates, &Dictionary::default()).is_err());
    }
}
