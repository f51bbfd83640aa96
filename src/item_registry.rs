//! ItemRegistry - compiled items of one configuration generation.
//!
//! Items are stored per type, ordered by name, and addressed by the
//! `Type!name` key. Default templates are additionally indexed so that
//! `ImportDefaultTemplates` can find them.
//!
//! # Thread Safety
//!
//! Like the type registry, `ItemRegistry` is not internally synchronized.
//! Items are registered while a configuration is loaded and only read while
//! it is evaluated; callers that need both at once wrap the registry in
//! `Arc<RwLock<_>>`. The items themselves are immutable and shared freely.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use objconf_compiler::{ConfigItem, TemplateResolver};
use objconf_core::DebugInfo;

/// Errors that occur while registering items.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemRegistrationError {
    /// Another item with the same type and name is already registered.
    #[error(
        "A configuration item of type '{type_name}' and name '{name}' already exists ({existing}), new declaration: {new}"
    )]
    Duplicate {
        /// Type of both items.
        type_name: String,
        /// Name of both items.
        name: String,
        /// Where the registered item was declared.
        existing: DebugInfo,
        /// Where the rejected item was declared.
        new: DebugInfo,
    },
}

type ItemsByName = BTreeMap<String, Arc<ConfigItem>>;

/// Registry of compiled items, keyed by type name then object name.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    items: FxHashMap<String, ItemsByName>,
    default_templates: FxHashMap<String, ItemsByName>,
}

impl ItemRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item.
    ///
    /// Fails if an item with the same type and name exists. Default templates
    /// are also recorded in the per-type default template index.
    pub fn register(&mut self, item: Arc<ConfigItem>) -> Result<(), ItemRegistrationError> {
        let type_name = item.type_name().to_string();
        let by_name = self.items.entry(type_name.clone()).or_default();

        if let Some(existing) = by_name.get(item.name()) {
            return Err(ItemRegistrationError::Duplicate {
                type_name,
                name: item.name().to_string(),
                existing: existing.debug_info().clone(),
                new: item.debug_info().clone(),
            });
        }

        by_name.insert(item.name().to_string(), item.clone());

        if item.is_default_template() {
            self.default_templates
                .entry(type_name)
                .or_default()
                .insert(item.name().to_string(), item);
        }

        Ok(())
    }

    /// Remove an item, returning it if it was registered.
    pub fn unregister(&mut self, type_name: &str, name: &str) -> Option<Arc<ConfigItem>> {
        if let Some(defaults) = self.default_templates.get_mut(type_name) {
            defaults.remove(name);
        }
        self.items.get_mut(type_name)?.remove(name)
    }

    /// Look up an item by type and name.
    pub fn get(&self, type_name: &str, name: &str) -> Option<&Arc<ConfigItem>> {
        self.items.get(type_name)?.get(name)
    }

    /// Look up an item by its `Type!name` key.
    pub fn get_by_key(&self, key: &str) -> Option<&Arc<ConfigItem>> {
        let (type_name, name) = key.split_once(objconf_core::NAME_SEPARATOR)?;
        self.get(type_name, name)
    }

    /// All items of a type, ordered by name.
    pub fn items_of_type(&self, type_name: &str) -> impl Iterator<Item = &Arc<ConfigItem>> {
        self.items.get(type_name).into_iter().flat_map(|m| m.values())
    }

    /// Default templates of a type, ordered by name.
    pub fn default_templates_of(&self, type_name: &str) -> impl Iterator<Item = &Arc<ConfigItem>> {
        self.default_templates
            .get(type_name)
            .into_iter()
            .flat_map(|m| m.values())
    }

    /// All items, ordered by type name then object name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ConfigItem>> {
        let mut types: Vec<_> = self.items.keys().collect();
        types.sort();
        types
            .into_iter()
            .flat_map(move |t| self.items[t].values())
    }

    /// Drop every item, as on a configuration reload.
    pub fn clear(&mut self) {
        self.items.clear();
        self.default_templates.clear();
    }

    /// Number of registered items.
    pub fn len(&self) -> usize {
        self.items.values().map(|m| m.len()).sum()
    }

    /// Whether no items are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TemplateResolver for ItemRegistry {
    fn template(&self, type_name: &str, name: &str) -> Option<Arc<ConfigItem>> {
        self.get(type_name, name).cloned()
    }

    fn default_templates(&self, type_name: &str) -> Vec<Arc<ConfigItem>> {
        self.default_templates_of(type_name).cloned().collect()
    }
}
