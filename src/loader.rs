//! ConfigLoader - compiles a batch of declarations and activates the result.
//!
//! Loading happens in two steps:
//!
//! 1. [`ConfigLoader::load`] compiles every declaration and registers the
//!    resulting items.
//! 2. [`ConfigLoader::commit`] evaluates every concrete item into an object.
//!    Items whose activation filter rejects the evaluated object are left out.
//!
//! A failure in either step aborts the whole load, unless the failing
//! declaration set `ignore_on_error`; such failures are logged, recorded in
//! the report and skipped. Compiler self-check failures always abort.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use objconf_compiler::{CompilationError, ConfigItem, ConfigItemBuilder, EvalError};
use objconf_core::Dictionary;

use crate::item_registry::{ItemRegistrationError, ItemRegistry};

/// Errors that abort (or, under `ignore_on_error`, skip) part of a load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// A declaration failed to compile.
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// A compiled item could not be registered.
    #[error(transparent)]
    Registration(#[from] ItemRegistrationError),

    /// An item failed to evaluate.
    #[error("Evaluation of '{key}' failed: {source}")]
    Evaluation {
        /// `Type!name` of the failing item.
        key: String,
        /// The evaluator error.
        source: EvalError,
    },
}

/// Outcome of [`ConfigLoader::load`].
#[derive(Debug, Default)]
pub struct LoadReport {
    /// `Type!name` keys of registered items, in load order.
    pub loaded: Vec<String>,
    /// Failures tolerated because of `ignore_on_error`.
    pub skipped: Vec<LoadError>,
}

/// An evaluated concrete object.
#[derive(Debug)]
pub struct ActivatedObject {
    /// The item that produced the object.
    pub item: Arc<ConfigItem>,
    /// The object's attributes.
    pub attributes: Dictionary,
}

/// Outcome of [`ConfigLoader::commit`].
#[derive(Debug, Default)]
pub struct CommitReport {
    /// Evaluated objects, ordered by type then name.
    pub objects: Vec<ActivatedObject>,
    /// `Type!name` keys of items whose filter rejected the object.
    pub filtered: Vec<String>,
    /// Failures tolerated because of `ignore_on_error`.
    pub skipped: Vec<LoadError>,
}

enum Admission {
    Loaded(Arc<ConfigItem>),
    Skipped(LoadError),
}

/// Compiles declarations into an [`ItemRegistry`] and evaluates them.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    registry: ItemRegistry,
}

impl ConfigLoader {
    /// Create a loader with an empty item registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader on top of an existing registry.
    pub fn with_registry(registry: ItemRegistry) -> Self {
        Self { registry }
    }

    /// The item registry.
    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    /// Take the item registry out of the loader.
    pub fn into_registry(self) -> ItemRegistry {
        self.registry
    }

    /// Compile and register one declaration.
    ///
    /// Returns `Ok(None)` if the declaration failed but set `ignore_on_error`.
    pub fn add(
        &mut self,
        builder: ConfigItemBuilder,
    ) -> Result<Option<Arc<ConfigItem>>, LoadError> {
        match self.admit(builder)? {
            Admission::Loaded(item) => Ok(Some(item)),
            Admission::Skipped(_) => Ok(None),
        }
    }

    fn admit(&mut self, builder: ConfigItemBuilder) -> Result<Admission, LoadError> {
        let ignore_on_error = builder.ignore_on_error();
        match self.compile_and_register(builder) {
            Ok(item) => Ok(Admission::Loaded(item)),
            Err(err) => tolerate(ignore_on_error, err).map(Admission::Skipped),
        }
    }

    fn compile_and_register(
        &mut self,
        builder: ConfigItemBuilder,
    ) -> Result<Arc<ConfigItem>, LoadError> {
        let item = Arc::new(builder.compile()?);
        self.registry.register(item.clone())?;
        Ok(item)
    }

    /// Compile and register a batch of declarations.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn load<I>(&mut self, builders: I) -> Result<LoadReport, LoadError>
    where
        I: IntoIterator<Item = ConfigItemBuilder>,
    {
        let mut report = LoadReport::default();

        for builder in builders {
            match self.admit(builder)? {
                Admission::Loaded(item) => report.loaded.push(item.key()),
                Admission::Skipped(err) => report.skipped.push(err),
            }
        }

        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            "loaded configuration items"
        );
        Ok(report)
    }

    /// Evaluate every concrete item into an object.
    ///
    /// Templates are not evaluated on their own; they only take effect when
    /// imported. Objects whose activation filter is false are listed in
    /// [`CommitReport::filtered`] instead.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn commit(&self) -> Result<CommitReport, LoadError> {
        let mut report = CommitReport::default();

        for item in self.registry.iter().filter(|item| !item.is_abstract()) {
            match item.activate(&self.registry) {
                Ok(Some(attributes)) => report.objects.push(ActivatedObject {
                    item: item.clone(),
                    attributes,
                }),
                Ok(None) => {
                    debug!(key = %item.key(), "filter rejected object");
                    report.filtered.push(item.key());
                }
                Err(source) => {
                    let err = LoadError::Evaluation {
                        key: item.key(),
                        source,
                    };
                    report.skipped.push(tolerate(item.ignore_on_error(), err)?);
                }
            }
        }

        info!(
            objects = report.objects.len(),
            filtered = report.filtered.len(),
            skipped = report.skipped.len(),
            "committed configuration items"
        );
        Ok(report)
    }
}

/// Skip `err` if the item allows it, returning the error to record.
///
/// Compiler self-check failures are never skipped.
fn tolerate(ignore_on_error: bool, err: LoadError) -> Result<LoadError, LoadError> {
    let internal = matches!(&err, LoadError::Compilation(e) if e.is_internal());
    if !ignore_on_error || internal {
        return Err(err);
    }
    warn!(error = %err, "ignoring failed configuration item");
    Ok(err)
}
