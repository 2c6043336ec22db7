//! Engine extension hooks
//!
//! `view.extension` names a hook registered in code. The hook runs once for
//! every engine instance right after construction, which is the place to add
//! custom filters, functions or helpers.
//!
//! ```rust
//! use tessera_view::{EngineHandle, Views};
//!
//! let views = Views::builder("/srv/app")
//!     .extension("shout", |engine: EngineHandle<'_>| {
//!         if let EngineHandle::MiniJinja(env) = engine {
//!             env.add_filter("shout", |s: String| s.to_uppercase());
//!         }
//!         Ok(())
//!     })
//!     .build();
//! # let _ = views;
//! ```

use super::EngineKind;
use crate::config::ConfigStore;
use crate::error::{Result, ViewError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Mutable access to a freshly built engine
pub enum EngineHandle<'a> {
    /// A Tera instance
    Tera(&'a mut tera::Tera),
    /// A MiniJinja environment
    MiniJinja(&'a mut minijinja::Environment<'static>),
    /// A Handlebars registry
    Handlebars(&'a mut handlebars::Handlebars<'static>),
}

impl EngineHandle<'_> {
    /// Which engine this handle points to
    pub fn kind(&self) -> EngineKind {
        match self {
            Self::Tera(_) => EngineKind::Tera,
            Self::MiniJinja(_) => EngineKind::MiniJinja,
            Self::Handlebars(_) => EngineKind::Handlebars,
        }
    }
}

/// A registered extension hook
pub type ExtensionFn = Arc<dyn Fn(EngineHandle<'_>) -> Result<()> + Send + Sync>;

/// Named extension hooks
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    hooks: HashMap<String, ExtensionFn>,
}

impl ExtensionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(EngineHandle<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Arc::new(hook));
    }

    /// Look up a hook
    pub fn get(&self, name: &str) -> Option<&ExtensionFn> {
        self.hooks.get(name)
    }

    /// Run the hook configured for `plugin`, if any
    pub(crate) fn apply(
        &self,
        config: &ConfigStore,
        plugin: &str,
        engine: EngineHandle<'_>,
    ) -> Result<()> {
        let Some(name) = config.plugin_get_as::<String>(plugin, "view.extension")? else {
            return Ok(());
        };
        let hook = self
            .get(&name)
            .ok_or_else(|| ViewError::UnknownExtension(name.clone()))?;

        tracing::debug!(extension = %name, engine = %engine.kind(), "applying view extension");
        hook(engine)
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.hooks.keys().collect();
        names.sort();
        f.debug_struct("ExtensionRegistry").field("hooks", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_no_extension_configured() {
        let registry = ExtensionRegistry::new();
        let mut tera = tera::Tera::default();
        registry
            .apply(&ConfigStore::new(), "", EngineHandle::Tera(&mut tera))
            .unwrap();
    }

    #[test]
    fn test_configured_extension_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut registry = ExtensionRegistry::new();
        registry.register("count", move |engine: EngineHandle<'_>| {
            assert_eq!(engine.kind(), EngineKind::Tera);
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let config = ConfigStore::new().with("view.extension", "count");
        let mut tera = tera::Tera::default();
        registry
            .apply(&config, "", EngineHandle::Tera(&mut tera))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_extension_is_an_error() {
        let registry = ExtensionRegistry::new();
        let config = ConfigStore::new().with("plugin.shop.view.extension", "missing");
        let mut tera = tera::Tera::default();

        let err = registry
            .apply(&config, "shop", EngineHandle::Tera(&mut tera))
            .unwrap_err();
        assert!(matches!(err, ViewError::UnknownExtension(name) if name == "missing"));
    }
}
