//! Per-root engine cache

use crate::error::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Engines keyed by the view root they were built for
///
/// The first lookup for a root runs the initializer while holding that
/// entry's lock, so concurrent first renders build the engine once. Entries
/// are never evicted.
///
/// The key is the root alone. Renders that share a root also share one
/// engine, including its suffix and extension hook, even when they come
/// from plugins with different `view.options`. The first render to reach a
/// root decides how that engine is set up. Templates named with a leading
/// `/` all resolve to the project root, so they share a single engine.
pub struct EngineCache<E> {
    engines: DashMap<PathBuf, Arc<E>>,
}

impl<E> EngineCache<E> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            engines: DashMap::new(),
        }
    }

    /// Return the engine for `root`, building it with `init` on first use
    ///
    /// A failed initialization is not cached; the next call tries again.
    pub fn get_or_try_init<F>(&self, root: &Path, init: F) -> Result<Arc<E>>
    where
        F: FnOnce() -> Result<E>,
    {
        if let Some(engine) = self.engines.get(root) {
            return Ok(Arc::clone(engine.value()));
        }

        match self.engines.entry(root.to_path_buf()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(slot) => {
                let engine = Arc::new(init()?);
                slot.insert(Arc::clone(&engine));
                Ok(engine)
            }
        }
    }

    /// Whether an engine exists for `root`
    pub fn contains(&self, root: &Path) -> bool {
        self.engines.contains_key(root)
    }

    /// Number of cached engines
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Whether no engine has been built yet
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl<E> Default for EngineCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EngineCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roots: Vec<PathBuf> = self.engines.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("EngineCache").field("roots", &roots).finish()
    }
}
