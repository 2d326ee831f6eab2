//! In-process caching of resolved configurations

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{load, LoadOptions, ResolvedConfiguration};
use crate::error::{Error, Result};

type Entries = HashMap<LoadOptions, Arc<ResolvedConfiguration>>;

/// Caller-owned memoization of [`load`], keyed by [`LoadOptions`]
///
/// Nothing is ever invalidated automatically; the filesystem may change
/// between calls, so watchers call [`ConfigurationCache::invalidate`] or
/// [`ConfigurationCache::clear`] when they see a change.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationCache {
    entries: Arc<Mutex<Entries>>,
}

impl ConfigurationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>> {
        self.entries.lock().map_err(|_| Error::LockPoisoned {
            context: "configuration cache".to_string(),
        })
    }

    /// The configuration for `options`, loading it on first use.
    pub fn get_or_load(&self, options: &LoadOptions) -> Result<Arc<ResolvedConfiguration>> {
        self.get_or_insert_with(options, || load(options))
    }

    /// Like [`ConfigurationCache::get_or_load`] with a custom loader.
    ///
    /// The lock is not held while `loader` runs. Failed loads are not cached.
    pub fn get_or_insert_with<F>(
        &self,
        options: &LoadOptions,
        loader: F,
    ) -> Result<Arc<ResolvedConfiguration>>
    where
        F: FnOnce() -> Result<ResolvedConfiguration>,
    {
        if let Some(cached) = self.lock()?.get(options) {
            debug!("Configuration cache hit for {:?}", options.context);
            return Ok(Arc::clone(cached));
        }

        let resolved = Arc::new(loader()?);
        self.lock()?
            .insert(options.clone(), Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Drop the entry for `options`; returns whether one existed.
    pub fn invalidate(&self, options: &LoadOptions) -> Result<bool> {
        Ok(self.lock()?.remove(options).is_some())
    }

    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }
}
