//! Shared Settings Handle
//!
//! Reload-without-restart support. A [`SharedSettings`] holds the current
//! record behind an [`ArcSwap`]: reads are lock-free, and a reload swaps in
//! a new fully-validated record atomically. Readers always observe either
//! the old or the new record, never a partially-updated one. A failed
//! reload leaves the current record in place.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::Result;
use crate::settings::loader::SettingsLoader;
use crate::settings::types::Settings;

/// Atomically swappable handle to the current settings record
pub struct SharedSettings {
    inner: ArcSwap<Settings>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: ArcSwap::from_pointee(settings),
        }
    }

    /// The current record
    pub fn current(&self) -> Arc<Settings> {
        self.inner.load_full()
    }

    /// Swap in a new record, returning the previous one
    pub fn replace(&self, next: Settings) -> Arc<Settings> {
        self.inner.swap(Arc::new(next))
    }

    /// Run a fresh [`SettingsLoader::load`] and swap the result in.
    ///
    /// On failure the current record is untouched.
    pub fn reload(&self) -> Result<Arc<Settings>> {
        let next = Arc::new(SettingsLoader::load()?);
        self.inner.store(Arc::clone(&next));
        Ok(next)
    }
}

impl From<Settings> for SharedSettings {
    fn from(settings: Settings) -> Self {
        Self::new(settings)
    }
}
