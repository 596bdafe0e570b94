//! Shared handle to the current registry snapshot
//!
//! Readers take an `Arc` snapshot and keep using it for the whole request.
//! Reloading builds a complete new registry first and only then swaps the
//! pointer, so a reader sees either the old catalog or the new one.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::error::LoadError;
use crate::registry::SkillRegistry;
use crate::source::SkillSources;

/// Atomically swappable registry snapshot
#[derive(Debug)]
pub struct SkillCatalog {
    current: RwLock<Arc<SkillRegistry>>,
}

impl SkillCatalog {
    /// Wrap an initial registry
    pub fn new(registry: SkillRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// Current snapshot; stays valid after later swaps
    pub fn snapshot(&self) -> Arc<SkillRegistry> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install a new registry, returning the previous snapshot
    pub fn replace(&self, registry: SkillRegistry) -> Arc<SkillRegistry> {
        let next = Arc::new(registry);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Rebuild from `sources` and swap in the result.
    ///
    /// On failure the current snapshot is left untouched.
    pub fn reload(&self, sources: &SkillSources) -> Result<Arc<SkillRegistry>, LoadError> {
        let registry = SkillRegistry::discover(sources)?;
        info!("Reloaded skill catalog ({} skills)", registry.len());
        Ok(self.replace(registry))
    }
}
