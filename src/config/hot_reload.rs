use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::EngineConfig;

/// Live-reloadable engine configuration.
///
/// Readers never block; a reload atomically swaps the pointer. Turns already
/// in flight keep the snapshot they started with.
pub struct ConfigHandle {
    inner: Arc<ArcSwap<EngineConfig>>,
    path: PathBuf,
}

impl ConfigHandle {
    pub fn new(config: EngineConfig) -> Self {
        let path = config.config_path.clone();
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
            path,
        }
    }

    /// Load current config snapshot. Lock-free.
    pub fn load(&self) -> arc_swap::Guard<Arc<EngineConfig>> {
        self.inner.load()
    }

    pub fn load_full(&self) -> Arc<EngineConfig> {
        self.inner.load_full()
    }

    /// Reload config from disk, atomically swapping the active snapshot.
    pub fn reload(&self) -> anyhow::Result<()> {
        let fresh = EngineConfig::load_from_path(&self.path)?;
        self.inner.store(Arc::new(fresh));
        tracing::info!(path = %self.path.display(), "engine config hot-reloaded");
        Ok(())
    }

    pub fn store(&self, config: EngineConfig) {
        self.inner.store(Arc::new(config));
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Clone for ConfigHandle {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            path: self.path.clone(),
        }
    }
}
