//! Hot-reloadable configuration snapshot
//!
//! The current [`BridgeConfig`] is held as an `Arc` behind a lock that is only
//! taken to clone or swap the pointer. Readers keep whatever snapshot they
//! cloned; a reload never mutates a snapshot in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};
use uplinkbridge_domain::{BridgeConfig, ConfigError};

use super::loader::load_from_file;

/// Shared, atomically replaceable configuration
#[derive(Debug)]
pub struct ConfigHandle {
    path: Option<PathBuf>,
    current: RwLock<Arc<BridgeConfig>>,
    modified: Mutex<Option<SystemTime>>,
}

impl ConfigHandle {
    /// Load the file and remember its modification time
    ///
    /// # Errors
    /// Returns any [`ConfigError`] from loading or validation.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let modified = modified_at(&path);
        let config = load_from_file(&path)?;
        info!(path = %path.display(), "Configuration loaded");

        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(config)),
            modified: Mutex::new(modified),
        })
    }

    /// A handle that is never reloaded
    pub fn fixed(config: BridgeConfig) -> Self {
        Self { path: None, current: RwLock::new(Arc::new(config)), modified: Mutex::new(None) }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<BridgeConfig> {
        Arc::clone(&self.current.read())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reload if the file changed since the last load attempt
    ///
    /// Returns the new snapshot when one was swapped in. A failed reload keeps
    /// the previous snapshot; the failing file is not retried until it
    /// changes again.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] of a failed reload.
    pub fn reload_if_changed(&self) -> Result<Option<Arc<BridgeConfig>>, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };

        let modified = modified_at(path);
        {
            let mut last = self.modified.lock();
            if modified == *last {
                return Ok(None);
            }
            *last = modified;
        }

        debug!(path = %path.display(), "Configuration file changed");
        let config = Arc::new(load_from_file(path)?);
        *self.current.write() = Arc::clone(&config);
        info!(path = %path.display(), "Configuration reloaded");
        Ok(Some(config))
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
