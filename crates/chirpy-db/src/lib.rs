pub mod error;
pub mod models;
pub mod queries;
pub mod snapshot;

pub use error::{Result, StoreError};

use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;

use crate::models::Snapshot;

/// JSON-file record store for chirps and users.
///
/// Every call reloads the file. Readers share the lock; a writer holds it
/// exclusively from load through persist, so no reader ever sees a half
/// applied mutation and writers never interleave.
pub struct Database {
    path: PathBuf,
    lock: RwLock<()>,
}

impl Database {
    /// Open the store, creating an empty snapshot file if none exists.
    /// A present but unreadable file is an error rather than being replaced.
    pub fn open(path: &Path) -> Result<Self> {
        let snapshot = snapshot::load(path)?;
        if !path.exists() {
            snapshot::persist(path, &snapshot)?;
        }

        info!(
            "Database opened at {} ({} chirps, {} users)",
            path.display(),
            snapshot.chirps.len(),
            snapshot.users.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            lock: RwLock::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a read-only closure against a freshly loaded snapshot.
    pub fn with_snapshot<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Snapshot) -> Result<T>,
    {
        let _guard = self.lock.read().map_err(|_| StoreError::Poisoned)?;
        let snapshot = snapshot::load(&self.path)?;
        f(&snapshot)
    }

    /// Load, mutate and persist under the write lock. Nothing is written if
    /// the closure fails.
    pub fn with_snapshot_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Snapshot) -> Result<T>,
    {
        let _guard = self.lock.write().map_err(|_| StoreError::Poisoned)?;
        let mut snapshot = snapshot::load(&self.path)?;
        let out = f(&mut snapshot)?;
        snapshot::persist(&self.path, &snapshot)?;
        Ok(out)
    }
}
