//! Snapshot stores: where session state lives between mounts.
//!
//! A store holds at most one value and notifies subscribers on every write.
//! The owning component loads on start and writes on mutation; nothing else
//! reaches into the store, so it is injected rather than global.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::error::Result;

/// Repository interface for a single persisted value.
pub trait SnapshotStore<T>: Send + Sync {
    /// Current value, if any has been written.
    fn get(&self) -> Result<Option<T>>;

    /// Replace the value and notify subscribers.
    fn set(&self, value: T) -> Result<()>;

    /// Receiver that observes every subsequent write.
    fn subscribe(&self) -> watch::Receiver<Option<T>>;
}

/// In-memory store, the equivalent of per-tab session storage.
pub struct MemoryStore<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SnapshotStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync,
{
    fn get(&self) -> Result<Option<T>> {
        Ok(self.tx.borrow().clone())
    }

    fn set(&self, value: T) -> Result<()> {
        self.tx.send_replace(Some(value));
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }
}

/// Store backed by one JSON file, written atomically.
pub struct JsonFileStore<T> {
    path: PathBuf,
    tx: watch::Sender<Option<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Open a store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<T>(&content) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(?path, %e, "ignoring unreadable snapshot");
                    None
                }
            },
            Err(_) => None,
        };
        let (tx, _rx) = watch::channel(initial);
        Self {
            path,
            tx,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> SnapshotStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    fn get(&self) -> Result<Option<T>> {
        Ok(self.tx.borrow().clone())
    }

    fn set(&self, value: T) -> Result<()> {
        let json = serde_json::to_vec_pretty(&value)?;
        atomic_write(&self.path, &json)?;
        debug!(path = ?self.path, "snapshot written");
        self.tx.send_replace(Some(value));
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }
}

/// Write to a temp file then rename for atomic persistence.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    std::fs::write(&tmp, data)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
