//! # Persistence Adapters
//!
//! Durable whole-collection snapshotting behind a swappable seam.
//!
//! ## Snapshot Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Snapshot Persistence                               │
//! │                                                                         │
//! │  InventoryStore (actor)                                                │
//! │        │  save(&entries)   - whole collection, every mutation          │
//! │        ▼                                                                │
//! │  PersistenceAdapter (trait)                                            │
//! │        │                                                                │
//! │        ├── FileSnapshotAdapter      production: one fixed JSON file    │
//! │        │     write inventory.json.tmp ── rename ──► inventory.json     │
//! │        │     (rename is atomic: a failed write never corrupts the      │
//! │        │      previously saved snapshot)                               │
//! │        │                                                                │
//! │        └── MemoryAdapter            tests: bytes behind a mutex        │
//! │                                                                         │
//! │  SINGLE WRITER: only the store actor ever calls save(). No other       │
//! │  component touches the snapshot key.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Corruption policy: a snapshot that is absent or fails to deserialize is
//! treated as "no data" and loads as an empty collection. It is logged and
//! never fatal - the store must stay usable with zero successful loads.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, warn};

use larder_core::InventoryEntry;

use crate::error::PersistError;

/// File name of the snapshot - the one fixed storage key.
pub const SNAPSHOT_FILE: &str = "inventory.json";

// =============================================================================
// Adapter Trait
// =============================================================================

/// Durable whole-collection snapshotting.
///
/// Implementations read/write a full snapshot on behalf of the store and
/// never diff it. `load` degrades corruption to an empty collection.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Serializes the entire collection atomically under the fixed key.
    async fn save(&self, entries: &[InventoryEntry]) -> Result<(), PersistError>;

    /// Returns the previously saved collection, or an empty collection if
    /// the key is absent or the stored data fails to deserialize.
    async fn load(&self) -> Result<Vec<InventoryEntry>, PersistError>;
}

// =============================================================================
// File Snapshot Adapter
// =============================================================================

/// Production adapter: one JSON file under a data directory.
pub struct FileSnapshotAdapter {
    /// Full path of the snapshot file.
    path: PathBuf,
}

impl FileSnapshotAdapter {
    /// Creates an adapter storing the snapshot under `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        FileSnapshotAdapter {
            path: data_dir.as_ref().join(SNAPSHOT_FILE),
        }
    }

    /// Path of the snapshot file (for diagnostics).
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[async_trait]
impl PersistenceAdapter for FileSnapshotAdapter {
    async fn save(&self, entries: &[InventoryEntry]) -> Result<(), PersistError> {
        // Serialize first: a serialization failure leaves the old snapshot
        // untouched on disk.
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| PersistError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write-then-rename so readers never observe a partial file.
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), count = entries.len(), "Snapshot saved");
        Ok(())
    }

    async fn load(&self) -> Result<Vec<InventoryEntry>, PersistError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(PersistError::Io(e)),
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // Corruption is "no data", never fatal.
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Snapshot failed to deserialize, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }
}

// =============================================================================
// Memory Adapter (tests)
// =============================================================================

/// In-memory adapter for tests.
///
/// Stores the serialized snapshot bytes behind a mutex so tests can seed
/// corrupt data and flip saves into failures.
pub struct MemoryAdapter {
    bytes: Mutex<Option<Vec<u8>>>,
    fail_saves: Mutex<bool>,
}

impl MemoryAdapter {
    /// Creates an empty in-memory adapter.
    pub fn new() -> Self {
        MemoryAdapter {
            bytes: Mutex::new(None),
            fail_saves: Mutex::new(false),
        }
    }

    /// Creates an adapter pre-seeded with raw snapshot bytes.
    ///
    /// Useful for exercising the corruption path without touching disk.
    pub fn with_raw(bytes: Vec<u8>) -> Self {
        MemoryAdapter {
            bytes: Mutex::new(Some(bytes)),
            fail_saves: Mutex::new(false),
        }
    }

    /// Makes every subsequent `save` fail with `PersistError::Unavailable`.
    pub fn fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().expect("fail flag poisoned") = fail;
    }

    /// Raw stored bytes, if any (for assertions).
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.bytes.lock().expect("snapshot mutex poisoned").clone()
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryAdapter {
    async fn save(&self, entries: &[InventoryEntry]) -> Result<(), PersistError> {
        if *self.fail_saves.lock().expect("fail flag poisoned") {
            return Err(PersistError::Unavailable("save disabled by test".into()));
        }

        let bytes = serde_json::to_vec(entries)
            .map_err(|e| PersistError::Serialize(e.to_string()))?;
        *self.bytes.lock().expect("snapshot mutex poisoned") = Some(bytes);
        Ok(())
    }

    async fn load(&self) -> Result<Vec<InventoryEntry>, PersistError> {
        let guard = self.bytes.lock().expect("snapshot mutex poisoned");
        let Some(bytes) = guard.as_ref() else {
            return Ok(Vec::new());
        };

        match serde_json::from_slice(bytes) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(error = %e, "In-memory snapshot failed to deserialize, treating as empty");
                Ok(Vec::new())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
