//! # Inventory Store
//!
//! The canonical, deduplicated, ordered collection of inventory entries.
//!
//! ## Actor Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     InventoryStore Actor                                │
//! │                                                                         │
//! │  InventoryStoreHandle (Clone)          InventoryStore (actor task)     │
//! │  ───────────────────────────           ─────────────────────────────   │
//! │                                                                         │
//! │  add(entry) ─────┐                     ┌──────────────────────────┐    │
//! │  remove(id) ─────┤                     │  owns Vec<InventoryEntry>│    │
//! │  clear() ────────┼──► mpsc mailbox ──► │  one command at a time   │    │
//! │  all() ──────────┤    (StoreCommand)   │  uniqueness check here   │    │
//! │  subscribe() ────┘                     │  flush after mutation    │    │
//! │       ▲                                └───────────┬──────────────┘    │
//! │       │            oneshot reply / watch bump      │                   │
//! │       └────────────────────────────────────────────┘                   │
//! │                                                                         │
//! │  WHY AN ACTOR: scan-driven adds and sync-driven adds race. Because     │
//! │  every mutation flows through one mailbox, the duplicate check and     │
//! │  the insert are a single atomic step - the uniqueness invariant        │
//! │  holds for free, no locks to reason about.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! New entries are inserted at the front (most-recent-first). Readers only
//! ever see the collection between commands, never mid-mutation.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use larder_core::{AddOutcome, InventoryEntry};

use crate::error::{StoreError, StoreResult};
use crate::persist::PersistenceAdapter;

/// Mailbox depth. Commands are tiny and handled quickly; if this ever backs
/// up the system has a bigger problem than backpressure.
const MAILBOX_CAPACITY: usize = 64;

// =============================================================================
// Commands
// =============================================================================

enum StoreCommand {
    Add {
        entry: InventoryEntry,
        reply: oneshot::Sender<AddOutcome>,
    },
    Remove {
        id: Uuid,
        reply: oneshot::Sender<bool>,
    },
    RemoveMany {
        ids: Vec<Uuid>,
        reply: oneshot::Sender<usize>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    All {
        reply: oneshot::Sender<Vec<InventoryEntry>>,
    },
    Len {
        reply: oneshot::Sender<usize>,
    },
    ContainsBarcode {
        barcode: String,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

// =============================================================================
// Store Actor
// =============================================================================

/// The actor task owning the collection. Constructed via [`InventoryStore::spawn`].
pub struct InventoryStore {
    entries: Vec<InventoryEntry>,
    adapter: Arc<dyn PersistenceAdapter>,
    rx: mpsc::Receiver<StoreCommand>,
    revision_tx: watch::Sender<u64>,
}

impl InventoryStore {
    /// Loads the initial snapshot and spawns the store actor.
    ///
    /// A snapshot that cannot be loaded at all degrades to an empty
    /// collection - the store must stay usable with zero successful
    /// persistence interactions.
    pub async fn spawn(adapter: Arc<dyn PersistenceAdapter>) -> InventoryStoreHandle {
        let entries = match adapter.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to load inventory snapshot, starting empty");
                Vec::new()
            }
        };

        info!(count = entries.len(), "Inventory store starting");

        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let (revision_tx, revision_rx) = watch::channel(0u64);

        let store = InventoryStore {
            entries,
            adapter,
            rx,
            revision_tx,
        };
        tokio::spawn(store.run());

        InventoryStoreHandle { tx, revision_rx }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                StoreCommand::Add { entry, reply } => {
                    let outcome = self.add(entry).await;
                    let _ = reply.send(outcome);
                }
                StoreCommand::Remove { id, reply } => {
                    let removed = self.remove_ids(&[id]).await;
                    let _ = reply.send(removed == 1);
                }
                StoreCommand::RemoveMany { ids, reply } => {
                    let removed = self.remove_ids(&ids).await;
                    let _ = reply.send(removed);
                }
                StoreCommand::Clear { reply } => {
                    let had = self.entries.len();
                    self.entries.clear();
                    self.flush().await;
                    if had > 0 {
                        self.bump_revision();
                    }
                    debug!(removed = had, "Inventory cleared");
                    let _ = reply.send(());
                }
                StoreCommand::All { reply } => {
                    let _ = reply.send(self.entries.clone());
                }
                StoreCommand::Len { reply } => {
                    let _ = reply.send(self.entries.len());
                }
                StoreCommand::ContainsBarcode { barcode, reply } => {
                    let _ = reply.send(self.entries.iter().any(|e| e.barcode == barcode));
                }
                StoreCommand::Shutdown => {
                    info!("Inventory store shutting down");
                    break;
                }
            }
        }

        debug!("Inventory store stopped");
    }

    /// Inserts at the front unless the barcode is already present.
    ///
    /// The check and the insert happen in the same actor turn, so a
    /// scan-triggered add and a sync-triggered add for the same barcode can
    /// never both succeed, regardless of arrival order.
    async fn add(&mut self, entry: InventoryEntry) -> AddOutcome {
        if self.entries.iter().any(|e| e.barcode == entry.barcode) {
            debug!(barcode = %entry.barcode, "Rejected duplicate barcode");
            return AddOutcome::AlreadyExists;
        }

        debug!(
            barcode = %entry.barcode,
            origin = %entry.origin,
            "Adding inventory entry"
        );
        self.entries.insert(0, entry);
        self.flush().await;
        self.bump_revision();
        AddOutcome::Added
    }

    /// Removes entries by id. Absent ids are a no-op, not an error.
    /// Flushes regardless - removal always triggers a snapshot write.
    async fn remove_ids(&mut self, ids: &[Uuid]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !ids.contains(&e.id));
        let removed = before - self.entries.len();

        self.flush().await;
        if removed > 0 {
            self.bump_revision();
        }
        debug!(requested = ids.len(), removed, "Removed inventory entries");
        removed
    }

    /// Writes the whole collection through the adapter. Failures are logged
    /// and absorbed: the in-memory collection stays authoritative for the
    /// session and the previous snapshot stays intact on disk.
    async fn flush(&self) {
        if let Err(e) = self.adapter.save(&self.entries).await {
            warn!(error = %e, "Failed to persist inventory snapshot");
        }
    }

    fn bump_revision(&self) {
        self.revision_tx.send_modify(|rev| *rev += 1);
    }
}

// =============================================================================
// Store Handle
// =============================================================================

/// Clone-able handle to the store actor.
///
/// Every method is a message round trip; the only error is the actor being
/// gone. Domain outcomes (duplicate barcode, absent id) are values.
#[derive(Clone)]
pub struct InventoryStoreHandle {
    tx: mpsc::Sender<StoreCommand>,
    revision_rx: watch::Receiver<u64>,
}

impl InventoryStoreHandle {
    /// Inserts an entry at the front unless its barcode already exists.
    pub async fn add(&self, entry: InventoryEntry) -> StoreResult<AddOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreCommand::Add { entry, reply }).await?;
        rx.await.map_err(|_| StoreError::ChannelClosed)
    }

    /// Removes the entry with the given id. Returns false if absent.
    pub async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreCommand::Remove { id, reply }).await?;
        rx.await.map_err(|_| StoreError::ChannelClosed)
    }

    /// Removes all entries whose ids match. Returns how many were removed.
    pub async fn remove_many(&self, ids: Vec<Uuid>) -> StoreResult<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreCommand::RemoveMany { ids, reply }).await?;
        rx.await.map_err(|_| StoreError::ChannelClosed)
    }

    /// Empties the store.
    pub async fn clear(&self) -> StoreResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreCommand::Clear { reply }).await?;
        rx.await.map_err(|_| StoreError::ChannelClosed)
    }

    /// Returns an atomic snapshot of the collection, most recent first.
    pub async fn all(&self) -> StoreResult<Vec<InventoryEntry>> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreCommand::All { reply }).await?;
        rx.await.map_err(|_| StoreError::ChannelClosed)
    }

    /// Number of entries.
    pub async fn len(&self) -> StoreResult<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreCommand::Len { reply }).await?;
        rx.await.map_err(|_| StoreError::ChannelClosed)
    }

    /// True when the store is empty.
    pub async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// True when an entry with this barcode exists.
    pub async fn contains_barcode(&self, barcode: impl Into<String>) -> StoreResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreCommand::ContainsBarcode {
            barcode: barcode.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| StoreError::ChannelClosed)
    }

    /// Change notification, decoupled from any UI framework.
    ///
    /// The watch value is a revision counter bumped on every committed
    /// mutation; observers re-query via [`all`](Self::all) when it moves.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_rx.clone()
    }

    /// Signals the actor to stop. Pending commands already queued are
    /// processed first.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(StoreCommand::Shutdown).await;
    }

    async fn send(&self, cmd: StoreCommand) -> StoreResult<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| StoreError::ChannelClosed)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryAdapter;
    use larder_core::{EntryDraft, Origin};

    fn entry(barcode: &str, name: &str) -> InventoryEntry {
        EntryDraft::new(barcode, name).into_entry(Origin::LocalOnly)
    }

    async fn spawn_mem() -> (InventoryStoreHandle, Arc<MemoryAdapter>) {
        let adapter = Arc::new(MemoryAdapter::new());
        let handle = InventoryStore::spawn(adapter.clone()).await;
        (handle, adapter)
    }

    #[tokio::test]
    async fn test_add_duplicate_barcode_leaves_store_unchanged() {
        let (store, _) = spawn_mem().await;

        let first = entry("737628064502", "Rice Noodles");
        assert_eq!(store.add(first.clone()).await.unwrap(), AddOutcome::Added);

        let dup = entry("737628064502", "Different Name");
        assert_eq!(store.add(dup).await.unwrap(), AddOutcome::AlreadyExists);

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[0].display_name, "Rice Noodles");
    }

    #[tokio::test]
    async fn test_add_inserts_at_front() {
        let (store, _) = spawn_mem().await;

        store.add(entry("111", "first")).await.unwrap();
        store.add(entry("222", "second")).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all[0].barcode, "222");
        assert_eq!(all[1].barcode, "111");
    }

    #[tokio::test]
    async fn test_remove_absent_id_is_noop() {
        let (store, _) = spawn_mem().await;
        store.add(entry("111", "a")).await.unwrap();

        assert!(!store.remove(Uuid::new_v4()).await.unwrap());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_many() {
        let (store, _) = spawn_mem().await;
        let a = entry("111", "a");
        let b = entry("222", "b");
        let c = entry("333", "c");
        let ids = vec![a.id, c.id, Uuid::new_v4()];
        for e in [a, b, c] {
            store.add(e).await.unwrap();
        }

        assert_eq!(store.remove_many(ids).await.unwrap(), 2);
        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].barcode, "222");
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_preserves_order() {
        let adapter = Arc::new(MemoryAdapter::new());
        let store = InventoryStore::spawn(adapter.clone()).await;

        store.add(entry("111", "a")).await.unwrap();
        store.add(entry("222", "b")).await.unwrap();
        store.shutdown().await;

        // A fresh store on the same adapter sees the same barcodes in the
        // same order.
        let reloaded = InventoryStore::spawn(adapter).await;
        let all = reloaded.all().await.unwrap();
        let barcodes: Vec<_> = all.iter().map(|e| e.barcode.as_str()).collect();
        assert_eq!(barcodes, vec!["222", "111"]);
    }

    #[tokio::test]
    async fn test_clear_roundtrips_to_empty() {
        let adapter = Arc::new(MemoryAdapter::new());
        let store = InventoryStore::spawn(adapter.clone()).await;

        store.add(entry("111", "a")).await.unwrap();
        store.clear().await.unwrap();
        store.shutdown().await;

        let reloaded = InventoryStore::spawn(adapter).await;
        assert!(reloaded.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flush_failure_is_absorbed() {
        let (store, adapter) = spawn_mem().await;
        adapter.fail_saves(true);

        // The add still succeeds; the in-memory collection stays
        // authoritative for the session.
        assert_eq!(
            store.add(entry("111", "a")).await.unwrap(),
            AddOutcome::Added
        );
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_loads_empty() {
        let adapter = Arc::new(MemoryAdapter::with_raw(b"][ not json".to_vec()));
        let store = InventoryStore::spawn(adapter).await;
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds_same_barcode_insert_once() {
        let (store, _) = spawn_mem().await;

        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.add(entry("737628064502", &format!("racer {i}"))).await
            }));
        }

        let mut added = 0;
        for task in tasks {
            if task.await.unwrap().unwrap() == AddOutcome::Added {
                added += 1;
            }
        }

        assert_eq!(added, 1);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_sees_revision_bumps() {
        let (store, _) = spawn_mem().await;
        let mut rev = store.subscribe();
        assert_eq!(*rev.borrow_and_update(), 0);

        store.add(entry("111", "a")).await.unwrap();
        rev.changed().await.unwrap();
        assert_eq!(*rev.borrow_and_update(), 1);

        // A rejected duplicate commits nothing and bumps nothing.
        store.add(entry("111", "again")).await.unwrap();
        store.clear().await.unwrap();
        rev.changed().await.unwrap();
        assert_eq!(*rev.borrow_and_update(), 2);
    }

    #[tokio::test]
    async fn test_contains_barcode() {
        let (store, _) = spawn_mem().await;
        store.add(entry("111", "a")).await.unwrap();

        assert!(store.contains_barcode("111").await.unwrap());
        assert!(!store.contains_barcode("999").await.unwrap());
    }
}
