//! # Sync Coordinator
//!
//! Background reconciliation between the remote pantry inventory and the
//! local store.
//!
//! ## Actor Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SyncCoordinator Actor                              │
//! │                                                                         │
//! │  SyncHandle (Clone)                    SyncCoordinator (actor task)    │
//! │  ──────────────────                    ─────────────────────────────   │
//! │                                                                         │
//! │  trigger() ──────┐                     ┌──────────────────────────┐    │
//! │  trigger_        ├──► mpsc mailbox ──► │  fetch remote listing    │    │
//! │    detached() ───┤                     │  merge additively into   │    │
//! │  shutdown() ─────┘                     │  the local store         │    │
//! │                                        └───────────┬──────────────┘    │
//! │  status() ◄──── Arc<RwLock<SyncStatus>> ◄──────────┘                   │
//! │                                                                         │
//! │  MERGE RULES (additive, local-first):                                  │
//! │  • remote rows whose barcode is new locally are imported               │
//! │  • rows whose barcode already exists are skipped - the local entry     │
//! │    wins verbatim, field by field (first writer wins)                   │
//! │  • sync NEVER removes a local entry, whatever the remote says          │
//! │  • rows without a barcode have no uniqueness key and are skipped       │
//! │                                                                         │
//! │  Remote listing order is preserved among imported rows: the merge     │
//! │  walks the listing back-to-front so front insertion reproduces it.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sync failure leaves the local collection untouched and is surfaced
//! through [`SyncStatus::last_error`]; scanning keeps working offline.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use larder_core::{AddOutcome, Origin};
use larder_store::InventoryStoreHandle;

use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteCatalog;

/// Mailbox depth. Triggers coalesce naturally: a full mailbox means a sync
/// is already queued and a detached trigger can be dropped.
const MAILBOX_CAPACITY: usize = 8;

// =============================================================================
// Status & Report
// =============================================================================

/// Observable state of the reconciliation loop.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    /// When the last successful sync completed.
    pub last_sync: Option<DateTime<Utc>>,

    /// Error message of the most recent failure, cleared on success.
    pub last_error: Option<String>,

    /// Number of successful syncs since spawn.
    pub sync_count: u64,

    /// Whether a sync pass is currently running.
    pub in_progress: bool,
}

/// What one sync pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Rows in the remote listing.
    pub fetched: usize,

    /// Rows imported as new local entries.
    pub imported: usize,

    /// Rows skipped because their barcode already exists locally.
    pub skipped_duplicates: usize,

    /// Rows skipped because their item carries no barcode.
    pub skipped_no_barcode: usize,
}

// =============================================================================
// Commands
// =============================================================================

enum SyncCommand {
    Trigger {
        reply: Option<oneshot::Sender<SyncResult<SyncReport>>>,
    },
    Shutdown,
}

// =============================================================================
// Coordinator Actor
// =============================================================================

/// The actor task owning the reconciliation loop. Constructed via
/// [`SyncCoordinator::spawn`].
pub struct SyncCoordinator {
    remote: Arc<dyn RemoteCatalog>,
    store: InventoryStoreHandle,
    status: Arc<RwLock<SyncStatus>>,
    rx: mpsc::Receiver<SyncCommand>,
}

impl SyncCoordinator {
    /// Spawns the coordinator and runs an initial sync pass immediately.
    ///
    /// The initial pass is best-effort like every other: a dead backend at
    /// startup just records an error and the app continues offline.
    pub fn spawn(remote: Arc<dyn RemoteCatalog>, store: InventoryStoreHandle) -> SyncHandle {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let status = Arc::new(RwLock::new(SyncStatus::default()));

        let coordinator = SyncCoordinator {
            remote,
            store,
            status: status.clone(),
            rx,
        };
        tokio::spawn(coordinator.run());

        // Queue the startup pass through the same mailbox as everything
        // else so it cannot race a caller's explicit trigger.
        let handle = SyncHandle { tx, status };
        handle.trigger_detached();
        handle
    }

    async fn run(mut self) {
        info!("Sync coordinator starting");

        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                SyncCommand::Trigger { reply } => {
                    let result = self.sync_once().await;
                    if let Some(reply) = reply {
                        let _ = reply.send(result);
                    }
                }
                SyncCommand::Shutdown => {
                    info!("Sync coordinator shutting down");
                    break;
                }
            }
        }

        debug!("Sync coordinator stopped");
    }

    /// One full reconciliation pass: fetch, merge, record status.
    async fn sync_once(&self) -> SyncResult<SyncReport> {
        self.status.write().await.in_progress = true;

        let result = self.sync_from_remote().await;

        let mut status = self.status.write().await;
        status.in_progress = false;
        match &result {
            Ok(report) => {
                status.last_sync = Some(Utc::now());
                status.last_error = None;
                status.sync_count += 1;
                info!(
                    fetched = report.fetched,
                    imported = report.imported,
                    skipped_duplicates = report.skipped_duplicates,
                    skipped_no_barcode = report.skipped_no_barcode,
                    "Sync pass complete"
                );
            }
            Err(e) => {
                status.last_error = Some(e.to_string());
                warn!(error = %e, retryable = e.is_retryable(), "Sync pass failed");
            }
        }

        result
    }

    async fn sync_from_remote(&self) -> SyncResult<SyncReport> {
        let rows = self.remote.fetch_inventory().await?;

        let mut report = SyncReport {
            fetched: rows.len(),
            ..Default::default()
        };

        // Walk the listing back-to-front: each import lands at the front
        // of the local collection, so imported rows end up in listing
        // order. Going through the store's add() keeps the uniqueness
        // check atomic with respect to concurrent scan-driven adds.
        for row in rows.into_iter().rev() {
            let draft = match row.into_draft() {
                Some(draft) => draft,
                None => {
                    report.skipped_no_barcode += 1;
                    continue;
                }
            };

            match self.store.add(draft.into_entry(Origin::Remote)).await? {
                AddOutcome::Added => report.imported += 1,
                AddOutcome::AlreadyExists => report.skipped_duplicates += 1,
            }
        }

        Ok(report)
    }
}

// =============================================================================
// Sync Handle
// =============================================================================

/// Clone-able handle to the sync coordinator.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncCommand>,
    status: Arc<RwLock<SyncStatus>>,
}

impl SyncHandle {
    /// Runs a sync pass and waits for its report.
    pub async fn trigger(&self) -> SyncResult<SyncReport> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SyncCommand::Trigger { reply: Some(reply) })
            .await
            .map_err(|_| SyncError::ShuttingDown)?;
        rx.await.map_err(|_| SyncError::ShuttingDown)?
    }

    /// Queues a sync pass without waiting. Dropped silently when the
    /// mailbox is full (a pass is already queued) or the coordinator is
    /// gone - background sync is always best-effort.
    pub fn trigger_detached(&self) {
        if let Err(e) = self.tx.try_send(SyncCommand::Trigger { reply: None }) {
            debug!(reason = %e, "Dropped detached sync trigger");
        }
    }

    /// Snapshot of the current sync status.
    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    /// Signals the coordinator to stop after queued commands drain.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(SyncCommand::Shutdown).await;
    }
}

// =============================================================================
// Tests
// =============================================================================
