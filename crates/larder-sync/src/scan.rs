//! # Scan Flow
//!
//! The end-to-end path from a decoded barcode to an inventory outcome.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Scan Flow                                       │
//! │                                                                         │
//! │  raw payload                                                            │
//! │      │ normalize + validate (no network for garbage input)             │
//! │      ▼                                                                  │
//! │  ResolutionPipeline (coalesced, cancellable)                           │
//! │      │                                                                  │
//! │      ├── NotFoundAnywhere ───────────► ScanOutcome::NotFound           │
//! │      │                                                                  │
//! │      └── Found { draft, origin }                                       │
//! │             │                                                           │
//! │             │ origin == Remote: mirror the add to the backend          │
//! │             │ (best-effort) and nudge the sync coordinator             │
//! │             ▼                                                           │
//! │       store.add()  ──► Added ────────► ScanOutcome::Added(entry)       │
//! │                    ──► AlreadyExists ► ScanOutcome::Duplicate          │
//! │                                                                         │
//! │  CANCELLATION: checked again between resolution and the store          │
//! │  mutation - a scan abandoned mid-lookup never adds anything, even      │
//! │  when the coalesced lookup completes for someone else.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use larder_core::barcode;
use larder_core::{AddOutcome, InventoryEntry, NotFoundReason, Origin, ResolvedProduct};
use larder_store::InventoryStoreHandle;

use crate::capture::{CaptureSession, ScanDevice};
use crate::coordinator::SyncHandle;
use crate::error::{ResolveError, ScanError};
use crate::remote::{AddToInventoryRequest, RemoteCatalog};
use crate::resolver::ResolutionPipeline;

// =============================================================================
// Outcome
// =============================================================================

/// User-visible result of one scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The product resolved and was added to the inventory.
    Added(InventoryEntry),

    /// The product resolved but an entry with this barcode already exists.
    /// The existing entry is untouched.
    Duplicate { barcode: String },

    /// Neither source matched the barcode.
    NotFound { reason: NotFoundReason },
}

// =============================================================================
// Scan Flow
// =============================================================================

/// Wires capture, resolution and the store into the one-call scan path.
#[derive(Clone)]
pub struct ScanFlow {
    resolver: ResolutionPipeline,
    store: InventoryStoreHandle,
    remote: Arc<dyn RemoteCatalog>,
    sync: Option<SyncHandle>,
}

impl ScanFlow {
    /// Builds the flow. The sync handle is optional so the flow works in
    /// fully-offline configurations and in tests without a coordinator.
    pub fn new(
        resolver: ResolutionPipeline,
        store: InventoryStoreHandle,
        remote: Arc<dyn RemoteCatalog>,
        sync: Option<SyncHandle>,
    ) -> Self {
        ScanFlow {
            resolver,
            store,
            remote,
            sync,
        }
    }

    /// Runs a capture session on the device and feeds the decoded code
    /// through [`scan_to_inventory`](Self::scan_to_inventory).
    pub async fn scan_device(
        &self,
        device: &dyn ScanDevice,
        cancel: watch::Receiver<bool>,
    ) -> Result<ScanOutcome, ScanError> {
        let mut session = CaptureSession::begin(device).await?;
        let decoded = session.next_code().await?;
        self.scan_to_inventory(&decoded.text, cancel).await
    }

    /// Resolves a raw decoded payload and records the outcome in the store.
    pub async fn scan_to_inventory(
        &self,
        raw: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<ScanOutcome, ScanError> {
        let code = barcode::normalize(raw);
        barcode::validate(&code)?;

        let resolved = match self.resolver.resolve_with_cancel(&code, cancel.clone()).await {
            Ok(resolved) => resolved,
            Err(ResolveError::Cancelled) => return Err(ScanError::Cancelled),
            Err(e) => return Err(ScanError::Resolution(e)),
        };

        // The lookup may have completed on behalf of other coalesced
        // callers after this session was abandoned. Never let a late
        // result mutate the store.
        if *cancel.borrow() {
            debug!(barcode = %code, "Discarding resolution for cancelled scan");
            return Err(ScanError::Cancelled);
        }

        let (draft, origin) = match resolved {
            ResolvedProduct::Found { draft, origin } => (draft, origin),
            ResolvedProduct::NotFoundAnywhere { reason } => {
                info!(barcode = %code, ?reason, "Barcode not found anywhere");
                return Ok(ScanOutcome::NotFound { reason });
            }
        };

        // An authoritative match is mirrored into the backend inventory
        // and the reconciliation loop nudged. Both are best-effort: a dead
        // backend must never block the local add.
        if origin == Origin::Remote {
            if let Some(item_id) = draft.remote_item_id {
                if let Err(e) = self
                    .remote
                    .add_to_inventory(&AddToInventoryRequest::one_piece(item_id))
                    .await
                {
                    warn!(barcode = %code, error = %e, "Failed to mirror add to backend");
                }
            }
            if let Some(sync) = &self.sync {
                sync.trigger_detached();
            }
        }

        let entry = draft.into_entry(origin);
        match self.store.add(entry.clone()).await? {
            AddOutcome::Added => {
                info!(barcode = %code, origin = %origin, "Scan added inventory entry");
                Ok(ScanOutcome::Added(entry))
            }
            AddOutcome::AlreadyExists => {
                info!(barcode = %code, "Scan hit an existing inventory entry");
                Ok(ScanOutcome::Duplicate { barcode: code })
            }
        }
    }

    /// Scan without a cancellation controller (the session runs to
    /// completion).
    pub async fn scan(&self, raw: &str) -> Result<ScanOutcome, ScanError> {
        let (_tx, rx) = watch::channel(false);
        self.scan_to_inventory(raw, rx).await
    }
}

// =============================================================================
// Tests
// =============================================================================
