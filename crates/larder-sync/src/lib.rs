//! # larder-sync: Resolution & Reconciliation Engine
//!
//! Everything that talks to a network or a capture device lives here.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          larder-sync                                    │
//! │                                                                         │
//! │  ┌──────────────┐     ┌────────────────────┐     ┌─────────────────┐   │
//! │  │ ScanDevice / │     │ ResolutionPipeline │     │ SyncCoordinator │   │
//! │  │ CaptureSess. │ ──► │ (resolver.rs)      │     │ (coordinator.rs)│   │
//! │  │ (capture.rs) │     │                    │     │                 │   │
//! │  └──────────────┘     │  stage 1: remote   │     │ additive merge  │   │
//! │                       │  stage 2: fallback │     │ of the remote   │   │
//! │  ┌──────────────┐     │  coalesced +       │     │ listing into    │   │
//! │  │ ScanFlow     │ ──► │  cancellable       │     │ the local store │   │
//! │  │ (scan.rs)    │     └─────┬──────────┬───┘     └────────┬────────┘   │
//! │  └──────┬───────┘           │          │                  │            │
//! │         │            ┌──────▼─────┐ ┌──▼──────────────┐   │            │
//! │         │            │PantryClient│ │OpenFoodFacts-   │   │            │
//! │         │            │(remote.rs) │ │Client           │   │            │
//! │         │            └────────────┘ │(fallback.rs)    │   │            │
//! │         │                           └─────────────────┘   │            │
//! │         └────────────► larder-store ◄─────────────────────┘            │
//! │                        (single mutation owner)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - At most one lookup in flight per barcode, process-wide
//! - A cancelled scan session never mutates the store
//! - Reconciliation is additive: local entries are never removed or
//!   overwritten by sync

pub mod capture;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fallback;
pub mod remote;
pub mod resolver;
pub mod scan;

pub use capture::{CaptureSession, Decoded, ScanDevice};
pub use config::{FallbackSettings, LarderConfig, RemoteSettings, StoreSettings};
pub use coordinator::{SyncCoordinator, SyncHandle, SyncReport, SyncStatus};
pub use error::{CaptureError, ResolveError, ScanError, SyncError, SyncResult};
pub use fallback::{FallbackCatalog, FallbackProduct, OpenFoodFactsClient};
pub use remote::{AddToInventoryRequest, PantryClient, RemoteCatalog};
pub use resolver::ResolutionPipeline;
pub use scan::{ScanFlow, ScanOutcome};
