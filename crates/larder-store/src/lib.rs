//! # larder-store: Inventory Collection & Persistence
//!
//! The canonical, durably-backed inventory collection for Larder.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          larder-store                                   │
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌────────────────────────────────┐    │
//! │  │  InventoryStore      │        │  PersistenceAdapter (trait)    │    │
//! │  │  (actor, store.rs)   │──────► │  (persist.rs)                  │    │
//! │  │                      │ save/  │                                │    │
//! │  │  Single mutation     │ load   │  FileSnapshotAdapter (prod)    │    │
//! │  │  owner; barcode      │        │  MemoryAdapter (tests)         │    │
//! │  │  uniqueness lives    │        │                                │    │
//! │  │  here and only here  │        │  One fixed key, whole-         │    │
//! │  └──────────────────────┘        │  collection snapshots          │    │
//! │                                  └────────────────────────────────┘    │
//! │                                                                         │
//! │  Callers (larder-sync, UI shells) hold an InventoryStoreHandle and     │
//! │  never touch the collection or the snapshot directly.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - `add` rejects duplicate barcodes atomically (`AddOutcome::AlreadyExists`)
//! - readers get whole snapshots, never a partially-mutated state
//! - persistence failures degrade gracefully: logged, absorbed, the
//!   in-memory collection stays fully usable

pub mod error;
pub mod persist;
pub mod store;

pub use error::{PersistError, StoreError, StoreResult};
pub use persist::{FileSnapshotAdapter, MemoryAdapter, PersistenceAdapter, SNAPSHOT_FILE};
pub use store::{InventoryStore, InventoryStoreHandle};
