//! # larder-core: Pure Domain Logic for Larder
//!
//! This crate is the **heart** of Larder. It contains the domain model of
//! the barcode-to-inventory subsystem as pure types and functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Larder Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    larder-sync                                  │   │
//! │  │   Capture ──► ResolutionPipeline ──► ScanFlow ──► Coordinator   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ larder-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │  barcode  │  │   error   │                  │   │
//! │  │   │  Entry    │  │  validate │  │ Validation│                  │   │
//! │  │   │  Draft    │  │  classify │  │   Error   │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    larder-store                                 │   │
//! │  │       Inventory collection actor + snapshot persistence         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryEntry, EntryDraft, Origin, ...)
//! - [`barcode`] - Barcode normalization and check-digit validation
//! - [`error`] - Validation error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic modulo clock/uuid
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Explicit Outcomes**: Duplicates and misses are tagged values, never
//!    stringly-typed errors or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod error;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use larder_core::InventoryEntry` instead of
// `use larder_core::types::InventoryEntry`

pub use error::{ValidationError, ValidationResult};
pub use types::*;
