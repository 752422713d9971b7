//! # Store Error Types
//!
//! Error types for the inventory store and its persistence backing.
//!
//! ## Design Principles
//! - Persistence failures are absorbed by the store (logged, never fatal);
//!   the variants exist so adapters and tests can speak precisely
//! - `AddOutcome::AlreadyExists` is NOT here - duplicates are a tagged
//!   value on the operation, not an error

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store Error
// =============================================================================

/// Errors surfaced by the store handle.
///
/// The only way a handle call fails is the actor being gone; every domain
/// outcome (duplicate, absent id) is expressed as a value instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store actor task has stopped (shutdown or panic).
    #[error("inventory store task is not running")]
    ChannelClosed,
}

// =============================================================================
// Persist Error
// =============================================================================

/// Errors from a persistence adapter.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Underlying I/O failure while writing or renaming the snapshot.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The collection could not be serialized.
    #[error("failed to serialize snapshot: {0}")]
    Serialize(String),

    /// The stored data could not be deserialized.
    ///
    /// Adapters normally degrade this to an empty collection on `load`;
    /// the variant exists for backends that want to report it anyway.
    #[error("failed to deserialize snapshot: {0}")]
    Deserialize(String),

    /// The backing medium refused the operation (used by test adapters).
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PersistError::Serialize("bad value".into());
        assert_eq!(err.to_string(), "failed to serialize snapshot: bad value");
        assert_eq!(
            StoreError::ChannelClosed.to_string(),
            "inventory store task is not running"
        );
    }
}
