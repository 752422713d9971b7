//! # Error Types
//!
//! Domain-specific error types for larder-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  larder-core errors (this file)                                        │
//! │  └── ValidationError  - Barcode/input validation failures              │
//! │                                                                         │
//! │  larder-store errors (separate crate)                                  │
//! │  ├── StoreError       - Store actor unavailable                        │
//! │  └── PersistError     - Snapshot save/load failures                    │
//! │                                                                         │
//! │  larder-sync errors (separate crate)                                   │
//! │  ├── SyncError        - HTTP/config/coordinator failures               │
//! │  ├── ResolveError     - Resolution cancellation                        │
//! │  ├── CaptureError     - Camera permission/hardware failures            │
//! │  └── ScanError        - End-to-end scan flow failures                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field name, reason)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a scanned code or other user input doesn't meet
/// requirements. Used for early validation before any network call runs.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (bad check digit, control characters, etc.).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "barcode is required");

        let err = ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "check digit mismatch".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "barcode has invalid format: check digit mismatch"
        );
    }
}
