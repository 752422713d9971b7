//! # Sync Error Types
//!
//! Error types for resolution, capture, and reconciliation.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Network      │  │  Configuration  │  │      Capture            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Http           │  │  InvalidConfig  │  │  PermissionDenied       │ │
//! │  │  Api {status}   │  │  InvalidUrl     │  │  Unavailable            │ │
//! │  │  Timeout        │  │  ConfigLoad/    │  │  SessionConsumed        │ │
//! │  │  Decode         │  │  SaveFailed     │  │  Closed                 │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────────────────────────────────┐  │
//! │  │   Resolution    │  │                Scan Flow                    │  │
//! │  │                 │  │                                             │  │
//! │  │  Cancelled      │  │  InvalidBarcode / Cancelled / Resolution /  │  │
//! │  │  Internal       │  │  Store                                      │  │
//! │  └─────────────────┘  └─────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  NOT ERRORS: "barcode not found" and "duplicate barcode" are tagged    │
//! │  values (`ResolvedProduct::NotFoundAnywhere`, `AddOutcome::            │
//! │  AlreadyExists`) - user-visible outcomes, never failures.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use larder_store::StoreError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// Sync Error
// =============================================================================

/// Network, configuration and coordinator failures.
///
/// ## Design Principles
/// - Each variant includes enough context for debugging
/// - Errors are categorized for different handling strategies
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Network Errors
    // =========================================================================
    /// Transport-level HTTP failure (connect, TLS, DNS, ...).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The service answered outside the 2xx range.
    #[error("remote service returned status {status}")]
    Api { status: u16 },

    /// The request exceeded its deadline.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to load the config file.
    #[error("failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save the config file.
    #[error("failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Coordinator Errors
    // =========================================================================
    /// The inventory store actor is gone.
    #[error("inventory store unavailable: {0}")]
    Store(String),

    /// The coordinator is shutting down.
    #[error("sync coordinator is shutting down")]
    ShuttingDown,

    /// Channel send/receive failed.
    #[error("channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout
        } else if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else {
            SyncError::Http(err.to_string())
        }
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::Store(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the operation can be retried later.
    ///
    /// ## Retryable
    /// - Transport failures and timeouts (network issues)
    /// - 5xx responses (server-side trouble)
    ///
    /// ## Non-Retryable
    /// - Configuration errors
    /// - 4xx responses and decode failures (retrying won't change them)
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Http(_) | SyncError::Timeout => true,
            SyncError::Api { status } => *status >= 500,
            _ => false,
        }
    }
}

// =============================================================================
// Resolution Error
// =============================================================================

/// Failures of a single resolution attempt.
///
/// Stage failures are NOT here: a stage-1 miss/timeout falls through to
/// stage 2 internally, and a stage-2 failure folds into
/// `ResolvedProduct::NotFoundAnywhere { reason: FallbackUnreachable }`.
/// Clone-able because coalesced waiters all receive the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The scan session was abandoned while the lookup was in flight.
    #[error("scan session cancelled")]
    Cancelled,

    /// The shared lookup task disappeared (should not happen).
    #[error("internal resolution error: {0}")]
    Internal(String),
}

// =============================================================================
// Capture Error
// =============================================================================

/// Failures of the capture capability. All terminal for the session; the
/// session never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The user denied the camera permission.
    #[error("camera permission denied")]
    PermissionDenied,

    /// No capture hardware is available on this device.
    #[error("no capture hardware available")]
    Unavailable,

    /// The session already produced its one terminal code.
    #[error("capture session already produced its code")]
    SessionConsumed,

    /// The device stopped delivering frames before any code decoded.
    #[error("capture device closed before decoding a code")]
    Closed,
}

// =============================================================================
// Scan Flow Error
// =============================================================================

/// Failures of the end-to-end scan-to-inventory flow.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The capture session failed before producing a code.
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// The decoded payload failed validation before any network call.
    #[error("invalid barcode: {0}")]
    InvalidBarcode(#[from] larder_core::ValidationError),

    /// The scan session was abandoned; nothing was added to the store.
    #[error("scan session cancelled")]
    Cancelled,

    /// Resolution failed internally.
    #[error("resolution failed: {0}")]
    Resolution(ResolveError),

    /// The inventory store actor is gone.
    #[error("inventory store unavailable: {0}")]
    Store(#[from] StoreError),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::Http("connection refused".into()).is_retryable());
        assert!(SyncError::Timeout.is_retryable());
        assert!(SyncError::Api { status: 503 }.is_retryable());

        assert!(!SyncError::Api { status: 404 }.is_retryable());
        assert!(!SyncError::Decode("bad json".into()).is_retryable());
        assert!(!SyncError::InvalidConfig("empty url".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SyncError::Api { status: 502 }.to_string(),
            "remote service returned status 502"
        );
        assert_eq!(
            CaptureError::PermissionDenied.to_string(),
            "camera permission denied"
        );
        assert_eq!(ResolveError::Cancelled.to_string(), "scan session cancelled");
    }
}
