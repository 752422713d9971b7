//! # Capture Session
//!
//! The hardware seam between a physical barcode reader (camera pipeline,
//! HID wedge scanner, test script) and the scan flow.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Capture Session Lifecycle                           │
//! │                                                                         │
//! │  CaptureSession::begin(device)                                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  device.start() ──► stream of decoded codes                            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  next_code():  first decoded code is TERMINAL for the session          │
//! │        │       ├─ acknowledge (haptic/beep hook on the device)         │
//! │        │       └─ stop the device                                       │
//! │        ▼                                                                │
//! │  session consumed - a second next_code() is SessionConsumed            │
//! │                                                                         │
//! │  cancel(): stops the device; an in-flight next_code() unblocks with    │
//! │  Closed. Failures (permission denied, no hardware, device closed)      │
//! │  are terminal; the session never retries on its own.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use larder_core::barcode::{classify, Symbology};

use crate::error::CaptureError;

// =============================================================================
// Decoded Code
// =============================================================================

/// One code decoded by a capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The raw decoded payload.
    pub text: String,

    /// The symbology the device decoded.
    pub symbology: Symbology,
}

impl Decoded {
    /// Convenience constructor for linear retail codes.
    pub fn linear(text: impl Into<String>) -> Self {
        let text = text.into();
        let symbology = classify(&text);
        Decoded { text, symbology }
    }
}

// =============================================================================
// Device Seam
// =============================================================================

/// A physical (or scripted) barcode reader.
///
/// `start` may fail with permission or availability errors; once started
/// the device pushes decoded codes into the returned channel until stopped
/// or closed.
#[async_trait]
pub trait ScanDevice: Send + Sync {
    /// Starts capture and returns the decoded-code stream.
    async fn start(&self) -> Result<mpsc::Receiver<Decoded>, CaptureError>;

    /// Stops capture. Idempotent.
    async fn stop(&self);

    /// Confirmation hook fired once when a code is accepted (haptic tick,
    /// beep). Default is a no-op for devices with no feedback channel.
    async fn acknowledge(&self) {}
}

// =============================================================================
// Capture Session
// =============================================================================

/// A single-shot capture session: one decoded code, then done.
///
/// The one-code-per-session rule is what makes "scan, look at the result,
/// scan again" the natural UX - re-arming is an explicit new session, so a
/// busy camera can never fire a burst of duplicate adds.
pub struct CaptureSession<'a> {
    device: &'a dyn ScanDevice,
    stream: mpsc::Receiver<Decoded>,
    consumed: bool,
}

impl std::fmt::Debug for CaptureSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("consumed", &self.consumed)
            .finish_non_exhaustive()
    }
}

impl<'a> CaptureSession<'a> {
    /// Starts the device and opens a session over its stream.
    pub async fn begin(device: &'a dyn ScanDevice) -> Result<CaptureSession<'a>, CaptureError> {
        let stream = device.start().await?;
        debug!("Capture session started");
        Ok(CaptureSession {
            device,
            stream,
            consumed: false,
        })
    }

    /// Waits for the first decoded code, acknowledges it, and stops the
    /// device. Terminal: a second call is `SessionConsumed`.
    pub async fn next_code(&mut self) -> Result<Decoded, CaptureError> {
        if self.consumed {
            return Err(CaptureError::SessionConsumed);
        }

        let decoded = match self.stream.recv().await {
            Some(decoded) => decoded,
            None => {
                self.consumed = true;
                return Err(CaptureError::Closed);
            }
        };

        self.consumed = true;
        info!(symbology = ?decoded.symbology, "Captured code");
        self.device.acknowledge().await;
        self.device.stop().await;
        Ok(decoded)
    }

    /// Abandons the session without consuming a code.
    pub async fn cancel(mut self) {
        self.consumed = true;
        self.device.stop().await;
        debug!("Capture session cancelled");
    }
}

// =============================================================================
// Tests
// =============================================================================
