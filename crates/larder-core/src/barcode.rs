//! # Barcode Validation
//!
//! Normalization, symbology classification and check-digit validation for
//! scanned codes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Capture hardware                                             │
//! │  ├── Decoder only reports codes it could read at all                   │
//! │  └── Symbology comes from the decoder                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any network call)                        │
//! │  ├── Reject empty / oversized / control-character payloads             │
//! │  └── Verify GS1 check digits for EAN-8 / UPC-A / EAN-13                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Inventory store                                              │
//! │  └── Barcode uniqueness at the single serialization point              │
//! │                                                                         │
//! │  Defense in depth: a mis-decoded linear code fails here instead of     │
//! │  producing a garbage "not found" round trip.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use larder_core::barcode::{normalize, validate};
//!
//! let code = normalize("  737628064502 ");
//! assert!(validate(&code).is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// Maximum accepted payload length. Linear retail codes are at most 13
/// digits; QR payloads can be longer but anything past this is noise.
pub const MAX_BARCODE_LEN: usize = 128;

// =============================================================================
// Symbology
// =============================================================================

/// The symbology family a scanned code belongs to.
///
/// Linear retail codes (EAN/UPC) are classified by digit count; everything
/// else a decoder hands us is treated as a 2D payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    /// 8-digit EAN-8.
    Ean8,
    /// 12-digit UPC-A.
    UpcA,
    /// 13-digit EAN-13.
    Ean13,
    /// QR or another 2D symbology with a free-form payload.
    TwoDimensional,
}

/// Classifies a normalized code by shape.
///
/// Purely structural: an all-digit payload of a retail length is assumed
/// linear, anything else 2D. Decoders that know better can report their own
/// symbology instead.
pub fn classify(code: &str) -> Symbology {
    if code.chars().all(|c| c.is_ascii_digit()) {
        match code.len() {
            8 => return Symbology::Ean8,
            12 => return Symbology::UpcA,
            13 => return Symbology::Ean13,
            _ => {}
        }
    }
    Symbology::TwoDimensional
}

// =============================================================================
// Normalization & Validation
// =============================================================================

/// Normalizes a raw decoded payload (trims surrounding whitespace).
pub fn normalize(raw: &str) -> String {
    raw.trim().to_string()
}

/// Validates a normalized code before it is allowed near the network.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most [`MAX_BARCODE_LEN`] characters
/// - Must not contain control characters
/// - EAN-8 / UPC-A / EAN-13 shaped codes must carry a valid GS1 check digit
///
/// ## Example
/// ```rust
/// use larder_core::barcode::validate;
///
/// assert!(validate("0041220576500").is_ok());  // EAN-13
/// assert!(validate("0041220576501").is_err()); // bad check digit
/// assert!(validate("").is_err());
/// ```
pub fn validate(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if code.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if code.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    match classify(code) {
        Symbology::Ean8 | Symbology::UpcA | Symbology::Ean13 => {
            if !check_digit_valid(code) {
                return Err(ValidationError::InvalidFormat {
                    field: "barcode".to_string(),
                    reason: "check digit mismatch".to_string(),
                });
            }
            Ok(())
        }
        Symbology::TwoDimensional => Ok(()),
    }
}

/// Verifies the GS1 mod-10 check digit of an all-digit code.
///
/// Weights alternate 1,3 starting from the rightmost (check) digit; the
/// weighted sum of a valid code is divisible by 10. The same rule covers
/// EAN-8, UPC-A and EAN-13.
pub fn check_digit_valid(digits: &str) -> bool {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let sum: u32 = digits
        .chars()
        .rev()
        .enumerate()
        .map(|(i, c)| {
            let d = c.to_digit(10).unwrap_or(0);
            if i % 2 == 1 {
                d * 3
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

// =============================================================================
// Unit Tests
// =============================================================================
