//! # Domain Types
//!
//! Core domain types used throughout Larder.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryEntry  │   │   EntryDraft    │   │ ResolvedProduct │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  barcode        │   │  Found          │       │
//! │  │  barcode (key)  │◄──│  display_name   │◄──│  NotFound-      │       │
//! │  │  origin         │   │  nutrition      │   │    Anywhere     │       │
//! │  │  date_added     │   │  (no identity)  │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Origin      │   │    Nutrition    │   │   AddOutcome    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Remote         │   │  calories?      │   │  Added          │       │
//! │  │  ExternalFallbck│   │  protein?       │   │  AlreadyExists  │       │
//! │  │  LocalOnly      │   │  carbs? fat?    │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Pattern
//! Every entry has:
//! - `id`: UUID v4 - immutable, used for removal by identity
//! - `barcode`: business key - unique (exact string match) within a store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Origin
// =============================================================================

/// Provenance of an inventory entry.
///
/// Records which source produced the entry so that sync and UI layers can
/// distinguish authoritative data from fallback and offline additions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Resolved by the authoritative pantry backend.
    Remote,
    /// Resolved by the public Open Food Facts fallback database.
    ExternalFallback,
    /// Added while fully offline; the backend has never seen it.
    LocalOnly,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Remote => write!(f, "remote"),
            Origin::ExternalFallback => write!(f, "external_fallback"),
            Origin::LocalOnly => write!(f, "local_only"),
        }
    }
}

// =============================================================================
// Nutrition
// =============================================================================

/// Per-unit nutrition facts, carried through unchanged from whichever
/// source resolved the product. No computation happens on these values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrition {
    /// Calories (kcal).
    pub calories: Option<f64>,

    /// Protein (grams).
    pub protein: Option<f64>,

    /// Carbohydrates (grams).
    pub carbs: Option<f64>,

    /// Fat (grams).
    pub fat: Option<f64>,
}

impl Nutrition {
    /// Returns true when no nutrition facts are known at all.
    pub fn is_empty(&self) -> bool {
        self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
    }
}

// =============================================================================
// Inventory Entry
// =============================================================================

/// A single item in the local inventory.
///
/// ## Invariant
/// `barcode` is unique (exact string match) across all entries in a store
/// instance. The store actor is the only place allowed to enforce this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Unique identifier (UUID v4).
    pub id: Uuid,

    /// Scanned product identifier - the business key.
    pub barcode: String,

    /// Display name shown in inventory lists.
    pub display_name: String,

    /// Brand name, empty string when unknown.
    #[serde(default)]
    pub brand: String,

    /// Product image URL, when a source provided one.
    #[serde(default)]
    pub image_url: Option<String>,

    /// Human-readable quantity ("1.5 l", "2.0 piece").
    #[serde(default)]
    pub quantity_label: Option<String>,

    /// Per-unit nutrition facts, carried through unchanged.
    #[serde(default)]
    pub nutrition: Nutrition,

    /// When the entry was added locally.
    pub date_added: DateTime<Utc>,

    /// Which source produced this entry.
    pub origin: Origin,
}

// =============================================================================
// Entry Draft
// =============================================================================

/// The pre-insert shape of an entry, produced by a resolution attempt.
///
/// A draft has no identity yet: `id` and `date_added` are stamped by
/// [`EntryDraft::into_entry`] at the moment the caller decides to keep it.
/// This keeps "what the network said" separate from "what we stored".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    /// Scanned product identifier.
    pub barcode: String,

    /// Display name from the resolving source.
    pub display_name: String,

    /// Brand name, empty string when unknown.
    #[serde(default)]
    pub brand: String,

    /// Product image URL, when the source provided one.
    #[serde(default)]
    pub image_url: Option<String>,

    /// Human-readable quantity from the source payload.
    #[serde(default)]
    pub quantity_label: Option<String>,

    /// Nutrition facts from the source payload.
    #[serde(default)]
    pub nutrition: Nutrition,

    /// Backend catalog id, present only when the authoritative remote
    /// resolved the barcode. Needed for the add-to-inventory call.
    #[serde(default)]
    pub remote_item_id: Option<i64>,
}

impl EntryDraft {
    /// Creates a minimal draft with just a barcode and a name.
    pub fn new(barcode: impl Into<String>, display_name: impl Into<String>) -> Self {
        EntryDraft {
            barcode: barcode.into(),
            display_name: display_name.into(),
            brand: String::new(),
            image_url: None,
            quantity_label: None,
            nutrition: Nutrition::default(),
            remote_item_id: None,
        }
    }

    /// Stamps identity onto the draft, producing a storable entry.
    pub fn into_entry(self, origin: Origin) -> InventoryEntry {
        InventoryEntry {
            id: Uuid::new_v4(),
            barcode: self.barcode,
            display_name: self.display_name,
            brand: self.brand,
            image_url: self.image_url,
            quantity_label: self.quantity_label,
            nutrition: self.nutrition,
            date_added: Utc::now(),
            origin,
        }
    }
}

// =============================================================================
// Resolution Outcome
// =============================================================================

/// Why a resolution attempt produced no product.
///
/// The distinction matters for retry UX only, never for store semantics:
/// a `FallbackUnreachable` barcode may be worth rescanning once the network
/// is back, a `NoMatch` barcode will not get better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    /// Both sources answered and neither knew the barcode.
    NoMatch,
    /// The fallback lookup failed or timed out, so the barcode may still
    /// exist in the fallback database.
    FallbackUnreachable,
}

/// Tagged result of a resolution attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedProduct {
    /// A source matched the barcode.
    Found {
        /// The pre-insert entry shape built from the source payload.
        draft: EntryDraft,
        /// Which source matched.
        origin: Origin,
    },
    /// Neither the remote nor the fallback produced a match.
    NotFoundAnywhere {
        /// Whether this is a definitive miss or a reachability problem.
        reason: NotFoundReason,
    },
}

impl ResolvedProduct {
    /// Returns true when a source matched the barcode.
    pub fn is_found(&self) -> bool {
        matches!(self, ResolvedProduct::Found { .. })
    }
}

// =============================================================================
// Add Outcome
// =============================================================================

/// Tagged result of an insert attempt on the inventory store.
///
/// Duplicate barcodes are an expected, user-visible outcome - not an error -
/// so they get a value of their own instead of an `Err` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The entry was inserted at the front of the collection.
    Added,
    /// An entry with the same barcode already exists; the store is unchanged.
    AlreadyExists,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_into_entry_stamps_identity() {
        let draft = EntryDraft::new("737628064502", "Thai Kitchen Rice Noodles");
        let entry = draft.into_entry(Origin::ExternalFallback);

        assert_eq!(entry.barcode, "737628064502");
        assert_eq!(entry.origin, Origin::ExternalFallback);
        assert!(!entry.id.is_nil());
        // ids must be unique across constructions
        let another = EntryDraft::new("737628064502", "Same").into_entry(Origin::LocalOnly);
        assert_ne!(entry.id, another.id);
    }

    #[test]
    fn test_nutrition_is_empty() {
        assert!(Nutrition::default().is_empty());
        let n = Nutrition {
            calories: Some(110.0),
            ..Default::default()
        };
        assert!(!n.is_empty());
    }

    #[test]
    fn test_origin_serde_snake_case() {
        let json = serde_json::to_string(&Origin::ExternalFallback).unwrap();
        assert_eq!(json, "\"external_fallback\"");
        let back: Origin = serde_json::from_str("\"local_only\"").unwrap();
        assert_eq!(back, Origin::LocalOnly);
    }

    #[test]
    fn test_entry_snapshot_roundtrip() {
        let entry = EntryDraft::new("0041220576500", "Minute Maid Orange Juice")
            .into_entry(Origin::Remote);
        let json = serde_json::to_string(&entry).unwrap();
        let back: InventoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_resolved_product_is_found() {
        let found = ResolvedProduct::Found {
            draft: EntryDraft::new("1", "x"),
            origin: Origin::Remote,
        };
        assert!(found.is_found());
        let miss = ResolvedProduct::NotFoundAnywhere {
            reason: NotFoundReason::NoMatch,
        };
        assert!(!miss.is_found());
    }
}
