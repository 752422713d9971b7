//! # Authoritative Pantry Backend Client
//!
//! HTTP client for the authoritative pantry service - stage 1 of the
//! resolution pipeline and the source of truth for reconciliation.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Pantry Backend API                                │
//! │                                                                         │
//! │  POST /api/pantry/scan            barcode ──► { found, item?, message }│
//! │  POST /api/pantry/inventory       mirror a local add to the backend    │
//! │  GET  /api/pantry/inventory       full remote inventory listing        │
//! │                                                                         │
//! │  All bodies are JSON with snake_case keys. Any non-2xx status is an    │
//! │  error; "barcode unknown" is `found: false` inside a 200, never a 404. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`RemoteCatalog`] trait is the seam tests mock; [`PantryClient`] is
//! the production implementation over reqwest.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use larder_core::{EntryDraft, Nutrition};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Catalog Seam
// =============================================================================

/// The authoritative backend's surface, as the pipeline and coordinator
/// see it. Object-safe so tests can substitute scripted catalogs.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Asks the backend whether it knows this barcode.
    async fn scan_barcode(&self, barcode: &str) -> SyncResult<ScanResponse>;

    /// Mirrors a locally-kept entry into the backend inventory.
    async fn add_to_inventory(&self, req: &AddToInventoryRequest) -> SyncResult<()>;

    /// Fetches the full remote inventory listing.
    async fn fetch_inventory(&self) -> SyncResult<Vec<RemoteInventoryRow>>;
}

// =============================================================================
// Wire Types
// =============================================================================

/// Response of `POST /api/pantry/scan`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanResponse {
    /// Whether the backend matched the barcode.
    pub found: bool,

    /// The matched catalog item. Expected to be present when `found` is
    /// true, but the pipeline tolerates its absence.
    #[serde(default)]
    pub item: Option<ScanItem>,

    /// Human-readable status message from the backend.
    #[serde(default)]
    pub message: Option<String>,
}

/// Catalog item payload inside a scan response.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanItem {
    /// Backend catalog id, needed for the add-to-inventory mirror call.
    pub id: i64,

    /// Product name.
    pub name: String,

    /// The barcode the backend has on file for this item.
    #[serde(default)]
    pub barcode: Option<String>,

    /// Brand name.
    #[serde(default)]
    pub brand: Option<String>,

    /// Per-serving nutrition facts.
    #[serde(default)]
    pub calories_per_serving: Option<f64>,
    #[serde(default)]
    pub protein_per_serving: Option<f64>,
    #[serde(default)]
    pub carbs_per_serving: Option<f64>,
    #[serde(default)]
    pub fat_per_serving: Option<f64>,
}

/// Body of `POST /api/pantry/inventory`.
#[derive(Debug, Clone, Serialize)]
pub struct AddToInventoryRequest {
    /// Backend catalog id from a prior scan match.
    pub item_id: i64,

    /// Quantity to record.
    pub quantity: f64,

    /// Unit for the quantity.
    pub unit: String,

    /// Storage location within the household.
    pub location: String,
}

impl AddToInventoryRequest {
    /// The mirror call for a just-scanned item: one piece in the pantry.
    pub fn one_piece(item_id: i64) -> Self {
        AddToInventoryRequest {
            item_id,
            quantity: 1.0,
            unit: "piece".to_string(),
            location: "pantry".to_string(),
        }
    }
}

/// One row of `GET /api/pantry/inventory`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteInventoryRow {
    /// Inventory row id on the backend.
    pub id: i64,

    /// Catalog item id this row refers to.
    pub item_id: i64,

    /// Quantity on hand.
    pub quantity: f64,

    /// Unit for the quantity.
    #[serde(default)]
    pub unit: String,

    /// The catalog item the row refers to.
    pub item: RemotePantryItem,
}

/// Catalog item payload nested inside an inventory row.
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePantryItem {
    /// Product name.
    pub name: String,

    /// Barcode on file; rows without one cannot be merged locally.
    #[serde(default)]
    pub barcode: Option<String>,

    /// Brand name.
    #[serde(default)]
    pub brand: Option<String>,

    /// Per-serving nutrition facts.
    #[serde(default)]
    pub calories_per_serving: Option<f64>,
    #[serde(default)]
    pub protein_per_serving: Option<f64>,
    #[serde(default)]
    pub carbs_per_serving: Option<f64>,
    #[serde(default)]
    pub fat_per_serving: Option<f64>,
}

// =============================================================================
// Wire → Domain Mapping
// =============================================================================

impl ScanItem {
    /// Builds the pre-insert entry shape from a scan match.
    ///
    /// The backend's own barcode string is preferred; when the item record
    /// carries none, the barcode actually scanned is kept so the local
    /// uniqueness key matches what the user will scan again.
    pub fn into_draft(self, scanned_barcode: &str) -> EntryDraft {
        EntryDraft {
            barcode: self
                .barcode
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| scanned_barcode.to_string()),
            display_name: self.name,
            brand: self.brand.unwrap_or_default(),
            image_url: None,
            quantity_label: None,
            nutrition: Nutrition {
                calories: self.calories_per_serving,
                protein: self.protein_per_serving,
                carbs: self.carbs_per_serving,
                fat: self.fat_per_serving,
            },
            remote_item_id: Some(self.id),
        }
    }
}

impl RemoteInventoryRow {
    /// Builds the pre-insert entry shape from a remote inventory row.
    /// Returns None when the row's item carries no barcode - such rows have
    /// no local uniqueness key and are skipped by the coordinator.
    pub fn into_draft(self) -> Option<EntryDraft> {
        let barcode = self.item.barcode.filter(|b| !b.is_empty())?;
        Some(EntryDraft {
            barcode,
            display_name: self.item.name,
            brand: self.item.brand.unwrap_or_default(),
            image_url: None,
            quantity_label: Some(format!("{} {}", self.quantity, self.unit)),
            nutrition: Nutrition {
                calories: self.item.calories_per_serving,
                protein: self.item.protein_per_serving,
                carbs: self.item.carbs_per_serving,
                fat: self.item.fat_per_serving,
            },
            remote_item_id: Some(self.item_id),
        })
    }
}

// =============================================================================
// Pantry Client
// =============================================================================

/// reqwest-backed client for the pantry backend.
#[derive(Debug, Clone)]
pub struct PantryClient {
    client: reqwest::Client,
    base_url: String,
}

impl PantryClient {
    /// Creates a client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        PantryClient {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Creates a client reusing an existing connection pool.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        PantryClient {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl RemoteCatalog for PantryClient {
    async fn scan_barcode(&self, barcode: &str) -> SyncResult<ScanResponse> {
        #[derive(Serialize)]
        struct ScanRequest<'a> {
            barcode: &'a str,
        }

        debug!(barcode, "Scanning barcode against pantry backend");
        let response = self
            .client
            .post(self.url("/api/pantry/scan"))
            .json(&ScanRequest { barcode })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::Api {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<ScanResponse>().await?)
    }

    async fn add_to_inventory(&self, req: &AddToInventoryRequest) -> SyncResult<()> {
        debug!(item_id = req.item_id, "Mirroring add to pantry backend");
        let response = self
            .client
            .post(self.url("/api/pantry/inventory"))
            .json(req)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::Api {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }

    async fn fetch_inventory(&self) -> SyncResult<Vec<RemoteInventoryRow>> {
        debug!("Fetching remote inventory listing");
        let response = self
            .client
            .get(self.url("/api/pantry/inventory"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::Api {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<Vec<RemoteInventoryRow>>().await?)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_response_decodes_match() {
        let json = r#"{
            "found": true,
            "item": {
                "id": 42,
                "name": "Minute Maid Orange Juice",
                "barcode": "0041220576500",
                "brand": "Minute Maid",
                "calories_per_serving": 110.0
            },
            "message": "Item found"
        }"#;
        let resp: ScanResponse = serde_json::from_str(json).unwrap();
        assert!(resp.found);
        let item = resp.item.unwrap();
        assert_eq!(item.id, 42);
        assert_eq!(item.barcode.as_deref(), Some("0041220576500"));
    }

    #[test]
    fn test_scan_response_decodes_miss_without_item() {
        let json = r#"{ "found": false, "message": "Unknown barcode" }"#;
        let resp: ScanResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.found);
        assert!(resp.item.is_none());
    }

    #[test]
    fn test_scan_item_into_draft_keeps_backend_id() {
        let item = ScanItem {
            id: 42,
            name: "Minute Maid Orange Juice".into(),
            barcode: Some("0041220576500".into()),
            brand: Some("Minute Maid".into()),
            calories_per_serving: Some(110.0),
            protein_per_serving: None,
            carbs_per_serving: Some(27.0),
            fat_per_serving: None,
        };
        let draft = item.into_draft("0041220576500");

        assert_eq!(draft.barcode, "0041220576500");
        assert_eq!(draft.remote_item_id, Some(42));
        assert_eq!(draft.nutrition.calories, Some(110.0));
        assert_eq!(draft.nutrition.carbs, Some(27.0));
    }

    #[test]
    fn test_scan_item_without_barcode_falls_back_to_scanned() {
        let item = ScanItem {
            id: 7,
            name: "Loose Produce".into(),
            barcode: None,
            brand: None,
            calories_per_serving: None,
            protein_per_serving: None,
            carbs_per_serving: None,
            fat_per_serving: None,
        };
        let draft = item.into_draft("40170725");
        assert_eq!(draft.barcode, "40170725");
    }

    #[test]
    fn test_inventory_row_into_draft_builds_quantity_label() {
        let json = r#"{
            "id": 1,
            "item_id": 42,
            "quantity": 1.5,
            "unit": "l",
            "item": {
                "name": "Milk",
                "barcode": "0016000275287",
                "brand": "General Mills",
                "protein_per_serving": 3.0
            }
        }"#;
        let row: RemoteInventoryRow = serde_json::from_str(json).unwrap();
        let draft = row.into_draft().unwrap();

        assert_eq!(draft.barcode, "0016000275287");
        assert_eq!(draft.quantity_label.as_deref(), Some("1.5 l"));
        assert_eq!(draft.remote_item_id, Some(42));
        assert_eq!(draft.nutrition.protein, Some(3.0));
    }

    #[test]
    fn test_inventory_row_without_barcode_is_skipped() {
        let json = r#"{
            "id": 2,
            "item_id": 9,
            "quantity": 1.0,
            "unit": "piece",
            "item": { "name": "Homemade Jam", "barcode": "" }
        }"#;
        let row: RemoteInventoryRow = serde_json::from_str(json).unwrap();
        assert!(row.into_draft().is_none());
    }

    #[test]
    fn test_add_request_serializes_snake_case() {
        let req = AddToInventoryRequest::one_piece(42);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["item_id"], 42);
        assert_eq!(json["quantity"], 1.0);
        assert_eq!(json["unit"], "piece");
        assert_eq!(json["location"], "pantry");
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = PantryClient::new("http://127.0.0.1:8000/");
        assert_eq!(
            client.url("/api/pantry/scan"),
            "http://127.0.0.1:8000/api/pantry/scan"
        );
    }
}
