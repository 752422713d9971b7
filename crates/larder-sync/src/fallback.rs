//! # Open Food Facts Fallback Client
//!
//! Stage 2 of the resolution pipeline: a read-only lookup against the
//! public Open Food Facts database, consulted only after the authoritative
//! backend reported no match (or could not answer in time).
//!
//! ## Endpoint
//! ```text
//! GET {base}/api/v2/product/{barcode}.json
//!
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  status: 1 + product payload  ──► Some(FallbackProduct)                 │
//! │  status: 0 (unknown barcode)  ──► None (definitive miss)                │
//! │  HTTP 404                     ──► None (some deployments answer 404)    │
//! │  transport error / timeout    ──► Err (FallbackUnreachable upstream)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nutriment keys use OFF's per-100g naming, including the hyphenated
//! `energy-kcal_100g`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use larder_core::Nutrition;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Fallback Seam
// =============================================================================

/// A read-only product database the pipeline can fall back to.
#[async_trait]
pub trait FallbackCatalog: Send + Sync {
    /// Looks up a barcode. `Ok(None)` is a definitive miss; `Err` means the
    /// database could not be consulted.
    async fn lookup(&self, barcode: &str) -> SyncResult<Option<FallbackProduct>>;
}

// =============================================================================
// Domain Shape
// =============================================================================

/// Product facts extracted from a fallback match.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackProduct {
    /// Product name; never empty (a nameless match degrades to "Unknown Product").
    pub name: String,

    /// Brand string, empty when unknown.
    pub brand: String,

    /// Product photo URL.
    pub image_url: Option<String>,

    /// Package quantity string ("1.5 l", "330 ml").
    pub quantity: Option<String>,

    /// Per-100g nutrition facts.
    pub nutrition: Nutrition,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct OffResponse {
    /// 1 = found, 0 = unknown barcode.
    status: i32,

    #[serde(default)]
    product: Option<OffProduct>,
}

#[derive(Debug, Deserialize)]
struct OffProduct {
    #[serde(default)]
    product_name: Option<String>,

    #[serde(default)]
    brands: Option<String>,

    #[serde(default)]
    image_url: Option<String>,

    #[serde(default)]
    quantity: Option<String>,

    #[serde(default)]
    nutriments: Option<OffNutriments>,
}

#[derive(Debug, Deserialize)]
struct OffNutriments {
    #[serde(rename = "energy-kcal_100g", default)]
    energy_kcal: Option<f64>,

    #[serde(rename = "proteins_100g", default)]
    proteins: Option<f64>,

    #[serde(rename = "carbohydrates_100g", default)]
    carbohydrates: Option<f64>,

    #[serde(rename = "fat_100g", default)]
    fat: Option<f64>,
}

impl OffProduct {
    fn into_product(self) -> FallbackProduct {
        let nutriments = self.nutriments.unwrap_or(OffNutriments {
            energy_kcal: None,
            proteins: None,
            carbohydrates: None,
            fat: None,
        });

        FallbackProduct {
            name: self
                .product_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown Product".to_string()),
            brand: self.brands.unwrap_or_default(),
            image_url: self.image_url,
            quantity: self.quantity,
            nutrition: Nutrition {
                calories: nutriments.energy_kcal,
                protein: nutriments.proteins,
                carbs: nutriments.carbohydrates,
                fat: nutriments.fat,
            },
        }
    }
}

// =============================================================================
// Open Food Facts Client
// =============================================================================

/// reqwest-backed client for the Open Food Facts v2 product endpoint.
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    /// Creates a client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        OpenFoodFactsClient {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Creates a client reusing an existing connection pool.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        OpenFoodFactsClient {
            client,
            base_url: base_url.into(),
        }
    }

    fn product_url(&self, barcode: &str) -> String {
        format!(
            "{}/api/v2/product/{}.json",
            self.base_url.trim_end_matches('/'),
            barcode
        )
    }
}

#[async_trait]
impl FallbackCatalog for OpenFoodFactsClient {
    async fn lookup(&self, barcode: &str) -> SyncResult<Option<FallbackProduct>> {
        debug!(barcode, "Looking up barcode on Open Food Facts");
        let response = self.client.get(self.product_url(barcode)).send().await?;

        // OFF normally signals an unknown barcode with status:0 inside a
        // 200, but some deployments answer 404.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SyncError::Api {
                status: response.status().as_u16(),
            });
        }

        let body = response.json::<OffResponse>().await?;
        if body.status != 1 {
            debug!(barcode, "Open Food Facts has no record for barcode");
            return Ok(None);
        }

        Ok(body.product.map(OffProduct::into_product))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_payload_maps_all_fields() {
        let json = r#"{
            "status": 1,
            "product": {
                "product_name": "Thai Kitchen Rice Noodles",
                "brands": "Thai Kitchen",
                "image_url": "https://images.openfoodfacts.org/x.jpg",
                "quantity": "155 g",
                "nutriments": {
                    "energy-kcal_100g": 380.0,
                    "proteins_100g": 6.0,
                    "carbohydrates_100g": 84.0,
                    "fat_100g": 1.0
                }
            }
        }"#;
        let resp: OffResponse = serde_json::from_str(json).unwrap();
        let product = resp.product.unwrap().into_product();

        assert_eq!(product.name, "Thai Kitchen Rice Noodles");
        assert_eq!(product.brand, "Thai Kitchen");
        assert_eq!(product.quantity.as_deref(), Some("155 g"));
        assert_eq!(product.nutrition.calories, Some(380.0));
        assert_eq!(product.nutrition.carbs, Some(84.0));
    }

    #[test]
    fn test_status_zero_is_a_miss() {
        let json = r#"{ "status": 0 }"#;
        let resp: OffResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, 0);
        assert!(resp.product.is_none());
    }

    #[test]
    fn test_nameless_product_degrades_to_placeholder() {
        let json = r#"{ "status": 1, "product": { "product_name": "  " } }"#;
        let resp: OffResponse = serde_json::from_str(json).unwrap();
        let product = resp.product.unwrap().into_product();
        assert_eq!(product.name, "Unknown Product");
        assert!(product.nutrition.is_empty());
    }

    #[test]
    fn test_product_url_shape() {
        let client = OpenFoodFactsClient::new("https://world.openfoodfacts.org/");
        assert_eq!(
            client.product_url("0041220576500"),
            "https://world.openfoodfacts.org/api/v2/product/0041220576500.json"
        );
    }
}
