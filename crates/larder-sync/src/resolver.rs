//! # Resolution Pipeline
//!
//! Two-tier barcode resolution with per-stage deadlines, per-barcode
//! request coalescing and cooperative cancellation.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Resolution Pipeline                                │
//! │                                                                         │
//! │  barcode ──► STAGE 1: authoritative backend  (deadline T1)             │
//! │                 │                                                       │
//! │                 ├── match ────────────► Found { origin: Remote }       │
//! │                 │                                                       │
//! │                 └── miss/error/timeout                                 │
//! │                        │                                                │
//! │                        ▼                                                │
//! │              STAGE 2: Open Food Facts       (deadline T2)              │
//! │                 │                                                       │
//! │                 ├── match ──────► Found { origin: ExternalFallback }   │
//! │                 ├── miss ───────► NotFoundAnywhere { NoMatch }         │
//! │                 └── error/timeout ► NotFoundAnywhere                   │
//! │                                      { FallbackUnreachable }           │
//! │                                                                         │
//! │  COALESCING: at most one lookup in flight per barcode. Concurrent     │
//! │  callers for the same code attach to the running lookup and all       │
//! │  receive the same outcome.                                             │
//! │                                                                         │
//! │  CANCELLATION: the lookup task is detached - a caller abandoning its  │
//! │  wait never tears down work other callers share. Cancellation only    │
//! │  changes what the abandoning caller sees.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::timeout;
use tracing::{debug, warn};

use larder_core::{EntryDraft, NotFoundReason, Origin, ResolvedProduct};

use crate::error::ResolveError;
use crate::fallback::{FallbackCatalog, FallbackProduct};
use crate::remote::RemoteCatalog;

/// Broadcast depth for coalesced waiters. One value is ever sent per
/// channel, so any non-zero capacity works.
const COALESCE_CAPACITY: usize = 4;

type InFlightMap = HashMap<String, broadcast::Sender<ResolvedProduct>>;

// =============================================================================
// Resolution Pipeline
// =============================================================================

/// Resolves barcodes to product drafts via the two-tier lookup.
///
/// Cheap to clone; clones share the in-flight map, so coalescing holds
/// across every handle in the process.
#[derive(Clone)]
pub struct ResolutionPipeline {
    remote: Arc<dyn RemoteCatalog>,
    fallback: Arc<dyn FallbackCatalog>,
    scan_timeout: Duration,
    lookup_timeout: Duration,
    in_flight: Arc<Mutex<InFlightMap>>,
}

impl ResolutionPipeline {
    /// Builds a pipeline over the two catalog seams with per-stage deadlines.
    pub fn new(
        remote: Arc<dyn RemoteCatalog>,
        fallback: Arc<dyn FallbackCatalog>,
        scan_timeout: Duration,
        lookup_timeout: Duration,
    ) -> Self {
        ResolutionPipeline {
            remote,
            fallback,
            scan_timeout,
            lookup_timeout,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Resolves a barcode, waiting as long as it takes (both stage
    /// deadlines still apply inside).
    pub async fn resolve(&self, barcode: &str) -> Result<ResolvedProduct, ResolveError> {
        let mut rx = self.attach(barcode);
        rx.recv()
            .await
            .map_err(|e| ResolveError::Internal(e.to_string()))
    }

    /// Resolves a barcode with cooperative cancellation.
    ///
    /// When the watch flag flips to true the caller gets
    /// `Err(ResolveError::Cancelled)` immediately. The underlying lookup
    /// keeps running for any other waiters coalesced onto it.
    pub async fn resolve_with_cancel(
        &self,
        barcode: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<ResolvedProduct, ResolveError> {
        if *cancel.borrow() {
            return Err(ResolveError::Cancelled);
        }

        let mut rx = self.attach(barcode);
        loop {
            tokio::select! {
                result = rx.recv() => {
                    return result.map_err(|e| ResolveError::Internal(e.to_string()));
                }
                changed = cancel.changed() => {
                    match changed {
                        Ok(()) if *cancel.borrow() => return Err(ResolveError::Cancelled),
                        // Spurious change or controller dropped without
                        // cancelling: keep waiting for the outcome.
                        Ok(()) => continue,
                        Err(_) => {
                            return rx
                                .recv()
                                .await
                                .map_err(|e| ResolveError::Internal(e.to_string()));
                        }
                    }
                }
            }
        }
    }

    /// Joins the in-flight lookup for this barcode, starting one if none
    /// is running. The lookup task is detached and removes itself from the
    /// map before broadcasting, so no waiter can miss the outcome and no
    /// later caller can attach to a finished lookup.
    fn attach(&self, barcode: &str) -> broadcast::Receiver<ResolvedProduct> {
        let mut in_flight = self.in_flight.lock().expect("in-flight map poisoned");

        if let Some(tx) = in_flight.get(barcode) {
            debug!(barcode, "Coalescing onto in-flight lookup");
            return tx.subscribe();
        }

        let (tx, rx) = broadcast::channel(COALESCE_CAPACITY);
        in_flight.insert(barcode.to_string(), tx.clone());

        let pipeline = self.clone();
        let barcode = barcode.to_string();
        tokio::spawn(async move {
            let outcome = pipeline.lookup(&barcode).await;
            pipeline
                .in_flight
                .lock()
                .expect("in-flight map poisoned")
                .remove(&barcode);
            // All waiters gone is fine; the result just evaporates.
            let _ = tx.send(outcome);
        });

        rx
    }

    /// The actual two-tier lookup. Never fails: every stage failure folds
    /// into a tagged outcome.
    async fn lookup(&self, barcode: &str) -> ResolvedProduct {
        // Stage 1: authoritative backend. Errors and timeouts here are
        // treated like an explicit miss so an offline backend degrades to
        // the public fallback rather than blocking the scan.
        match timeout(self.scan_timeout, self.remote.scan_barcode(barcode)).await {
            Ok(Ok(resp)) if resp.found => match resp.item {
                Some(item) => {
                    debug!(barcode, item_id = item.id, "Resolved by pantry backend");
                    return ResolvedProduct::Found {
                        draft: item.into_draft(barcode),
                        origin: Origin::Remote,
                    };
                }
                None => {
                    warn!(barcode, "Backend reported found without item payload");
                }
            },
            Ok(Ok(_)) => {
                debug!(barcode, "Pantry backend has no match");
            }
            Ok(Err(e)) => {
                debug!(barcode, error = %e, "Pantry scan failed, trying fallback");
            }
            Err(_) => {
                debug!(barcode, "Pantry scan timed out, trying fallback");
            }
        }

        // Stage 2: public fallback. A definitive miss and an unreachable
        // database are distinguishable outcomes.
        match timeout(self.lookup_timeout, self.fallback.lookup(barcode)).await {
            Ok(Ok(Some(product))) => {
                debug!(barcode, "Resolved by Open Food Facts");
                ResolvedProduct::Found {
                    draft: draft_from_fallback(barcode, product),
                    origin: Origin::ExternalFallback,
                }
            }
            Ok(Ok(None)) => ResolvedProduct::NotFoundAnywhere {
                reason: NotFoundReason::NoMatch,
            },
            Ok(Err(e)) => {
                warn!(barcode, error = %e, "Fallback lookup failed");
                ResolvedProduct::NotFoundAnywhere {
                    reason: NotFoundReason::FallbackUnreachable,
                }
            }
            Err(_) => {
                warn!(barcode, "Fallback lookup timed out");
                ResolvedProduct::NotFoundAnywhere {
                    reason: NotFoundReason::FallbackUnreachable,
                }
            }
        }
    }
}

/// Builds the pre-insert entry shape from a fallback match. The scanned
/// barcode is the uniqueness key; the fallback never supplies a backend id.
fn draft_from_fallback(barcode: &str, product: FallbackProduct) -> EntryDraft {
    EntryDraft {
        barcode: barcode.to_string(),
        display_name: product.name,
        brand: product.brand,
        image_url: product.image_url,
        quantity_label: product.quantity,
        nutrition: product.nutrition,
        remote_item_id: None,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::remote::{AddToInventoryRequest, RemoteInventoryRow, ScanItem, ScanResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum RemoteScript {
        Hit,
        HitWithoutItem,
        Miss,
        SlowMiss,
        Fail,
        SlowHit,
    }

    struct MockRemote {
        script: RemoteScript,
        calls: AtomicUsize,
    }

    impl MockRemote {
        fn new(script: RemoteScript) -> Arc<Self> {
            Arc::new(MockRemote {
                script,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn item(barcode: &str) -> ScanItem {
            ScanItem {
                id: 42,
                name: "Minute Maid Orange Juice".into(),
                barcode: Some(barcode.to_string()),
                brand: Some("Minute Maid".into()),
                calories_per_serving: Some(110.0),
                protein_per_serving: None,
                carbs_per_serving: None,
                fat_per_serving: None,
            }
        }
    }

    #[async_trait]
    impl RemoteCatalog for MockRemote {
        async fn scan_barcode(&self, barcode: &str) -> Result<ScanResponse, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                RemoteScript::Hit => Ok(ScanResponse {
                    found: true,
                    item: Some(Self::item(barcode)),
                    message: None,
                }),
                RemoteScript::HitWithoutItem => Ok(ScanResponse {
                    found: true,
                    item: None,
                    message: Some("match without payload".into()),
                }),
                RemoteScript::Miss => Ok(ScanResponse {
                    found: false,
                    item: None,
                    message: None,
                }),
                RemoteScript::SlowMiss => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(ScanResponse {
                        found: false,
                        item: None,
                        message: None,
                    })
                }
                RemoteScript::Fail => Err(SyncError::Http("connection refused".into())),
                RemoteScript::SlowHit => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(ScanResponse {
                        found: true,
                        item: Some(Self::item(barcode)),
                        message: None,
                    })
                }
            }
        }

        async fn add_to_inventory(&self, _req: &AddToInventoryRequest) -> Result<(), SyncError> {
            Ok(())
        }

        async fn fetch_inventory(&self) -> Result<Vec<RemoteInventoryRow>, SyncError> {
            Ok(Vec::new())
        }
    }

    #[derive(Clone, Copy)]
    enum FallbackScript {
        Hit,
        Miss,
        Fail,
    }

    struct MockFallback {
        script: FallbackScript,
        calls: AtomicUsize,
    }

    impl MockFallback {
        fn new(script: FallbackScript) -> Arc<Self> {
            Arc::new(MockFallback {
                script,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FallbackCatalog for MockFallback {
        async fn lookup(&self, _barcode: &str) -> Result<Option<FallbackProduct>, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                FallbackScript::Hit => Ok(Some(FallbackProduct {
                    name: "Thai Kitchen Rice Noodles".into(),
                    brand: "Thai Kitchen".into(),
                    image_url: None,
                    quantity: Some("155 g".into()),
                    nutrition: larder_core::Nutrition {
                        calories: Some(380.0),
                        ..Default::default()
                    },
                })),
                FallbackScript::Miss => Ok(None),
                FallbackScript::Fail => Err(SyncError::Timeout),
            }
        }
    }

    fn pipeline(
        remote: Arc<MockRemote>,
        fallback: Arc<MockFallback>,
    ) -> ResolutionPipeline {
        ResolutionPipeline::new(
            remote,
            fallback,
            Duration::from_secs(3),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_remote_hit_short_circuits_fallback() {
        let remote = MockRemote::new(RemoteScript::Hit);
        let fallback = MockFallback::new(FallbackScript::Hit);
        let p = pipeline(remote.clone(), fallback.clone());

        let outcome = p.resolve("0041220576500").await.unwrap();
        match outcome {
            ResolvedProduct::Found { draft, origin } => {
                assert_eq!(origin, Origin::Remote);
                assert_eq!(draft.remote_item_id, Some(42));
                assert_eq!(draft.barcode, "0041220576500");
            }
            other => panic!("expected remote match, got {other:?}"),
        }
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_miss_falls_through_to_fallback() {
        let remote = MockRemote::new(RemoteScript::Miss);
        let fallback = MockFallback::new(FallbackScript::Hit);
        let p = pipeline(remote, fallback);

        let outcome = p.resolve("737628064502").await.unwrap();
        match outcome {
            ResolvedProduct::Found { draft, origin } => {
                assert_eq!(origin, Origin::ExternalFallback);
                assert_eq!(draft.barcode, "737628064502");
                assert_eq!(draft.remote_item_id, None);
                assert_eq!(draft.nutrition.calories, Some(380.0));
            }
            other => panic!("expected fallback match, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remote_error_still_reaches_fallback() {
        let remote = MockRemote::new(RemoteScript::Fail);
        let fallback = MockFallback::new(FallbackScript::Hit);
        let p = pipeline(remote, fallback.clone());

        let outcome = p.resolve("737628064502").await.unwrap();
        assert!(outcome.is_found());
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_found_without_item_payload_is_a_miss() {
        let remote = MockRemote::new(RemoteScript::HitWithoutItem);
        let fallback = MockFallback::new(FallbackScript::Miss);
        let p = pipeline(remote, fallback.clone());

        let outcome = p.resolve("40170725").await.unwrap();
        assert_eq!(
            outcome,
            ResolvedProduct::NotFoundAnywhere {
                reason: NotFoundReason::NoMatch
            }
        );
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_both_miss_is_no_match() {
        let remote = MockRemote::new(RemoteScript::Miss);
        let fallback = MockFallback::new(FallbackScript::Miss);
        let p = pipeline(remote, fallback);

        let outcome = p.resolve("40170725").await.unwrap();
        assert_eq!(
            outcome,
            ResolvedProduct::NotFoundAnywhere {
                reason: NotFoundReason::NoMatch
            }
        );
    }

    #[tokio::test]
    async fn test_fallback_failure_is_distinguishable_from_no_match() {
        let remote = MockRemote::new(RemoteScript::Miss);
        let fallback = MockFallback::new(FallbackScript::Fail);
        let p = pipeline(remote, fallback);

        let outcome = p.resolve("40170725").await.unwrap();
        assert_eq!(
            outcome,
            ResolvedProduct::NotFoundAnywhere {
                reason: NotFoundReason::FallbackUnreachable
            }
        );
    }

    #[tokio::test]
    async fn test_concurrent_resolves_coalesce_to_one_lookup() {
        let remote = MockRemote::new(RemoteScript::SlowHit);
        let fallback = MockFallback::new(FallbackScript::Miss);
        let p = pipeline(remote.clone(), fallback);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let p = p.clone();
            tasks.push(tokio::spawn(async move {
                p.resolve("0041220576500").await
            }));
        }

        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_found());
        }
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_coalesced_lookup_reaches_fallback_once() {
        // A slow remote miss makes the shared lookup continue into stage 2
        // while every caller is still attached: both stages must run at
        // most once for the whole window.
        let remote = MockRemote::new(RemoteScript::SlowMiss);
        let fallback = MockFallback::new(FallbackScript::Hit);
        let p = pipeline(remote.clone(), fallback.clone());

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let p = p.clone();
            tasks.push(tokio::spawn(async move {
                p.resolve("737628064502").await
            }));
        }

        for task in tasks {
            let outcome = task.await.unwrap().unwrap();
            match outcome {
                ResolvedProduct::Found { origin, .. } => {
                    assert_eq!(origin, Origin::ExternalFallback);
                }
                other => panic!("expected fallback match, got {other:?}"),
            }
        }
        assert_eq!(remote.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_sequential_resolves_do_not_coalesce() {
        let remote = MockRemote::new(RemoteScript::Hit);
        let fallback = MockFallback::new(FallbackScript::Miss);
        let p = pipeline(remote.clone(), fallback);

        p.resolve("0041220576500").await.unwrap();
        p.resolve("0041220576500").await.unwrap();
        assert_eq!(remote.calls(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_returns_cancelled() {
        let remote = MockRemote::new(RemoteScript::SlowHit);
        let fallback = MockFallback::new(FallbackScript::Miss);
        let p = pipeline(remote.clone(), fallback);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = {
            let p = p.clone();
            tokio::spawn(async move { p.resolve_with_cancel("0041220576500", cancel_rx).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel_tx.send(true).unwrap();

        assert_eq!(handle.await.unwrap(), Err(ResolveError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_caller_does_not_kill_shared_lookup() {
        let remote = MockRemote::new(RemoteScript::SlowHit);
        let fallback = MockFallback::new(FallbackScript::Miss);
        let p = pipeline(remote.clone(), fallback);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let abandoner = {
            let p = p.clone();
            tokio::spawn(async move { p.resolve_with_cancel("0041220576500", cancel_rx).await })
        };
        // A second caller on the same barcode coalesces onto the same task.
        let survivor = {
            let p = p.clone();
            tokio::spawn(async move { p.resolve("0041220576500").await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel_tx.send(true).unwrap();

        assert_eq!(abandoner.await.unwrap(), Err(ResolveError::Cancelled));
        assert!(survivor.await.unwrap().unwrap().is_found());
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_never_starts_lookup() {
        let remote = MockRemote::new(RemoteScript::Hit);
        let fallback = MockFallback::new(FallbackScript::Miss);
        let p = pipeline(remote.clone(), fallback);

        let (cancel_tx, cancel_rx) = watch::channel(true);
        let result = p.resolve_with_cancel("0041220576500", cancel_rx).await;
        drop(cancel_tx);

        assert_eq!(result, Err(ResolveError::Cancelled));
        assert_eq!(remote.calls(), 0);
    }
}
