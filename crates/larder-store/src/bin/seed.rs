//! # Seed Snapshot Generator
//!
//! Writes a starter inventory snapshot for development, through the same
//! file adapter the store uses in production.
//!
//! ## Usage
//! ```bash
//! # Seed into the default ./data directory
//! cargo run -p larder-store --bin seed
//!
//! # Seed into a specific directory
//! cargo run -p larder-store --bin seed -- --dir /tmp/larder
//!
//! # Start from an empty snapshot instead
//! cargo run -p larder-store --bin seed -- --clear
//! ```
//!
//! Each seeded entry has a real retail barcode, a display name, a brand and
//! partial nutrition facts, tagged `origin=local_only` so a later sync run
//! exercises the "never remove local data" path against a backend that has
//! never seen them.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use larder_core::{EntryDraft, Nutrition, Origin};
use larder_store::{FileSnapshotAdapter, InventoryStore};

/// Pantry staples with real UPC/EAN codes.
const STAPLES: &[(&str, &str, &str, &str, Option<f64>)] = &[
    // (barcode, name, brand, quantity, calories)
    ("0041220576500", "Minute Maid Orange Juice", "Minute Maid", "59 fl oz", Some(110.0)),
    ("737628064502", "Thai Kitchen Rice Noodles", "Thai Kitchen", "155 g", Some(380.0)),
    ("0016000275287", "Cheerios", "General Mills", "12 oz", Some(100.0)),
    ("0051500255162", "Creamy Peanut Butter", "Jif", "16 oz", Some(190.0)),
    ("0064144282432", "Tomato Basil Pasta Sauce", "Classico", "24 oz", Some(60.0)),
    ("0018627703570", "Organic Black Beans", "Pacific Foods", "15 oz", Some(110.0)),
    ("0041196910759", "Chicken Noodle Soup", "Progresso", "19 oz", Some(100.0)),
    ("0030000010204", "Old Fashioned Oats", "Quaker", "42 oz", Some(150.0)),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut dir = PathBuf::from("./data");
    let mut clear = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dir" => {
                i += 1;
                dir = PathBuf::from(args.get(i).map(String::as_str).unwrap_or("./data"));
            }
            "--clear" => clear = true,
            other => {
                eprintln!("Unknown argument: {other}");
                eprintln!("Usage: seed [--dir <path>] [--clear]");
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let adapter = Arc::new(FileSnapshotAdapter::new(&dir));
    info!(path = %adapter.path().display(), "Seeding inventory snapshot");

    let store = InventoryStore::spawn(adapter.clone()).await;

    if clear {
        store.clear().await.expect("store actor stopped");
        info!("Snapshot cleared");
        store.shutdown().await;
        return;
    }

    let mut seeded = 0usize;
    let mut skipped = 0usize;

    // Walk the table in reverse so the first staple ends up at the front of
    // the most-recent-first collection.
    for (barcode, name, brand, quantity, calories) in STAPLES.iter().rev() {
        let mut draft = EntryDraft::new(*barcode, *name);
        draft.brand = (*brand).to_string();
        draft.quantity_label = Some((*quantity).to_string());
        draft.nutrition = Nutrition {
            calories: *calories,
            ..Default::default()
        };

        match store
            .add(draft.into_entry(Origin::LocalOnly))
            .await
            .expect("store actor stopped")
        {
            larder_core::AddOutcome::Added => seeded += 1,
            larder_core::AddOutcome::AlreadyExists => skipped += 1,
        }
    }

    info!(seeded, skipped, "Seed complete");
    store.shutdown().await;
}
