//! Seed-data loading
//!
//! `serial_codes.json` maps each code to its audio reference and quota:
//!
//! ```json
//! {
//!     "1234": { "audio_url": "hayase.wav", "max_uses": 3 },
//!     "5678": { "audio_url": "https://cdn.example.com/track.mp3" }
//! }
//! ```
//!
//! The file populates an empty database at startup and backs the admin
//! sync operation afterwards.

use crate::error::Result;
use crate::store::{CodeStore, SeedEntry, SyncReport};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Parse a seed file into code entries.
pub fn load_seed_file(path: &Path) -> Result<BTreeMap<String, SeedEntry>> {
    let content = std::fs::read_to_string(path)?;
    let entries = serde_json::from_str(&content)?;
    Ok(entries)
}

/// Populate the store from the seed file, but only when the table is empty.
/// A missing file is not an error; the table just starts empty.
pub async fn seed_if_empty(store: &CodeStore, path: &Path) -> Result<()> {
    if store.count().await? > 0 {
        return Ok(());
    }

    if !path.exists() {
        warn!(
            "Seed file {} not found; starting with no serial codes",
            path.display()
        );
        return Ok(());
    }

    let entries = load_seed_file(path)?;
    let report = store.sync_from_entries(&entries).await?;
    info!(
        "Seeded {} serial codes from {}",
        report.created,
        path.display()
    );
    Ok(())
}

/// Re-read the seed file and upsert every entry (the admin sync operation).
pub async fn sync_from_file(store: &CodeStore, path: &Path) -> Result<SyncReport> {
    let entries = load_seed_file(path)?;
    store.sync_from_entries(&entries).await
}
