use std::path::Path;

use chrono::Utc;

use alarmdeck_core::storage::legacy;
use alarmdeck_core::{Config, SyncCoordinator, TieredStore};

/// Import a legacy flat-file alarm export.
///
/// Guarded by a canonical-data presence check: if any tier already holds
/// data the import is refused, because re-anchoring the legacy relative
/// offsets a second time would shift every deadline.
pub fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = TieredStore::open(&config.storage.extra_tiers)?;

    if store.has_data() {
        println!("canonical alarm data already exists; migration skipped");
        return Ok(());
    }

    let raw = std::fs::read_to_string(file)?;
    let now = Utc::now();
    if legacy::migrate(&raw, now).is_none() {
        return Err(format!("{} does not look like legacy alarm data", file.display()).into());
    }

    let mut coordinator = SyncCoordinator::new(store, None);
    coordinator.bootstrap(Some(&raw), now);
    println!("migrated {} alarms", coordinator.len());
    Ok(())
}
