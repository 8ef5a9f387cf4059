pub mod alarm;
pub mod config;
pub mod migrate;
pub mod sync;

use alarmdeck_core::storage::data_dir;
use alarmdeck_core::{Config, HttpRemote, RemoteStore, SyncCoordinator, TieredStore};
use chrono::Utc;

/// Build and bootstrap a coordinator from the on-disk config.
pub(crate) fn open_engine() -> Result<SyncCoordinator, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = TieredStore::open(&config.storage.extra_tiers)?;

    let remote: Option<Box<dyn RemoteStore>> = if config.sync.enabled {
        match HttpRemote::new(&config.sync.remote_url) {
            Ok(remote) => Some(Box::new(remote)),
            Err(e) => {
                eprintln!("warning: remote sync disabled: {e}");
                None
            }
        }
    } else {
        None
    };

    let legacy = read_legacy_file();
    let mut coordinator = SyncCoordinator::new(store, remote);
    coordinator.bootstrap(legacy.as_deref(), Utc::now());
    Ok(coordinator)
}

/// Legacy flat-file location from older builds, if still present.
fn read_legacy_file() -> Option<String> {
    let path = data_dir().ok()?.join("alarms.txt");
    std::fs::read_to_string(path).ok()
}
