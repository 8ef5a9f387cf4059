pub mod config;
pub mod legacy;
pub mod store;

pub use config::Config;
pub use store::TieredStore;

use std::path::PathBuf;

use crate::error::StoreError;

/// Returns `~/.config/alarmdeck[-dev]/` based on ALARMDECK_ENV.
///
/// Set ALARMDECK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ALARMDECK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("alarmdeck-dev")
    } else {
        base_dir.join("alarmdeck")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Fast local cache location, tier 0 of the persistence store.
/// Falls back next to the data directory when no platform cache dir exists.
pub fn cache_dir() -> Result<PathBuf, StoreError> {
    let dir = match dirs::cache_dir() {
        Some(base) => base.join("alarmdeck"),
        None => data_dir()?.join("cache"),
    };
    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(e.to_string()))?;
    Ok(dir)
}
