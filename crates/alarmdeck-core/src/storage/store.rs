//! Tiered persistence store for the alarm collection.
//!
//! Storage locations form an ordered fallback chain: a fast local cache
//! file first, then each candidate data-file path in priority order.
//! Reads skip unreadable or corrupt tiers and keep the freshest parsed
//! envelope; writes go to the cache best-effort and then to the first
//! file tier that accepts them. Persistence is best-effort throughout --
//! a session with zero writable tiers keeps operating from memory and
//! the caller only learns about it through the returned bool.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use super::{cache_dir, data_dir};
use crate::alarm::AlarmCollection;
use crate::error::StoreError;

/// File name shared by all tiers.
const COLLECTION_FILE: &str = "alarms.json";

/// Ordered multi-tier store for the persisted alarm collection.
pub struct TieredStore {
    /// Tier 0: fastest and most available, written unconditionally.
    cache: PathBuf,
    /// File tiers in priority order; the first writable one wins.
    tiers: Vec<PathBuf>,
}

impl TieredStore {
    /// Open the store at the default locations, appending any extra
    /// configured tier paths after the defaults.
    ///
    /// # Errors
    /// Returns an error only when no directory for the primary tier can
    /// be resolved at all.
    pub fn open(extra_tiers: &[PathBuf]) -> Result<Self, StoreError> {
        let cache = cache_dir()?.join(COLLECTION_FILE);
        let mut tiers = vec![data_dir()?.join(COLLECTION_FILE)];
        if let Some(home) = dirs::home_dir() {
            tiers.push(home.join(".alarmdeck.alarms.json"));
        }
        tiers.extend_from_slice(extra_tiers);
        Ok(Self { cache, tiers })
    }

    /// Build a store over explicit paths (tests and embedding).
    pub fn with_paths(cache: PathBuf, tiers: Vec<PathBuf>) -> Self {
        Self { cache, tiers }
    }

    /// All locations in priority order, cache first.
    fn all_tiers(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.cache).chain(self.tiers.iter())
    }

    /// Load the freshest parseable collection across all tiers.
    ///
    /// Corrupt or unreadable tiers are treated as empty and skipped.
    /// Returns `None` when every tier is empty or unreadable. Duplicate
    /// ids in the winning envelope are collapsed keeping the record with
    /// the greater `lastUpdated`.
    pub fn load(&self) -> Option<AlarmCollection> {
        let mut freshest: Option<AlarmCollection> = None;

        for path in self.all_tiers() {
            let collection = match read_tier(path) {
                Ok(Some(c)) => c,
                Ok(None) => continue,
                Err(e) => {
                    warn!(tier = %path.display(), error = %e, "skipping unreadable tier");
                    continue;
                }
            };
            // Priority order breaks ties, so only a strictly fresher
            // envelope replaces an earlier tier's.
            let fresher = freshest
                .as_ref()
                .map(|best| collection.last_updated > best.last_updated)
                .unwrap_or(true);
            if fresher {
                freshest = Some(collection);
            }
        }

        freshest.map(|mut c| {
            c.dedup_by_freshness();
            c.normalize();
            c
        })
    }

    /// Write the collection to every tier it can reach.
    ///
    /// The cache is written unconditionally (errors swallowed), then file
    /// tiers are attempted in order, stopping at the first success. A tier
    /// that has never been written is seeded with an empty envelope first
    /// so later loads can target it directly. Returns whether at least one
    /// tier accepted the write; never raises.
    pub fn save(&self, collection: &AlarmCollection) -> bool {
        let payload = match serde_json::to_string_pretty(collection) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to serialize alarm collection");
                return false;
            }
        };

        let mut ok = match write_atomic(&self.cache, &payload) {
            Ok(()) => true,
            Err(e) => {
                debug!(tier = %self.cache.display(), error = %e, "cache tier write failed");
                false
            }
        };

        for path in &self.tiers {
            if !path.exists() {
                self.seed(path);
            }
            match write_atomic(path, &payload) {
                Ok(()) => {
                    ok = true;
                    break;
                }
                Err(e) => {
                    warn!(tier = %path.display(), error = %e, "tier write failed, trying next");
                }
            }
        }

        if !ok {
            warn!("all persistence tiers failed; session continues from memory");
        }
        ok
    }

    /// Seed a never-written tier with an empty envelope. Best effort.
    fn seed(&self, path: &Path) {
        let empty = AlarmCollection::empty(Utc::now());
        if let Ok(payload) = serde_json::to_string_pretty(&empty) {
            if let Err(e) = write_atomic(path, &payload) {
                debug!(tier = %path.display(), error = %e, "failed to seed tier");
            }
        }
    }

    /// Whether any tier currently holds canonical data. Gates legacy
    /// migration: a presence hit means migration must not run again.
    pub fn has_data(&self) -> bool {
        self.load().is_some()
    }
}

fn read_tier(path: &Path) -> Result<Option<AlarmCollection>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let collection =
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(collection))
}

/// Write via a sibling temp file and rename so a tier never holds a
/// half-written envelope.
fn write_atomic(path: &Path, payload: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, payload)?;
    std::fs::rename(&tmp, path)
}
