//! Alarm data model and the persisted collection envelope.
//!
//! An [`Alarm`] is a single deadline tracker. Its `target_timestamp` is the
//! single source of truth for remaining time; the decomposed
//! days/hours/minutes/seconds in [`Remaining`] are display-only, never
//! persisted, and recomputed from the target on every load and tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alarm lifecycle status. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmStatus {
    Active,
    Paused,
    Completed,
}

/// Recurrence mode. `Weekly` requires a non-empty `days_of_week` set on the
/// alarm (0 = Sunday .. 6 = Saturday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Once,
    Daily,
    Weekly,
    Monthly,
}

/// Derived remaining-time fields. Display-only: serde skips them entirely
/// so a stale decomposition can never be persisted as ground truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Remaining {
    /// Total seconds represented by this decomposition.
    pub fn total_seconds(&self) -> i64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.total_seconds() == 0
    }
}

/// A single deadline tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    /// Opaque unique id, immutable once created.
    pub id: String,
    pub title: String,
    /// Absolute point in time the countdown reaches zero.
    pub target_timestamp: DateTime<Utc>,
    pub status: AlarmStatus,
    pub recurrence: Recurrence,
    /// Weekday set for weekly recurrence, 0 = Sunday .. 6 = Saturday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    /// Timestamp of the most recent mutation; last-writer-wins key for
    /// reconciliation against the remote copy.
    pub last_updated: DateTime<Utc>,
    /// Display-only countdown fields, never persisted.
    #[serde(skip)]
    pub remaining: Remaining,
}

impl Alarm {
    pub fn is_active(&self) -> bool {
        self.status == AlarmStatus::Active
    }

    /// Bump the mutation timestamp. Every edit path goes through this.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = now;
    }
}

/// The persisted envelope written atomically to each storage tier.
///
/// The envelope `last_updated` is the freshness key used to pick a tier on
/// load. It is at least the max of the members' `last_updated`, and is
/// bumped past that on deletions so an emptied collection still outranks a
/// stale tier that predates the delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmCollection {
    pub alarms: Vec<Alarm>,
    pub last_updated: DateTime<Utc>,
}

impl AlarmCollection {
    /// An empty collection stamped at `now`.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            alarms: Vec::new(),
            last_updated: now,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Alarm> {
        self.alarms.iter_mut().find(|a| a.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Alarm> {
        let idx = self.alarms.iter().position(|a| a.id == id)?;
        Some(self.alarms.remove(idx))
    }

    /// Insert or replace by id.
    pub fn upsert(&mut self, alarm: Alarm) {
        match self.get_mut(&alarm.id) {
            Some(existing) => *existing = alarm,
            None => self.alarms.push(alarm),
        }
    }

    /// Collapse duplicate ids, keeping the record with the greater
    /// `last_updated`. Duplicates can appear when two tiers are merged or
    /// when a tier was written by an older build.
    pub fn dedup_by_freshness(&mut self) {
        let mut keep: HashMap<String, Alarm> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        for alarm in self.alarms.drain(..) {
            match keep.get(&alarm.id) {
                Some(existing) if existing.last_updated >= alarm.last_updated => {}
                Some(_) => {
                    keep.insert(alarm.id.clone(), alarm);
                }
                None => {
                    order.push(alarm.id.clone());
                    keep.insert(alarm.id.clone(), alarm);
                }
            }
        }
        self.alarms = order.into_iter().filter_map(|id| keep.remove(&id)).collect();
    }

    /// Restore the envelope invariant: `last_updated` >= every member's
    /// `last_updated`. Called after every mutation batch.
    pub fn normalize(&mut self) {
        let member_max = self.alarms.iter().map(|a| a.last_updated).max();
        if let Some(max) = member_max {
            if max > self.last_updated {
                self.last_updated = max;
            }
        }
    }

    /// Stamp the envelope at `now` (deletions have no surviving member to
    /// carry the timestamp, so the envelope itself must advance).
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        if now > self.last_updated {
            self.last_updated = now;
        }
        self.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alarm(id: &str, updated_secs: i64) -> Alarm {
        let t = Utc.timestamp_opt(updated_secs, 0).unwrap();
        Alarm {
            id: id.into(),
            title: format!("alarm {id}"),
            target_timestamp: t,
            status: AlarmStatus::Active,
            recurrence: Recurrence::Once,
            days_of_week: None,
            last_updated: t,
            remaining: Remaining::default(),
        }
    }

    #[test]
    fn envelope_serializes_camel_case_without_derived_fields() {
        let mut collection = AlarmCollection::empty(Utc::now());
        collection.upsert(alarm("a1", 1_700_000_000));
        let json = serde_json::to_value(&collection).unwrap();
        assert!(json["alarms"][0]["targetTimestamp"].is_string());
        assert!(json["alarms"][0]["lastUpdated"].is_string());
        assert!(json["alarms"][0].get("remaining").is_none());
        assert!(json["alarms"][0].get("daysRemaining").is_none());
        assert!(json["lastUpdated"].is_string());
    }

    #[test]
    fn dedup_keeps_freshest_record() {
        let mut collection = AlarmCollection::empty(Utc::now());
        collection.alarms.push(alarm("a1", 100));
        collection.alarms.push(alarm("a1", 200));
        collection.alarms.push(alarm("a2", 50));
        collection.dedup_by_freshness();
        assert_eq!(collection.alarms.len(), 2);
        assert_eq!(
            collection.get("a1").unwrap().last_updated,
            Utc.timestamp_opt(200, 0).unwrap()
        );
    }

    #[test]
    fn normalize_lifts_envelope_to_member_max() {
        let mut collection = AlarmCollection::empty(Utc.timestamp_opt(0, 0).unwrap());
        collection.alarms.push(alarm("a1", 500));
        collection.normalize();
        assert_eq!(collection.last_updated, Utc.timestamp_opt(500, 0).unwrap());
    }

    #[test]
    fn stamp_advances_past_members_for_deletes() {
        let mut collection = AlarmCollection::empty(Utc.timestamp_opt(0, 0).unwrap());
        collection.alarms.push(alarm("a1", 500));
        collection.remove("a1");
        collection.stamp(Utc.timestamp_opt(900, 0).unwrap());
        assert_eq!(collection.last_updated, Utc.timestamp_opt(900, 0).unwrap());
    }

    #[test]
    fn days_of_week_omitted_when_absent() {
        let a = alarm("a1", 10);
        let json = serde_json::to_value(&a).unwrap();
        assert!(json.get("daysOfWeek").is_none());
    }
}
