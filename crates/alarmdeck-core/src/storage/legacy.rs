//! Legacy on-disk schema migrator.
//!
//! Older builds stored alarms as a flat text format: an `alarms:` header,
//! then one `key: value` line per field, with an `id` line opening each
//! record. Crucially the old format recorded only *relative* offsets
//! (days/hours/minutes/seconds remaining at save time), never an absolute
//! target, so migration reconstructs `target_timestamp` as `now + offset`
//! anchored to migration time. Deadlines that sat unmigrated therefore
//! shift forward by that gap; this matches the historical behavior and is
//! a known accuracy limitation, not something to silently correct.
//!
//! Because re-running the migration would re-apply the offset from a new
//! `now`, callers must gate it behind a canonical-data presence check and
//! run it at most once per process lifetime.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::alarm::{Alarm, AlarmStatus, Recurrence, Remaining};

/// Marker that identifies the legacy format. Input without it is not
/// legacy data and migration is a no-op.
const LEGACY_MARKER: &str = "alarms:";

#[derive(Debug, Default)]
struct RecordBuilder {
    id: Option<String>,
    title: Option<String>,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
    status: Option<AlarmStatus>,
    recurrence: Option<Recurrence>,
    days_of_week: Option<Vec<u8>>,
}

impl RecordBuilder {
    fn set(&mut self, key: &str, value: &str) {
        match key {
            "id" => self.id = Some(value.to_string()),
            "title" => self.title = Some(value.to_string()),
            "days" => self.days = value.parse().unwrap_or(0),
            "hours" => self.hours = value.parse().unwrap_or(0),
            "minutes" => self.minutes = value.parse().unwrap_or(0),
            "seconds" => self.seconds = value.parse().unwrap_or(0),
            "status" => {
                self.status = match value {
                    "active" => Some(AlarmStatus::Active),
                    "paused" => Some(AlarmStatus::Paused),
                    "completed" => Some(AlarmStatus::Completed),
                    _ => None,
                }
            }
            "recurrence" => {
                self.recurrence = match value {
                    "once" => Some(Recurrence::Once),
                    "daily" => Some(Recurrence::Daily),
                    "weekly" => Some(Recurrence::Weekly),
                    "monthly" => Some(Recurrence::Monthly),
                    _ => None,
                }
            }
            "daysOfWeek" => {
                let days: Vec<u8> = value
                    .split(',')
                    .filter_map(|d| d.trim().parse::<u8>().ok())
                    .filter(|d| *d <= 6)
                    .collect();
                if !days.is_empty() {
                    self.days_of_week = Some(days);
                }
            }
            // Unknown keys are ignored rather than failing the record.
            _ => {}
        }
    }

    /// Finish the record, anchoring the reconstructed target to `now`.
    /// Returns `None` for records too malformed to keep, including
    /// offsets too large to represent as a duration or a timestamp.
    fn build(self, now: DateTime<Utc>) -> Option<Alarm> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        let recurrence = self.recurrence.unwrap_or(Recurrence::Once);
        if recurrence == Recurrence::Weekly && self.days_of_week.is_none() {
            return None;
        }

        let total_seconds = self
            .days
            .checked_mul(86_400)?
            .checked_add(self.hours.checked_mul(3_600)?)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)?;
        let offset = Duration::try_seconds(total_seconds)?;
        let target = now.checked_add_signed(offset)?;

        Some(Alarm {
            id,
            title,
            target_timestamp: target,
            status: self.status.unwrap_or(AlarmStatus::Active),
            recurrence,
            days_of_week: self.days_of_week,
            last_updated: now,
            remaining: Remaining::default(),
        })
    }
}

/// Convert legacy flat-record text into canonical alarms.
///
/// Returns `None` when the input does not look like the legacy format
/// (no `alarms:` marker). Malformed individual records are skipped; the
/// rest of the input is preserved. Never panics on bad input.
pub fn migrate(raw: &str, now: DateTime<Utc>) -> Option<Vec<Alarm>> {
    if !raw.lines().any(|line| line.trim() == LEGACY_MARKER) {
        return None;
    }

    let mut alarms = Vec::new();
    let mut current: Option<RecordBuilder> = None;
    let mut skipped = 0usize;

    let mut finish = |builder: Option<RecordBuilder>, skipped: &mut usize| {
        if let Some(builder) = builder {
            match builder.build(now) {
                Some(alarm) => alarms.push(alarm),
                None => *skipped += 1,
            }
        }
    };

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line == LEGACY_MARKER {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        // An id line opens a new record and closes the previous one.
        if key == "id" {
            finish(current.take(), &mut skipped);
            current = Some(RecordBuilder::default());
        }
        if let Some(builder) = current.as_mut() {
            builder.set(key, value);
        }
    }
    finish(current, &mut skipped);

    if skipped > 0 {
        debug!(skipped, "legacy migration skipped malformed records");
    }
    Some(alarms)
}
