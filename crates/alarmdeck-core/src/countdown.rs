//! Countdown recompute engine.
//!
//! Pure functions deriving remaining-time fields from a fixed target
//! timestamp and a caller-supplied clock. There is no internal thread and
//! no decrementing counter: the caller recomputes on load and on every
//! tick, which is what keeps the display correct after arbitrary
//! wall-clock gaps (app closed for days, clock adjustments).

use chrono::{DateTime, Utc};

use crate::alarm::{Alarm, Remaining};

/// Clamped whole seconds from `now` until `target`. Zero once the target
/// is reached or passed.
pub fn delta_seconds(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (target - now).num_seconds().max(0)
}

/// Decompose a second count into days/hours/minutes/seconds. Calendar-
/// agnostic: fixed divisors, no month or year units.
pub fn decompose(total_seconds: i64) -> Remaining {
    let total = total_seconds.max(0);
    Remaining {
        days: total / 86_400,
        hours: (total % 86_400) / 3_600,
        minutes: (total % 3_600) / 60,
        seconds: total % 60,
    }
}

/// Remaining time until `target` as seen at `now`.
pub fn remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> Remaining {
    decompose(delta_seconds(target, now))
}

/// Recompute an alarm's derived fields at `now`.
///
/// Non-active alarms pass through unchanged: paused alarms keep their
/// frozen display fields, completed alarms stay at whatever they showed
/// last. Deciding what happens when an active alarm reaches zero (complete
/// vs. recur) belongs to the lifecycle layer, not here.
pub fn recompute(alarm: &Alarm, now: DateTime<Utc>) -> Alarm {
    if !alarm.is_active() {
        return alarm.clone();
    }
    let mut updated = alarm.clone();
    updated.remaining = remaining(alarm.target_timestamp, now);
    updated
}

/// In-place variant of [`recompute`] for the canonical collection.
pub fn recompute_in_place(alarm: &mut Alarm, now: DateTime<Utc>) {
    if alarm.is_active() {
        alarm.remaining = remaining(alarm.target_timestamp, now);
    }
}

/// True when an active alarm has reached its target.
pub fn is_due(alarm: &Alarm, now: DateTime<Utc>) -> bool {
    alarm.is_active() && delta_seconds(alarm.target_timestamp, now) == 0
}
