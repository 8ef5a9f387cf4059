//! Alarm lifecycle state machine.
//!
//! Applies user and automation intents as validated transitions on
//! individual alarms. All validation happens here, before a mutation can
//! reach the store:
//!
//! ```text
//! active <-> paused        (user pause/resume; target retained)
//! active  -> completed     (target reached, recurrence = once)
//! active  -> active        (target reached, recurring; target rolls forward)
//! any     -> deleted       (handled by the coordinator)
//! ```
//!
//! Pausing suspends relevance, it does not bank time: resume recomputes
//! from the unchanged target, so time elapsed while paused is forgiven.

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use uuid::Uuid;

use crate::alarm::{Alarm, AlarmStatus, Recurrence, Remaining};
use crate::countdown;
use crate::error::ValidationError;

/// Creation intent: a title, a relative duration, and a recurrence mode.
#[derive(Debug, Clone)]
pub struct NewAlarm {
    pub title: String,
    /// Countdown length from "now"; the absolute target is computed at
    /// creation and becomes the single source of truth.
    pub duration: Duration,
    pub recurrence: Recurrence,
    pub days_of_week: Option<Vec<u8>>,
}

/// Edit intent. `None` fields are left untouched. Permitted in any state
/// except completed; always bumps `last_updated`.
#[derive(Debug, Clone, Default)]
pub struct AlarmEdit {
    pub title: Option<String>,
    pub target_timestamp: Option<DateTime<Utc>>,
    pub recurrence: Option<Recurrence>,
    pub days_of_week: Option<Vec<u8>>,
}

/// Outcome of resolving a due alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueOutcome {
    /// `once` alarm reached its target; now completed (terminal).
    Completed,
    /// Recurring alarm rolled its target forward one period, still active.
    RolledOver,
}

fn validate_days_of_week(
    recurrence: Recurrence,
    days: Option<&Vec<u8>>,
) -> Result<(), ValidationError> {
    if let Some(days) = days {
        if let Some(bad) = days.iter().find(|d| **d > 6) {
            return Err(ValidationError::InvalidDayOfWeek(*bad));
        }
    }
    if recurrence == Recurrence::Weekly && days.map(|d| d.is_empty()).unwrap_or(true) {
        return Err(ValidationError::EmptyDaysOfWeek);
    }
    Ok(())
}

/// Create a new alarm from an intent. Assigns the id, computes the
/// absolute target from the relative duration, and starts it active.
pub fn create(draft: NewAlarm, now: DateTime<Utc>) -> Result<Alarm, ValidationError> {
    if draft.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    validate_days_of_week(draft.recurrence, draft.days_of_week.as_ref())?;

    let target = now + draft.duration;
    let mut alarm = Alarm {
        id: Uuid::new_v4().to_string(),
        title: draft.title,
        target_timestamp: target,
        status: AlarmStatus::Active,
        recurrence: draft.recurrence,
        days_of_week: draft.days_of_week,
        last_updated: now,
        remaining: Remaining::default(),
    };
    countdown::recompute_in_place(&mut alarm, now);
    Ok(alarm)
}

/// Apply an edit. Rejected on completed alarms.
pub fn apply_edit(
    alarm: &mut Alarm,
    edit: AlarmEdit,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if alarm.status == AlarmStatus::Completed {
        return Err(ValidationError::CompletedIsFrozen(alarm.id.clone()));
    }
    if let Some(title) = &edit.title {
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
    }

    let recurrence = edit.recurrence.unwrap_or(alarm.recurrence);
    let days = edit.days_of_week.as_ref().or(alarm.days_of_week.as_ref());
    validate_days_of_week(recurrence, days)?;

    if let Some(title) = edit.title {
        alarm.title = title;
    }
    if let Some(target) = edit.target_timestamp {
        alarm.target_timestamp = target;
    }
    alarm.recurrence = recurrence;
    if let Some(days) = edit.days_of_week {
        alarm.days_of_week = Some(days);
    }
    alarm.touch(now);
    countdown::recompute_in_place(alarm, now);
    Ok(())
}

/// Apply a status transition.
///
/// Completed is terminal: nothing transitions out of it. Pausing freezes
/// the derived fields at their last computed value; resuming leaves the
/// target untouched and recomputes from it.
pub fn set_status(
    alarm: &mut Alarm,
    status: AlarmStatus,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if alarm.status == status {
        return Ok(());
    }
    if alarm.status == AlarmStatus::Completed {
        return Err(ValidationError::InvalidTransition {
            from: alarm.status,
            to: status,
        });
    }
    alarm.status = status;
    alarm.touch(now);
    countdown::recompute_in_place(alarm, now);
    Ok(())
}

/// Resolve an alarm whose countdown reached zero.
///
/// `once` alarms complete; recurring alarms advance their target exactly
/// one period forward from its current value and stay active. An alarm
/// several periods overdue converges over successive ticks rather than
/// jumping. Returns `None` when the alarm is not due.
pub fn resolve_due(alarm: &mut Alarm, now: DateTime<Utc>) -> Option<DueOutcome> {
    if !countdown::is_due(alarm, now) {
        return None;
    }
    match alarm.recurrence {
        Recurrence::Once => {
            alarm.status = AlarmStatus::Completed;
            alarm.touch(now);
            Some(DueOutcome::Completed)
        }
        Recurrence::Daily => {
            alarm.target_timestamp += Duration::days(1);
            alarm.touch(now);
            countdown::recompute_in_place(alarm, now);
            Some(DueOutcome::RolledOver)
        }
        Recurrence::Weekly => {
            alarm.target_timestamp = next_weekly_target(alarm);
            alarm.touch(now);
            countdown::recompute_in_place(alarm, now);
            Some(DueOutcome::RolledOver)
        }
        Recurrence::Monthly => {
            alarm.target_timestamp = alarm
                .target_timestamp
                .checked_add_months(Months::new(1))
                .unwrap_or(alarm.target_timestamp + Duration::days(30));
            alarm.touch(now);
            countdown::recompute_in_place(alarm, now);
            Some(DueOutcome::RolledOver)
        }
    }
}

/// Next enabled weekday strictly after the current target, preserving the
/// time of day. Falls back to one week out when the day set is somehow
/// empty (the controller boundary should have rejected that).
fn next_weekly_target(alarm: &Alarm) -> DateTime<Utc> {
    let days = match &alarm.days_of_week {
        Some(days) if !days.is_empty() => days,
        _ => return alarm.target_timestamp + Duration::weeks(1),
    };
    for offset in 1..=7 {
        let candidate = alarm.target_timestamp + Duration::days(offset);
        let weekday = candidate.weekday().num_days_from_sunday() as u8;
        if days.contains(&weekday) {
            return candidate;
        }
    }
    alarm.target_timestamp + Duration::weeks(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // 2023-11-14 22:13:20 UTC, a Tuesday.
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn draft(title: &str, recurrence: Recurrence, days: Option<Vec<u8>>) -> NewAlarm {
        NewAlarm {
            title: title.into(),
            duration: Duration::hours(2),
            recurrence,
            days_of_week: days,
        }
    }

    #[test]
    fn create_assigns_id_and_absolute_target() {
        let alarm = create(draft("Tea", Recurrence::Once, None), now()).unwrap();
        assert!(!alarm.id.is_empty());
        assert_eq!(alarm.target_timestamp, now() + Duration::hours(2));
        assert_eq!(alarm.status, AlarmStatus::Active);
        assert_eq!(alarm.remaining.hours, 2);
    }

    #[test]
    fn create_rejects_empty_title() {
        let err = create(draft("   ", Recurrence::Once, None), now()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTitle);
    }

    #[test]
    fn weekly_requires_non_empty_days() {
        let err = create(draft("Standup", Recurrence::Weekly, Some(vec![])), now()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyDaysOfWeek);

        let err = create(draft("Standup", Recurrence::Weekly, None), now()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyDaysOfWeek);

        assert!(create(draft("Standup", Recurrence::Weekly, Some(vec![1, 3])), now()).is_ok());
    }

    #[test]
    fn day_of_week_out_of_range_rejected() {
        let err = create(draft("Bad", Recurrence::Weekly, Some(vec![1, 7])), now()).unwrap_err();
        assert_eq!(err, ValidationError::InvalidDayOfWeek(7));
    }

    #[test]
    fn pause_resume_preserves_target() {
        let mut alarm = create(draft("Tea", Recurrence::Once, None), now()).unwrap();
        let target = alarm.target_timestamp;

        set_status(&mut alarm, AlarmStatus::Paused, now()).unwrap();
        let frozen = alarm.remaining;

        // One hour passes while paused; display fields stay frozen.
        let resumed_at = now() + Duration::hours(1);
        assert_eq!(countdown::recompute(&alarm, resumed_at).remaining, frozen);

        set_status(&mut alarm, AlarmStatus::Active, resumed_at).unwrap();
        assert_eq!(alarm.target_timestamp, target);
        // The full elapsed hour is reflected, no time credit.
        assert_eq!(alarm.remaining.hours, 1);
        assert_eq!(alarm.remaining.minutes, 0);
    }

    #[test]
    fn completed_is_terminal() {
        let mut alarm = create(draft("Tea", Recurrence::Once, None), now()).unwrap();
        set_status(&mut alarm, AlarmStatus::Completed, now()).unwrap();

        let err = set_status(&mut alarm, AlarmStatus::Active, now()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTransition { .. }));

        let err = apply_edit(&mut alarm, AlarmEdit::default(), now()).unwrap_err();
        assert!(matches!(err, ValidationError::CompletedIsFrozen(_)));
    }

    #[test]
    fn edit_bumps_last_updated() {
        let mut alarm = create(draft("Tea", Recurrence::Once, None), now()).unwrap();
        let later = now() + Duration::minutes(5);
        apply_edit(
            &mut alarm,
            AlarmEdit {
                title: Some("Green tea".into()),
                ..Default::default()
            },
            later,
        )
        .unwrap();
        assert_eq!(alarm.title, "Green tea");
        assert_eq!(alarm.last_updated, later);
    }

    #[test]
    fn edit_cannot_break_weekly_invariant() {
        let mut alarm = create(draft("Tea", Recurrence::Once, None), now()).unwrap();
        let err = apply_edit(
            &mut alarm,
            AlarmEdit {
                recurrence: Some(Recurrence::Weekly),
                ..Default::default()
            },
            now(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyDaysOfWeek);
    }

    #[test]
    fn once_alarm_completes_when_due() {
        let mut alarm = create(draft("Tea", Recurrence::Once, None), now()).unwrap();
        alarm.target_timestamp = now() - Duration::minutes(1);

        let outcome = resolve_due(&mut alarm, now()).unwrap();
        assert_eq!(outcome, DueOutcome::Completed);
        assert_eq!(alarm.status, AlarmStatus::Completed);
    }

    #[test]
    fn daily_alarm_rolls_forward_exactly_one_day() {
        let mut alarm = create(draft("Review", Recurrence::Daily, None), now()).unwrap();
        let past = now() - Duration::hours(3);
        alarm.target_timestamp = past;

        let outcome = resolve_due(&mut alarm, now()).unwrap();
        assert_eq!(outcome, DueOutcome::RolledOver);
        assert_eq!(alarm.status, AlarmStatus::Active);
        assert_eq!(alarm.target_timestamp, past + Duration::days(1));
    }

    #[test]
    fn weekly_alarm_advances_to_next_enabled_weekday() {
        // now() is a Tuesday (weekday 2). Enabled: Monday(1) and Friday(5).
        let mut alarm =
            create(draft("Standup", Recurrence::Weekly, Some(vec![1, 5])), now()).unwrap();
        alarm.target_timestamp = now() - Duration::hours(1);

        resolve_due(&mut alarm, now()).unwrap();
        let weekday = alarm.target_timestamp.weekday().num_days_from_sunday();
        assert_eq!(weekday, 5); // Friday comes before next Monday.
        assert!(alarm.target_timestamp > now());
    }

    #[test]
    fn monthly_alarm_advances_one_month() {
        let base = Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap();
        let mut alarm = create(draft("Rent", Recurrence::Monthly, None), base).unwrap();
        alarm.target_timestamp = base;

        resolve_due(&mut alarm, base).unwrap();
        // chrono clamps Jan 31 + 1 month to Feb 29 (2024 is a leap year).
        assert_eq!(
            alarm.target_timestamp,
            Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn not_due_alarm_is_untouched() {
        let mut alarm = create(draft("Tea", Recurrence::Once, None), now()).unwrap();
        assert!(resolve_due(&mut alarm, now()).is_none());
        assert_eq!(alarm.status, AlarmStatus::Active);
    }

    #[test]
    fn paused_alarm_never_resolves() {
        let mut alarm = create(draft("Tea", Recurrence::Daily, None), now()).unwrap();
        alarm.target_timestamp = now() - Duration::hours(1);
        set_status(&mut alarm, AlarmStatus::Paused, now()).unwrap();
        assert!(resolve_due(&mut alarm, now()).is_none());
    }
}
