use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;

use alarmdeck_core::{Alarm, AlarmEdit, AlarmStatus, NewAlarm, Recurrence};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// List alarms with recomputed countdowns
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new alarm counting down from now
    Add {
        /// Alarm title
        title: String,
        #[arg(long, default_value_t = 0)]
        days: i64,
        #[arg(long, default_value_t = 0)]
        hours: i64,
        #[arg(long, default_value_t = 0)]
        minutes: i64,
        #[arg(long, default_value_t = 0)]
        seconds: i64,
        /// Recurrence: once, daily, weekly, monthly
        #[arg(long, default_value = "once")]
        recurrence: String,
        /// Weekday for weekly recurrence (0 = Sunday .. 6 = Saturday), repeatable
        #[arg(long = "day")]
        days_of_week: Vec<u8>,
    },
    /// Edit an alarm's title or target time
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// New absolute target, RFC 3339 (e.g. 2026-09-01T09:00:00Z)
        #[arg(long)]
        target: Option<String>,
    },
    /// Pause an alarm (countdown display freezes, target is kept)
    Pause { id: String },
    /// Resume a paused alarm
    Resume { id: String },
    /// Mark an alarm completed
    Complete { id: String },
    /// Delete an alarm everywhere
    Delete { id: String },
}

/// Combine the duration flags, rejecting values the countdown cannot
/// represent instead of aborting on overflow.
fn duration_from_parts(
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
) -> Result<Duration, Box<dyn std::error::Error>> {
    days.checked_mul(86_400)
        .and_then(|t| t.checked_add(hours.checked_mul(3_600)?))
        .and_then(|t| t.checked_add(minutes.checked_mul(60)?))
        .and_then(|t| t.checked_add(seconds))
        .and_then(Duration::try_seconds)
        .ok_or_else(|| "countdown length is out of range".into())
}

fn parse_recurrence(value: &str) -> Result<Recurrence, Box<dyn std::error::Error>> {
    match value {
        "once" => Ok(Recurrence::Once),
        "daily" => Ok(Recurrence::Daily),
        "weekly" => Ok(Recurrence::Weekly),
        "monthly" => Ok(Recurrence::Monthly),
        other => Err(format!("unknown recurrence '{other}' (once|daily|weekly|monthly)").into()),
    }
}

fn print_alarm(alarm: &Alarm) {
    let status = match alarm.status {
        AlarmStatus::Active => "active",
        AlarmStatus::Paused => "paused",
        AlarmStatus::Completed => "completed",
    };
    let r = alarm.remaining;
    println!(
        "{}  [{status}]  {}  {}d {:02}h {:02}m {:02}s  (target {})",
        alarm.id, alarm.title, r.days, r.hours, r.minutes, r.seconds, alarm.target_timestamp
    );
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = super::open_engine()?;
    let now = Utc::now();

    match action {
        AlarmAction::List { json } => {
            let alarms = engine.list(now);
            if json {
                println!("{}", serde_json::to_string_pretty(&alarms)?);
            } else if alarms.is_empty() {
                println!("no alarms");
            } else {
                for alarm in &alarms {
                    print_alarm(alarm);
                }
            }
        }
        AlarmAction::Add {
            title,
            days,
            hours,
            minutes,
            seconds,
            recurrence,
            days_of_week,
        } => {
            let draft = NewAlarm {
                title,
                duration: duration_from_parts(days, hours, minutes, seconds)?,
                recurrence: parse_recurrence(&recurrence)?,
                days_of_week: if days_of_week.is_empty() {
                    None
                } else {
                    Some(days_of_week)
                },
            };
            let alarm = engine.create(draft, now)?;
            println!("created {}", alarm.id);
            print_alarm(&alarm);
        }
        AlarmAction::Edit { id, title, target } => {
            let target_timestamp = target
                .map(|t| {
                    DateTime::parse_from_rfc3339(&t).map(|dt| dt.with_timezone(&Utc))
                })
                .transpose()?;
            let edit = AlarmEdit {
                title,
                target_timestamp,
                ..Default::default()
            };
            let alarm = engine.edit(&id, edit, now)?;
            print_alarm(&alarm);
        }
        AlarmAction::Pause { id } => {
            let alarm = engine.set_status(&id, AlarmStatus::Paused, now)?;
            print_alarm(&alarm);
        }
        AlarmAction::Resume { id } => {
            let alarm = engine.set_status(&id, AlarmStatus::Active, now)?;
            print_alarm(&alarm);
        }
        AlarmAction::Complete { id } => {
            let alarm = engine.set_status(&id, AlarmStatus::Completed, now)?;
            print_alarm(&alarm);
        }
        AlarmAction::Delete { id } => {
            engine.delete(&id, now)?;
            println!("deleted {id}");
        }
    }

    engine.flush();
    Ok(())
}
