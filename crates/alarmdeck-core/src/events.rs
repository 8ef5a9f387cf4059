use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::AlarmStatus;

/// Every successful mutation and every reconciliation tick produces an
/// Event. Presentation layers subscribe to these instead of polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    AlarmCreated {
        id: String,
        title: String,
        at: DateTime<Utc>,
    },
    AlarmUpdated {
        id: String,
        status: AlarmStatus,
        at: DateTime<Utc>,
    },
    AlarmDeleted {
        id: String,
        at: DateTime<Utc>,
    },
    /// A `once` alarm reached its target and was marked completed.
    AlarmCompleted {
        id: String,
        at: DateTime<Utc>,
    },
    /// A recurring alarm reached its target and rolled forward one period.
    AlarmRolledOver {
        id: String,
        next_target: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// The canonical collection was (re)loaded from a tier, legacy
    /// migration, or the remote fallback.
    CollectionReloaded {
        alarm_count: usize,
        at: DateTime<Utc>,
    },
    /// A periodic reconciliation tick finished.
    TickCompleted {
        saved: bool,
        pushed: usize,
        pulled: usize,
        at: DateTime<Utc>,
    },
}
