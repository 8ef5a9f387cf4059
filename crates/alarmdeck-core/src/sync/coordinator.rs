//! Sync coordinator: the single owner of the canonical alarm collection.
//!
//! Every read and write from other components funnels through this type;
//! no other code path read-modify-writes the whole collection. Mutations
//! write through to the tiered store immediately, and a caller-driven
//! periodic [`tick`](SyncCoordinator::tick) recomputes countdowns,
//! resolves due alarms, re-saves, and reconciles opportunistically with
//! the remote service using last-writer-wins by `lastUpdated`.
//!
//! There is no internal thread or timer. The embedding event loop calls
//! `tick()` at its configured interval and `flush()` on teardown, the
//! same caller-drives-the-clock contract the countdown engine uses.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::alarm::{Alarm, AlarmCollection, AlarmStatus};
use crate::countdown;
use crate::error::ValidationError;
use crate::events::Event;
use crate::lifecycle::{self, AlarmEdit, DueOutcome, NewAlarm};
use crate::storage::{legacy, TieredStore};
use crate::sync::remote::RemoteStore;

type Listener = Box<dyn Fn(&Event)>;

/// Summary of one reconciliation tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickReport {
    /// True when the tick was skipped because another was in flight.
    pub skipped: bool,
    /// Whether at least one persistence tier accepted the save.
    pub saved: bool,
    /// Alarms pushed to the remote service.
    pub pushed: usize,
    /// Alarms adopted or replaced from the remote service.
    pub pulled: usize,
    /// Due alarms resolved (completed or rolled over).
    pub resolved: usize,
}

/// Owner and mediator of the in-memory canonical alarm collection.
pub struct SyncCoordinator {
    store: TieredStore,
    remote: Option<Box<dyn RemoteStore>>,
    collection: AlarmCollection,
    /// Locally mutated ids not yet confirmed by the remote service.
    dirty: HashSet<String>,
    /// Deleted ids whose remote delete has not succeeded yet. Held in
    /// memory only: a restart before the remote delete lands lets the
    /// next fetch re-adopt the record, and the user must delete it
    /// again. Within a session the set also shields the fetch merge
    /// from resurrecting a just-deleted record.
    pending_deletes: HashSet<String>,
    listeners: Vec<Listener>,
    tick_in_flight: bool,
}

impl SyncCoordinator {
    pub fn new(store: TieredStore, remote: Option<Box<dyn RemoteStore>>) -> Self {
        Self {
            store,
            remote,
            collection: AlarmCollection::empty(Utc::now()),
            dirty: HashSet::new(),
            pending_deletes: HashSet::new(),
            listeners: Vec::new(),
            tick_in_flight: false,
        }
    }

    /// Load the canonical collection, trying in order: the tiered store,
    /// legacy-format migration of `legacy_text`, the remote service, and
    /// finally an empty collection.
    ///
    /// The legacy migrator only runs when no tier holds canonical data;
    /// re-running it would re-anchor every reconstructed target to a new
    /// "now", so presence of canonical data makes it a no-op forever.
    pub fn bootstrap(&mut self, legacy_text: Option<&str>, now: DateTime<Utc>) {
        if let Some(mut collection) = self.store.load() {
            for alarm in &mut collection.alarms {
                countdown::recompute_in_place(alarm, now);
            }
            self.collection = collection;
        } else if let Some(alarms) = legacy_text.and_then(|raw| legacy::migrate(raw, now)) {
            debug!(count = alarms.len(), "migrated legacy alarm data");
            let mut collection = AlarmCollection::empty(now);
            for mut alarm in alarms {
                countdown::recompute_in_place(&mut alarm, now);
                // Migrated records have never been seen by the remote.
                self.dirty.insert(alarm.id.clone());
                collection.upsert(alarm);
            }
            collection.normalize();
            self.collection = collection;
            self.persist();
        } else if let Some(alarms) = self.fetch_remote() {
            let mut collection = AlarmCollection::empty(now);
            for mut alarm in alarms {
                countdown::recompute_in_place(&mut alarm, now);
                collection.upsert(alarm);
            }
            collection.normalize();
            self.collection = collection;
            self.persist();
        } else {
            self.collection = AlarmCollection::empty(now);
        }

        self.notify(&Event::CollectionReloaded {
            alarm_count: self.collection.alarms.len(),
            at: now,
        });
    }

    fn fetch_remote(&self) -> Option<Vec<Alarm>> {
        let remote = self.remote.as_ref()?;
        match remote.fetch_all() {
            Ok(alarms) => Some(alarms),
            Err(e) => {
                warn!(error = %e, "remote bootstrap fetch failed");
                None
            }
        }
    }

    /// Register a change listener, notified after every successful
    /// mutation and after every tick.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&Event) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self, event: &Event) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// Best-effort write-through; failures are logged and retried on the
    /// next tick, never surfaced to the mutation caller.
    fn persist(&self) -> bool {
        self.store.save(&self.collection)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// All alarms with derived fields recomputed at `now`.
    pub fn list(&self, now: DateTime<Utc>) -> Vec<Alarm> {
        self.collection
            .alarms
            .iter()
            .map(|a| countdown::recompute(a, now))
            .collect()
    }

    pub fn get(&self, id: &str, now: DateTime<Utc>) -> Option<Alarm> {
        self.collection.get(id).map(|a| countdown::recompute(a, now))
    }

    pub fn len(&self) -> usize {
        self.collection.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.alarms.is_empty()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create a new alarm from a validated intent.
    pub fn create(&mut self, draft: NewAlarm, now: DateTime<Utc>) -> Result<Alarm, ValidationError> {
        let alarm = lifecycle::create(draft, now)?;
        self.dirty.insert(alarm.id.clone());
        self.collection.upsert(alarm.clone());
        self.collection.stamp(now);
        self.persist();
        self.notify(&Event::AlarmCreated {
            id: alarm.id.clone(),
            title: alarm.title.clone(),
            at: now,
        });
        Ok(alarm)
    }

    /// Edit an existing alarm. Rejected for completed alarms.
    pub fn edit(
        &mut self,
        id: &str,
        edit: AlarmEdit,
        now: DateTime<Utc>,
    ) -> Result<Alarm, ValidationError> {
        let alarm = self
            .collection
            .get_mut(id)
            .ok_or_else(|| ValidationError::UnknownAlarm(id.to_string()))?;
        lifecycle::apply_edit(alarm, edit, now)?;
        let updated = alarm.clone();
        self.dirty.insert(id.to_string());
        self.collection.stamp(now);
        self.persist();
        self.notify(&Event::AlarmUpdated {
            id: id.to_string(),
            status: updated.status,
            at: now,
        });
        Ok(updated)
    }

    /// Apply a status transition (pause, resume, complete).
    pub fn set_status(
        &mut self,
        id: &str,
        status: AlarmStatus,
        now: DateTime<Utc>,
    ) -> Result<Alarm, ValidationError> {
        let alarm = self
            .collection
            .get_mut(id)
            .ok_or_else(|| ValidationError::UnknownAlarm(id.to_string()))?;
        lifecycle::set_status(alarm, status, now)?;
        let updated = alarm.clone();
        self.dirty.insert(id.to_string());
        self.collection.stamp(now);
        self.persist();
        self.notify(&Event::AlarmUpdated {
            id: id.to_string(),
            status: updated.status,
            at: now,
        });
        Ok(updated)
    }

    /// Delete an alarm from all tiers and, out of band, from the remote.
    pub fn delete(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.collection
            .remove(id)
            .ok_or_else(|| ValidationError::UnknownAlarm(id.to_string()))?;
        self.dirty.remove(id);
        self.pending_deletes.insert(id.to_string());
        self.collection.stamp(now);
        self.persist();
        self.notify(&Event::AlarmDeleted {
            id: id.to_string(),
            at: now,
        });
        Ok(())
    }

    // ── Periodic reconciliation ──────────────────────────────────────

    /// One reconciliation tick: recompute, resolve due alarms, save, and
    /// reconcile with the remote service.
    ///
    /// Re-entrant-safe: a tick arriving while another is still running is
    /// skipped rather than run against the same in-memory state.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        if self.tick_in_flight {
            return TickReport {
                skipped: true,
                ..TickReport::default()
            };
        }
        self.tick_in_flight = true;
        let report = self.run_tick(now);
        self.tick_in_flight = false;
        report
    }

    fn run_tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut events = Vec::new();
        let mut resolved = 0usize;

        for alarm in &mut self.collection.alarms {
            countdown::recompute_in_place(alarm, now);
            match lifecycle::resolve_due(alarm, now) {
                Some(DueOutcome::Completed) => {
                    resolved += 1;
                    self.dirty.insert(alarm.id.clone());
                    events.push(Event::AlarmCompleted {
                        id: alarm.id.clone(),
                        at: now,
                    });
                }
                Some(DueOutcome::RolledOver) => {
                    resolved += 1;
                    self.dirty.insert(alarm.id.clone());
                    events.push(Event::AlarmRolledOver {
                        id: alarm.id.clone(),
                        next_target: alarm.target_timestamp,
                        at: now,
                    });
                }
                None => {}
            }
        }
        self.collection.normalize();

        let saved = self.persist();
        let (pushed, pulled) = self.reconcile(now);
        if pulled > 0 {
            // Remote wins were merged into memory; re-persist them.
            self.persist();
        }

        for event in &events {
            self.notify(event);
        }
        self.notify(&Event::TickCompleted {
            saved,
            pushed,
            pulled,
            at: now,
        });

        TickReport {
            skipped: false,
            saved,
            pushed,
            pulled,
            resolved,
        }
    }

    /// Merge with the remote service: replay pending deletes, adopt
    /// strictly-newer remote records, then push everything locally newer
    /// or still unconfirmed. Last-writer-wins by `lastUpdated` throughout.
    fn reconcile(&mut self, now: DateTime<Utc>) -> (usize, usize) {
        let Some(remote) = self.remote.take() else {
            return (0, 0);
        };

        for id in self.pending_deletes.clone() {
            match remote.delete(&id) {
                Ok(()) => {
                    self.pending_deletes.remove(&id);
                }
                Err(e) => warn!(id = %id, error = %e, "remote delete failed, will retry"),
            }
        }

        let mut pulled = 0usize;
        match remote.fetch_all() {
            Ok(remote_alarms) => {
                for remote_alarm in remote_alarms {
                    // A record we deleted locally but whose remote delete
                    // has not landed yet must not be resurrected.
                    if self.pending_deletes.contains(&remote_alarm.id) {
                        continue;
                    }
                    match self.collection.get_mut(&remote_alarm.id) {
                        Some(local) => {
                            if remote_alarm.last_updated > local.last_updated {
                                *local = remote_alarm;
                                countdown::recompute_in_place(local, now);
                                let id = local.id.clone();
                                self.dirty.remove(&id);
                                pulled += 1;
                            } else if local.last_updated > remote_alarm.last_updated {
                                self.dirty.insert(local.id.clone());
                            }
                        }
                        None => {
                            let mut adopted = remote_alarm;
                            countdown::recompute_in_place(&mut adopted, now);
                            self.collection.upsert(adopted);
                            pulled += 1;
                        }
                    }
                }
                self.collection.normalize();
            }
            Err(e) => warn!(error = %e, "remote fetch failed, will retry"),
        }

        let mut pushed = 0usize;
        for id in self.dirty.clone() {
            let Some(alarm) = self.collection.get(&id) else {
                self.dirty.remove(&id);
                continue;
            };
            match remote.push(alarm) {
                Ok(()) => {
                    self.dirty.remove(&id);
                    pushed += 1;
                }
                Err(e) => warn!(id = %id, error = %e, "remote push failed, will retry"),
            }
        }

        self.remote = Some(remote);
        (pushed, pulled)
    }

    /// Final best-effort flush for process or window teardown. The
    /// periodic tick already bounds staleness, so a missed flush loses at
    /// most one interval of mutations.
    pub fn flush(&mut self) -> bool {
        self.collection.normalize();
        self.persist()
    }
}
