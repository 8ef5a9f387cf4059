//! # Alarmdeck Core Library
//!
//! Core engine for Alarmdeck's deadline alarms: a client-owned store of
//! countdown alarms that survives restarts and backend unavailability,
//! keeps a monotonically-correct countdown across arbitrary wall-clock
//! gaps, reconciles state across storage tiers and a remote service, and
//! migrates the legacy on-disk schema transparently. Presentation layers
//! (CLI, GUI) are thin shells over this library.
//!
//! ## Architecture
//!
//! - **Countdown Engine**: pure recompute of remaining time from a fixed
//!   target and a caller-supplied clock; no decrementing counters
//! - **Tiered Store**: ordered fallback chain of a local cache file plus
//!   candidate data-file locations, best-effort and self-healing
//! - **Sync Coordinator**: single owner of the canonical collection;
//!   caller-driven reconciliation tick, last-writer-wins against the
//!   remote service
//! - **Lifecycle**: validated state transitions (pause/resume/complete/
//!   recur) applied before anything reaches the store
//!
//! ## Key Components
//!
//! - [`SyncCoordinator`]: mutation funnel and tick driver
//! - [`TieredStore`]: multi-tier persistence
//! - [`Config`]: application configuration management
//! - [`RemoteStore`]: trait seam for the remote alarm service

pub mod alarm;
pub mod countdown;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod storage;
pub mod sync;

pub use alarm::{Alarm, AlarmCollection, AlarmStatus, Recurrence, Remaining};
pub use error::{ConfigError, CoreError, StoreError, SyncError, ValidationError};
pub use events::Event;
pub use lifecycle::{AlarmEdit, DueOutcome, NewAlarm};
pub use storage::{Config, TieredStore};
pub use sync::{HttpRemote, RemoteStore, SyncCoordinator, TickReport};
