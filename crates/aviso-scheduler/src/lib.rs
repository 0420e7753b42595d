//! `aviso-scheduler`: one-shot delayed reminder scheduler.
//!
//! # Overview
//!
//! Jobs live in an in-memory pending set, optionally checkpointed to a
//! SQLite table so reminders survive a restart. A single background loop
//! ([`ReminderScheduler::run`]) sleeps until the earliest `fire_at`, drains
//! every due job, and hands each one to the configured
//! [`Notifier`](aviso_notify::Notifier) on its own task with a delivery
//! timeout. `schedule`, `cancel` and `list_pending` are cheap synchronous
//! calls safe to use concurrently with the loop.
//!
//! # Guarantees
//!
//! - a job fires at most once, never before its `fire_at`
//! - fire times already in the past are clamped a few seconds forward and
//!   reported back, never dropped
//! - a cancel/fire race resolves to exactly one terminal state

pub mod engine;
pub mod error;
pub mod store;
pub mod types;

pub use engine::ReminderScheduler;
pub use error::{Result, SchedulerError};
pub use store::JobStore;
pub use types::{JobState, PendingSummary, ReminderJob, ReminderPayload, ScheduleOutcome};
