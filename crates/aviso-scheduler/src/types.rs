use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aviso_core::types::TemplateKind;

/// Lifecycle state of a scheduled reminder.
///
/// `Pending -> Fired` when the timing loop executes it, `Pending -> Cancelled`
/// on an explicit cancel. Both `Fired` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Fired,
    Cancelled,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Fired => "fired",
            JobState::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobState::Pending),
            "fired" => Ok(JobState::Fired),
            "cancelled" => Ok(JobState::Cancelled),
            other => Err(format!("unknown job state: {other}")),
        }
    }
}

/// Everything the delivery task needs to perform the send at fire time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderPayload {
    /// Destination address (email or phone number, per the notifier).
    pub recipient: String,
    /// Template the notifier renders the message with.
    pub kind: TemplateKind,
    /// Template variables (date, time, names, …).
    #[serde(default)]
    pub context: HashMap<String, String>,
    /// Shared across the jobs created by one scheduling request; jobs are
    /// otherwise independent.
    pub correlation_id: String,
}

/// A scheduled one-shot reminder. Owned exclusively by the scheduler;
/// callers only ever hold the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderJob {
    /// UUID v4 string.
    pub id: String,
    /// Human-readable label shown in listings.
    pub description: String,
    /// UTC instant at which the job becomes due.
    pub fire_at: DateTime<Utc>,
    pub payload: ReminderPayload,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
}

/// Read-only view of a pending job, as returned by `list_pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSummary {
    pub id: String,
    pub description: String,
    pub fire_at: DateTime<Utc>,
}

/// Returned by `schedule`: the assigned id plus the effective fire time,
/// which differs from the requested one when clamping kicked in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub id: String,
    pub fire_at: DateTime<Utc>,
    /// True when the requested time was in the past and got pushed forward.
    pub clamped: bool,
}
