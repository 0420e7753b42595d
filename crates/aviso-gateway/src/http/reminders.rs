//! Reminder endpoints.
//!
//! - `POST /notifications/reminder` schedules the two per-party reminder jobs
//!   for a session and returns their ids immediately.
//! - `GET /notifications/pending` lists the pending set.
//! - `DELETE /notifications/reminder/{id}` cancels a pending job; cancelling
//!   something that no longer exists is a normal `cancelled: false` answer,
//!   not an error.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use aviso_scheduler::{PendingSummary, SchedulerError};

use crate::app::AppState;
use crate::http::{internal_error, validation_error, ApiError};

#[derive(Deserialize)]
pub struct ReminderRequest {
    pub session_id: String,
    /// Absolute UTC start time of the session.
    pub session_start: DateTime<Utc>,
    pub developer_email: String,
    pub client_email: String,
    /// Minutes before `session_start` at which the reminder fires.
    /// Falls back to the configured default (30) when omitted.
    #[serde(default)]
    pub lead_minutes: Option<i64>,
}

#[derive(Serialize)]
pub struct ReminderResponse {
    pub job_ids: Vec<String>,
    pub fire_at: DateTime<Utc>,
    /// True when the computed fire time was already in the past and the jobs
    /// will fire almost immediately instead.
    pub clamped: bool,
}

pub async fn schedule_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReminderRequest>,
) -> Result<Json<ReminderResponse>, (StatusCode, Json<ApiError>)> {
    let lead = request
        .lead_minutes
        .unwrap_or(state.config.scheduler.default_lead_minutes);

    let outcomes = state
        .scheduler
        .schedule_session_reminder(
            &request.session_id,
            request.session_start,
            &[
                ("developer", request.developer_email.as_str()),
                ("client", request.client_email.as_str()),
            ],
            lead,
        )
        .map_err(|e| match e {
            SchedulerError::InvalidJob(msg) => validation_error(msg),
            other => internal_error(other.to_string()),
        })?;

    info!(
        session_id = %request.session_id,
        jobs = outcomes.len(),
        lead_minutes = lead,
        "session reminders scheduled"
    );

    // Both jobs share one request, so the effective fire time is identical.
    let fire_at = outcomes[0].fire_at;
    let clamped = outcomes[0].clamped;
    Ok(Json(ReminderResponse {
        job_ids: outcomes.into_iter().map(|o| o.id).collect(),
        fire_at,
        clamped,
    }))
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub total: usize,
    pub reminders: Vec<PendingSummary>,
}

pub async fn pending_handler(State(state): State<Arc<AppState>>) -> Json<PendingResponse> {
    let reminders = state.scheduler.list_pending();
    Json(PendingResponse {
        total: reminders.len(),
        reminders,
    })
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

pub async fn cancel_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.scheduler.cancel(&id),
    })
}
