//! Session lifecycle notification endpoint (POST /notifications/session).
//!
//! The booking service pushes one event per lifecycle change; this handler
//! fans it out to both parties over email and (per preference) WhatsApp.
//! Delivery is best-effort: individual send failures are logged and reported
//! in the response body, only validation problems produce an error status.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::{info, warn};

use aviso_core::types::SessionEvent;
use aviso_core::AvisoError;

use crate::app::AppState;
use crate::fanout::{self, Transport};
use crate::http::{validation_error, ApiError};

#[derive(Serialize)]
pub struct SendResult {
    pub target: String,
    pub transport: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub message: String,
    pub results: Vec<SendResult>,
}

pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<SessionEvent>,
) -> Result<Json<SessionResponse>, (StatusCode, Json<ApiError>)> {
    validate(&event).map_err(|e| validation_error(e.to_string()))?;

    info!(
        session_id = %event.session_id,
        status = %event.status,
        developer = %event.developer.email,
        client = %event.client.email,
        "session notification received"
    );

    let plan = fanout::plan(&event);
    let context = fanout::build_context(&event);

    let mut results = Vec::with_capacity(plan.len());
    for send in plan {
        let notifier = match send.transport {
            Transport::Email => &state.email,
            Transport::WhatsApp => &state.whatsapp,
        };
        match notifier.send(&send.recipient, send.kind, &context).await {
            Ok(receipt) => {
                results.push(SendResult {
                    target: send.target.to_string(),
                    transport: receipt.transport,
                    ok: true,
                    detail: receipt.detail,
                });
            }
            Err(e) => {
                warn!(
                    session_id = %event.session_id,
                    target = send.target,
                    recipient = %send.recipient,
                    error = %e,
                    "session notification send failed"
                );
                results.push(SendResult {
                    target: send.target.to_string(),
                    transport: notifier.name().to_string(),
                    ok: false,
                    detail: e.to_string(),
                });
            }
        }
    }

    Ok(Json(SessionResponse {
        message: format!("session notifications processed ({})", event.status),
        results,
    }))
}

fn validate(event: &SessionEvent) -> Result<(), AvisoError> {
    if event.session_id.trim().is_empty() {
        return Err(AvisoError::Validation(
            "session_id must not be empty".to_string(),
        ));
    }
    for (label, email) in [
        ("developer", &event.developer.email),
        ("client", &event.client.email),
    ] {
        if email.trim().is_empty() {
            return Err(AvisoError::Validation(format!(
                "{label} email must not be empty"
            )));
        }
        if !email.contains('@') {
            return Err(AvisoError::Validation(format!(
                "{label} email is not a valid address: {email}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use aviso_core::types::{ChannelPref, Party, SessionStatus};

    use super::*;

    fn event() -> SessionEvent {
        SessionEvent {
            session_id: "SES-1".to_string(),
            status: SessionStatus::Pending,
            developer: Party {
                name: "Ana".to_string(),
                email: "dev@example.com".to_string(),
                phone: None,
            },
            client: Party {
                name: "Luis".to_string(),
                email: "cli@example.com".to_string(),
                phone: None,
            },
            date: "2026-02-15".to_string(),
            time: "10:00".to_string(),
            reason: None,
            reply_message: None,
            channel_pref: ChannelPref::Email,
        }
    }

    #[test]
    fn well_formed_event_passes_validation() {
        assert!(validate(&event()).is_ok());
    }

    #[test]
    fn malformed_events_produce_validation_errors() {
        let mut e = event();
        e.session_id = "  ".to_string();
        assert!(matches!(validate(&e), Err(AvisoError::Validation(_))));

        let mut e = event();
        e.client.email = "not-an-address".to_string();
        let err = validate(&e).unwrap_err();
        assert!(matches!(err, AvisoError::Validation(_)));
        assert!(err.to_string().contains("client"));
    }
}
