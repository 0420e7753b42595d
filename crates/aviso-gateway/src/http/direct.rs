//! Direct single-send endpoints, bypassing the session fan-out rules.
//!
//! - `POST /notifications/email` sends one templated email.
//! - `POST /notifications/whatsapp` sends one WhatsApp message.
//!
//! Like the session handler, delivery is best-effort: the response reports
//! the outcome instead of turning a provider failure into a 5xx.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use aviso_core::types::TemplateKind;
use aviso_notify::Notifier;

use crate::app::AppState;
use crate::http::{validation_error, ApiError};

#[derive(Deserialize)]
pub struct DirectSendRequest {
    /// Email address or phone number, per the endpoint.
    pub to: String,
    /// Template to render; defaults to the generic one.
    #[serde(default = "default_kind")]
    pub kind: TemplateKind,
    /// Template variables (`message`, `date`, `time`, names, ...).
    #[serde(default)]
    pub context: HashMap<String, String>,
}

fn default_kind() -> TemplateKind {
    TemplateKind::Generic
}

#[derive(Serialize)]
pub struct DirectSendResponse {
    pub ok: bool,
    pub transport: String,
    pub detail: String,
}

pub async fn email_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DirectSendRequest>,
) -> Result<Json<DirectSendResponse>, (StatusCode, Json<ApiError>)> {
    if request.to.trim().is_empty() || !request.to.contains('@') {
        return Err(validation_error(format!(
            "to is not a valid email address: {}",
            request.to
        )));
    }
    Ok(Json(dispatch(&state.email, &request).await))
}

pub async fn whatsapp_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DirectSendRequest>,
) -> Result<Json<DirectSendResponse>, (StatusCode, Json<ApiError>)> {
    if request.to.trim().is_empty() {
        return Err(validation_error("to must not be empty"));
    }
    Ok(Json(dispatch(&state.whatsapp, &request).await))
}

async fn dispatch(notifier: &Arc<dyn Notifier>, request: &DirectSendRequest) -> DirectSendResponse {
    match notifier.send(&request.to, request.kind, &request.context).await {
        Ok(receipt) => DirectSendResponse {
            ok: true,
            transport: receipt.transport,
            detail: receipt.detail,
        },
        Err(e) => {
            warn!(
                recipient = %request.to,
                kind = %request.kind,
                error = %e,
                "direct send failed"
            );
            DirectSendResponse {
                ok: false,
                transport: notifier.name().to_string(),
                detail: e.to_string(),
            }
        }
    }
}
