pub mod direct;
pub mod health;
pub mod reminders;
pub mod sessions;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Error body returned by every handler on a non-2xx response.
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
}

pub(crate) fn validation_error(msg: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiError { error: msg.into() }),
    )
}

pub(crate) fn internal_error(msg: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError { error: msg.into() }),
    )
}
