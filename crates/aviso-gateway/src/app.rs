use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use aviso_core::config::AvisoConfig;
use aviso_notify::Notifier;
use aviso_scheduler::ReminderScheduler;

/// Central shared state, passed as `Arc<AppState>` to all Axum handlers.
pub struct AppState {
    pub config: AvisoConfig,
    pub scheduler: ReminderScheduler,
    pub email: Arc<dyn Notifier>,
    pub whatsapp: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        config: AvisoConfig,
        scheduler: ReminderScheduler,
        email: Arc<dyn Notifier>,
        whatsapp: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            scheduler,
            email,
            whatsapp,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/notifications/session",
            post(crate::http::sessions::session_handler),
        )
        .route(
            "/notifications/email",
            post(crate::http::direct::email_handler),
        )
        .route(
            "/notifications/whatsapp",
            post(crate::http::direct::whatsapp_handler),
        )
        .route(
            "/notifications/reminder",
            post(crate::http::reminders::schedule_handler),
        )
        .route(
            "/notifications/pending",
            get(crate::http::reminders::pending_handler),
        )
        .route(
            "/notifications/reminder/{id}",
            delete(crate::http::reminders::cancel_handler),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
