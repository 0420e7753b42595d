use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use aviso_core::types::TemplateKind;

use crate::error::NotifyError;

/// Result of a successful delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Transport that carried the message (e.g. `"email"`, `"whatsapp"`).
    pub transport: String,
    /// Provider-side reference: message id, SID, or a short status note.
    pub detail: String,
    /// True when no real send happened (adapter running without credentials).
    #[serde(default)]
    pub simulated: bool,
}

/// Common interface implemented by every outbound transport.
///
/// Implementations must be `Send + Sync` so a single adapter instance can be
/// shared between the request handlers and the scheduler's delivery tasks.
/// `send` takes `&self`; adapters hold no per-send mutable state.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable lowercase identifier for this transport (e.g. `"email"`).
    fn name(&self) -> &str;

    /// Deliver one notification to one recipient.
    ///
    /// `context` carries the template variables (names, date, time, …);
    /// missing keys fall back to neutral placeholder text rather than
    /// failing the send.
    async fn send(
        &self,
        recipient: &str,
        kind: TemplateKind,
        context: &HashMap<String, String>,
    ) -> Result<SendReceipt, NotifyError>;
}
