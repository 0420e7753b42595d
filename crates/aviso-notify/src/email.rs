//! Transactional email adapter (Brevo HTTP API).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use aviso_core::config::EmailConfig;
use aviso_core::types::TemplateKind;

use crate::{
    error::NotifyError,
    notifier::{Notifier, SendReceipt},
    template,
};

const BREVO_API_URL: &str = "https://api.brevo.com/v3/smtp/email";
const CLIENT_TIMEOUT_SECS: u64 = 30;

pub struct EmailNotifier {
    client: reqwest::Client,
    api_key: String,
    from_email: String,
    from_name: String,
    frontend_url: String,
    api_url: String,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig, frontend_url: &str) -> Self {
        if config.api_key.is_empty() {
            warn!("email notifier has no API key; sends will fail until configured");
        }
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            api_key: config.api_key.clone(),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
            frontend_url: frontend_url.to_string(),
            api_url: BREVO_API_URL.to_string(),
        }
    }

    /// Point the adapter at a different endpoint (test servers).
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(
        &self,
        recipient: &str,
        kind: TemplateKind,
        context: &HashMap<String, String>,
    ) -> Result<SendReceipt, NotifyError> {
        if self.api_key.is_empty() {
            return Err(NotifyError::NotConfigured(
                "email.api_key is not set".to_string(),
            ));
        }

        let (subject, html) = template::render_email(kind, context, &self.frontend_url);

        let payload = json!({
            "sender": { "name": self.from_name, "email": self.from_email },
            "to": [ { "email": recipient } ],
            "subject": subject,
            "htmlContent": html,
        });

        let response = self
            .client
            .post(&self.api_url)
            .header("accept", "application/json")
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::from_reqwest(e, CLIENT_TIMEOUT_SECS))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let message_id = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("messageId").and_then(|m| m.as_str().map(String::from)))
            .unwrap_or_else(|| "n/a".to_string());

        info!(%recipient, %kind, message_id = %message_id, "email sent");

        Ok(SendReceipt {
            transport: "email".to_string(),
            detail: message_id,
            simulated: false,
        })
    }
}
