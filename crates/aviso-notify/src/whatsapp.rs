//! WhatsApp adapter (Twilio messaging API).
//!
//! Without credentials the adapter runs in simulated mode: the send is
//! logged and reported as successful with `simulated = true`, so a dev
//! environment works end-to-end without a Twilio account.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use aviso_core::config::WhatsAppConfig;
use aviso_core::types::TemplateKind;

use crate::{
    error::NotifyError,
    notifier::{Notifier, SendReceipt},
    template,
};

const TWILIO_API_BASE: &str = "https://api.twilio.com";
const CLIENT_TIMEOUT_SECS: u64 = 30;

pub struct WhatsAppNotifier {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
}

impl WhatsAppNotifier {
    pub fn new(config: &WhatsAppConfig) -> Self {
        if config.account_sid.is_empty() || config.auth_token.is_empty() {
            warn!("whatsapp notifier has no Twilio credentials; running in simulated mode");
        }
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            api_base: TWILIO_API_BASE.to_string(),
        }
    }

    /// Point the adapter at a different endpoint (test servers).
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.to_string();
        self
    }

    fn configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty()
    }
}

/// Twilio requires the `whatsapp:` scheme on both ends of the send.
fn normalize_number(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send(
        &self,
        recipient: &str,
        kind: TemplateKind,
        context: &HashMap<String, String>,
    ) -> Result<SendReceipt, NotifyError> {
        let body = template::render_whatsapp(kind, context);
        let to = normalize_number(recipient);

        if !self.configured() {
            info!(%recipient, %kind, "whatsapp send simulated (no credentials)");
            return Ok(SendReceipt {
                transport: "whatsapp".to_string(),
                detail: "simulated".to_string(),
                simulated: true,
            });
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("From", self.from_number.as_str()),
                ("To", to.as_str()),
                ("Body", body.as_str()),
            ])
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

        let sid = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("sid").and_then(|s| s.as_str().map(String::from)))
            .unwrap_or_else(|| "n/a".to_string());

        info!(%recipient, %kind, sid = %sid, "whatsapp message sent");

        Ok(SendReceipt {
            transport: "whatsapp".to_string(),
            detail: sid,
            simulated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_gets_whatsapp_prefix() {
        assert_eq!(normalize_number("+593999999999"), "whatsapp:+593999999999");
    }

    #[test]
    fn prefixed_number_is_left_alone() {
        assert_eq!(
            normalize_number("whatsapp:+593999999999"),
            "whatsapp:+593999999999"
        );
    }

    #[tokio::test]
    async fn unconfigured_adapter_simulates_the_send() {
        let notifier = WhatsAppNotifier::new(&WhatsAppConfig::default());
        let receipt = notifier
            .send("+10000000000", TemplateKind::Reminder, &HashMap::new())
            .await
            .expect("simulated send should succeed");
        assert!(receipt.simulated);
        assert_eq!(receipt.transport, "whatsapp");
    }
}
