use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Minutes before the session start at which a reminder fires by default.
pub const DEFAULT_LEAD_MINUTES: i64 = 30;
/// Past-due fire times are pushed this many seconds into the future.
pub const CLAMP_EPSILON_SECS: i64 = 10;
/// Upper bound on a single delivery attempt before the scheduler gives up on it.
pub const SEND_TIMEOUT_SECS: u64 = 30;

/// Top-level config (aviso.toml + AVISO_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvisoConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Base URL for links embedded in notification emails.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for AvisoConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            email: EmailConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            scheduler: SchedulerConfig::default(),
            frontend_url: default_frontend_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Transactional email settings (Brevo API).
///
/// An empty `api_key` leaves the email adapter unconfigured; sends then fail
/// with `NotConfigured` instead of reaching the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

/// WhatsApp settings (Twilio API).
///
/// Missing credentials put the adapter in simulated mode: sends are logged
/// and reported as successful without touching the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default = "default_whatsapp_from")]
    pub from_number: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: default_whatsapp_from(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// SQLite file the pending-job set is checkpointed to. `None` keeps the
    /// scheduler purely in-memory; pending reminders are then lost on restart.
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: Option<String>,
    #[serde(default = "default_lead_minutes")]
    pub default_lead_minutes: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: default_checkpoint_path(),
            default_lead_minutes: DEFAULT_LEAD_MINUTES,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_frontend_url() -> String {
    "http://localhost:4200".to_string()
}
fn default_from_email() -> String {
    "noreply@portafoliodevs.example".to_string()
}
fn default_from_name() -> String {
    "Portafolio Devs".to_string()
}
fn default_whatsapp_from() -> String {
    "whatsapp:+14155238886".to_string()
}
fn default_lead_minutes() -> i64 {
    DEFAULT_LEAD_MINUTES
}
fn default_checkpoint_path() -> Option<String> {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Some(format!("{home}/.aviso/reminders.db"))
}

impl AvisoConfig {
    /// Load config from a TOML file with AVISO_* env var overrides.
    ///
    /// Nested keys use a double underscore in the environment, e.g.
    /// `AVISO_EMAIL__API_KEY` maps to `email.api_key`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: AvisoConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("AVISO_").split("__"))
            .extract()
            .map_err(|e| crate::error::AvisoError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.aviso/aviso.toml")
}
