use serde::{Deserialize, Serialize};

/// Lifecycle state of an advisory session, as reported by the upstream
/// booking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created and waiting for the developer to approve or reject it.
    Pending,
    /// The developer accepted the request.
    Approved,
    /// The developer turned the request down.
    Rejected,
    /// Either party called the session off after creation.
    Cancelled,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Approved => "approved",
            SessionStatus::Rejected => "rejected",
            SessionStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Which message template a notification should be rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// A new session request landed in the developer's queue.
    NewRequest,
    /// The session was approved.
    Approved,
    /// The session request was rejected.
    Rejected,
    /// The session was cancelled after being created.
    Cancelled,
    /// Pre-session reminder fired by the scheduler.
    Reminder,
    /// Plain notification with no structured detail block.
    Generic,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TemplateKind::NewRequest => "new_request",
            TemplateKind::Approved => "approved",
            TemplateKind::Rejected => "rejected",
            TemplateKind::Cancelled => "cancelled",
            TemplateKind::Reminder => "reminder",
            TemplateKind::Generic => "generic",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "new_request" => Ok(TemplateKind::NewRequest),
            "approved" => Ok(TemplateKind::Approved),
            "rejected" => Ok(TemplateKind::Rejected),
            "cancelled" => Ok(TemplateKind::Cancelled),
            "reminder" => Ok(TemplateKind::Reminder),
            "generic" => Ok(TemplateKind::Generic),
            other => Err(format!("unknown template kind: {other}")),
        }
    }
}

/// How the client asked to be reached for status updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelPref {
    #[default]
    Email,
    Whatsapp,
    Both,
}

impl ChannelPref {
    pub fn wants_email(self) -> bool {
        matches!(self, ChannelPref::Email | ChannelPref::Both)
    }

    pub fn wants_whatsapp(self) -> bool {
        matches!(self, ChannelPref::Whatsapp | ChannelPref::Both)
    }
}

/// One side of a session: the developer offering the slot or the client
/// booking it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub email: String,
    /// E.164 phone number (`+593999999999`), required only for WhatsApp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A session lifecycle event pushed by the booking service. Drives the
/// notification fan-out to both parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: String,
    pub status: SessionStatus,
    pub developer: Party,
    pub client: Party,
    /// Session date as shown to users (e.g. `2026-02-15`).
    pub date: String,
    /// Session time as shown to users (e.g. `10:00`).
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Free-form reply from the developer (approval note, rejection reason).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_message: Option<String>,
    #[serde(default)]
    pub channel_pref: ChannelPref,
}
