use thiserror::Error;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP transport failed before a response was received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("Delivery rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The adapter is missing credentials and cannot send.
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    /// The provider did not answer within the client timeout.
    #[error("Send timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl NotifyError {
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_secs: u64) -> Self {
        if e.is_timeout() {
            NotifyError::Timeout { secs: timeout_secs }
        } else {
            NotifyError::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;
