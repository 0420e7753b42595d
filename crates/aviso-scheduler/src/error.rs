use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Underlying SQLite / rusqlite error from the checkpoint store.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The scheduling request itself is malformed (e.g. blank recipient).
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// Payload could not be (de)serialized for the checkpoint store.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
