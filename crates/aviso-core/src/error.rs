use thiserror::Error;

#[derive(Debug, Error)]
pub enum AvisoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, AvisoError>;
