use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("telephony provider is not configured")]
    ProviderMisconfigured,

    #[error("outbound call dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("audio resource could not be resolved: {0}")]
    ResourceResolutionFailed(String),

    #[error("invalid serial code entry: {0}")]
    InvalidCode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GateError>;
