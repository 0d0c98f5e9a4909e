//! Error types used throughout the fax gateway

use thiserror::Error;

/// Main error type for Faxgate
#[derive(Error, Debug)]
pub enum FaxError {
    #[error("Provider request failed: {message}")]
    ProviderRequestFailed { status: Option<u16>, message: String },

    #[error("Invalid webhook payload: {0}")]
    InvalidWebhookPayload(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Module disabled or unconfigured: {0}")]
    ModuleDisabledOrUnconfigured(String),

    #[error("Storage write failed: {0}")]
    StorageWriteFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FaxError {
    /// Build a provider failure from a transport-level error (no HTTP status).
    pub fn provider_transport(message: impl Into<String>) -> Self {
        Self::ProviderRequestFailed { status: None, message: message.into() }
    }

    /// Build a provider failure from a non-2xx HTTP response.
    pub fn provider_status(status: u16, message: impl Into<String>) -> Self {
        Self::ProviderRequestFailed { status: Some(status), message: message.into() }
    }
}

/// Result type alias for fax gateway operations
pub type Result<T> = std::result::Result<T, FaxError>;
