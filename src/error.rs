//! Error types for Notionslot.

/// Top-level error type for the handler.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors. Raised at construction time, never
/// recovered: an incomplete config is a deploy mistake, not user input.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} is required as notionslot config")]
    Missing { key: String },
}

/// Transport-level failures, reported by whichever [`TransportPort`]
/// implementation is injected. The core propagates these unchanged —
/// no retry, no backoff.
///
/// [`TransportPort`]: crate::transport::TransportPort
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to send mail to {to}: {reason}")]
    SendFailed { to: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid mail address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// Result type alias for the handler.
pub type Result<T> = std::result::Result<T, Error>;
