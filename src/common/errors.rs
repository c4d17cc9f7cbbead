//! Error types for the application

use thiserror::Error;

/// Result type alias using our TradingError
pub type Result<T> = std::result::Result<T, TradingError>;

/// Classification failures for inbound alert payloads
///
/// Raised before any dispatch happens; the webhook surfaces these as a
/// rejected request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    /// Body could not be parsed at all
    #[error("Malformed alert payload: {0}")]
    Malformed(String),

    /// Payload is not a key-value record
    #[error("Alert payload must be a JSON object")]
    NotAnObject,

    /// Discriminator missing or naming a type we do not know
    #[error("Unknown alert type: {0:?}")]
    UnknownAlertType(String),

    /// A field required by this alert type is absent or empty
    #[error("Alert {alert_type} is missing required field '{field}'")]
    MissingField {
        alert_type: String,
        field: &'static str,
    },

    /// A field is present but cannot be interpreted
    #[error("Alert field '{field}' has invalid value {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Main error type for bot execution
#[derive(Error, Debug)]
pub enum TradingError {
    /// Payload classification errors
    #[error("Validation error: {0}")]
    Validation(#[from] AlertError),

    /// Exchange call failed (order placement, sizing, leverage)
    #[error("Exchange error: {0}")]
    Exchange(String),

    /// Positions store call failed
    #[error("Position store error: {0}")]
    Store(String),

    /// Notification delivery failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for TradingError {
    fn from(err: config::ConfigError) -> Self {
        TradingError::Configuration(err.to_string())
    }
}
