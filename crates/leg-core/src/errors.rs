//! Error types for leg-core

use thiserror::Error;

/// Result type for leg-core operations
pub type Result<T> = std::result::Result<T, LegError>;

/// Errors raised by the call flow and the gateway boundary.
///
/// Registry lookups never fail: absence is `None`, not an error.
#[derive(Error, Debug)]
pub enum LegError {
    /// The gateway rejected or could not perform a command
    #[error("Gateway {operation} failed: {message}")]
    Gateway { operation: String, message: String },

    /// The gateway answered with a non-success HTTP status
    #[error("Gateway {operation} returned HTTP {status}")]
    GatewayStatus { operation: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Collected digits are not a 1-6 digit conference number
    #[error("Invalid conference number: {0:?}")]
    InvalidConferenceNumber(String),

    /// A phone number that cannot be dialled
    #[error("Invalid phone number: {0:?}")]
    InvalidNumber(String),

    /// A required request parameter was absent
    #[error("\"{0}\" parameter missing")]
    MissingParameter(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LegError {
    /// Create a gateway command error
    pub fn gateway(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Gateway {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether the error came from input the caller supplied
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConferenceNumber(_) | Self::InvalidNumber(_) | Self::MissingParameter(_)
        )
    }
}
