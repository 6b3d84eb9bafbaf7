//! Startup errors of the webhook server

use confstream_leg_core::LegError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Leg(#[from] LegError),
}
