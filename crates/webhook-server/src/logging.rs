use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogSettings;
use crate::errors::{Result, ServerError};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// The log level to use
    pub level: Level,
    /// Whether to enable JSON formatting
    pub json: bool,
    /// Whether to include file and line information
    pub file_info: bool,
    /// Application name to include in logs
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
            app_name: "confstream".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn new(level: Level, app_name: impl Into<String>) -> Self {
        LoggingConfig {
            level,
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    pub fn from_settings(settings: &LogSettings) -> Result<Self> {
        let mut config = Self::new(parse_log_level(&settings.level)?, "confstream");
        config.json = settings.json;
        config.file_info = settings.file_info;
        Ok(config)
    }

    /// Enable JSON formatting
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }
}

/// Set up the logging system with the provided configuration.
///
/// `RUST_LOG` directives are honoured in addition to the configured level.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(config.level.into());

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        subscriber.with_writer(std::io::stdout).json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| ServerError::Logging(e.to_string()))
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| ServerError::InvalidSetting(format!("Invalid log level: {}", level)))
}

/// Log a welcome message with version info
pub fn log_welcome(app_name: &str, version: &str) {
    tracing::info!("Starting {} v{}", app_name, version);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn settings_to_config() {
        let settings = LogSettings {
            level: "trace".to_string(),
            json: true,
            file_info: false,
        };
        let config = LoggingConfig::from_settings(&settings).unwrap();
        assert_eq!(config.level, Level::TRACE);
        assert!(config.json);
        assert_eq!(config.app_name, "confstream");
    }
}
