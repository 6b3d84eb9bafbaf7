//! Server configuration
//!
//! Loaded from an optional TOML file layered under environment variables:
//!
//! ```text
//! confstream.toml                       [flow] record_calls = true
//! CONFSTREAM__FLOW__RECORD_CALLS=true   same setting from the environment
//! ```

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use confstream_leg_core::{FlowConfig, GatewayConfig};

use crate::errors::{Result, ServerError};

pub const ENV_PREFIX: &str = "CONFSTREAM";

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub gateway: GatewayConfig,
    pub flow: FlowConfig,
    pub logging: LogSettings,
}

/// Listener and housekeeping settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_address: String,
    pub port: u16,
    /// Host (and port) the gateway reaches this service on. When unset the
    /// `Host` header of each callback is used.
    pub public_host: Option<String>,
    /// Records older than this are dropped by the sweeper
    pub stale_leg_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            public_host: None,
            stale_leg_secs: 4 * 60 * 60,
            sweep_interval_secs: 60,
        }
    }
}

impl HttpConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .map_err(|_| ServerError::InvalidSetting(format!("server.bind_address {:?}", self.bind_address)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_leg_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Logging settings as they appear in the configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    pub file_info: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
        }
    }
}

impl ServerConfig {
    /// Load `path` (if it exists) and the `CONFSTREAM__*` environment
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse a TOML document, without consulting the environment
    pub fn from_toml(source: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        self.flow.validate()?;
        self.server.socket_addr()?;
        if self.server.sweep_interval_secs == 0 {
            return Err(ServerError::InvalidSetting(
                "server.sweep_interval_secs must be positive".to_string(),
            ));
        }
        if matches!(&self.server.public_host, Some(host) if host.trim().is_empty()) {
            return Err(ServerError::InvalidSetting("server.public_host is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.public_host, None);
        assert_eq!(config.server.stale_after(), Duration::from_secs(14_400));
        assert_eq!(config.flow.room_prefix, "conf_");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            [server]
            port = 9100
            public_host = "calls.example.com"

            [flow]
            record_calls = true
            processor_host = "processor.internal:6000"

            [gateway]
            application_id = "app-123"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.public_host.as_deref(), Some("calls.example.com"));
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert!(config.flow.record_calls);
        assert_eq!(config.flow.processor_host, "processor.internal:6000");
        assert_eq!(config.flow.max_digits, 6);
        assert_eq!(config.gateway.application_id, "app-123");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = ServerConfig::load(Path::new("/nonexistent/confstream.toml")).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0");
    }

    #[test]
    fn rejects_bad_bind_address() {
        let mut config = ServerConfig::default();
        config.server.bind_address = "not-an-ip".to_string();
        assert!(matches!(config.validate(), Err(ServerError::InvalidSetting(_))));
    }
}
