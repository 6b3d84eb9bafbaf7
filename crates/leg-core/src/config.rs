//! Configuration for the call flow and the gateway client

use serde::Deserialize;
use std::path::PathBuf;

use crate::errors::{LegError, Result};

/// Call flow settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Prefix of every conference room name
    pub room_prefix: String,
    /// Host (and optional port) of the media processor's WebSocket server
    pub processor_host: String,
    /// Number outbound PSTN calls are placed from
    pub service_number: String,
    /// Start a leg recording when a PSTN leg is answered
    pub record_calls: bool,
    /// Duration limit passed to the gateway for outbound PSTN calls
    pub max_call_duration_secs: u32,
    pub language: String,
    pub voice_style: u32,
    pub inbound_prompt: String,
    pub outbound_prompt: String,
    pub farewell_text: String,
    pub invalid_entry_text: String,
    pub max_digits: u8,
    pub digit_timeout_secs: u8,
    pub submit_on_hash: bool,
    /// Content type the streaming leg is created with
    pub stream_content_type: String,
    /// Caller id shown on streaming legs; the gateway ignores its value
    pub stream_from_number: String,
    /// Participant label handed to the processor for outbound calls
    pub participant_label: String,
    /// Scheme of the callback URLs handed to the gateway
    pub callback_scheme: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            room_prefix: "conf_".to_string(),
            processor_host: "localhost:6000".to_string(),
            service_number: String::new(),
            record_calls: false,
            max_call_duration_secs: 300,
            language: "en-US".to_string(),
            voice_style: 0,
            inbound_prompt: "Enter a conference number, between one and six digit long".to_string(),
            outbound_prompt: "Hello this is a call from your preferred provider. \
                              Enter a conference number, between one and six digit long"
                .to_string(),
            farewell_text: "You did not press any key, good bye".to_string(),
            invalid_entry_text: "That is not a valid conference number, good bye".to_string(),
            max_digits: 6,
            digit_timeout_secs: 7,
            submit_on_hash: true,
            stream_content_type: "audio/l16;rate=16000".to_string(),
            stream_from_number: "12995550101".to_string(),
            participant_label: "user1".to_string(),
            callback_scheme: "https".to_string(),
        }
    }
}

impl FlowConfig {
    /// Check settings that would make every call fail
    pub fn validate(&self) -> Result<()> {
        if self.processor_host.trim().is_empty() {
            return Err(LegError::config("flow.processor_host must be set"));
        }
        if self.max_digits == 0 || usize::from(self.max_digits) > crate::types::MAX_CONFERENCE_DIGITS {
            return Err(LegError::config(format!(
                "flow.max_digits must be between 1 and {}",
                crate::types::MAX_CONFERENCE_DIGITS
            )));
        }
        if self.callback_scheme != "https" && self.callback_scheme != "http" {
            return Err(LegError::config("flow.callback_scheme must be http or https"));
        }
        Ok(())
    }
}

/// Credentials and endpoints of the voice API
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub application_id: String,
    /// PEM file holding the application's RSA private key
    pub private_key_path: PathBuf,
    /// Base URL for call control, e.g. `https://api-us.vonage.com`
    pub api_base_url: String,
    /// Base URL for leg recording
    pub recording_api_base_url: String,
    /// Lifetime of each signed request token
    pub token_ttl_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            private_key_path: PathBuf::from(".private.key"),
            api_base_url: "https://api.nexmo.com".to_string(),
            recording_api_base_url: "https://api-us.vonage.com".to_string(),
            token_ttl_secs: 900,
            connect_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FlowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.room_prefix, "conf_");
        assert_eq!(config.max_digits, 6);
        assert_eq!(config.digit_timeout_secs, 7);
    }

    #[test]
    fn rejects_too_many_digits() {
        let config = FlowConfig {
            max_digits: 7,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: FlowConfig =
            serde_json::from_str(r#"{"processor_host": "proc.example.com", "record_calls": true}"#).unwrap();
        assert_eq!(config.processor_host, "proc.example.com");
        assert!(config.record_calls);
        assert_eq!(config.language, "en-US");
    }
}
