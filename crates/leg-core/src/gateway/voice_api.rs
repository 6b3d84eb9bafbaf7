//! HTTP gateway speaking the Vonage Voice API
//!
//! Every request is authenticated with a short-lived RS256 JWT signed with
//! the application's private key.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{CreateCallRequest, Endpoint, HangupOutcome, TelephonyGateway};
use crate::config::GatewayConfig;
use crate::errors::{LegError, Result};
use crate::types::LegId;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    application_id: &'a str,
    iat: i64,
    exp: i64,
    jti: String,
}

#[derive(Debug, Serialize)]
struct CreateCallBody<'a> {
    to: [&'a Endpoint; 1],
    from: Endpoint,
    answer_url: [&'a str; 1],
    answer_method: &'static str,
    event_url: [&'a str; 1],
    event_method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    length_timer: Option<u32>,
}

impl<'a> CreateCallBody<'a> {
    fn from_request(request: &'a CreateCallRequest) -> Self {
        Self {
            to: [&request.to],
            from: Endpoint::Phone {
                number: request.from_number.clone(),
            },
            answer_url: [request.answer_url.as_str()],
            answer_method: "GET",
            event_url: [request.event_url.as_str()],
            event_method: "POST",
            length_timer: request.length_timer,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateCallResponse {
    uuid: String,
}

#[derive(Debug, Serialize)]
struct RecordingBody {
    split: bool,
    streamed: bool,
    public: bool,
    validity_time: u32,
    format: &'static str,
}

impl Default for RecordingBody {
    fn default() -> Self {
        Self {
            split: true,
            streamed: true,
            public: true,
            validity_time: 30,
            format: "mp3",
        }
    }
}

/// [`TelephonyGateway`] over the voice REST API
pub struct VoiceApiGateway {
    client: Client,
    config: GatewayConfig,
    signing_key: EncodingKey,
}

impl VoiceApiGateway {
    /// Build a gateway reading the private key from `config.private_key_path`
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let pem = std::fs::read(&config.private_key_path).map_err(|e| {
            LegError::config(format!(
                "cannot read private key {}: {}",
                config.private_key_path.display(),
                e
            ))
        })?;
        Self::with_private_key(config, &pem)
    }

    /// Build a gateway from an in-memory PEM key
    pub fn with_private_key(config: GatewayConfig, pem: &[u8]) -> Result<Self> {
        if config.application_id.is_empty() {
            return Err(LegError::config("gateway.application_id must be set"));
        }
        let signing_key = EncodingKey::from_rsa_pem(pem)?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            signing_key,
        })
    }

    fn token(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            application_id: &self.config.application_id,
            iat: now,
            exp: now + self.config.token_ttl_secs as i64,
            jti: uuid::Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)?)
    }
}

/// `base` with `segments` appended to its path
fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| LegError::config(format!("{} cannot be used as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl TelephonyGateway for VoiceApiGateway {
    async fn create_call(&self, request: CreateCallRequest) -> Result<LegId> {
        let url = endpoint(&self.config.api_base_url, &["v1", "calls"])?;
        let body = CreateCallBody::from_request(&request);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LegError::GatewayStatus {
                operation: "create call".to_string(),
                status: status.as_u16(),
            });
        }

        let created: CreateCallResponse = response.json().await?;
        info!("Gateway created leg {}", created.uuid);
        Ok(LegId(created.uuid))
    }

    async fn hangup_leg(&self, leg: &LegId) -> Result<HangupOutcome> {
        let url = endpoint(&self.config.api_base_url, &["v1", "calls", leg.as_str()])?;

        let response = self
            .client
            .put(url)
            .bearer_auth(self.token()?)
            .json(&serde_json::json!({ "action": "hangup" }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(HangupOutcome::Terminated)
        } else if status.is_client_error() && status != StatusCode::UNAUTHORIZED {
            debug!("Hangup of leg {} answered {}, leg already ended", leg, status);
            Ok(HangupOutcome::AlreadyEnded)
        } else {
            Err(LegError::GatewayStatus {
                operation: "hangup".to_string(),
                status: status.as_u16(),
            })
        }
    }

    async fn start_recording(&self, leg: &LegId) -> Result<()> {
        let url = endpoint(
            &self.config.recording_api_base_url,
            &["v1", "legs", leg.as_str(), "recording"],
        )?;

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token()?)
            .json(&RecordingBody::default())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LegError::GatewayStatus {
                operation: "start recording".to_string(),
                status: status.as_u16(),
            });
        }
        info!("Recording started on leg {}", leg);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn endpoint_appends_segments() {
        let url = endpoint("https://api.example.com/", &["v1", "calls", "abc-123"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/calls/abc-123");

        let url = endpoint("https://api.example.com/voice", &["v1", "legs", "x", "recording"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/voice/v1/legs/x/recording");
    }

    #[test]
    fn websocket_call_body() {
        let request = CreateCallRequest {
            to: Endpoint::Websocket {
                uri: "wss://proc/socket?peer_uuid=leg-1".to_string(),
                content_type: "audio/l16;rate=16000".to_string(),
            },
            from_number: "12995550101".to_string(),
            answer_url: "https://host/ws_answer".to_string(),
            event_url: "https://host/ws_event".to_string(),
            length_timer: None,
        };

        let body = serde_json::to_value(CreateCallBody::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "to": [{
                    "type": "websocket",
                    "uri": "wss://proc/socket?peer_uuid=leg-1",
                    "content-type": "audio/l16;rate=16000"
                }],
                "from": { "type": "phone", "number": "12995550101" },
                "answer_url": ["https://host/ws_answer"],
                "answer_method": "GET",
                "event_url": ["https://host/ws_event"],
                "event_method": "POST"
            })
        );
    }

    #[test]
    fn phone_call_body_carries_length_timer() {
        let request = CreateCallRequest {
            to: Endpoint::Phone {
                number: "12995550100".to_string(),
            },
            from_number: "12995550199".to_string(),
            answer_url: "https://host/answer?direction=outbound".to_string(),
            event_url: "https://host/event".to_string(),
            length_timer: Some(300),
        };

        let body = serde_json::to_value(CreateCallBody::from_request(&request)).unwrap();
        assert_eq!(body["length_timer"], json!(300));
        assert_eq!(body["to"][0], json!({ "type": "phone", "number": "12995550100" }));
    }

    #[test]
    fn missing_application_id_is_rejected() {
        let result = VoiceApiGateway::with_private_key(GatewayConfig::default(), b"not a key");
        assert!(matches!(result, Err(LegError::Configuration(_))));
    }
}
