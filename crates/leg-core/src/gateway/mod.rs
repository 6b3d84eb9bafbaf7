//! Telephony gateway boundary
//!
//! The gateway creates and hangs up call legs and delivers their callbacks.
//! The call flow only depends on [`TelephonyGateway`]; [`VoiceApiGateway`]
//! is the HTTP implementation used in production.

pub mod voice_api;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::Result;
use crate::types::LegId;

pub use voice_api::VoiceApiGateway;

/// Far end of a leg to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Endpoint {
    Phone {
        number: String,
    },
    Websocket {
        uri: String,
        #[serde(rename = "content-type")]
        content_type: String,
    },
}

/// Everything the gateway needs to place a new leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCallRequest {
    pub to: Endpoint,
    /// Caller id presented on the new leg
    pub from_number: String,
    /// Fetched with GET when the leg answers
    pub answer_url: String,
    /// Receives the leg's status events with POST
    pub event_url: String,
    /// Maximum leg duration in seconds
    pub length_timer: Option<u32>,
}

/// Result of a hangup command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangupOutcome {
    Terminated,
    /// The leg had already ended; as good as a successful hangup
    AlreadyEnded,
}

/// Call-control commands the flow issues
#[async_trait]
pub trait TelephonyGateway: Send + Sync {
    /// Place a new leg and return its id
    async fn create_call(&self, request: CreateCallRequest) -> Result<LegId>;

    /// Terminate a leg
    async fn hangup_leg(&self, leg: &LegId) -> Result<HangupOutcome>;

    /// Start a gateway-side recording of one leg
    async fn start_recording(&self, leg: &LegId) -> Result<()>;
}
