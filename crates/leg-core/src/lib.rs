//! # Leg-Core
//!
//! Call-leg bookkeeping and the conference call flow for confstream.
//!
//! This crate provides:
//! - [`LegRegistry`]: per-leg conference and streaming-peer bindings, safe
//!   under concurrent webhook handling
//! - [`CallFlowController`]: the per-leg state machine issuing gateway commands
//! - [`TelephonyGateway`]: the call-control boundary, with the HTTP
//!   [`VoiceApiGateway`] implementation
//! - the instruction model returned to the gateway and the URL builders for
//!   callbacks and streaming-leg targets
//!
//! ## Architecture
//!
//! The gateway pushes callbacks to the webhook server, which hands them to
//! the controller. The controller consults and updates the registry and sends
//! commands back through the gateway. Leg state lives only as long as the call.

pub mod config;
pub mod controller;
pub mod errors;
pub mod gateway;
pub mod instructions;
pub mod phase;
pub mod registry;
pub mod stream_target;
pub mod types;

pub use config::{FlowConfig, GatewayConfig};
pub use controller::{AnswerCallback, CallFlowController, DigitCollection, FlowProfile, StreamOutcome};
pub use errors::{LegError, Result};
pub use gateway::{CreateCallRequest, Endpoint, HangupOutcome, TelephonyGateway, VoiceApiGateway};
pub use instructions::{Instruction, InstructionSet};
pub use phase::{CallPhase, PhaseTrigger};
pub use registry::{LegRegistry, RegistryStats, ReleasedLeg, StreamClaim};
pub use stream_target::CallbackUrls;
pub use types::{CallDirection, CallOrigin, ConferenceNumber, LegEvent, LegEventKind, LegId, LegRole, LegStatus};
