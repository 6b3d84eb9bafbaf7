//! # Call Flow Controller
//!
//! Drives each PSTN leg through its conference call flow and issues the
//! gateway commands that belong to each transition:
//!
//! ```text
//! answer webhook      Ringing -> AwaitingDigits        prompt + collect digits
//! digits webhook      AwaitingDigits -> Joining...     bind conference, join room
//!                     AwaitingDigits -> Completed      farewell (timeout / bad entry)
//! transfer event      Joining... -> InConference       create streaming leg, bind peer
//! completed event     any -> Completed                 release bindings, hang up peer
//! ```
//!
//! Inbound and outbound PSTN legs run the same flow; a [`FlowProfile`]
//! carries what differs between them (the direction and the first prompt).
//!
//! Webhook handlers call the synchronous entry points ([`CallFlowController::on_answered`],
//! [`CallFlowController::on_digits`], [`CallFlowController::streaming_answer`])
//! to build their response, and hand events to
//! [`CallFlowController::handle_event`] on a spawned task so the gateway is
//! acknowledged before any command is sent.
//!
//! ## Failure handling
//!
//! No per-call failure escapes the controller. Gateway command failures are
//! logged; a failed streaming-leg creation leaves the participant in the
//! conference without an observer; hangups of legs that already ended are
//! successes. Events for legs the registry does not hold are no-ops.

mod outbound;
mod streaming;

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::FlowConfig;
use crate::gateway::TelephonyGateway;
use crate::instructions::{Instruction, InstructionSet};
use crate::phase::PhaseTrigger;
use crate::registry::LegRegistry;
use crate::stream_target::CallbackUrls;
use crate::types::{
    CallDirection, CallOrigin, ConferenceNumber, LegEvent, LegEventKind, LegId, LegRole, LegStatus,
};

pub use outbound::normalize_number;
pub use streaming::StreamOutcome;

/// What differs between the inbound and the outbound flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowProfile {
    pub direction: CallDirection,
    pub initial_prompt: String,
}

impl FlowProfile {
    pub fn for_direction(config: &FlowConfig, direction: CallDirection) -> Self {
        let initial_prompt = match direction {
            CallDirection::Inbound => config.inbound_prompt.clone(),
            CallDirection::Outbound => config.outbound_prompt.clone(),
        };
        Self {
            direction,
            initial_prompt,
        }
    }
}

/// Answer callback for a PSTN leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCallback {
    pub leg: LegId,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Result of a digit collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitCollection {
    pub leg: LegId,
    pub digits: String,
    pub timed_out: bool,
}

/// Conference call flow for PSTN legs and their streaming peers
pub struct CallFlowController {
    gateway: Arc<dyn TelephonyGateway>,
    registry: Arc<LegRegistry>,
    config: FlowConfig,
}

impl CallFlowController {
    pub fn new(gateway: Arc<dyn TelephonyGateway>, registry: Arc<LegRegistry>, config: FlowConfig) -> Self {
        Self {
            gateway,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<LegRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn profile(&self, direction: CallDirection) -> FlowProfile {
        FlowProfile::for_direction(&self.config, direction)
    }

    /// What the registry knows `leg` to be.
    ///
    /// Only PSTN legs are bound to a conference and only streaming legs are
    /// bound as peers; `None` for legs the registry holds neither way.
    pub fn role_of(&self, leg: &LegId) -> Option<LegRole> {
        if self.registry.lookup_conference(leg).is_some() {
            Some(LegRole::Pstn)
        } else if self.registry.peer_of(leg).is_some() {
            Some(LegRole::Streaming)
        } else {
            None
        }
    }

    /// A PSTN leg answered: prompt for the conference number.
    ///
    /// When recording is enabled the recording is started on a detached task;
    /// its outcome never affects the call.
    pub fn on_answered(&self, profile: &FlowProfile, answer: AnswerCallback, urls: &CallbackUrls) -> InstructionSet {
        info!("Leg {} answered ({})", answer.leg, profile.direction);

        let origin = match profile.direction {
            CallDirection::Inbound => CallOrigin {
                direction: CallDirection::Inbound,
                caller: answer.from,
                callee: answer.to,
            },
            CallDirection::Outbound => CallOrigin::outbound(answer.from, answer.to),
        };
        self.registry.record_origin(&answer.leg, origin);
        self.registry.advance(&answer.leg, PhaseTrigger::Answered);

        if self.config.record_calls {
            let gateway = Arc::clone(&self.gateway);
            let leg = answer.leg.clone();
            tokio::spawn(async move {
                if let Err(e) = gateway.start_recording(&leg).await {
                    warn!("Could not start recording on leg {}: {}", leg, e);
                }
            });
        }

        InstructionSet::new()
            .push(Instruction::prompt(&self.config, profile.initial_prompt.clone()))
            .push(Instruction::collect_digits(&self.config, urls.dtmf()))
    }

    /// Digit collection finished: join the selected conference or say goodbye.
    pub fn on_digits(&self, collection: DigitCollection) -> InstructionSet {
        let leg = &collection.leg;

        if collection.timed_out {
            info!("Digit collection timed out on leg {}", leg);
            self.registry.advance(leg, PhaseTrigger::DigitsRejected);
            return InstructionSet::new().push(Instruction::talk(&self.config, self.config.farewell_text.clone()));
        }

        let number = match ConferenceNumber::parse(&collection.digits) {
            Ok(number) => number,
            Err(e) => {
                warn!("Leg {} entered an unusable conference number: {}", leg, e);
                self.registry.advance(leg, PhaseTrigger::DigitsRejected);
                return InstructionSet::new()
                    .push(Instruction::talk(&self.config, self.config.invalid_entry_text.clone()));
            }
        };

        let room = number.room_name(&self.config.room_prefix);
        let confirmation = format!(
            "You entered conference number {}, you are now on the conference call.",
            number.readback()
        );

        if let Some(previous) = self.registry.bind_conference(leg, number) {
            debug!("Leg {} re-entered digits, replacing conference {}", leg, previous);
        }
        self.registry.advance(leg, PhaseTrigger::DigitsAccepted);
        info!("Leg {} joining room {}", leg, room);

        InstructionSet::new()
            .push(Instruction::talk(&self.config, confirmation))
            .push(Instruction::join_room(room))
    }

    /// Answer instructions for the streaming leg observing `peer`: join the
    /// same room, hearing only that participant.
    pub fn streaming_answer(&self, peer: &LegId, conference: &ConferenceNumber) -> InstructionSet {
        let room = conference.room_name(&self.config.room_prefix);
        debug!("Streaming leg for {} listening in on {}", peer, room);
        InstructionSet::new().push(Instruction::listen_in(room, peer.as_str()))
    }

    /// Status events of streaming legs need no action
    pub fn on_streaming_event(&self, leg: Option<&LegId>, status: Option<&str>) {
        debug!(
            "Streaming leg {} status {}",
            leg.map(LegId::as_str).unwrap_or("<unknown>"),
            status.unwrap_or("<none>")
        );
    }

    /// React to an asynchronous PSTN leg event
    pub async fn handle_event(&self, event: LegEvent, urls: &CallbackUrls) {
        match event.kind {
            LegEventKind::Transfer => {
                self.on_transfer(&event.leg, urls).await;
            }
            LegEventKind::Status(LegStatus::Completed) => {
                self.on_completed(&event.leg).await;
            }
            LegEventKind::Status(status) if status.is_terminal() => {
                info!("Leg {} ended with status {:?}", event.leg, status);
            }
            LegEventKind::Status(status) => {
                debug!("Leg {} status {:?}", event.leg, status);
            }
        }
    }
}
