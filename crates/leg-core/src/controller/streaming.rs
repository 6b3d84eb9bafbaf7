//! Streaming-leg lifecycle: creation on transfer, teardown on completion

use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::CallFlowController;
use crate::errors::Result;
use crate::gateway::{CreateCallRequest, Endpoint, HangupOutcome};
use crate::phase::PhaseTrigger;
use crate::registry::{ReleasedLeg, StreamClaim};
use crate::stream_target::{stream_uri, CallbackUrls};
use crate::types::LegId;

/// How a transfer event was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Nothing to do: not a PSTN leg with a conference, or a streaming leg
    /// already exists or is being created
    Skipped,
    /// Streaming leg created and bound
    Attached(LegId),
    /// Streaming leg created after the PSTN leg completed; it was hung up
    Orphaned(LegId),
    /// Creation failed; the conference continues unobserved
    Failed,
}

impl CallFlowController {
    /// The gateway placed `leg` into its conference room.
    ///
    /// Only legs with a conference binding get a streaming peer, which rules
    /// out streaming legs themselves (they transfer into the room too).
    pub async fn on_transfer(&self, leg: &LegId, urls: &CallbackUrls) -> StreamOutcome {
        let Some(claim) = self.registry.claim_stream(leg) else {
            debug!("Transfer of leg {} ({:?}) needs no streaming leg", leg, self.role_of(leg));
            return StreamOutcome::Skipped;
        };
        self.registry.advance(leg, PhaseTrigger::Transferred);

        let request = match self.stream_request(leg, &claim, urls) {
            Ok(request) => request,
            Err(e) => {
                error!("Cannot build streaming leg target for {}: {}", leg, e);
                self.registry.abandon_stream_claim(leg);
                return StreamOutcome::Failed;
            }
        };

        match self.gateway.create_call(request).await {
            Ok(peer) => {
                if self.registry.bind_peer(leg, peer.clone()) {
                    info!("Streaming leg {} observing leg {} in conference {}", peer, leg, claim.conference);
                    StreamOutcome::Attached(peer)
                } else {
                    warn!("Leg {} completed while streaming leg {} was created, hanging it up", leg, peer);
                    self.hangup_peer(&peer).await;
                    StreamOutcome::Orphaned(peer)
                }
            }
            Err(e) => {
                error!("Streaming leg for {} not created, conference continues unobserved: {}", leg, e);
                self.registry.abandon_stream_claim(leg);
                StreamOutcome::Failed
            }
        }
    }

    /// The PSTN leg completed: drop its bindings and hang up its streaming peer.
    ///
    /// Returns what was released, or `None` when nothing was held (an unknown
    /// leg, a streaming leg, or a duplicated completion).
    pub async fn on_completed(&self, leg: &LegId) -> Option<ReleasedLeg> {
        let Some(released) = self.registry.release(leg) else {
            debug!("Completed leg {} held nothing", leg);
            return None;
        };
        if released.phase.is_terminal() {
            info!("Leg {} completed after its call flow ended", leg);
        } else {
            info!("Leg {} completed in phase {}", leg, released.phase);
        }

        if let Some(peer) = &released.peer {
            self.hangup_peer(peer).await;
        }
        Some(released)
    }

    /// Drop leg records idle for `max_age` and hang up their streaming legs.
    ///
    /// Returns how many records were dropped.
    pub async fn sweep_stale(&self, max_age: Duration) -> usize {
        let swept = self.registry.sweep_stale(max_age);
        for (leg, released) in &swept {
            if let Some(peer) = &released.peer {
                warn!("Stale leg {} still had streaming leg {}, hanging it up", leg, peer);
                self.hangup_peer(peer).await;
            }
        }
        swept.len()
    }

    fn stream_request(&self, leg: &LegId, claim: &StreamClaim, urls: &CallbackUrls) -> Result<CreateCallRequest> {
        let uri = stream_uri(
            &self.config.processor_host,
            leg,
            claim,
            &urls.results(),
            &self.config.participant_label,
        )?;

        Ok(CreateCallRequest {
            to: Endpoint::Websocket {
                uri: uri.into(),
                content_type: self.config.stream_content_type.clone(),
            },
            from_number: self.config.stream_from_number.clone(),
            answer_url: urls.stream_answer(leg, &claim.conference),
            event_url: urls.stream_event(leg, &claim.conference),
            length_timer: None,
        })
    }

    /// Hang up a streaming leg; a leg that already ended counts as done
    async fn hangup_peer(&self, peer: &LegId) {
        match self.gateway.hangup_leg(peer).await {
            Ok(HangupOutcome::Terminated) => info!("Streaming leg {} terminated", peer),
            Ok(HangupOutcome::AlreadyEnded) => debug!("Streaming leg {} had already ended", peer),
            Err(e) => warn!("Hangup of streaming leg {} failed, treating it as ended: {}", peer, e),
        }
    }
}
