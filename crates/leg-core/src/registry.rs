//! Leg Registry - per-leg bindings for active PSTN legs
//!
//! The registry relates a PSTN leg id to:
//!
//! - the conference number the caller keyed in (the *conference binding*),
//! - the id of the streaming leg that observes it (the *peer binding*),
//! - where the call came from and which phase it is in.
//!
//! Every gateway callback runs on its own task, so all of these are shared
//! mutable state. Each operation below is atomic for its key: the map is a
//! `DashMap`, and an operation holds the shard lock for exactly one entry and
//! never across an `.await`.
//!
//! A peer binding can only exist while a conference binding exists for the
//! same leg. Lookups for ids the registry has never seen return `None`, and
//! removing something twice is a no-op.

use dashmap::DashMap;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::phase::{CallPhase, PhaseTrigger};
use crate::types::{CallOrigin, ConferenceNumber, LegId};

/// Everything the registry holds for one PSTN leg
#[derive(Debug, Clone)]
struct LegRecord {
    conference: Option<ConferenceNumber>,
    peer: Option<LegId>,
    origin: Option<CallOrigin>,
    /// A streaming leg is being created for this leg
    stream_pending: bool,
    phase: CallPhase,
    /// Last binding change or phase transition
    touched_at: Instant,
}

impl LegRecord {
    fn new() -> Self {
        Self {
            conference: None,
            peer: None,
            origin: None,
            stream_pending: false,
            phase: CallPhase::default(),
            touched_at: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.touched_at = Instant::now();
    }

    fn is_vacant(&self) -> bool {
        self.conference.is_none()
            && self.peer.is_none()
            && self.origin.is_none()
            && !self.stream_pending
    }
}

/// Granted by [`LegRegistry::claim_stream`]: the caller may create the streaming leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamClaim {
    pub conference: ConferenceNumber,
    pub origin: CallOrigin,
}

/// What [`LegRegistry::release`] removed for a leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasedLeg {
    pub conference: Option<ConferenceNumber>,
    pub peer: Option<LegId>,
    pub phase: CallPhase,
}

/// Snapshot counters
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub awaiting_digits: usize,
    pub joining_conference: usize,
    pub in_conference: usize,
    pub completed: usize,
    pub conference_bindings: usize,
    pub peer_bindings: usize,
    pub pending_streams: usize,
}

/// In-memory store of leg bindings
#[derive(Debug, Default)]
pub struct LegRegistry {
    legs: DashMap<LegId, LegRecord>,
}

impl LegRegistry {
    pub fn new() -> Self {
        Self {
            legs: DashMap::new(),
        }
    }

    /// Bind `leg` to a conference number, replacing any previous binding
    pub fn bind_conference(&self, leg: &LegId, number: ConferenceNumber) -> Option<ConferenceNumber> {
        let mut record = self.legs.entry(leg.clone()).or_insert_with(LegRecord::new);
        let previous = record.conference.replace(number);
        record.touch();
        debug!("Bound leg {} to conference {:?} (previous {:?})", leg, record.conference, previous);
        previous
    }

    pub fn lookup_conference(&self, leg: &LegId) -> Option<ConferenceNumber> {
        self.legs.get(leg).and_then(|record| record.conference.clone())
    }

    /// Remove the conference binding; a peer bound to the same leg goes with it
    pub fn unbind_conference(&self, leg: &LegId) {
        if let Some(mut record) = self.legs.get_mut(leg) {
            record.conference = None;
            record.peer = None;
            record.stream_pending = false;
        }
        self.drop_if_vacant(leg);
    }

    /// Bind `leg` to its streaming peer.
    ///
    /// Returns `false`, leaving the registry unchanged, when no conference is
    /// bound to `leg` (typically because it completed while the streaming leg
    /// was being created).
    pub fn bind_peer(&self, leg: &LegId, peer: LegId) -> bool {
        match self.legs.get_mut(leg) {
            Some(mut record) if record.conference.is_some() => {
                debug!("Bound leg {} to streaming peer {}", leg, peer);
                record.peer = Some(peer);
                record.stream_pending = false;
                record.touch();
                true
            }
            _ => {
                debug!("Refused peer {} for leg {}: no conference bound", peer, leg);
                false
            }
        }
    }

    pub fn lookup_peer(&self, leg: &LegId) -> Option<LegId> {
        self.legs.get(leg).and_then(|record| record.peer.clone())
    }

    pub fn unbind_peer(&self, leg: &LegId) {
        if let Some(mut record) = self.legs.get_mut(leg) {
            record.peer = None;
        }
        self.drop_if_vacant(leg);
    }

    pub fn record_origin(&self, leg: &LegId, origin: CallOrigin) {
        let mut record = self.legs.entry(leg.clone()).or_insert_with(LegRecord::new);
        record.origin = Some(origin);
        record.touch();
    }

    pub fn lookup_origin(&self, leg: &LegId) -> Option<CallOrigin> {
        self.legs.get(leg).and_then(|record| record.origin.clone())
    }

    /// Reserve the right to create the streaming leg for `leg`.
    ///
    /// Granted only when a conference is bound, no peer is bound and no other
    /// task holds the claim, so duplicated transfer callbacks create at most
    /// one streaming leg.
    pub fn claim_stream(&self, leg: &LegId) -> Option<StreamClaim> {
        let mut record = self.legs.get_mut(leg)?;
        if record.peer.is_some() || record.stream_pending {
            return None;
        }
        let conference = record.conference.clone()?;
        record.stream_pending = true;
        record.touch();
        Some(StreamClaim {
            conference,
            origin: record.origin.clone().unwrap_or_default(),
        })
    }

    /// Give the claim back after a failed creation
    pub fn abandon_stream_claim(&self, leg: &LegId) {
        if let Some(mut record) = self.legs.get_mut(leg) {
            record.stream_pending = false;
        }
        self.drop_if_vacant(leg);
    }

    /// Remove everything held for `leg` in one step.
    ///
    /// Returns `None` when nothing was held, e.g. on a duplicated completion.
    pub fn release(&self, leg: &LegId) -> Option<ReleasedLeg> {
        let (_, record) = self.legs.remove(leg)?;
        debug!("Released leg {} in phase {}", leg, record.phase);
        Some(ReleasedLeg {
            conference: record.conference,
            peer: record.peer,
            phase: record.phase,
        })
    }

    /// Apply `trigger` to the leg's phase.
    ///
    /// Returns the new phase, or `None` if the leg is unknown or the
    /// transition table refuses the trigger.
    pub fn advance(&self, leg: &LegId, trigger: PhaseTrigger) -> Option<CallPhase> {
        let mut record = self.legs.get_mut(leg)?;
        match record.phase.next(trigger) {
            Some(next) => {
                debug!("Leg {} {} -> {} on {:?}", leg, record.phase, next, trigger);
                record.phase = next;
                record.touch();
                Some(next)
            }
            None => {
                debug!("Leg {} ignores {:?} in phase {}", leg, trigger, record.phase);
                None
            }
        }
    }

    pub fn phase(&self, leg: &LegId) -> Option<CallPhase> {
        self.legs.get(leg).map(|record| record.phase)
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Drop records with no activity for `max_age`.
    ///
    /// A leg whose completion callback never arrives would otherwise stay
    /// forever. Returns what was dropped, so bound streaming legs can be hung up.
    pub fn sweep_stale(&self, max_age: Duration) -> Vec<(LegId, ReleasedLeg)> {
        let mut swept = Vec::new();
        self.legs.retain(|leg, record| {
            let keep = record.touched_at.elapsed() < max_age;
            if !keep {
                info!("Sweeping stale leg {} in phase {}", leg, record.phase);
                swept.push((
                    leg.clone(),
                    ReleasedLeg {
                        conference: record.conference.take(),
                        peer: record.peer.take(),
                        phase: record.phase,
                    },
                ));
            }
            keep
        });
        swept
    }

    /// The PSTN leg `streaming` is bound to as a peer, if any
    pub fn peer_of(&self, streaming: &LegId) -> Option<LegId> {
        self.legs
            .iter()
            .find(|entry| entry.peer.as_ref() == Some(streaming))
            .map(|entry| entry.key().clone())
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for record in self.legs.iter() {
            stats.total += 1;
            match record.phase {
                CallPhase::Ringing => {}
                CallPhase::AwaitingDigits => stats.awaiting_digits += 1,
                CallPhase::JoiningConference => stats.joining_conference += 1,
                CallPhase::InConference => stats.in_conference += 1,
                CallPhase::Completed => stats.completed += 1,
            }
            if record.conference.is_some() {
                stats.conference_bindings += 1;
            }
            if record.peer.is_some() {
                stats.peer_bindings += 1;
            }
            if record.stream_pending {
                stats.pending_streams += 1;
            }
        }
        stats
    }

    fn drop_if_vacant(&self, leg: &LegId) {
        self.legs.remove_if(leg, |_, record| record.is_vacant());
    }
}
