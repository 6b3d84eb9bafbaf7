//! Core types for leg-core
//!
//! Identifiers, the conference number, call direction and the gateway's
//! status vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LegError, Result};

/// Longest conference number a caller can key in
pub const MAX_CONFERENCE_DIGITS: usize = 6;

/// Gateway-assigned call leg id
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegId(pub String);

impl LegId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LegId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LegId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Conference number keyed in by a caller: 1 to 6 ASCII digits.
///
/// The digits are kept exactly as entered, so "0012" stays "0012".
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConferenceNumber(String);

impl ConferenceNumber {
    /// Validate a digit string collected from the caller
    pub fn parse(digits: &str) -> Result<Self> {
        let valid = !digits.is_empty()
            && digits.len() <= MAX_CONFERENCE_DIGITS
            && digits.bytes().all(|b| b.is_ascii_digit());
        if valid {
            Ok(Self(digits.to_string()))
        } else {
            Err(LegError::InvalidConferenceNumber(digits.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits separated by spaces so text-to-speech reads them one by one
    pub fn readback(&self) -> String {
        let mut spoken = String::with_capacity(self.0.len() * 2);
        for (i, digit) in self.0.chars().enumerate() {
            if i > 0 {
                spoken.push(' ');
            }
            spoken.push(digit);
        }
        spoken
    }

    /// Name of the conference room this number selects
    pub fn room_name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.0)
    }
}

impl fmt::Display for ConferenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ConferenceNumber {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ConferenceNumber::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Which side originated the PSTN call
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    #[default]
    Inbound,
    Outbound,
}

impl CallDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallDirection::Inbound => "inbound",
            CallDirection::Outbound => "outbound",
        }
    }
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a leg is connected to
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum LegRole {
    /// A telephone participant
    Pstn,
    /// A WebSocket leg feeding the media processor
    Streaming,
}

/// Leg status as reported by the gateway's event callbacks
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum LegStatus {
    Started,
    Ringing,
    Answered,
    Machine,
    Completed,
    Busy,
    Cancelled,
    Failed,
    Rejected,
    Timeout,
    Unanswered,
    Other(String),
}

impl LegStatus {
    /// The leg will not carry media any more
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LegStatus::Completed
                | LegStatus::Busy
                | LegStatus::Cancelled
                | LegStatus::Failed
                | LegStatus::Rejected
                | LegStatus::Timeout
                | LegStatus::Unanswered
        )
    }
}

impl From<&str> for LegStatus {
    fn from(status: &str) -> Self {
        match status {
            "started" => LegStatus::Started,
            "ringing" => LegStatus::Ringing,
            "answered" => LegStatus::Answered,
            "machine" => LegStatus::Machine,
            "completed" => LegStatus::Completed,
            "busy" => LegStatus::Busy,
            "cancelled" => LegStatus::Cancelled,
            "failed" => LegStatus::Failed,
            "rejected" => LegStatus::Rejected,
            "timeout" => LegStatus::Timeout,
            "unanswered" => LegStatus::Unanswered,
            other => LegStatus::Other(other.to_string()),
        }
    }
}

/// Where a PSTN call came from, captured when it is answered
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallOrigin {
    pub direction: CallDirection,
    pub caller: Option<String>,
    pub callee: Option<String>,
}

impl CallOrigin {
    pub fn inbound() -> Self {
        Self::default()
    }

    pub fn outbound(caller: Option<String>, callee: Option<String>) -> Self {
        Self {
            direction: CallDirection::Outbound,
            caller,
            callee,
        }
    }
}

/// Asynchronous event delivered by the gateway for one leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegEventKind {
    /// The leg has been moved into a named conference
    Transfer,
    /// The leg's status changed
    Status(LegStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegEvent {
    pub leg: LegId,
    pub kind: LegEventKind,
}

impl LegEvent {
    /// Classify a raw event callback.
    ///
    /// Transfer notifications carry `type: "transfer"` and no status; status
    /// callbacks carry `status`. Anything else is not an event this flow reacts to.
    pub fn classify(leg: LegId, event_type: Option<&str>, status: Option<&str>) -> Option<Self> {
        let kind = match (event_type, status) {
            (Some("transfer"), _) => LegEventKind::Transfer,
            (_, Some(status)) => LegEventKind::Status(LegStatus::from(status)),
            _ => return None,
        };
        Some(Self { leg, kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conference_number_keeps_digits_verbatim() {
        let number = ConferenceNumber::parse("0012").unwrap();
        assert_eq!(number.as_str(), "0012");
        assert_eq!(number.room_name("conf_"), "conf_0012");
    }

    #[test]
    fn conference_number_readback_spaces_digits() {
        assert_eq!(ConferenceNumber::parse("1234").unwrap().readback(), "1 2 3 4");
        assert_eq!(ConferenceNumber::parse("7").unwrap().readback(), "7");
    }

    #[test]
    fn conference_number_rejects_bad_input() {
        for bad in ["", "1234567", "12a4", "12#", " 12"] {
            assert!(ConferenceNumber::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn classify_transfer_and_status() {
        let leg = LegId::from("leg-1");
        let transfer = LegEvent::classify(leg.clone(), Some("transfer"), None).unwrap();
        assert_eq!(transfer.kind, LegEventKind::Transfer);

        let completed = LegEvent::classify(leg.clone(), None, Some("completed")).unwrap();
        assert_eq!(completed.kind, LegEventKind::Status(LegStatus::Completed));

        assert!(LegEvent::classify(leg, Some("sip:hangup"), None).is_none());
    }

    #[test]
    fn unknown_status_is_preserved() {
        let status = LegStatus::from("human");
        assert_eq!(status, LegStatus::Other("human".to_string()));
        assert!(!status.is_terminal());
        assert!(LegStatus::from("busy").is_terminal());
    }
}
