//! URL building for gateway callbacks and streaming-leg targets

use url::Url;

use crate::errors::Result;
use crate::registry::StreamClaim;
use crate::types::{CallDirection, ConferenceNumber, LegId};

/// Callback URLs handed to the gateway, all rooted at this service's public host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackUrls {
    base: Url,
}

impl CallbackUrls {
    /// `host` may carry a port, e.g. `calls.example.com` or `127.0.0.1:8000`
    pub fn new(scheme: &str, host: &str) -> Result<Self> {
        let base = Url::parse(&format!("{}://{}", scheme, host))?;
        Ok(Self { base })
    }

    pub fn host(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }

    /// Answer URL for PSTN legs this service dials out
    pub fn answer(&self, direction: CallDirection) -> String {
        let mut url = self.endpoint("/answer");
        url.query_pairs_mut().append_pair("direction", direction.as_str());
        url.into()
    }

    pub fn dtmf(&self) -> String {
        self.endpoint("/dtmf").into()
    }

    pub fn event(&self) -> String {
        self.endpoint("/event").into()
    }

    pub fn results(&self) -> String {
        self.endpoint("/results").into()
    }

    /// Answer URL of the streaming leg observing `peer`
    pub fn stream_answer(&self, peer: &LegId, conference: &ConferenceNumber) -> String {
        self.with_peer("/ws_answer", peer, conference)
    }

    /// Event URL of the streaming leg observing `peer`
    pub fn stream_event(&self, peer: &LegId, conference: &ConferenceNumber) -> String {
        self.with_peer("/ws_event", peer, conference)
    }

    fn with_peer(&self, path: &str, peer: &LegId, conference: &ConferenceNumber) -> String {
        let mut url = self.endpoint(path);
        url.query_pairs_mut()
            .append_pair("peer_uuid", peer.as_str())
            .append_pair("conf_number", conference.as_str());
        url.into()
    }
}

/// WebSocket URI the streaming leg for `peer` connects to.
///
/// The media processor reads the peer leg, the conference number and where
/// to post its results from the query string. Outbound calls also carry the
/// participant label, the direction and both phone numbers.
pub fn stream_uri(
    processor_host: &str,
    peer: &LegId,
    claim: &StreamClaim,
    results_url: &str,
    participant_label: &str,
) -> Result<Url> {
    let mut uri = Url::parse(&format!("wss://{}/socket", processor_host))?;
    {
        let mut query = uri.query_pairs_mut();
        if claim.origin.direction == CallDirection::Outbound {
            query
                .append_pair("participant", participant_label)
                .append_pair("call_direction", claim.origin.direction.as_str());
        }
        query
            .append_pair("peer_uuid", peer.as_str())
            .append_pair("conf_number", claim.conference.as_str());
        if claim.origin.direction == CallDirection::Outbound {
            if let Some(caller) = &claim.origin.caller {
                query.append_pair("caller_number", caller);
            }
            if let Some(callee) = &claim.origin.callee {
                query.append_pair("callee_number", callee);
            }
        }
        query.append_pair("webhook_url", results_url);
    }
    Ok(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CallOrigin;
    use std::collections::HashMap;

    fn query_of(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    fn claim(origin: CallOrigin) -> StreamClaim {
        StreamClaim {
            conference: ConferenceNumber::parse("0077").unwrap(),
            origin,
        }
    }

    #[test]
    fn callback_urls() {
        let urls = CallbackUrls::new("https", "calls.example.com").unwrap();
        assert_eq!(urls.dtmf(), "https://calls.example.com/dtmf");
        assert_eq!(urls.event(), "https://calls.example.com/event");
        assert_eq!(
            urls.answer(CallDirection::Outbound),
            "https://calls.example.com/answer?direction=outbound"
        );
        let conference = ConferenceNumber::parse("12").unwrap();
        assert_eq!(
            urls.stream_answer(&LegId::from("leg-1"), &conference),
            "https://calls.example.com/ws_answer?peer_uuid=leg-1&conf_number=12"
        );
    }

    #[test]
    fn host_with_port() {
        let urls = CallbackUrls::new("http", "127.0.0.1:8000").unwrap();
        assert_eq!(urls.results(), "http://127.0.0.1:8000/results");
        assert_eq!(urls.host(), "127.0.0.1");
    }

    #[test]
    fn inbound_stream_uri() {
        let uri = stream_uri(
            "proc.example.com",
            &LegId::from("leg-1"),
            &claim(CallOrigin::inbound()),
            "https://calls.example.com/results",
            "user1",
        )
        .unwrap();

        assert_eq!(uri.scheme(), "wss");
        assert_eq!(uri.path(), "/socket");
        let query = query_of(&uri);
        assert_eq!(query["peer_uuid"], "leg-1");
        assert_eq!(query["conf_number"], "0077");
        assert_eq!(query["webhook_url"], "https://calls.example.com/results");
        assert!(!query.contains_key("call_direction"));
        assert!(!query.contains_key("participant"));
    }

    #[test]
    fn outbound_stream_uri_carries_numbers() {
        let origin = CallOrigin::outbound(Some("12995550100".into()), Some("12995550101".into()));
        let uri = stream_uri(
            "proc.example.com:8443",
            &LegId::from("leg-2"),
            &claim(origin),
            "https://calls.example.com/results",
            "user1",
        )
        .unwrap();

        let query = query_of(&uri);
        assert_eq!(query["participant"], "user1");
        assert_eq!(query["call_direction"], "outbound");
        assert_eq!(query["caller_number"], "12995550100");
        assert_eq!(query["callee_number"], "12995550101");
        assert_eq!(uri.port(), Some(8443));
    }
}
