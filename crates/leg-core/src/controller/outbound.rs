//! Manually triggered outbound PSTN calls

use tracing::info;

use super::CallFlowController;
use crate::errors::{LegError, Result};
use crate::gateway::{CreateCallRequest, Endpoint};
use crate::stream_target::CallbackUrls;
use crate::types::{CallDirection, LegId};

const MIN_NUMBER_DIGITS: usize = 7;
const MAX_NUMBER_DIGITS: usize = 15;

/// Validate a number to dial and return it in E.164 form without the `+`.
pub fn normalize_number(number: Option<&str>) -> Result<String> {
    let raw = number
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| LegError::MissingParameter("number".to_string()))?;

    let digits = raw.strip_prefix('+').unwrap_or(raw);
    let valid = (MIN_NUMBER_DIGITS..=MAX_NUMBER_DIGITS).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit());
    if !valid {
        return Err(LegError::InvalidNumber(raw.to_string()));
    }
    Ok(digits.to_string())
}

impl CallFlowController {
    /// Dial `number` from the service number; the answered leg then runs the
    /// outbound flow.
    ///
    /// `number` must already be normalized with [`normalize_number`].
    pub async fn place_outbound_call(&self, number: String, urls: &CallbackUrls) -> Result<LegId> {
        if self.config.service_number.is_empty() {
            return Err(LegError::config("flow.service_number must be set to place calls"));
        }

        let request = CreateCallRequest {
            to: Endpoint::Phone { number: number.clone() },
            from_number: self.config.service_number.clone(),
            answer_url: urls.answer(CallDirection::Outbound),
            event_url: urls.event(),
            length_timer: Some(self.config.max_call_duration_secs),
        };

        let leg = self.gateway.create_call(request).await?;
        info!("Outbound call to {} placed as leg {}", number, leg);
        Ok(leg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_e164() {
        assert_eq!(normalize_number(Some("+12995550101")).unwrap(), "12995550101");
        assert_eq!(normalize_number(Some(" 12995550101 ")).unwrap(), "12995550101");
    }

    #[test]
    fn missing_number() {
        assert!(matches!(normalize_number(None), Err(LegError::MissingParameter(_))));
        assert!(matches!(normalize_number(Some("  ")), Err(LegError::MissingParameter(_))));
    }

    #[test]
    fn malformed_number() {
        for bad in ["12345", "1299555010199999", "1299-555-0101", "++12995550101"] {
            assert!(
                matches!(normalize_number(Some(bad)), Err(LegError::InvalidNumber(_))),
                "{bad} should be rejected"
            );
        }
    }
}
