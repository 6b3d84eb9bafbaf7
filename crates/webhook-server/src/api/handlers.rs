//! Gateway and operator webhooks
//!
//! Handlers that return instructions answer synchronously. Event handlers
//! acknowledge at once and leave gateway commands to a spawned task, so a
//! slow gateway never delays the acknowledgment.

use axum::extract::{Host, Json, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use confstream_leg_core::controller::normalize_number;
use confstream_leg_core::{
    AnswerCallback, CallDirection, ConferenceNumber, DigitCollection, InstructionSet, LegError, LegEvent, LegId,
    RegistryStats,
};

use super::error::ApiError;
use super::state::AppState;

const ACK: &str = "Ok";

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError(LegError::MissingParameter(name.to_string())))
}

#[derive(Debug, Deserialize)]
pub struct AnswerParams {
    pub uuid: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub direction: CallDirection,
}

/// GET /answer
pub async fn answer(
    State(state): State<AppState>,
    Host(host): Host,
    Query(params): Query<AnswerParams>,
) -> Result<Json<InstructionSet>, ApiError> {
    let leg = LegId(required(params.uuid, "uuid")?);
    let urls = state.callback_urls(&host)?;
    let profile = state.controller.profile(params.direction);

    let instructions = state.controller.on_answered(
        &profile,
        AnswerCallback {
            leg,
            from: params.from,
            to: params.to,
        },
        &urls,
    );
    Ok(Json(instructions))
}

#[derive(Debug, Default, Deserialize)]
pub struct DtmfResult {
    #[serde(default)]
    pub digits: String,
    #[serde(default)]
    pub timed_out: bool,
}

#[derive(Debug, Deserialize)]
pub struct DtmfCallback {
    pub uuid: Option<String>,
    #[serde(default)]
    pub dtmf: DtmfResult,
}

/// POST /dtmf
pub async fn dtmf(State(state): State<AppState>, Json(callback): Json<DtmfCallback>) -> Result<Json<InstructionSet>, ApiError> {
    let leg = LegId(required(callback.uuid, "uuid")?);
    let instructions = state.controller.on_digits(DigitCollection {
        leg,
        digits: callback.dtmf.digits,
        timed_out: callback.dtmf.timed_out,
    });
    Ok(Json(instructions))
}

#[derive(Debug, Deserialize)]
pub struct EventCallback {
    pub uuid: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

/// POST /event
pub async fn event(
    State(state): State<AppState>,
    Host(host): Host,
    Json(callback): Json<EventCallback>,
) -> &'static str {
    let Some(uuid) = callback.uuid.filter(|u| !u.is_empty()) else {
        debug!("Event without a leg id: {:?}", callback.event_type);
        return ACK;
    };
    let classified = LegEvent::classify(LegId(uuid), callback.event_type.as_deref(), callback.status.as_deref());
    let Some(event) = classified else {
        return ACK;
    };

    let urls = match state.callback_urls(&host) {
        Ok(urls) => urls,
        Err(e) => {
            warn!("Dropping event for leg {}, no callback URLs for host {:?}: {}", event.leg, host, e);
            return ACK;
        }
    };
    let controller = state.controller.clone();
    tokio::spawn(async move {
        controller.handle_event(event, &urls).await;
    });
    ACK
}

#[derive(Debug, Deserialize)]
pub struct StreamAnswerParams {
    pub peer_uuid: Option<String>,
    pub conf_number: Option<String>,
}

/// GET /ws_answer
pub async fn stream_answer(
    State(state): State<AppState>,
    Query(params): Query<StreamAnswerParams>,
) -> Result<Json<InstructionSet>, ApiError> {
    let peer = LegId(required(params.peer_uuid, "peer_uuid")?);
    let conference = ConferenceNumber::parse(&required(params.conf_number, "conf_number")?)?;
    Ok(Json(state.controller.streaming_answer(&peer, &conference)))
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamEventCallback {
    pub uuid: Option<String>,
    pub status: Option<String>,
}

/// POST /ws_event
pub async fn stream_event(State(state): State<AppState>, Json(callback): Json<StreamEventCallback>) -> &'static str {
    let leg = callback.uuid.map(LegId);
    state
        .controller
        .on_streaming_event(leg.as_ref(), callback.status.as_deref());
    ACK
}

#[derive(Debug, Deserialize)]
pub struct CallParams {
    pub number: Option<String>,
}

/// GET /call - dial a number and run the outbound flow on it
pub async fn place_call(State(state): State<AppState>, Host(host): Host, Query(params): Query<CallParams>) -> Response {
    let number = match normalize_number(params.number.as_deref()) {
        Ok(number) => number,
        Err(LegError::MissingParameter(name)) => {
            return format!("\"{}\" parameter missing as query parameter - please check", name).into_response();
        }
        Err(e) => return ApiError(e).into_response(),
    };
    let urls = match state.callback_urls(&host) {
        Ok(urls) => urls,
        Err(e) => return ApiError(e).into_response(),
    };

    let controller = state.controller.clone();
    tokio::spawn(async move {
        if let Err(e) = controller.place_outbound_call(number, &urls).await {
            error!("Outbound call failed: {}", e);
        }
    });
    ACK.into_response()
}

/// POST /results - analysis results pushed by the media processor
pub async fn results(body: String) -> &'static str {
    info!("Processor results: {}", body);
    ACK
}

/// POST /rtc - recording and transcription notifications
pub async fn rtc(body: String) -> &'static str {
    info!("RTC notification: {}", body);
    ACK
}

/// GET /_/health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, ACK)
}

/// GET /_/legs
pub async fn legs(State(state): State<AppState>) -> Json<RegistryStats> {
    Json(state.controller.registry().stats())
}
