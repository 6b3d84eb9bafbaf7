use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use confstream_leg_core::LegError;

/// A webhook that cannot be served
#[derive(Debug)]
pub struct ApiError(pub LegError);

impl From<LegError> for ApiError {
    fn from(error: LegError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            e if e.is_input_error() => StatusCode::BAD_REQUEST,
            LegError::Url(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!("Rejecting webhook with {}: {}", status, self.0);
        (status, self.0.to_string()).into_response()
    }
}
