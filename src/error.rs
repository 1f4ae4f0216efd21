use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::ErrorBody;

/// Outcomes the lookup pipeline can surface to a client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller did not supply an address to look up.
    #[error("IP is required")]
    MissingIp,

    /// Admission denied by the rate limiter.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// No record matches the requested address.
    #[error("IP not found")]
    NotFound,

    /// The backing record file could not be read.
    #[error("lookup unavailable: {0}")]
    LookupUnavailable(#[from] std::io::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingIp => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            // Read failures answer like a miss on the wire; remap here to
            // turn them into a 5xx instead.
            ApiError::NotFound | ApiError::LookupUnavailable(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::LookupUnavailable(_) => "IP not found".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
