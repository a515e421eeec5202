//! Error taxonomy and HTTP status mapping.
//!
//! `AppError` is `Clone` so a single failed upstream fetch can be propagated
//! to every caller coalesced onto it.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::types::ApiResponse;

/// Application-level error surfaced by fetchers and route handlers.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Unknown beach id, detected before any cache or upstream work.
    #[error("beach not found: {0}")]
    NotFound(String),

    /// Reserved for the route layer; the rate limiter itself never rejects,
    /// it only delays callers.
    #[error("rate limited by upstream")]
    RateLimited,

    /// Upstream integration is known to be down.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Upstream fetch failure: network error or non-2xx status.
    #[error("upstream API error: {0}")]
    Api(String),
}

impl AppError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Api(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Api(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ApiResponse::<serde_json::Value>::failure(self.to_string()));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_taxonomy() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::ServiceUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Api("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
