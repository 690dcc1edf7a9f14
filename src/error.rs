use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstimatorError {
    /// Rejected before any lookup is attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Weather or geocoding call failed, or the geocoder had no match (`not_found`).
    #[error("lookup failed: {message}")]
    LookupFailure { message: String, not_found: bool },

    /// Panel count, capacity, cloud cover and temperature are not all known yet.
    #[error("estimate not ready")]
    NotReady,
}

impl EstimatorError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn lookup(message: impl Into<String>) -> Self {
        Self::LookupFailure { message: message.into(), not_found: false }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::LookupFailure { message: message.into(), not_found: true }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::LookupFailure { not_found: true, .. })
    }
}

impl From<reqwest::Error> for EstimatorError {
    fn from(e: reqwest::Error) -> Self {
        Self::lookup(e.to_string())
    }
}

impl IntoResponse for EstimatorError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::LookupFailure { not_found: true, .. } => StatusCode::NOT_FOUND,
            Self::LookupFailure { not_found: false, .. } => StatusCode::BAD_GATEWAY,
            Self::NotReady => return StatusCode::NO_CONTENT.into_response(),
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(EstimatorError::invalid("area").into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(EstimatorError::lookup("timeout").into_response().status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            EstimatorError::not_found("no match for Atlantis").into_response().status(),
            StatusCode::NOT_FOUND,
        );
        // upstream text mentioning "not found" is still a gateway failure
        assert_eq!(
            EstimatorError::lookup("upstream: 404 page not found").into_response().status(),
            StatusCode::BAD_GATEWAY,
        );
        assert_eq!(EstimatorError::NotReady.into_response().status(), StatusCode::NO_CONTENT);
    }
}
