//! Mapping of pipeline errors onto HTTP responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::explain::ExplainError;

/// `{"detail": "..."}`, the body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ExplainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExplainError::Validation(_) => StatusCode::BAD_REQUEST,
            ExplainError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ExplainError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ExplainError::Invocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metrics label.
    pub fn outcome(&self) -> &'static str {
        match self {
            ExplainError::Validation(_) | ExplainError::PayloadTooLarge { .. } => "invalid",
            ExplainError::RateLimited { .. } => "rate_limited",
            ExplainError::Invocation(_) => "backend_failure",
        }
    }
}

impl IntoResponse for ExplainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Invocation errors display the generic message only.
        let body = Json(ErrorBody {
            detail: self.to_string(),
        });

        match self {
            ExplainError::RateLimited { retry_after, .. } => {
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                let mut response = (status, body).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
                response
            }
            _ => (status, body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::ValidationError;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ExplainError::from(ValidationError::EmptyCode).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ExplainError::PayloadTooLarge { limit: 10 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after_rounded_up() {
        let response = ExplainError::RateLimited {
            retry_after: Duration::from_millis(41_200),
            limit: "10 per 1 minute".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
