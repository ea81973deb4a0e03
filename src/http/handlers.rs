//! Route handlers.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::explain::{CodeRequest, ExplainError, ValidationError};
use crate::http::request::client_key;
use crate::http::server::AppState;
use crate::observability::metrics;

/// `POST /explain`
pub async fn explain(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    payload: Result<Json<CodeRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let client = client_key(&peer);
    tracing::Span::current().record("client", client.as_str());

    let result = match payload {
        Ok(Json(request)) => state.service.handle(&client, request).await,
        Err(rejection) => Err(reject_body(rejection, state.max_body_bytes)),
    };

    match result {
        Ok(explanation) => {
            metrics::record_request("ok", 200, start);
            Json(explanation).into_response()
        }
        Err(e) => {
            metrics::record_request(e.outcome(), e.status_code().as_u16(), start);
            e.into_response()
        }
    }
}

/// `GET /`
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn reject_body(rejection: JsonRejection, limit: usize) -> ExplainError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::info!(limit, "Request body too large");
        return ExplainError::PayloadTooLarge { limit };
    }
    tracing::info!(error = %rejection.body_text(), "Malformed request body");
    ValidationError::MalformedBody(rejection.body_text()).into()
}
