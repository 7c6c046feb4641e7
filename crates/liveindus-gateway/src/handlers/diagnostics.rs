//! Probes for deployment checks: key presence and a handler that never calls the model.

use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use liveindus_core::{ChatRequest, ErrorBody};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyReport {
    api_key_exists: bool,
    api_key_length: usize,
    api_key_prefix: String,
    timestamp: String,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// GET /api/check-api: whether the provider key is set, its length and a short prefix.
pub async fn check_api(State(state): State<Arc<AppState>>) -> Json<ApiKeyReport> {
    let cred = &state.credential;
    Json(ApiKeyReport {
        api_key_exists: cred.exists,
        api_key_length: cred.length,
        api_key_prefix: cred.prefix.clone(),
        timestamp: now(),
    })
}

/// POST /api/test-chat: echoes the message back.
pub async fn test_chat(body: Bytes) -> Response {
    let request = match ChatRequest::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "[LIVEINDUS TEST] unparseable body");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Internal server error").with_message(e.to_string())),
            )
                .into_response();
        }
    };

    let Some(message) = request.message() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Message is required")),
        )
            .into_response();
    };

    Json(json!({
        "response": format!(
            "Test successful! You said: \"{}\". This function is working correctly.",
            message
        ),
        "timestamp": now(),
    }))
    .into_response()
}
