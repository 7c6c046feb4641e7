//! HTTP handlers: chat relay and the diagnostics probes.

pub mod chat;
pub mod diagnostics;

use axum::{http::StatusCode, response::IntoResponse, Json};
use liveindus_core::ErrorBody;

/// Method fallback for the POST-only routes.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new("Method not allowed")),
    )
}
