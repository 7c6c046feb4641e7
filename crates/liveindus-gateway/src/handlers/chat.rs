//! Chat relay: one handler for every prompt strategy.
//!
//! `POST /api/chat` uses the configured strategy, `POST /api/chat/:strategy` picks one
//! explicitly. Failures never escape as panics or bare 500s; the strategy's failure policy
//! decides what the caller sees. Message and prompt text are never logged.

use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use liveindus_core::{
    assemble, ChatReply, ChatRequest, ErrorBody, FailureContext, PromptStrategy, RelayError,
    Resolution,
};
use std::sync::Arc;

pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let strategy = state.config.prompt_strategy;
    respond(&state, strategy, &body).await
}

pub async fn chat_with_strategy(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    match name.parse::<PromptStrategy>() {
        Ok(strategy) => respond(&state, strategy, &body).await,
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("Unknown prompt strategy")),
        )
            .into_response(),
    }
}

async fn respond(state: &AppState, strategy: PromptStrategy, body: &[u8]) -> Response {
    let mut ctx = FailureContext {
        history_len: None,
        debug_errors: state.config.debug_errors,
    };

    match relay(state, strategy, body, &mut ctx).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(err) => {
            match &err {
                RelayError::Provider(e) => tracing::warn!(
                    strategy = %strategy,
                    kind = e.kind.as_str(),
                    "[LIVEINDUS CHAT] provider call failed"
                ),
                other => tracing::warn!(
                    strategy = %strategy,
                    error = %other,
                    "[LIVEINDUS CHAT] request not relayed"
                ),
            }
            into_response(strategy.resolve_failure(&err, &ctx))
        }
    }
}

/// Parse, classify, assemble and call the model. `ctx` picks up the history length as soon
/// as the body is parsed so the failure policy can tell a greeting from a continuation.
async fn relay(
    state: &AppState,
    strategy: PromptStrategy,
    body: &[u8],
    ctx: &mut FailureContext,
) -> Result<ChatReply, RelayError> {
    if strategy.checks_credential_first() && state.model.is_none() {
        return Err(missing_credential(state));
    }

    let request = ChatRequest::from_slice(body)?;
    ctx.history_len = Some(request.history().len());

    let message = match request.message() {
        Some(m) => m,
        None if strategy.requires_message() => return Err(RelayError::MissingMessage),
        None => "",
    };

    let model = state
        .model
        .as_ref()
        .ok_or_else(|| missing_credential(state))?;

    let prompt = assemble(strategy, request.history(), message);
    match &prompt.decision {
        Some(decision) => tracing::info!(
            strategy = %strategy,
            phase = %decision.phase,
            user_turns = decision.signals.user_turns,
            history = request.history().len(),
            "[LIVEINDUS CHAT] phase selected"
        ),
        None => tracing::info!(
            strategy = %strategy,
            history = request.history().len(),
            "[LIVEINDUS CHAT] relaying"
        ),
    }

    let text = model.generate(&prompt.text).await?;
    tracing::debug!(
        model = model.model_name(),
        reply_chars = text.chars().count(),
        "[LIVEINDUS CHAT] model replied"
    );
    Ok(strategy.success(text, &request))
}

fn missing_credential(state: &AppState) -> RelayError {
    RelayError::MissingCredential {
        var: state.config.api_key_env.clone(),
    }
}

fn into_response(resolution: Resolution) -> Response {
    match resolution {
        Resolution::Reply(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Resolution::Reject { status, body } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
            .into_response(),
    }
}
