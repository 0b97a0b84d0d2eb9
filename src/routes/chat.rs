// src/routes/chat.rs
use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse, HealthResponse},
    services::{guardrails, session_manager::MessageRole},
    state::SharedState,
};

pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let span = state.telemetry.start_span("chat");
    let trace_id = state
        .telemetry
        .is_enabled()
        .then(|| span.trace_id().to_string());

    let result = process_chat(&state, payload).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(err) => err.kind(),
    };
    state.telemetry.finish_span(span, outcome);

    result.map(|mut response| {
        response.trace_id = trace_id;
        Json(response)
    })
}

/// The whole pipeline for one message: validate, input rails, agent call,
/// output rails. Split out of the handler so the span always records the
/// outcome, success or not.
async fn process_chat(
    state: &SharedState,
    payload: ChatRequest,
) -> Result<ChatResponse, AppError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    // Input rails run before anything touches the agent runtime.
    guardrails::check_input(message)?;

    let session_id = match payload.session_id.as_deref() {
        Some(id) if !id.trim().is_empty() => {
            state.sessions.ensure_session(id).await;
            id.to_string()
        }
        _ => state.sessions.create_session().await,
    };

    let user_id = payload.user_id.as_deref().unwrap_or("default_user");
    debug!(%session_id, user = %user_id, "dispatching message to agent");

    let history = state
        .sessions
        .get_history(&session_id)
        .await
        .unwrap_or_default();

    let raw_reply = state.agent.generate(&history, message).await?;

    let reply = guardrails::mask_pii(&raw_reply);
    let masked = reply != raw_reply;
    if masked {
        info!(%session_id, "masked PII in agent reply");
    }

    // History is only updated after a successful round trip, so a failed
    // agent call is not replayed as context next time.
    state
        .sessions
        .append_message(&session_id, MessageRole::User, message)
        .await;
    state
        .sessions
        .append_message(&session_id, MessageRole::Agent, reply.as_str())
        .await;

    Ok(ChatResponse {
        session_id,
        reply,
        masked,
        trace_id: None,
    })
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": "recruitment-gateway",
        "docs": "/docs",
        "health": "/health",
    }))
}

/// Static API descriptor. There is no framework-generated doc page here,
/// so the surface is spelled out by hand.
pub async fn docs_handler() -> Json<Value> {
    Json(json!({
        "service": "recruitment-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /chat": {
                "request": { "message": "string (required, non-empty)", "session_id": "string (optional)", "user_id": "string (optional)" },
                "response": { "session_id": "string", "reply": "string", "masked": "bool", "trace_id": "string (when telemetry is enabled)" },
                "errors": {
                    "400": "validation failure or guardrail violation (body carries a reason code)",
                    "502": "agent runtime returned an unusable response",
                    "503": "agent runtime unreachable or timed out",
                },
            },
            "GET /health": { "response": { "status": "ok", "guardrails_enabled": "bool", "version": "string" } },
            "GET /docs": "this document",
        },
    }))
}
