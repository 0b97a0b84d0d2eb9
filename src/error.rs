// src/error.rs
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::agent::UpstreamError;
use crate::services::guardrails::GuardrailViolation;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Guardrail(#[from] GuardrailViolation),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short machine-readable label, used both in the error body and as the
    /// span outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Guardrail(_) => "guardrail_violation",
            AppError::Upstream(_) => "upstream",
            AppError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Guardrail(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(err) => match err {
                // The agent never answered: retriable from the caller's side.
                UpstreamError::Timeout | UpstreamError::Transport(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                // The agent answered, but unusably.
                UpstreamError::Status { .. } | UpstreamError::Malformed(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Guardrail(violation) => json!({
                "error": self.kind(),
                "reason": violation.reason_code(),
                "message": violation.to_string(),
            }),
            AppError::Internal(err) => {
                error!(error = %err, "unhandled error while serving request");
                // Generic message only; internals stay in the logs.
                json!({ "error": self.kind(), "message": "internal server error" })
            }
            other => json!({ "error": other.kind(), "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_timeout_maps_to_503() {
        let err = AppError::from(UpstreamError::Timeout);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn upstream_bad_status_maps_to_502() {
        let err = AppError::from(UpstreamError::Status { status: 500 });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn guardrail_violation_maps_to_400() {
        let err = AppError::from(GuardrailViolation::PromptInjection);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "guardrail_violation");
    }
}
