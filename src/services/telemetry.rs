// src/services/telemetry.rs
//
// Best-effort span shipping to the AgentOps ingest API. Telemetry failure
// of any kind degrades to log noise; it never fails a request.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

const INGEST_URL: &str = "https://api.agentops.ai/v2/create_events";
const INGEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct TelemetryClient {
    inner: Option<Inner>,
}

#[derive(Clone)]
struct Inner {
    client: Client,
    api_key: String,
    // One process-lifetime observability session, shared by all spans.
    session_id: String,
    endpoint: String,
}

/// One in-flight request span. Handed back to `finish_span` when the
/// pipeline completes, whatever the outcome.
pub struct RequestSpan {
    trace_id: String,
    operation: &'static str,
    started: Instant,
}

impl RequestSpan {
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }
}

#[derive(Serialize)]
struct SpanEvent {
    session_id: String,
    span_id: String,
    operation: String,
    outcome: String,
    duration_ms: u64,
}

impl TelemetryClient {
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn init(api_key: Option<&str>) -> Self {
        let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            info!("telemetry disabled: AGENTOPS_API_KEY not set");
            return Self::disabled();
        };

        match Client::builder().timeout(INGEST_TIMEOUT).build() {
            Ok(client) => {
                let session_id = Uuid::new_v4().to_string();
                info!(%session_id, "telemetry session started");
                Self {
                    inner: Some(Inner {
                        client,
                        api_key: key.to_string(),
                        session_id,
                        endpoint: INGEST_URL.to_string(),
                    }),
                }
            }
            Err(err) => {
                warn!(error = %err, "telemetry init failed, serving without tracing");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn start_span(&self, operation: &'static str) -> RequestSpan {
        RequestSpan {
            trace_id: Uuid::new_v4().to_string(),
            operation,
            started: Instant::now(),
        }
    }

    /// Ship the span in the background. Fire and forget: the request path
    /// never waits on the ingest endpoint.
    pub fn finish_span(&self, span: RequestSpan, outcome: &'static str) {
        let Some(inner) = self.inner.clone() else {
            return;
        };

        let event = SpanEvent {
            session_id: inner.session_id.clone(),
            span_id: span.trace_id,
            operation: span.operation.to_string(),
            outcome: outcome.to_string(),
            duration_ms: span.started.elapsed().as_millis() as u64,
        };

        tokio::spawn(async move {
            let result = inner
                .client
                .post(&inner.endpoint)
                .header("X-Agentops-Api-Key", &inner.api_key)
                .json(&event)
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    debug!(span_id = %event.span_id, "span shipped");
                }
                Ok(resp) => {
                    warn!(status = %resp.status(), "telemetry ingest rejected span");
                }
                Err(err) => {
                    warn!(error = %err, "failed to ship telemetry span");
                }
            }
        });
    }
}
