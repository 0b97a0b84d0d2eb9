// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use crate::services::agent::AgentRuntime;
use crate::services::session_manager::SessionManager;
use crate::services::telemetry::TelemetryClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub sessions: SessionManager,
    pub agent: Arc<dyn AgentRuntime>,
    pub telemetry: TelemetryClient,
}

impl AppState {
    pub fn new(
        agent: Arc<dyn AgentRuntime>,
        telemetry: TelemetryClient,
        session_ttl: Duration,
    ) -> Self {
        Self {
            sessions: SessionManager::new(session_ttl),
            agent,
            telemetry,
        }
    }
}
