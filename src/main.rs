use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use recruitment_gateway::config::Config;
use recruitment_gateway::routes;
use recruitment_gateway::services::agent::GeminiAgent;
use recruitment_gateway::services::telemetry::TelemetryClient;
use recruitment_gateway::state::AppState;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Best-effort: a missing key or a broken client downgrades to logs only.
    let telemetry = TelemetryClient::init(config.agentops_api_key.as_deref());

    let agent = Arc::new(GeminiAgent::new(&config)?);
    let state = Arc::new(AppState::new(agent, telemetry, config.session_ttl));

    let purge_state = state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            tick.tick().await;
            let removed = purge_state.sessions.purge_expired().await;
            if removed > 0 {
                debug!(removed, "purged expired sessions");
            }
        }
    });

    let cors = routes::cors_layer(&config.cors_origins);
    let app = routes::create_router().with_state(state).layer(cors);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(model = %config.agent_model, "recruitment gateway listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
