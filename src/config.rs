// src/config.rs
use std::env;
use std::time::Duration;

use anyhow::{Context, bail};

/// Runtime configuration, loaded once at startup from the environment.
///
/// Retry and timeout defaults are ours; the upstream agent API does not
/// prescribe any.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub google_api_key: String,
    pub agentops_api_key: Option<String>,
    pub agent_model: String,
    pub agent_timeout: Duration,
    pub agent_max_retries: u32,
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let google_api_key = match env::var("GOOGLE_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => bail!("GOOGLE_API_KEY must be set"),
        };

        let port = env_or("PORT", "8080")
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let agent_timeout_secs = env_or("AGENT_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .context("AGENT_TIMEOUT_SECS must be a number of seconds")?;

        let agent_max_retries = env_or("AGENT_MAX_RETRIES", "3")
            .parse::<u32>()
            .context("AGENT_MAX_RETRIES must be a number")?;

        let session_ttl_secs = env_or("SESSION_TTL_SECS", "3600")
            .parse::<u64>()
            .context("SESSION_TTL_SECS must be a number of seconds")?;

        let cors_origins = env_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port,
            cors_origins,
            google_api_key,
            agentops_api_key: env::var("AGENTOPS_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            agent_model: env_or("AGENT_MODEL", "gemini-1.5-flash"),
            agent_timeout: Duration::from_secs(agent_timeout_secs),
            agent_max_retries,
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
