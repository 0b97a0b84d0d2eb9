// src/services/agent.rs
//
// Adapter around the external agent runtime (Google AI Studio
// `generateContent` endpoint). The gateway owns no generation logic; it
// marshals the conversation into the wire format, retries transient
// failures, and pulls the reply text back out.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::services::session_manager::{Message, MessageRole};

const GOOGLE_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Replayed turns are capped so long sessions don't grow the prompt without
/// bound.
const HISTORY_LIMIT: usize = 20;

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("agent request timed out")]
    Timeout,
    #[error("agent unreachable: {0}")]
    Transport(String),
    #[error("agent returned HTTP {status}")]
    Status { status: u16 },
    #[error("agent returned a malformed response: {0}")]
    Malformed(String),
}

impl UpstreamError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Timeout | UpstreamError::Transport(_) => true,
            UpstreamError::Status { status } => matches!(status, 429 | 500 | 503 | 504),
            UpstreamError::Malformed(_) => false,
        }
    }
}

/// Seam between the gateway and the external agent runtime. Handlers only
/// see this trait; tests substitute stubs.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Generate a reply to `message` given the prior session turns.
    async fn generate(&self, history: &[Message], message: &str) -> Result<String, UpstreamError>;
}

pub struct GeminiAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
}

impl GeminiAgent {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.agent_timeout)
            .build()
            .context("failed to build agent HTTP client")?;

        Ok(Self {
            client,
            api_key: config.google_api_key.clone(),
            model: config.agent_model.clone(),
            base_url: GOOGLE_AI_BASE_URL.to_string(),
            max_retries: config.agent_max_retries,
        })
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    fn build_request(history: &[Message], message: &str) -> GenerateRequest {
        let recent = if history.len() > HISTORY_LIMIT {
            &history[history.len() - HISTORY_LIMIT..]
        } else {
            history
        };

        let mut contents: Vec<WireContent> = recent
            .iter()
            .map(|m| WireContent {
                role: match m.role {
                    MessageRole::User => "user".to_string(),
                    MessageRole::Agent => "model".to_string(),
                },
                parts: vec![WirePart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        contents.push(WireContent {
            role: "user".to_string(),
            parts: vec![WirePart {
                text: message.to_string(),
            }],
        });

        GenerateRequest { contents }
    }

    async fn attempt(&self, body: &GenerateRequest) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(self.endpoint_url())
            .json(body)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        extract_reply(parsed)
    }
}

#[async_trait]
impl AgentRuntime for GeminiAgent {
    async fn generate(&self, history: &[Message], message: &str) -> Result<String, UpstreamError> {
        let body = Self::build_request(history, message);
        let mut delay = INITIAL_RETRY_DELAY;
        let mut attempt = 0u32;

        loop {
            match self.attempt(&body).await {
                Ok(reply) => {
                    debug!(model = %self.model, attempt, "agent reply received");
                    return Ok(reply);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %err, "agent call failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// Wire types for generativelanguage.googleapis.com.

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<WireContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<WireContent>,
}

fn extract_reply(response: GenerateResponse) -> Result<String, UpstreamError> {
    let reply = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if reply.trim().is_empty() {
        return Err(UpstreamError::Malformed(
            "no text candidates in response".to_string(),
        ));
    }
    Ok(reply)
}
