use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AskBackend;
use crate::error::AskError;
use crate::state::{Answer, HistoryEntry};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8001";

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
    conversation_history: &'a [HistoryEntry],
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub index_loaded: bool,
    #[serde(default)]
    pub qa_chain_ready: bool,
}

impl HealthStatus {
    pub fn is_ready(&self) -> bool {
        self.index_loaded && self.qa_chain_ready
    }
}

#[derive(Clone)]
pub struct AskClient {
    client: Client,
    base_url: String,
}

impl AskClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn ask(&self, question: &str, history: &[HistoryEntry]) -> Result<Answer, AskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let url = format!("{}/ask", self.base_url);
        let request = AskRequest {
            question,
            conversation_history: history,
        };
        debug!(%url, history_len = history.len(), "sending question");

        let transport = |source: reqwest::Error| AskError::Transport {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            // The reference server wraps failures as {"detail": "..."}
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);
            return Err(AskError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let answer: Answer =
            serde_json::from_str(&body).map_err(|e| AskError::MalformedBody(e.to_string()))?;
        debug!(sources = answer.sources.len(), "answer received");
        Ok(answer)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Health check failed: {}", response.status()));
        }

        let health: HealthStatus = response.json().await?;
        Ok(health)
    }
}

#[async_trait]
impl AskBackend for AskClient {
    async fn ask(&self, question: &str, history: &[HistoryEntry]) -> Result<Answer, AskError> {
        AskClient::ask(self, question, history).await
    }
}
