use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use axum::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AiConfig;

/// A single-turn chat completion against the language model.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Cohere v2 chat API.
pub struct CohereClient {
    client: reqwest::Client,
    config: AiConfig,
}

impl CohereClient {
    pub fn new(config: AiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("build chat http client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatClient for CohereClient {
    async fn chat(&self, system: &str, user: &str) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
        };

        let response = self
            .client
            .post(self.config.base_url.as_str())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!(e).context(format!("chat request to {} failed", self.config.base_url)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("chat API returned {status}: {text}");
        }

        let parsed: ChatResponse = response.json().await.context("decode chat response")?;
        let text = parsed
            .message
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("chat response had no text content"))?;
        debug!(model = %self.config.model, chars = text.len(), "chat completed");
        Ok(text)
    }
}
