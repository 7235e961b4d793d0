use std::sync::Arc;

use anyhow::{anyhow, Context};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error, instrument, warn};

use super::{
    client::ChatClient,
    prompts::{detection_prompt, PromptError, ReviewMode, Task, DETECTION_SYSTEM_PROMPT},
};
use crate::error::AppError;

/// Successful model answer for one task.
#[derive(Debug, Clone)]
pub struct AiOutcome {
    pub text: String,
    pub language: String,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("{error}: {details}")]
    Upstream { error: &'static str, details: String },
}

impl From<AiError> for AppError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::Prompt(p) => AppError::validation(p.to_string()),
            AiError::Upstream { error, details } => AppError::Upstream {
                error: error.to_string(),
                details,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DetectedLanguage {
    pub language: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub details: String,
}

/// Contents of the first ```json fenced block in a model reply.
pub fn extract_json_block(raw: &str) -> Option<&str> {
    lazy_static! {
        static ref JSON_BLOCK_RE: Regex = Regex::new(r"```json\s*([\s\S]*?)```").unwrap();
    }
    JSON_BLOCK_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Code-understanding tasks delegated to the chat model.
pub struct AiService {
    client: Arc<dyn ChatClient>,
}

impl AiService {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    pub async fn review_code(&self, code: &str, mode: ReviewMode) -> Result<AiOutcome, AiError> {
        self.run(Task::Review, code, mode).await
    }

    pub async fn suggest_fixes(&self, code: &str) -> Result<AiOutcome, AiError> {
        self.run(Task::Fixes, code, ReviewMode::Auto).await
    }

    pub async fn generate_documentation(
        &self,
        code: &str,
        mode: ReviewMode,
    ) -> Result<AiOutcome, AiError> {
        self.run(Task::Documentation, code, mode).await
    }

    pub async fn analyze_complexity(&self, code: &str) -> Result<AiOutcome, AiError> {
        self.run(Task::Complexity, code, ReviewMode::Auto).await
    }

    #[instrument(skip(self, code), fields(chars = code.len()))]
    async fn run(&self, task: Task, code: &str, mode: ReviewMode) -> Result<AiOutcome, AiError> {
        let template = task.template(mode, code)?;

        let language = match self.detect_language(code).await {
            Ok(detected) => detected.language,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "language detection failed");
                String::new()
            }
        };
        debug!(%template, %language, "prompt selected");

        let system = task.system_prompt(&language);
        let prompt = task.user_prompt(template, &language, code);
        match self.client.chat(&system, &prompt).await {
            Ok(text) => Ok(AiOutcome {
                text,
                language,
                timestamp: OffsetDateTime::now_utc(),
            }),
            Err(e) => {
                error!(error = %format!("{e:#}"), "chat request failed");
                Err(AiError::Upstream {
                    error: task.failure_message(),
                    details: format!("{e:#}"),
                })
            }
        }
    }

    /// Ask the model which language `code` is written in.
    pub async fn detect_language(&self, code: &str) -> anyhow::Result<DetectedLanguage> {
        let reply = self
            .client
            .chat(DETECTION_SYSTEM_PROMPT, &detection_prompt(code))
            .await?;
        let json = extract_json_block(&reply)
            .ok_or_else(|| anyhow!("could not extract JSON from detection reply"))?;
        let mut detected: DetectedLanguage =
            serde_json::from_str(json).context("parse detection JSON")?;
        if detected.language.eq_ignore_ascii_case("unknown") {
            detected.language.clear();
        }
        debug!(
            language = %detected.language,
            confidence = detected.confidence,
            details = %detected.details,
            "language detected"
        );
        Ok(detected)
    }
}
