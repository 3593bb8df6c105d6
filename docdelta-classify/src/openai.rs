//! [`ChangeReviewer`] over an OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::reviewer::{parse_labeled, ChangeReviewer, ModelJudgment, ReviewRequest};
use crate::ReviewError;

const SYSTEM_PROMPT: &str = "You are a contract review assistant at a leasing company. \
    You compare a client's edits against the company's reference contract, explain their \
    consequences and route them to the departments that must approve them.";

/// Connection settings for the model service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub connect_timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            api_key_env: "OPENAI_API_KEY".to_string(),
            connect_timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiReviewer {
    client: Client,
    config: ModelConfig,
    api_key: String,
}

impl OpenAiReviewer {
    pub fn new(config: ModelConfig, api_key: impl Into<String>) -> Result<Self, ReviewError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChangeReviewer for OpenAiReviewer {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn review(&self, request: &ReviewRequest) -> Result<ModelJudgment, ReviewError> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": request.prompt() },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ReviewError::RateLimited);
        }
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_chars(&mut body, 200);
            return Err(ReviewError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ChatResponse = response.json().await?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ReviewError::Malformed("response has no message content".to_string()))?;

        debug!(model = %self.config.model, chars = content.len(), "model answered");
        parse_labeled(&content)
    }
}

fn truncate_chars(text: &mut String, max: usize) {
    if let Some((at, _)) = text.char_indices().nth(max) {
        text.truncate(at);
    }
}
