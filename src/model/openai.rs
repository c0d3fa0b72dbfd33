// SPDX-License-Identifier: MIT

//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{ChatMessage, Model};
use crate::error::ModelError;

/// Generation parameters tuned for long structured output: the summarizer
/// emits a complete JSON document, so the token budget is deliberately high.
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 8192;

/// Chat-completions client for any OpenAI-compatible endpoint
pub struct OpenAiModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAiModel {
    pub fn new(api_key: String, base_url: String, model_name: String) -> Result<Self, ModelError> {
        if api_key.is_empty() {
            return Err(ModelError::ApiKeyMissing("openai".to_string()));
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }
}

#[async_trait]
impl Model for OpenAiModel {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.model_name,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        log::debug!(
            "Chat request to {}: {}",
            url,
            serde_json::to_string(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(ModelError::Api(text));
        }

        let resp_json: serde_json::Value = resp.json().await?;

        let content = resp_json["choices"]
            .as_array()
            .and_then(|c| c.first())
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or_else(|| ModelError::InvalidResponse("no choices in response".to_string()))?;

        Ok(content.to_string())
    }
}
