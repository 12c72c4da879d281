//! OpenAI backend
//!
//! First general-purpose fallback in the default chain. Standard
//! chat-completions API with bearer authentication.

use async_trait::async_trait;
use serde_json::json;

use super::azure::extract_chat_content;
use super::{
    triage_status, ChatMessage, InferenceBackend, InferenceError, ModalityConfig, ResponseFormat,
    Result,
};
use crate::config::OpenAiConfig;

pub struct OpenAiBackend {
    config: OpenAiConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiBackend {
    /// Create a backend against the configured model
    pub fn new(config: OpenAiConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl InferenceBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        modality: &ModalityConfig,
    ) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let api_messages: Vec<_> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content,
                })
            })
            .collect();

        let mut payload = json!({
            "model": self.config.model,
            "messages": api_messages,
            "temperature": modality.temperature,
        });
        if modality.response_format == ResponseFormat::JsonObject {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else {
                    InferenceError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(triage_status(status, &body));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| InferenceError::ParseError(e.to_string()))?;

        extract_chat_content(&data)
    }
}
