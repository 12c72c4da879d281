//! Azure OpenAI backend
//!
//! Calls a chat-completions deployment on an Azure OpenAI resource. Azure
//! addresses deployments by name with an api-version query parameter and
//! authenticates with an `api-key` header rather than a bearer token.

use async_trait::async_trait;
use serde_json::json;

use super::{
    triage_status, ChatMessage, InferenceBackend, InferenceError, ModalityConfig, ResponseFormat,
    Result,
};
use crate::config::AzureConfig;

/// Token cap for a single conversational reply
const MAX_COMPLETION_TOKENS: u32 = 300;

pub struct AzureOpenAiBackend {
    config: AzureConfig,
    api_key: String,
    client: reqwest::Client,
}

impl AzureOpenAiBackend {
    /// Create a backend against the configured deployment
    ///
    /// The API key is supplied by the embedding application; it is never
    /// read from config.
    pub fn new(config: AzureConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl InferenceBackend for AzureOpenAiBackend {
    fn name(&self) -> &str {
        "azure"
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
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
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
            "messages": api_messages,
            "temperature": modality.temperature,
            "max_tokens": MAX_COMPLETION_TOKENS,
        });
        if modality.response_format == ResponseFormat::JsonObject {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else if e.is_connect() {
                    InferenceError::Unavailable(format!(
                        "Cannot connect to Azure endpoint {}",
                        self.config.endpoint
                    ))
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

/// Pull the first choice's message content out of a chat-completions body
///
/// Shared with the OpenAI backend, which returns the same shape.
pub(super) fn extract_chat_content(data: &serde_json::Value) -> Result<String> {
    let choice = data
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| InferenceError::ParseError("No choices in response".to_string()))?;

    let content = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| InferenceError::ParseError("Empty content".to_string()))?;

    if content.trim().is_empty() {
        return Err(InferenceError::ParseError("Empty content".to_string()));
    }

    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_properties() {
        let backend = AzureOpenAiBackend::new(AzureConfig::default(), "key");
        assert_eq!(backend.name(), "azure");
        assert!(!backend.is_local());
    }

    #[test]
    fn test_extract_chat_content() {
        let data = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
        });
        assert_eq!(extract_chat_content(&data).unwrap(), "hello");
    }

    #[test]
    fn test_extract_rejects_missing_choices() {
        let data = serde_json::json!({ "choices": [] });
        assert!(matches!(
            extract_chat_content(&data),
            Err(InferenceError::ParseError(_))
        ));
    }

    #[test]
    fn test_extract_rejects_blank_content() {
        let data = serde_json::json!({
            "choices": [{ "message": { "content": "   " } }]
        });
        assert!(matches!(
            extract_chat_content(&data),
            Err(InferenceError::ParseError(_))
        ));
    }
}
