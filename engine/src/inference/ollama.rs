//! Ollama backend
//!
//! Last-resort fallback that runs a model locally, typically at
//! http://localhost:11434. No API key required. Structured output is
//! requested through Ollama's `format` field.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    ChatMessage, InferenceBackend, InferenceError, ModalityConfig, ResponseFormat, Result,
};
use crate::config::OllamaConfig;

pub struct OllamaBackend {
    config: OllamaConfig,
    client: Client,
}

impl OllamaBackend {
    /// Create a backend against a local Ollama instance
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn convert_messages(&self, messages: &[ChatMessage]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|msg| OllamaMessage {
                role: msg.role.to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        modality: &ModalityConfig,
    ) -> Result<String> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            messages: self.convert_messages(messages),
            stream: false,
            format: match modality.response_format {
                ResponseFormat::JsonObject => Some("json".to_string()),
                ResponseFormat::Text => None,
            },
            options: OllamaOptions {
                temperature: modality.temperature,
            },
        };

        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout
            } else if e.is_connect() {
                InferenceError::Unavailable(format!(
                    "Cannot connect to Ollama at {}. Is Ollama running?",
                    self.config.base_url
                ))
            } else {
                InferenceError::NetworkError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Unavailable(format!(
                "Ollama API error ({status}): {body}"
            )));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::ParseError(format!("Failed to parse Ollama response: {e}")))?;

        let content = ollama_response.message.content;
        if content.trim().is_empty() {
            return Err(InferenceError::ParseError("Empty content".to_string()));
        }

        Ok(content)
    }
}

/// Ollama API request format
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

/// Ollama API response format
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[allow(dead_code)]
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_properties() {
        let backend = OllamaBackend::new(OllamaConfig::default());
        assert_eq!(backend.name(), "ollama");
        assert!(backend.is_local());
    }

    #[test]
    fn test_message_conversion() {
        let backend = OllamaBackend::new(OllamaConfig::default());
        let messages = vec![
            ChatMessage::system("You are an interviewer"),
            ChatMessage::user("Hello"),
            ChatMessage::assistant("Hi there"),
        ];

        let converted = backend.convert_messages(&messages);
        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
        assert_eq!(converted[2].role, "assistant");
    }

    #[test]
    fn test_structured_request_sets_json_format() {
        let backend = OllamaBackend::new(OllamaConfig::default());
        let request = OllamaRequest {
            model: backend.config.model.clone(),
            messages: vec![],
            stream: false,
            format: Some("json".to_string()),
            options: OllamaOptions { temperature: 0.3 },
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
    }
}
