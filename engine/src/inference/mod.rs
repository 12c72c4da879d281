//! Inference Backend Abstraction Layer
//!
//! This module provides a common interface for the language-inference
//! backends the engine can call (Azure OpenAI, OpenAI, Ollama). The
//! `InferenceBackend` trait defines the contract every backend implements,
//! so the fallback chain can move across backends transparently. A backend
//! call carries a `ModalityConfig` describing the output mode it expects;
//! a backend that rejects the requested mode fails with
//! `InferenceError::ModalityMismatch`, which the chain answers with one
//! corrected retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod azure;
pub mod chain;
pub mod ollama;
pub mod openai;

/// Result type for inference operations
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Errors that can occur during inference calls
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Modality mismatch: {0}")]
    ModalityMismatch(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("All backends in the chain failed")]
    ChainExhausted,
}

impl InferenceError {
    /// Whether retrying elsewhere could plausibly succeed
    ///
    /// `ModalityMismatch` is handled separately (same backend, corrected
    /// parameters) and is deliberately not retryable here.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::RateLimited | Self::NetworkError(_) | Self::Timeout
        )
    }
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: Role,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,

    /// Assistant message
    Assistant,

    /// System message
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Output mode requested from a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Plain prose
    Text,

    /// A single JSON object (structured scoring)
    JsonObject,
}

/// Modality parameters for one inference call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModalityConfig {
    /// Requested output mode
    pub response_format: ResponseFormat,

    /// Sampling temperature
    pub temperature: f64,
}

impl ModalityConfig {
    /// Conversational configuration: prose output, warmer sampling
    pub fn text() -> Self {
        Self {
            response_format: ResponseFormat::Text,
            temperature: 0.7,
        }
    }

    /// Scoring configuration: structured output, cooler sampling
    pub fn structured() -> Self {
        Self {
            response_format: ResponseFormat::JsonObject,
            temperature: 0.3,
        }
    }

    /// The corrected configuration used for the single same-backend retry
    /// after a modality mismatch: the output mode is flipped, sampling is
    /// preserved
    pub fn corrected(self) -> Self {
        let response_format = match self.response_format {
            ResponseFormat::Text => ResponseFormat::JsonObject,
            ResponseFormat::JsonObject => ResponseFormat::Text,
        };
        Self {
            response_format,
            ..self
        }
    }
}

/// Inference backend trait that all backends must implement
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Returns the name of the backend (e.g., "azure", "openai", "ollama")
    fn name(&self) -> &str;

    /// Returns true for backends running on the local machine, which get a
    /// longer per-call timeout (model loading)
    fn is_local(&self) -> bool;

    /// Run one completion call
    ///
    /// # Arguments
    /// * `messages` - Conversation history including system prompt
    /// * `modality` - Requested output mode and sampling parameters
    ///
    /// # Returns
    /// * `Ok(String)` - Raw completion text (callers parse or sanitize it)
    /// * `Err(InferenceError)` - Typed failure; `ModalityMismatch` when the
    ///   backend rejects the requested output mode
    async fn complete(&self, messages: &[ChatMessage], modality: &ModalityConfig)
        -> Result<String>;
}

/// Map an HTTP error status plus body onto a typed inference error
///
/// Shared by the cloud backends: 401/403 is authentication, 429 is rate
/// limiting, a 400 whose body names the response format is a modality
/// mismatch, 5xx is unavailability.
pub(crate) fn triage_status(status: reqwest::StatusCode, body: &str) -> InferenceError {
    match status.as_u16() {
        401 | 403 => InferenceError::AuthenticationFailed(body.to_string()),
        429 => InferenceError::RateLimited,
        400 if is_modality_complaint(body) => InferenceError::ModalityMismatch(body.to_string()),
        400..=499 => InferenceError::InvalidRequest(body.to_string()),
        _ => InferenceError::Unavailable(format!("{status}: {body}")),
    }
}

/// Whether an error body complains about the requested output mode
fn is_modality_complaint(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("response_format") || lower.contains("modality") || lower.contains("json mode")
}
