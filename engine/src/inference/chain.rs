//! Backend fallback chain
//!
//! An ordered list of inference backends tried in sequence: the first
//! entry is the session's preferred backend, the rest are general-purpose
//! fallbacks in fixed priority order. Advancement is sticky and forward
//! only: once a backend has failed for a session, the chain never returns
//! to it. Callers hold the sticky position (`SessionState` owns
//! `active_backend_index`) and pass it to `execute`; the index that comes
//! back in the reply is the new sticky position.
//!
//! Per attempt, a modality mismatch earns exactly one retry against the
//! same backend with corrected modality parameters before the chain
//! advances.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::azure::AzureOpenAiBackend;
use super::ollama::OllamaBackend;
use super::openai::OpenAiBackend;
use super::{ChatMessage, InferenceBackend, InferenceError, ModalityConfig, Result};
use crate::config::Config;

/// Successful chain call
#[derive(Debug, Clone)]
pub struct ChainReply {
    /// Raw completion text from the backend
    pub content: String,

    /// Index of the backend that produced it; the caller's new sticky
    /// position
    pub backend_index: usize,

    /// Name of that backend, for logging and audit
    pub backend_name: String,
}

/// Ordered fallback chain over inference backends
pub struct FallbackChain {
    backends: Vec<Arc<dyn InferenceBackend>>,
    call_timeout: Duration,
    local_call_timeout: Duration,
}

impl FallbackChain {
    /// Create a chain over the given backends, first entry preferred
    pub fn new(
        backends: Vec<Arc<dyn InferenceBackend>>,
        call_timeout: Duration,
        local_call_timeout: Duration,
    ) -> Self {
        Self {
            backends,
            call_timeout,
            local_call_timeout,
        }
    }

    /// Build the chain named by the configuration
    ///
    /// Chain entries are instantiated in configured order. API keys are
    /// supplied by the caller; config validation has already rejected
    /// unknown backend names, so any stragglers are skipped with a warning
    /// rather than an error.
    pub fn from_config(config: &Config, azure_api_key: &str, openai_api_key: &str) -> Self {
        let mut backends: Vec<Arc<dyn InferenceBackend>> = Vec::new();
        for name in &config.inference.chain {
            match name.as_str() {
                "azure" => backends.push(Arc::new(AzureOpenAiBackend::new(
                    config.inference.azure.clone(),
                    azure_api_key,
                ))),
                "openai" => backends.push(Arc::new(OpenAiBackend::new(
                    config.inference.openai.clone(),
                    openai_api_key,
                ))),
                "ollama" => backends.push(Arc::new(OllamaBackend::new(
                    config.inference.ollama.clone(),
                ))),
                other => warn!(backend = other, "skipping unknown backend in chain"),
            }
        }

        Self::new(
            backends,
            Duration::from_secs(config.session.call_timeout_secs),
            Duration::from_secs(config.session.local_call_timeout_secs),
        )
    }

    /// Number of backends in the chain
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// True when no backends are configured
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Execute a call starting at the given chain position
    ///
    /// Walks forward from `start_index`, applying per-attempt timeouts and
    /// the single modality-corrected retry, until a backend succeeds or
    /// the chain is exhausted. Never retries a backend earlier than
    /// `start_index`.
    pub async fn execute(
        &self,
        start_index: usize,
        messages: &[ChatMessage],
        modality: &ModalityConfig,
    ) -> Result<ChainReply> {
        if self.backends.is_empty() {
            return Err(InferenceError::Unavailable(
                "No inference backends configured".to_string(),
            ));
        }

        let mut index = start_index;
        while index < self.backends.len() {
            let backend = &self.backends[index];

            match self.attempt(backend.as_ref(), messages, modality).await {
                Ok(content) => {
                    info!(backend = backend.name(), index, "backend succeeded");
                    return Ok(ChainReply {
                        content,
                        backend_index: index,
                        backend_name: backend.name().to_string(),
                    });
                }
                Err(InferenceError::ModalityMismatch(reason)) => {
                    debug!(
                        backend = backend.name(),
                        reason, "modality mismatch, retrying with corrected parameters"
                    );
                    let corrected = modality.corrected();
                    match self.attempt(backend.as_ref(), messages, &corrected).await {
                        Ok(content) => {
                            info!(
                                backend = backend.name(),
                                index, "backend succeeded after modality correction"
                            );
                            return Ok(ChainReply {
                                content,
                                backend_index: index,
                                backend_name: backend.name().to_string(),
                            });
                        }
                        Err(e) => {
                            warn!(
                                backend = backend.name(),
                                error = %e,
                                "corrected retry failed, advancing chain"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "backend failed, advancing chain");
                }
            }

            index += 1;
        }

        warn!("all inference backends exhausted");
        Err(InferenceError::ChainExhausted)
    }

    /// One timed attempt against one backend
    async fn attempt(
        &self,
        backend: &dyn InferenceBackend,
        messages: &[ChatMessage],
        modality: &ModalityConfig,
    ) -> Result<String> {
        let timeout = if backend.is_local() {
            self.local_call_timeout
        } else {
            self.call_timeout
        };

        match tokio::time::timeout(timeout, backend.complete(messages, modality)).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout),
        }
    }
}
