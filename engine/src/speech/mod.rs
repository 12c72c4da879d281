//! Speech Layer
//!
//! Voice is the medium of the interview: the candidate's answers arrive
//! as audio and the system's questions leave as audio. This module
//! defines the transcription and synthesis contracts plus the Deepgram
//! implementations of both. The orchestrator treats synthesis as
//! best-effort; transcription failures turn into a re-ask rather than an
//! aborted turn.

use async_trait::async_trait;

pub mod deepgram;

pub use deepgram::{DeepgramSynthesizer, DeepgramTranscriber};

/// Result type for speech operations
pub type Result<T> = std::result::Result<T, SpeechError>;

/// Errors that can occur during transcription or synthesis
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result of transcribing one audio payload
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    /// Recognized text; empty when the payload carried no usable speech
    pub text: String,

    /// Language the provider detected, when reported
    pub detected_language: Option<String>,
}

impl Transcription {
    /// A transcription carrying no usable speech
    pub fn silence() -> Self {
        Self {
            text: String::new(),
            detected_language: None,
        }
    }

    /// True when no usable speech was recognized
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Speech-to-text contract
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one complete audio payload
    ///
    /// Returns `Transcription::silence()` for payloads too small to carry
    /// speech; an empty transcript is not an error.
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcription>;
}

/// Text-to-speech contract
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render text to audio in the configured voice
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_empty() {
        assert!(Transcription::silence().is_empty());
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let t = Transcription {
            text: "   ".to_string(),
            detected_language: Some("en".to_string()),
        };
        assert!(t.is_empty());
    }

    #[test]
    fn test_real_text_is_not_empty() {
        let t = Transcription {
            text: "I led the migration".to_string(),
            detected_language: Some("en".to_string()),
        };
        assert!(!t.is_empty());
    }
}
