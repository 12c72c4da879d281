//! Deepgram speech backends
//!
//! One HTTP client for both directions: prerecorded transcription via
//! `/v1/listen` and speech synthesis via `/v1/speak`. Authentication is a
//! `Token` authorization header; the key is supplied by the embedding
//! application, never read from config.

use async_trait::async_trait;
use reqwest::Client;

use super::{Result, SpeechError, SpeechSynthesizer, Transcriber, Transcription};
use crate::config::SpeechConfig;

/// Deepgram prerecorded speech-to-text
pub struct DeepgramTranscriber {
    config: SpeechConfig,
    api_key: String,
    client: Client,
}

impl DeepgramTranscriber {
    pub fn new(config: SpeechConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcription> {
        // Payloads below the threshold are treated as silence without a
        // provider round trip. Browsers emit tiny container headers even
        // when the microphone captured nothing.
        if audio.len() < self.config.min_audio_bytes {
            tracing::debug!(bytes = audio.len(), "audio payload below silence threshold");
            return Ok(Transcription::silence());
        }

        let url = format!(
            "{}/v1/listen?model={}&smart_format=true&punctuate=true&detect_language=true",
            self.config.base_url.trim_end_matches('/'),
            self.config.stt_model
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => SpeechError::Authentication(body),
                400..=499 => SpeechError::InvalidRequest(body),
                _ => SpeechError::Network(format!("{status}: {body}")),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SpeechError::Parse(e.to_string()))?;

        Ok(extract_transcription(&data))
    }
}

/// Pull the first alternative's transcript out of a listen response
///
/// A response with no alternatives or a blank transcript is silence, not
/// an error.
fn extract_transcription(data: &serde_json::Value) -> Transcription {
    let channel = &data["results"]["channels"][0];

    let text = channel["alternatives"][0]["transcript"]
        .as_str()
        .unwrap_or("")
        .trim()
        .to_string();

    let detected_language = channel["detected_language"]
        .as_str()
        .map(|s| s.to_string());

    Transcription {
        text,
        detected_language,
    }
}

/// Deepgram text-to-speech
pub struct DeepgramSynthesizer {
    config: SpeechConfig,
    api_key: String,
    client: Client,
}

impl DeepgramSynthesizer {
    pub fn new(config: SpeechConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for DeepgramSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(SpeechError::InvalidRequest(
                "Cannot synthesize empty text".to_string(),
            ));
        }

        let url = format!(
            "{}/v1/speak?model={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => SpeechError::Authentication(body),
                400..=499 => SpeechError::InvalidRequest(body),
                _ => SpeechError::Network(format!("{status}: {body}")),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        if bytes.is_empty() {
            return Err(SpeechError::Parse("Empty audio response".to_string()));
        }

        Ok(bytes.to_vec())
    }
}
