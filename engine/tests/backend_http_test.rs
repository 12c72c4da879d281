//! HTTP-level backend tests
//!
//! Runs the real clients against wiremock servers: wire formats, header
//! placement, status triage, and the chain's behavior over real HTTP
//! failures.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use viva_engine::config::{AzureConfig, OllamaConfig, OpenAiConfig, SpeechConfig};
use viva_engine::inference::azure::AzureOpenAiBackend;
use viva_engine::inference::chain::FallbackChain;
use viva_engine::inference::ollama::OllamaBackend;
use viva_engine::inference::openai::OpenAiBackend;
use viva_engine::inference::{
    ChatMessage, InferenceBackend, InferenceError, ModalityConfig,
};
use viva_engine::speech::{DeepgramSynthesizer, DeepgramTranscriber, SpeechSynthesizer, Transcriber};

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

fn azure_backend(server: &MockServer) -> AzureOpenAiBackend {
    AzureOpenAiBackend::new(
        AzureConfig {
            endpoint: server.uri(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-10-01-preview".to_string(),
        },
        "azure-key",
    )
}

#[tokio::test]
async fn azure_addresses_the_deployment_with_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .and(query_param("api-version", "2024-10-01-preview"))
        .and(header("api-key", "azure-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = azure_backend(&server);
    let reply = backend
        .complete(&[ChatMessage::user("hi")], &ModalityConfig::text())
        .await
        .unwrap();

    assert_eq!(reply, "hello");
}

#[tokio::test]
async fn azure_401_is_an_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let backend = azure_backend(&server);
    let err = backend
        .complete(&[ChatMessage::user("hi")], &ModalityConfig::text())
        .await
        .unwrap_err();

    assert!(matches!(err, InferenceError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn modality_complaint_earns_one_corrected_retry_over_the_wire() {
    let server = MockServer::start().await;

    // structured requests are rejected with a modality complaint
    Mock::given(method("POST"))
        .and(body_string_contains("response_format"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string("response_format is not supported with this model"),
        )
        .expect(1)
        .mount(&server)
        .await;

    // the corrected plain-text retry succeeds
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("recovered")))
        .expect(1)
        .mount(&server)
        .await;

    let backend: Arc<dyn InferenceBackend> = Arc::new(azure_backend(&server));
    let chain = FallbackChain::new(
        vec![backend],
        Duration::from_secs(30),
        Duration::from_secs(120),
    );

    let reply = chain
        .execute(0, &[ChatMessage::user("score this")], &ModalityConfig::structured())
        .await
        .unwrap();

    assert_eq!(reply.content, "recovered");
    assert_eq!(reply.backend_index, 0);
}

#[tokio::test]
async fn chain_advances_from_a_500_to_the_next_backend() {
    let azure_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&azure_server)
        .await;

    let openai_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer openai-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("fallback wins")))
        .expect(1)
        .mount(&openai_server)
        .await;

    let azure: Arc<dyn InferenceBackend> = Arc::new(azure_backend(&azure_server));
    let openai: Arc<dyn InferenceBackend> = Arc::new(OpenAiBackend::new(
        OpenAiConfig {
            base_url: openai_server.uri(),
            model: "gpt-4o-mini".to_string(),
        },
        "openai-key",
    ));

    let chain = FallbackChain::new(
        vec![azure, openai],
        Duration::from_secs(30),
        Duration::from_secs(120),
    );

    let reply = chain
        .execute(0, &[ChatMessage::user("hi")], &ModalityConfig::text())
        .await
        .unwrap();

    assert_eq!(reply.content, "fallback wins");
    assert_eq!(reply.backend_index, 1);
    assert_eq!(reply.backend_name, "openai");
}

#[tokio::test]
async fn ollama_chat_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains("\"stream\":false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": "local reply" },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(OllamaConfig {
        base_url: server.uri(),
        model: "llama3.1:8b".to_string(),
    });

    let reply = backend
        .complete(&[ChatMessage::user("hi")], &ModalityConfig::text())
        .await
        .unwrap();

    assert_eq!(reply, "local reply");
}

fn speech_config(server: &MockServer) -> SpeechConfig {
    SpeechConfig {
        base_url: server.uri(),
        ..SpeechConfig::default()
    }
}

#[tokio::test]
async fn transcriber_sends_audio_and_reads_the_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/listen"))
        .and(query_param("model", "nova-2"))
        .and(query_param("detect_language", "true"))
        .and(header("Authorization", "Token speech-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {
                "channels": [{
                    "detected_language": "en",
                    "alternatives": [{ "transcript": "I led the rollout." }]
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transcriber = DeepgramTranscriber::new(speech_config(&server), "speech-key");
    let result = transcriber.transcribe(&[0u8; 4096]).await.unwrap();

    assert_eq!(result.text, "I led the rollout.");
    assert_eq!(result.detected_language.as_deref(), Some("en"));
}

#[tokio::test]
async fn tiny_payload_never_reaches_the_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let transcriber = DeepgramTranscriber::new(speech_config(&server), "speech-key");
    let result = transcriber.transcribe(&[0u8; 50]).await.unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn synthesizer_posts_text_and_returns_audio_bytes() {
    let server = MockServer::start().await;
    let audio = vec![0x52u8, 0x49, 0x46, 0x46, 1, 2, 3, 4];
    Mock::given(method("POST"))
        .and(path("/v1/speak"))
        .and(query_param("model", "aura-asteria-en"))
        .and(header("Authorization", "Token speech-key"))
        .and(body_string_contains("Thanks for joining"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let synthesizer = DeepgramSynthesizer::new(speech_config(&server), "speech-key");
    let result = synthesizer.synthesize("Thanks for joining today.").await.unwrap();

    assert_eq!(result, audio);
}
