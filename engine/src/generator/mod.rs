//! Interviewer response generation
//!
//! Produces the system side of the conversation: a personalised opening,
//! then one follow-up question per candidate answer, generated through
//! the fallback chain against a rolling conversation history. Generation
//! never aborts a turn: if every backend fails, the candidate hears a
//! fixed degraded reply and the interview continues.

use std::sync::Arc;

use sdk::types::ProfileContext;
use tracing::warn;

use crate::inference::chain::FallbackChain;
use crate::inference::{ChatMessage, ModalityConfig};

/// Spoken when every backend in the chain has failed
pub const DEGRADED_REPLY: &str =
    "I'm having trouble on my end at the moment. Please go on, I'm still listening.";

/// How the interviewer should pace itself, derived from elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingHint {
    /// No time pressure
    Open,

    /// Approaching the warn threshold; steer toward conclusion
    WindDown,

    /// Past the warn threshold; close out the conversation
    WrapUp,
}

/// One generated interviewer reply
#[derive(Debug)]
pub struct GeneratedReply {
    /// Raw reply text, before sanitization
    pub text: String,

    /// Chain position after the call
    pub backend_index: usize,

    /// True when this is the fixed degraded reply
    pub degraded: bool,
}

/// Generates interviewer turns over a rolling conversation history
pub struct ResponseGenerator {
    chain: Arc<FallbackChain>,
    history: Vec<ChatMessage>,
}

impl ResponseGenerator {
    /// Create a generator primed with the interviewer persona and the
    /// candidate's profile
    pub fn new(chain: Arc<FallbackChain>, profile: &ProfileContext) -> Self {
        let history = vec![ChatMessage::system(build_system_prompt(profile))];
        Self { chain, history }
    }

    /// The personalised opening line that starts the session
    ///
    /// Fixed text rather than a generated one, so the session always opens
    /// even when every backend is down.
    pub fn opening(profile: &ProfileContext) -> String {
        let greeting = match profile.name.as_deref() {
            Some(name) => format!("Hello {name}, thanks for joining."),
            None => "Hello, thanks for joining.".to_string(),
        };
        let topic = profile
            .key_project
            .as_deref()
            .unwrap_or("your most significant recent project");
        format!(
            "{greeting} I'd like to hear about your work on {topic}. Could \
             you walk me through what the problem was and what you did?"
        )
    }

    /// Record the opening question in the history so follow-ups have the
    /// full exchange
    pub fn record_opening(&mut self, opening_text: &str) {
        self.history.push(ChatMessage::assistant(opening_text));
    }

    /// Generate the interviewer's reply to one candidate answer
    ///
    /// Infallible by design: chain exhaustion produces the fixed degraded
    /// reply. The exchange is appended to the rolling history either way,
    /// because the degraded line is what the candidate actually heard.
    pub async fn generate(
        &mut self,
        answer: &str,
        pacing: PacingHint,
        start_index: usize,
    ) -> GeneratedReply {
        let mut messages = self.history.clone();
        messages.push(ChatMessage::user(answer));
        if let Some(hint) = pacing_instruction(pacing) {
            messages.push(ChatMessage::system(hint));
        }

        let reply = match self
            .chain
            .execute(start_index, &messages, &ModalityConfig::text())
            .await
        {
            Ok(reply) => GeneratedReply {
                text: reply.content,
                backend_index: reply.backend_index,
                degraded: false,
            },
            Err(e) => {
                warn!(error = %e, "generation failed everywhere, using degraded reply");
                GeneratedReply {
                    text: DEGRADED_REPLY.to_string(),
                    backend_index: start_index,
                    degraded: true,
                }
            }
        };

        self.history.push(ChatMessage::user(answer));
        self.history.push(ChatMessage::assistant(&reply.text));

        reply
    }

    /// Number of messages in the rolling history, system prompt included
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

fn build_system_prompt(profile: &ProfileContext) -> String {
    let mut prompt = "You are a professional interviewer conducting a spoken \
         screening interview. Your replies are read aloud to the candidate, \
         so reply in plain conversational prose only. Never produce JSON, \
         markdown, code, lists, or headings.\n\
         \n\
         Ask one focused follow-up question at a time. Probe for concrete \
         evidence: what the candidate personally did, what the outcome \
         was, and how they reasoned about it. Stay courteous and \
         professional regardless of how the candidate behaves."
        .to_string();

    if let Some(name) = &profile.name {
        prompt.push_str("\n\nCandidate: ");
        prompt.push_str(name);
        if let Some(role) = &profile.current_role {
            prompt.push_str(" (");
            prompt.push_str(role);
            prompt.push(')');
        }
    }
    if let Some(project) = &profile.key_project {
        prompt.push_str("\nKey project to explore: ");
        prompt.push_str(project);
    }
    if let Some(summary) = &profile.summary {
        prompt.push_str("\nBackground: ");
        prompt.push_str(summary);
    }

    prompt
}

/// Extra instruction injected for the current call only; the persistent
/// history stays clean of pacing noise
fn pacing_instruction(pacing: PacingHint) -> Option<&'static str> {
    match pacing {
        PacingHint::Open => None,
        PacingHint::WindDown => Some(
            "Time is getting short. Begin steering the conversation toward \
             a natural conclusion. Do not announce the time limit.",
        ),
        PacingHint::WrapUp => Some(
            "The interview is nearly over. Ask at most one brief closing \
             question, or thank the candidate and wrap up.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InferenceBackend;
    use async_trait::async_trait;
    use std::time::Duration;

    fn profile() -> ProfileContext {
        ProfileContext {
            name: Some("Asha".to_string()),
            current_role: Some("Staff Engineer".to_string()),
            key_project: Some("the billing migration".to_string()),
            summary: None,
        }
    }

    struct FixedBackend(&'static str);

    #[async_trait]
    impl InferenceBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }
        fn is_local(&self) -> bool {
            false
        }
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _modality: &ModalityConfig,
        ) -> crate::inference::Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn chain_of(backends: Vec<Arc<dyn InferenceBackend>>) -> Arc<FallbackChain> {
        Arc::new(FallbackChain::new(
            backends,
            Duration::from_secs(30),
            Duration::from_secs(120),
        ))
    }

    #[test]
    fn test_opening_is_personalised() {
        let opening = ResponseGenerator::opening(&profile());
        assert!(opening.contains("Asha"));
        assert!(opening.contains("the billing migration"));
    }

    #[test]
    fn test_system_prompt_carries_profile() {
        let prompt = build_system_prompt(&profile());
        assert!(prompt.contains("Staff Engineer"));
        assert!(prompt.contains("the billing migration"));
        assert!(prompt.contains("plain conversational prose"));
    }

    #[tokio::test]
    async fn test_generate_appends_exchange_to_history() {
        let chain = chain_of(vec![Arc::new(FixedBackend("What was the hardest part?"))]);
        let mut generator = ResponseGenerator::new(chain, &profile());
        generator.record_opening("Tell me about the migration.");

        let reply = generator.generate("We moved 40 services.", PacingHint::Open, 0).await;

        assert!(!reply.degraded);
        assert_eq!(reply.text, "What was the hardest part?");
        // system + opening + user + assistant
        assert_eq!(generator.history_len(), 4);
    }

    #[tokio::test]
    async fn test_exhausted_chain_yields_degraded_reply() {
        let mut generator = ResponseGenerator::new(chain_of(vec![]), &profile());

        let reply = generator.generate("Hello?", PacingHint::Open, 0).await;

        assert!(reply.degraded);
        assert_eq!(reply.text, DEGRADED_REPLY);
        assert_eq!(reply.backend_index, 0);
    }

    #[test]
    fn test_opening_without_profile_still_reads_naturally() {
        let opening = ResponseGenerator::opening(&ProfileContext::default());
        assert!(opening.contains("thanks for joining"));
        assert!(opening.contains("your most significant recent project"));
    }

    #[test]
    fn test_pacing_instructions() {
        assert!(pacing_instruction(PacingHint::Open).is_none());
        assert!(pacing_instruction(PacingHint::WindDown).is_some());
        assert!(pacing_instruction(PacingHint::WrapUp)
            .unwrap()
            .contains("nearly over"));
    }
}
