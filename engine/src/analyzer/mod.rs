//! Answer analysis
//!
//! Scores each candidate answer on three dimensions via a structured
//! inference call. Analysis never aborts a turn: any failure anywhere in
//! the pipeline yields the documented neutral default so the conversation
//! keeps moving.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::inference::chain::FallbackChain;
use crate::inference::{ChatMessage, ModalityConfig};
use crate::scoring::ScoreRecord;

const ANALYSIS_SYSTEM_PROMPT: &str = "\
You are an interview assessor. Evaluate the candidate's answer to the \
question and respond with a single JSON object, no prose, with exactly \
these fields:
{
  \"depth\": <integer 1-5, quality of evidence and domain expertise>,
  \"thinking\": <integer 1-5, structure and reasoning quality>,
  \"fit\": <integer 1-5, communication and professionalism>,
  \"overall\": <integer 0-100, overall impression of the answer>,
  \"red_flags\": [<short strings naming concerns, empty if none>]
}
Judge only what the answer demonstrates. Do not reward length.";

/// Outcome of analyzing one answer
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// The score, genuine or defaulted
    pub record: ScoreRecord,

    /// Chain position after the call; unchanged from the start index when
    /// the call never reached a backend
    pub backend_index: usize,
}

/// Shape the analysis backend is asked to produce
#[derive(Debug, Deserialize)]
struct RawAssessment {
    depth: u8,
    thinking: u8,
    fit: u8,
    overall: u8,
    #[serde(default)]
    red_flags: Vec<String>,
}

/// Scores candidate answers through the fallback chain
pub struct AnswerAnalyzer {
    chain: Arc<FallbackChain>,
}

impl AnswerAnalyzer {
    pub fn new(chain: Arc<FallbackChain>) -> Self {
        Self { chain }
    }

    /// Analyze one answer in the context of the question it responds to
    ///
    /// Infallible by design: chain exhaustion, a malformed body, or any
    /// parse failure all produce `ScoreRecord::defaulted()`.
    pub async fn analyze(
        &self,
        question: &str,
        answer: &str,
        start_index: usize,
    ) -> AnalysisOutcome {
        let messages = vec![
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Question: {question}\n\nCandidate's answer: {answer}"
            )),
        ];

        match self
            .chain
            .execute(start_index, &messages, &ModalityConfig::structured())
            .await
        {
            Ok(reply) => {
                let record = match parse_assessment(&reply.content) {
                    Some(record) => record,
                    None => {
                        warn!(
                            backend = %reply.backend_name,
                            "assessment body unparseable, recording neutral default"
                        );
                        ScoreRecord::defaulted()
                    }
                };
                AnalysisOutcome {
                    record,
                    backend_index: reply.backend_index,
                }
            }
            Err(e) => {
                warn!(error = %e, "analysis call failed, recording neutral default");
                AnalysisOutcome {
                    record: ScoreRecord::defaulted(),
                    backend_index: start_index,
                }
            }
        }
    }
}

/// Parse an assessment out of a completion body
///
/// Tolerates a fenced or prose-wrapped JSON object by falling back to the
/// first balanced object in the text.
fn parse_assessment(content: &str) -> Option<ScoreRecord> {
    let raw: RawAssessment = match serde_json::from_str(content.trim()) {
        Ok(raw) => raw,
        Err(_) => {
            let embedded = first_json_object(content)?;
            match serde_json::from_str(embedded) {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(error = %e, "embedded assessment object unparseable");
                    return None;
                }
            }
        }
    };

    Some(ScoreRecord::scored(
        raw.depth,
        raw.thinking,
        raw.fit,
        raw.overall,
        raw.red_flags,
    ))
}

/// First balanced top-level JSON object in the text, if any
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreProvenance;

    #[test]
    fn test_parse_clean_assessment() {
        let record = parse_assessment(
            r#"{"depth": 4, "thinking": 5, "fit": 3, "overall": 82, "red_flags": []}"#,
        )
        .unwrap();

        assert_eq!(record.depth, 4);
        assert_eq!(record.thinking, 5);
        assert_eq!(record.overall, 82);
        assert_eq!(record.provenance, ScoreProvenance::Scored);
    }

    #[test]
    fn test_parse_fenced_assessment() {
        let content = "```json\n{\"depth\": 2, \"thinking\": 2, \"fit\": 3, \"overall\": 40, \"red_flags\": [\"vague\"]}\n```";
        let record = parse_assessment(content).unwrap();
        assert_eq!(record.overall, 40);
        assert_eq!(record.red_flags, vec!["vague"]);
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        let record = parse_assessment(
            r#"{"depth": 0, "thinking": 9, "fit": 5, "overall": 100, "red_flags": []}"#,
        )
        .unwrap();
        assert_eq!(record.depth, 1);
        assert_eq!(record.thinking, 5);
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(parse_assessment("The candidate did quite well overall.").is_none());
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!(parse_assessment(r#"{"depth": 3}"#).is_none());
    }

    #[test]
    fn test_first_json_object_skips_prose() {
        let text = "Here is my assessment: {\"a\": {\"b\": 1}} trailing";
        assert_eq!(first_json_object(text), Some("{\"a\": {\"b\": 1}}"));
    }
}
