//! Session boundary types
//!
//! Types exchanged between the engine and the embedding application:
//! session lifecycle phases, transcript turns, per-turn results, and the
//! final interview report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session lifecycle phase
///
/// Phases only move forward within a session; `Terminated` is absorbing.
/// An external reset creates a new session rather than rewinding phases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Session created, opening not yet delivered
    Setup,

    /// Interview in progress
    Active,

    /// A formal conduct warning has been issued
    Warning,

    /// Session ended (time limit or second conduct strike)
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Active => write!(f, "active"),
            Phase::Warning => write!(f, "warning"),
            Phase::Terminated => write!(f, "terminated"),
        }
    }
}

/// Who spoke a transcript turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The interviewing system
    System,

    /// The interviewed candidate
    Candidate,
}

/// One transcript entry
///
/// Turns are append-only and immutable once recorded; insertion order is
/// chronological order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// Who spoke
    pub speaker: Speaker,

    /// What was said (already sanitized for system turns)
    pub text: String,

    /// Seconds into the session when the turn was recorded
    pub timestamp_seconds: u64,

    /// Session phase at the time of the turn
    pub phase_at_time: Phase,
}

impl Turn {
    /// Create a candidate turn
    pub fn candidate(text: impl Into<String>, timestamp_seconds: u64, phase: Phase) -> Self {
        Self {
            speaker: Speaker::Candidate,
            text: text.into(),
            timestamp_seconds,
            phase_at_time: phase,
        }
    }

    /// Create a system turn
    pub fn system(text: impl Into<String>, timestamp_seconds: u64, phase: Phase) -> Self {
        Self {
            speaker: Speaker::System,
            text: text.into(),
            timestamp_seconds,
            phase_at_time: phase,
        }
    }
}

/// Result of one submitted turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    /// Sanitized reply text for the candidate
    pub reply_text: String,

    /// Synthesized reply audio; `None` when synthesis failed (text-only
    /// degradation) or was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_audio: Option<Vec<u8>>,

    /// Session phase after the turn
    pub phase: Phase,

    /// True when this turn ended the session
    pub terminated: bool,

    /// Seconds elapsed since the session started
    pub elapsed_seconds: u64,
}

/// Opening delivered by `start_session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOpening {
    /// Opening line spoken by the interviewer
    pub opening_text: String,

    /// Synthesized opening audio, if synthesis succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_audio: Option<Vec<u8>>,
}

/// Candidate profile context supplied by the caller
///
/// Extracted upstream (resume parsing is a collaborator concern); the engine
/// only uses it to personalise the opening and steer questioning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileContext {
    /// Candidate name
    #[serde(default)]
    pub name: Option<String>,

    /// Current role or headline
    #[serde(default)]
    pub current_role: Option<String>,

    /// Most notable project, used for the opening question
    #[serde(default)]
    pub key_project: Option<String>,

    /// Free-form background summary injected as questioning context
    #[serde(default)]
    pub summary: Option<String>,
}

/// Per-dimension score averages over the whole session
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DimensionAverages {
    pub depth: f64,
    pub thinking: f64,
    pub fit: f64,
}

/// Final interview report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewReport {
    /// Arithmetic mean of per-turn overall scores (0 when no turns scored)
    pub average_score: f64,

    /// Per-dimension averages on the 1-5 scale
    pub per_dimension_averages: DimensionAverages,

    /// Full chronological transcript
    pub transcript: Vec<Turn>,

    /// Union of red flags across all scored turns, order-preserving
    pub red_flags: Vec<String>,

    /// True when no turns were scored; `average_score` is 0 in that case
    /// rather than a division-by-zero artifact
    pub insufficient_data: bool,

    /// Total session duration in seconds
    pub duration_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        let turn = Turn::candidate("hello", 12, Phase::Active);
        assert_eq!(turn.speaker, Speaker::Candidate);
        assert_eq!(turn.timestamp_seconds, 12);

        let turn = Turn::system("welcome", 0, Phase::Setup);
        assert_eq!(turn.speaker, Speaker::System);
        assert_eq!(turn.phase_at_time, Phase::Setup);
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&Phase::Terminated).unwrap();
        assert_eq!(json, r#""terminated""#);
        let phase: Phase = serde_json::from_str(r#""warning""#).unwrap();
        assert_eq!(phase, Phase::Warning);
    }

    #[test]
    fn test_turn_result_omits_missing_audio() {
        let result = TurnResult {
            reply_text: "ok".to_string(),
            reply_audio: None,
            phase: Phase::Active,
            terminated: false,
            elapsed_seconds: 30,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("reply_audio"));
    }
}
