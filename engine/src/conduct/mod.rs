//! Conduct monitoring
//!
//! Detects disallowed language in candidate transcripts and maps detections
//! onto the two-strike policy: the first detection earns a formal warning,
//! the second ends the session. The detector itself is stateless; the
//! strike counter lives in `SessionState` and is passed in by the
//! orchestrator.

use regex::Regex;
use tracing::warn;

/// Strikes after which a session is terminated
pub const STRIKE_LIMIT: u32 = 2;

/// Built-in disallowed terms, matched case-insensitively as substrings
const DISALLOWED_TERMS: &[&str] = &[
    "stupid", "idiot", "fuck", "shit", "asshole", "dumb", "moron", "bitch", "shut up",
];

/// Outcome of evaluating one transcript against the conduct policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConductVerdict {
    /// A disallowed term was found; the strike counter must advance
    pub strike: bool,

    /// This strike reached the limit; the session must terminate
    pub terminate: bool,

    /// The term that matched, for the red-flag record
    pub matched_term: Option<String>,
}

impl ConductVerdict {
    fn clear() -> Self {
        Self {
            strike: false,
            terminate: false,
            matched_term: None,
        }
    }
}

/// Detects disallowed content in candidate input
pub struct ConductMonitor {
    patterns: Vec<Regex>,
}

impl ConductMonitor {
    /// Create a monitor over the built-in term set
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile (should never happen
    /// with the built-in terms).
    pub fn new() -> anyhow::Result<Self> {
        Self::with_extra_terms(&[])
    }

    /// Create a monitor with config-supplied terms appended to the
    /// built-in set
    pub fn with_extra_terms(extra: &[String]) -> anyhow::Result<Self> {
        let mut patterns = Vec::with_capacity(DISALLOWED_TERMS.len() + extra.len());
        for term in DISALLOWED_TERMS
            .iter()
            .map(|t| t.to_string())
            .chain(extra.iter().cloned())
        {
            patterns.push(Regex::new(&format!("(?i){}", regex::escape(&term)))?);
        }
        Ok(Self { patterns })
    }

    /// Evaluate a transcript against the conduct policy
    ///
    /// `prior_strikes` is the session's strike count before this turn. A
    /// detection always sets `strike`; `terminate` is set when the
    /// detection brings the count to the limit.
    pub fn evaluate(&self, text: &str, prior_strikes: u32) -> ConductVerdict {
        let Some(matched) = self.scan(text) else {
            return ConductVerdict::clear();
        };

        let strikes_now = prior_strikes + 1;
        warn!(strike = strikes_now, limit = STRIKE_LIMIT, "conduct violation detected");

        ConductVerdict {
            strike: true,
            terminate: strikes_now >= STRIKE_LIMIT,
            matched_term: Some(matched),
        }
    }

    /// Return the first disallowed term found in the text, if any
    pub fn scan(&self, text: &str) -> Option<String> {
        for pattern in &self.patterns {
            if let Some(m) = pattern.find(text) {
                return Some(m.as_str().to_lowercase());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_passes() {
        let monitor = ConductMonitor::new().unwrap();
        let verdict = monitor.evaluate("I led the migration project last year", 0);
        assert!(!verdict.strike);
        assert!(!verdict.terminate);
        assert!(verdict.matched_term.is_none());
    }

    #[test]
    fn test_first_detection_strikes_without_terminating() {
        let monitor = ConductMonitor::new().unwrap();
        let verdict = monitor.evaluate("this question is stupid", 0);
        assert!(verdict.strike);
        assert!(!verdict.terminate);
        assert_eq!(verdict.matched_term.as_deref(), Some("stupid"));
    }

    #[test]
    fn test_second_detection_terminates() {
        let monitor = ConductMonitor::new().unwrap();
        let verdict = monitor.evaluate("shut up already", 1);
        assert!(verdict.strike);
        assert!(verdict.terminate);
    }

    #[test]
    fn test_detection_is_case_insensitive() {
        let monitor = ConductMonitor::new().unwrap();
        assert!(monitor.scan("SHUT UP").is_some());
        assert!(monitor.scan("Idiot").is_some());
    }

    #[test]
    fn test_extra_terms_extend_the_set() {
        let monitor =
            ConductMonitor::with_extra_terms(&["scoundrel".to_string()]).unwrap();
        assert!(monitor.scan("you scoundrel").is_some());
        assert!(monitor.scan("you rascal").is_none());
    }

    #[test]
    fn test_regex_metacharacters_in_extra_terms_are_escaped() {
        let monitor = ConductMonitor::with_extra_terms(&["a+b".to_string()]).unwrap();
        assert!(monitor.scan("a+b").is_some());
        assert!(monitor.scan("aab").is_none());
    }
}
