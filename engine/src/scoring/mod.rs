//! Per-turn scoring
//!
//! `ScoreRecord` is the structured assessment of one candidate answer.
//! Every record carries a provenance tag so audit code can tell a genuine
//! mid-range score from a recovery default or a forced conduct-strike
//! zero. `ScoreAggregator` accumulates records into the running session
//! metric.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sdk::types::DimensionAverages;

/// How a score record came to exist
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreProvenance {
    /// Computed by the analysis backend from the candidate's answer
    Scored,

    /// Neutral default substituted after an analysis or parse failure
    Defaulted,

    /// Forced to zero by a conduct strike
    Strike,
}

/// Structured assessment of one candidate turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    /// Quality of evidence and domain expertise, 1-5
    pub depth: u8,

    /// Structure and reasoning quality, 1-5
    pub thinking: u8,

    /// Communication and professionalism, 1-5
    pub fit: u8,

    /// Overall score, 0-100
    pub overall: u8,

    /// Concerns raised by this answer
    pub red_flags: Vec<String>,

    /// When the record was produced
    pub generated_at: DateTime<Utc>,

    /// Scored, defaulted, or strike-forced
    pub provenance: ScoreProvenance,
}

impl ScoreRecord {
    /// Create a genuinely computed record, clamping values into their
    /// documented ranges
    pub fn scored(depth: u8, thinking: u8, fit: u8, overall: u8, red_flags: Vec<String>) -> Self {
        Self {
            depth: depth.clamp(1, 5),
            thinking: thinking.clamp(1, 5),
            fit: fit.clamp(1, 5),
            overall: overall.min(100),
            red_flags,
            generated_at: Utc::now(),
            provenance: ScoreProvenance::Scored,
        }
    }

    /// The documented neutral default used when analysis fails
    ///
    /// Distinguishable from a genuine mid-range score via its provenance.
    pub fn defaulted() -> Self {
        Self {
            depth: 3,
            thinking: 3,
            fit: 3,
            overall: 60,
            red_flags: Vec::new(),
            generated_at: Utc::now(),
            provenance: ScoreProvenance::Defaulted,
        }
    }

    /// Forced-zero record for a conduct strike
    pub fn strike(red_flag: impl Into<String>) -> Self {
        Self {
            depth: 1,
            thinking: 1,
            fit: 1,
            overall: 0,
            red_flags: vec![red_flag.into()],
            generated_at: Utc::now(),
            provenance: ScoreProvenance::Strike,
        }
    }
}

/// Running summary over all recorded scores
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    /// Arithmetic mean of overall scores; 0 when nothing was recorded
    pub average_overall: f64,

    /// Per-dimension means on the 1-5 scale
    pub per_dimension: DimensionAverages,

    /// Union of red flags across records, deduplicated, insertion order
    pub red_flags: Vec<String>,

    /// True when no records exist; distinguishes a real zero average from
    /// an unscored session
    pub insufficient_data: bool,
}

/// Accumulates score records for one session
///
/// Pure accumulation: strike records count toward the mean like any other
/// record, so repeated violations drag the average down.
#[derive(Debug, Default)]
pub struct ScoreAggregator {
    records: Vec<ScoreRecord>,
}

impl ScoreAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one score
    pub fn record(&mut self, record: ScoreRecord) {
        self.records.push(record);
    }

    /// Number of recorded scores
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in recording order
    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    /// Summarize everything recorded so far
    pub fn summary(&self) -> ScoreSummary {
        if self.records.is_empty() {
            return ScoreSummary {
                average_overall: 0.0,
                per_dimension: DimensionAverages::default(),
                red_flags: Vec::new(),
                insufficient_data: true,
            };
        }

        let n = self.records.len() as f64;
        let average_overall = self.records.iter().map(|r| r.overall as f64).sum::<f64>() / n;
        let per_dimension = DimensionAverages {
            depth: self.records.iter().map(|r| r.depth as f64).sum::<f64>() / n,
            thinking: self.records.iter().map(|r| r.thinking as f64).sum::<f64>() / n,
            fit: self.records.iter().map(|r| r.fit as f64).sum::<f64>() / n,
        };

        let mut red_flags: Vec<String> = Vec::new();
        for record in &self.records {
            for flag in &record.red_flags {
                if !red_flags.contains(flag) {
                    red_flags.push(flag.clone());
                }
            }
        }

        ScoreSummary {
            average_overall,
            per_dimension,
            red_flags,
            insufficient_data: false,
        }
    }
}
