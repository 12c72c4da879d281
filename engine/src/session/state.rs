//! Per-session mutable state

use sdk::types::{Phase, Turn};
use tokio::time::Instant;
use tracing::info;

use crate::scoring::{ScoreAggregator, ScoreRecord};

/// Everything the engine remembers about one interview session
///
/// The clock is snapshotted into `elapsed_seconds` on every touch and the
/// snapshot only moves forward, so time comparisons inside a turn are
/// consistent even if the underlying instant is read more than once.
pub struct SessionState {
    phase: Phase,
    started_at: Instant,
    elapsed_seconds: u64,
    strike_count: u32,
    turns: Vec<Turn>,
    scores: ScoreAggregator,
    active_backend_index: usize,
}

impl SessionState {
    /// Fresh session in the setup phase
    pub fn new() -> Self {
        Self {
            phase: Phase::Setup,
            started_at: Instant::now(),
            elapsed_seconds: 0,
            strike_count: 0,
            turns: Vec::new(),
            scores: ScoreAggregator::new(),
            active_backend_index: 0,
        }
    }

    /// Mark the session active and start the clock
    pub fn begin(&mut self) {
        self.phase = Phase::Active;
        self.started_at = Instant::now();
        self.elapsed_seconds = 0;
        info!("session started");
    }

    /// Refresh the elapsed-seconds snapshot; never moves backwards
    pub fn touch_clock(&mut self) -> u64 {
        let now = self.started_at.elapsed().as_secs();
        if now > self.elapsed_seconds {
            self.elapsed_seconds = now;
        }
        self.elapsed_seconds
    }

    /// Last snapshotted elapsed time in seconds
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to a later phase; `Terminated` is absorbing
    pub fn set_phase(&mut self, phase: Phase) {
        if self.phase == Phase::Terminated {
            return;
        }
        if self.phase != phase {
            info!(from = %self.phase, to = %phase, "phase transition");
        }
        self.phase = phase;
    }

    pub fn strike_count(&self) -> u32 {
        self.strike_count
    }

    pub fn add_strike(&mut self) -> u32 {
        self.strike_count += 1;
        self.strike_count
    }

    /// Append one transcript turn; turns are immutable once recorded
    pub fn record_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.turns
    }

    pub fn record_score(&mut self, record: ScoreRecord) {
        self.scores.record(record);
    }

    pub fn scores(&self) -> &ScoreAggregator {
        &self.scores
    }

    /// Sticky fallback-chain position
    pub fn active_backend_index(&self) -> usize {
        self.active_backend_index
    }

    /// Advance the sticky chain position; never moves backwards
    pub fn advance_backend_index(&mut self, index: usize) {
        if index > self.active_backend_index {
            info!(
                from = self.active_backend_index,
                to = index,
                "advancing active backend"
            );
            self.active_backend_index = index;
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
