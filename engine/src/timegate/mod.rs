//! Session time gating
//!
//! Maps elapsed session time onto a time-phase signal. The warn signal is
//! advisory: it is injected into the next reply generation as wrap-up
//! context but never short-circuits a turn. The hard stop is authoritative
//! and terminates the session even mid-turn.

/// Time-phase signal for one point in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSignal {
    /// Plenty of time left
    Normal,

    /// Past the warn threshold; the interviewer should wrap up
    Warn,

    /// Past the hard stop; the session must terminate
    HardStop,
}

/// Maps elapsed seconds to a `TimeSignal` against two thresholds
///
/// Invariant: `warn_secs < hardstop_secs`, enforced by config validation.
#[derive(Debug, Clone, Copy)]
pub struct TimeGate {
    warn_secs: u64,
    hardstop_secs: u64,
}

impl TimeGate {
    /// Create a gate with the given thresholds
    pub fn new(warn_secs: u64, hardstop_secs: u64) -> Self {
        Self {
            warn_secs,
            hardstop_secs,
        }
    }

    /// Evaluate elapsed session time
    pub fn evaluate(&self, elapsed_seconds: u64) -> TimeSignal {
        if elapsed_seconds > self.hardstop_secs {
            TimeSignal::HardStop
        } else if elapsed_seconds > self.warn_secs {
            TimeSignal::Warn
        } else {
            TimeSignal::Normal
        }
    }

    /// Warn threshold in seconds
    pub fn warn_secs(&self) -> u64 {
        self.warn_secs
    }

    /// Hard-stop threshold in seconds
    pub fn hardstop_secs(&self) -> u64 {
        self.hardstop_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_across_thresholds() {
        let gate = TimeGate::new(780, 890);
        assert_eq!(gate.evaluate(0), TimeSignal::Normal);
        assert_eq!(gate.evaluate(780), TimeSignal::Normal);
        assert_eq!(gate.evaluate(781), TimeSignal::Warn);
        assert_eq!(gate.evaluate(890), TimeSignal::Warn);
        assert_eq!(gate.evaluate(891), TimeSignal::HardStop);
    }

    #[test]
    fn test_hardstop_is_strictly_greater_than() {
        // elapsed > hardstop terminates; exactly at the threshold does not
        let gate = TimeGate::new(10, 20);
        assert_eq!(gate.evaluate(20), TimeSignal::Warn);
        assert_eq!(gate.evaluate(21), TimeSignal::HardStop);
    }
}
