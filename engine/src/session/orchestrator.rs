//! Turn orchestration
//!
//! One `TurnOrchestrator` drives one interview session from opening to
//! termination. Each submitted turn runs the full pipeline: transcribe
//! the candidate's audio, check conduct, check the clock, generate the
//! reply and analyze the answer in parallel, sanitize, synthesize, and
//! record. Collaborator failures degrade the turn (re-ask, neutral
//! score, text-only reply) instead of erroring; the only errors the
//! caller sees are lifecycle misuse.

use std::sync::Arc;

use sdk::errors::EngineError;
use sdk::types::{InterviewReport, Phase, ProfileContext, SessionOpening, Speaker, Turn, TurnResult};
use tracing::{info, warn};

use crate::analyzer::AnswerAnalyzer;
use crate::conduct::ConductMonitor;
use crate::config::Config;
use crate::generator::{PacingHint, ResponseGenerator};
use crate::inference::chain::FallbackChain;
use crate::sanitizer::OutputSanitizer;
use crate::scoring::ScoreRecord;
use crate::speech::{SpeechSynthesizer, Transcriber};
use crate::timegate::{TimeGate, TimeSignal};

use super::SessionState;

/// Spoken when transcription produced nothing usable
const REASK_REPLY: &str =
    "I'm sorry, I didn't catch that. Could you repeat your answer, please?";

/// Spoken on the first conduct strike
const WARNING_REPLY: &str =
    "I need to pause here. Please keep the conversation professional. \
     This is a formal warning; a further violation will end the interview. \
     Let's continue.";

/// Spoken when the second conduct strike ends the session
const CONDUCT_TERMINATION_REPLY: &str =
    "I'm ending the interview here due to repeated unprofessional conduct. \
     Thank you for your time.";

/// Spoken when the hard time limit ends the session
const TIME_UP_REPLY: &str =
    "We've reached the end of our scheduled time, so I'll stop here. Thank \
     you for the conversation, and we'll be in touch about next steps.";

/// Drives one interview session through its turns
pub struct TurnOrchestrator {
    state: SessionState,
    chain: Arc<FallbackChain>,
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    generator: Option<ResponseGenerator>,
    analyzer: AnswerAnalyzer,
    sanitizer: OutputSanitizer,
    conduct: ConductMonitor,
    timegate: TimeGate,
    wind_down_lead_secs: u64,
}

impl TurnOrchestrator {
    /// Create an orchestrator for one session
    ///
    /// The chain is shared between generation and analysis; the speech
    /// collaborators are trait objects so tests can substitute them.
    pub fn new(
        config: &Config,
        chain: Arc<FallbackChain>,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Result<Self, EngineError> {
        let sanitizer = OutputSanitizer::new()
            .map_err(|e| EngineError::Config(format!("Failed to build sanitizer: {e}")))?;
        let conduct = ConductMonitor::with_extra_terms(&config.conduct.extra_terms)
            .map_err(|e| EngineError::Config(format!("Failed to build conduct monitor: {e}")))?;

        Ok(Self {
            state: SessionState::new(),
            chain: Arc::clone(&chain),
            transcriber,
            synthesizer,
            generator: None,
            analyzer: AnswerAnalyzer::new(chain),
            sanitizer,
            conduct,
            timegate: TimeGate::new(config.session.warn_secs, config.session.hardstop_secs),
            wind_down_lead_secs: config.session.wind_down_lead_secs,
        })
    }

    /// Start the session and deliver the personalised opening
    ///
    /// # Errors
    ///
    /// `SessionAlreadyStarted` when called twice on one session.
    pub async fn start_session(
        &mut self,
        profile: &ProfileContext,
    ) -> Result<SessionOpening, EngineError> {
        if self.state.phase() != Phase::Setup {
            return Err(EngineError::SessionAlreadyStarted);
        }

        let opening_text = ResponseGenerator::opening(profile);
        let mut generator = ResponseGenerator::new(Arc::clone(&self.chain), profile);
        generator.record_opening(&opening_text);
        self.generator = Some(generator);

        self.state.begin();
        let opening_audio = self.synthesize_best_effort(&opening_text).await;
        self.state
            .record_turn(Turn::system(&opening_text, 0, Phase::Active));

        Ok(SessionOpening {
            opening_text,
            opening_audio,
        })
    }

    /// Submit one candidate turn
    ///
    /// Single flight is structural: the mutable borrow means one turn at a
    /// time per session.
    ///
    /// # Errors
    ///
    /// `SessionNotStarted` before `start_session`, `SessionTerminated`
    /// after the session has ended. Per-turn collaborator failures never
    /// surface as errors.
    pub async fn submit_turn(&mut self, audio: &[u8]) -> Result<TurnResult, EngineError> {
        match self.state.phase() {
            Phase::Setup => return Err(EngineError::SessionNotStarted),
            Phase::Terminated => return Err(EngineError::SessionTerminated),
            Phase::Active | Phase::Warning => {}
        }

        let elapsed = self.state.touch_clock();

        // Hard stop check before any work is spent on the turn
        if self.timegate.evaluate(elapsed) == TimeSignal::HardStop {
            return Ok(self.terminate_for_time().await);
        }

        // 1. Transcribe. Failure or silence re-asks without penalty.
        let transcription = match self.transcriber.transcribe(audio).await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "transcription failed, re-asking");
                return Ok(self.reask().await);
            }
        };
        if transcription.is_empty() {
            info!("no usable speech in payload, re-asking");
            return Ok(self.reask().await);
        }
        let answer = transcription.text;

        self.state
            .record_turn(Turn::candidate(&answer, elapsed, self.state.phase()));

        // 2. Conduct policy, before the answer reaches any backend
        let verdict = self.conduct.evaluate(&answer, self.state.strike_count());
        if verdict.strike {
            return Ok(self.handle_strike(verdict.terminate, verdict.matched_term).await);
        }

        // 3. Generate and analyze concurrently, both starting from the
        //    session's sticky chain position
        let question = self.last_system_text();
        let pacing = self.pacing(elapsed);
        let start_index = self.state.active_backend_index();

        let generator = match self.generator.as_mut() {
            Some(g) => g,
            None => return Err(EngineError::SessionNotStarted),
        };
        let (reply, analysis) = tokio::join!(
            generator.generate(&answer, pacing, start_index),
            self.analyzer.analyze(&question, &answer, start_index),
        );

        self.state
            .advance_backend_index(reply.backend_index.max(analysis.backend_index));
        self.state.record_score(analysis.record);

        // 4. Hard stop recheck: generation may have straddled the limit.
        //    The completed score stands; the conversational reply does not.
        let elapsed = self.state.touch_clock();
        if self.timegate.evaluate(elapsed) == TimeSignal::HardStop {
            info!("hard stop reached mid-turn, discarding generated reply");
            return Ok(self.terminate_for_time().await);
        }

        // 5. Sanitize and voice the reply
        let reply_text = self.sanitizer.clean(&reply.text);
        let reply_audio = self.synthesize_best_effort(&reply_text).await;

        self.state
            .record_turn(Turn::system(&reply_text, elapsed, self.state.phase()));

        Ok(TurnResult {
            reply_text,
            reply_audio,
            phase: self.state.phase(),
            terminated: false,
            elapsed_seconds: elapsed,
        })
    }

    /// Final report over everything recorded so far
    ///
    /// Valid at any point in the session; most useful after termination.
    pub fn report(&self) -> InterviewReport {
        let summary = self.state.scores().summary();
        InterviewReport {
            average_score: summary.average_overall,
            per_dimension_averages: summary.per_dimension,
            transcript: self.state.transcript().to_vec(),
            red_flags: summary.red_flags,
            insufficient_data: summary.insufficient_data,
            duration_seconds: self.state.elapsed_seconds(),
        }
    }

    /// Current session phase
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    async fn reask(&mut self) -> TurnResult {
        let elapsed = self.state.elapsed_seconds();
        let reply_audio = self.synthesize_best_effort(REASK_REPLY).await;
        self.state
            .record_turn(Turn::system(REASK_REPLY, elapsed, self.state.phase()));
        TurnResult {
            reply_text: REASK_REPLY.to_string(),
            reply_audio,
            phase: self.state.phase(),
            terminated: false,
            elapsed_seconds: elapsed,
        }
    }

    async fn handle_strike(&mut self, terminate: bool, matched_term: Option<String>) -> TurnResult {
        let strikes = self.state.add_strike();
        let flag = match matched_term {
            Some(term) => format!("Inappropriate language: {term}"),
            None => "Inappropriate language".to_string(),
        };
        self.state.record_score(ScoreRecord::strike(flag));

        let elapsed = self.state.elapsed_seconds();
        if terminate {
            info!(strikes, "conduct limit reached, terminating session");
            self.state.set_phase(Phase::Terminated);
            let reply_audio = self.synthesize_best_effort(CONDUCT_TERMINATION_REPLY).await;
            self.state.record_turn(Turn::system(
                CONDUCT_TERMINATION_REPLY,
                elapsed,
                Phase::Terminated,
            ));
            TurnResult {
                reply_text: CONDUCT_TERMINATION_REPLY.to_string(),
                reply_audio,
                phase: Phase::Terminated,
                terminated: true,
                elapsed_seconds: elapsed,
            }
        } else {
            self.state.set_phase(Phase::Warning);
            let reply_audio = self.synthesize_best_effort(WARNING_REPLY).await;
            self.state
                .record_turn(Turn::system(WARNING_REPLY, elapsed, Phase::Warning));
            TurnResult {
                reply_text: WARNING_REPLY.to_string(),
                reply_audio,
                phase: Phase::Warning,
                terminated: false,
                elapsed_seconds: elapsed,
            }
        }
    }

    async fn terminate_for_time(&mut self) -> TurnResult {
        let elapsed = self.state.elapsed_seconds();
        self.state.set_phase(Phase::Terminated);
        let reply_audio = self.synthesize_best_effort(TIME_UP_REPLY).await;
        self.state
            .record_turn(Turn::system(TIME_UP_REPLY, elapsed, Phase::Terminated));
        TurnResult {
            reply_text: TIME_UP_REPLY.to_string(),
            reply_audio,
            phase: Phase::Terminated,
            terminated: true,
            elapsed_seconds: elapsed,
        }
    }

    /// Synthesis is best effort: a failure degrades the turn to text only
    async fn synthesize_best_effort(&self, text: &str) -> Option<Vec<u8>> {
        match self.synthesizer.synthesize(text).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                warn!(error = %e, "synthesis failed, continuing text-only");
                None
            }
        }
    }

    /// The question the candidate was answering, for analysis context
    fn last_system_text(&self) -> String {
        self.state
            .transcript()
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::System)
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    fn pacing(&self, elapsed: u64) -> PacingHint {
        if self.timegate.evaluate(elapsed) == TimeSignal::Warn {
            PacingHint::WrapUp
        } else if elapsed + self.wind_down_lead_secs > self.timegate.warn_secs() {
            PacingHint::WindDown
        } else {
            PacingHint::Open
        }
    }
}
