//! Session state and turn orchestration
//!
//! `SessionState` holds everything the engine remembers about one
//! interview: phase, clock, strikes, transcript, and scores.
//! `TurnOrchestrator` drives one turn at a time through the full
//! pipeline (transcribe, conduct check, time gate, generate and analyze
//! in parallel, sanitize, synthesize, record).
//!
//! Single flight is enforced at the type level: `submit_turn` takes
//! `&mut self`, so a caller cannot have two turns in flight on one
//! session.

mod orchestrator;
mod state;

pub use orchestrator::TurnOrchestrator;
pub use state::SessionState;
