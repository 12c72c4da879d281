//! Viva SDK
//!
//! Shared library providing the caller-facing contract for the Viva
//! interview engine. This crate is used by both the engine and any
//! UI/application layer embedding it.

/// Error types and handling
pub mod errors;

/// Session boundary types (turns, results, reports)
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, VivaErrorExt};
pub use types::{
    InterviewReport, Phase, ProfileContext, SessionOpening, Speaker, Turn, TurnResult,
};
