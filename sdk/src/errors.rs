//! Error types and handling
//!
//! This module provides the error types exposed at the engine boundary.
//! All errors implement the `VivaErrorExt` trait which provides
//! user-friendly hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! All error messages are scrubbed to ensure:
//! - No secrets (API keys, tokens) are included
//! - No raw collaborator payloads are exposed to end users
//! - All messages are safe to display to end users

use thiserror::Error;

/// Trait for Viva error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait VivaErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain:
    /// - Secrets (API keys, tokens, passwords)
    /// - Raw collaborator error payloads
    /// - Internal implementation details
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors end the session or require configuration changes.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// This enum represents the faults that can surface at the engine boundary.
/// Per-turn collaborator failures (transcription hiccups, backend outages,
/// malformed structured output) are absorbed inside the engine and converted
/// to safe defaults; they never appear here. What remains are configuration
/// problems and misuse of the session lifecycle.
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, VivaErrorExt};
///
/// let error = EngineError::SessionNotStarted;
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::SessionTerminated;
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Session lifecycle errors
    #[error("Session not started")]
    SessionNotStarted,

    #[error("Session already started")]
    SessionAlreadyStarted,

    #[error("Session terminated")]
    SessionTerminated,
}

impl VivaErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::SessionNotStarted => "Start a session before submitting turns",
            Self::SessionAlreadyStarted => "This session is already running",
            Self::SessionTerminated => "This session has ended. Start a new session",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::SessionTerminated => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
