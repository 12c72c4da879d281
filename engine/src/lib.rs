//! Viva Engine Library
//!
//! This library provides the turn orchestration core of the Viva voice
//! interview engine. It is used by the embedding application and by the
//! integration tests.

/// Configuration management module
pub mod config;

/// Structured-output sanitization module
pub mod sanitizer;

/// Conduct monitoring module
pub mod conduct;

/// Session time gating module
pub mod timegate;

/// Inference backend abstraction layer
pub mod inference;

/// Speech transcription and synthesis collaborators
pub mod speech;

/// Per-turn scoring and aggregation module
pub mod scoring;

/// Structured answer analysis module
pub mod analyzer;

/// Conversational reply generation module
pub mod generator;

/// Session state and turn orchestration module
pub mod session;

/// Telemetry and Observability
pub mod telemetry;
