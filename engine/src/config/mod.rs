//! Configuration management
//!
//! This module handles loading, validation, and management of the Viva
//! configuration. Configuration is stored in TOML format at
//! ~/.viva/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **session**: Time thresholds and per-call timeouts
//! - **inference**: Backend fallback chain and per-backend settings
//! - **speech**: Transcription and synthesis settings
//! - **conduct**: Additional disallowed terms
//!
//! API keys are never stored in the configuration file; the embedding
//! application supplies them when constructing collaborator clients.
//!
//! # Examples
//!
//! ```no_run
//! use viva_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Hard stop at {}s", config.session.hardstop_secs);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Represents the complete Viva configuration loaded from
/// ~/.viva/config.toml. Every section carries serde defaults so a partial
/// file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Session timing settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Inference backend configuration
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Speech collaborator configuration
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Conduct monitoring configuration
    #[serde(default)]
    pub conduct: ConductConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Session timing configuration
///
/// `warn_secs` must be strictly below `hardstop_secs`. The wind-down lead
/// is subtracted from the warn threshold to produce the earlier "move
/// toward conclusion" hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Elapsed seconds after which the interviewer is told to wrap up
    #[serde(default = "default_warn_secs")]
    pub warn_secs: u64,

    /// Elapsed seconds after which the session is force-terminated
    #[serde(default = "default_hardstop_secs")]
    pub hardstop_secs: u64,

    /// Seconds before the warn threshold at which the soft wind-down hint
    /// starts being injected
    #[serde(default = "default_wind_down_lead_secs")]
    pub wind_down_lead_secs: u64,

    /// Timeout per inference call against a cloud backend, in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Timeout per inference call against a local backend, in seconds
    /// (local backends may need to load a model first)
    #[serde(default = "default_local_call_timeout_secs")]
    pub local_call_timeout_secs: u64,
}

/// Inference backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Ordered fallback chain; the first entry is the session-preferred
    /// backend (azure, openai, ollama)
    #[serde(default = "default_chain")]
    pub chain: Vec<String>,

    /// Azure OpenAI backend settings
    #[serde(default)]
    pub azure: AzureConfig,

    /// OpenAI backend settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Ollama backend settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Azure OpenAI backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. https://myresource.openai.azure.com
    #[serde(default)]
    pub endpoint: String,

    /// Deployment name for conversational calls
    #[serde(default = "default_azure_deployment")]
    pub deployment: String,

    /// API version query parameter
    #[serde(default = "default_azure_api_version")]
    pub api_version: String,
    // Note: API key supplied by the application, not stored in config
}

/// OpenAI backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL for the OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,
    // Note: API key supplied by the application, not stored in config
}

/// Ollama backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// Speech collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Base URL for the speech API
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,

    /// Transcription model
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// Synthesis voice
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Audio payloads below this size are treated as silence
    #[serde(default = "default_min_audio_bytes")]
    pub min_audio_bytes: usize,
}

/// Conduct monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConductConfig {
    /// Extra disallowed terms appended to the built-in set
    #[serde(default)]
    pub extra_terms: Vec<String>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_warn_secs() -> u64 {
    780
}

fn default_hardstop_secs() -> u64 {
    890
}

fn default_wind_down_lead_secs() -> u64 {
    180
}

fn default_call_timeout_secs() -> u64 {
    30
}

fn default_local_call_timeout_secs() -> u64 {
    120
}

fn default_chain() -> Vec<String> {
    vec![
        "azure".to_string(),
        "openai".to_string(),
        "ollama".to_string(),
    ]
}

fn default_azure_deployment() -> String {
    "gpt-4o".to_string()
}

fn default_azure_api_version() -> String {
    "2024-10-01-preview".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_speech_base_url() -> String {
    "https://api.deepgram.com".to_string()
}

fn default_stt_model() -> String {
    "nova-2".to_string()
}

fn default_voice() -> String {
    "aura-asteria-en".to_string()
}

fn default_min_audio_bytes() -> usize {
    100
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            warn_secs: default_warn_secs(),
            hardstop_secs: default_hardstop_secs(),
            wind_down_lead_secs: default_wind_down_lead_secs(),
            call_timeout_secs: default_call_timeout_secs(),
            local_call_timeout_secs: default_local_call_timeout_secs(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            chain: default_chain(),
            azure: AzureConfig::default(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment: default_azure_deployment(),
            api_version: default_azure_api_version(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_speech_base_url(),
            stt_model: default_stt_model(),
            voice: default_voice(),
            min_audio_bytes: default_min_audio_bytes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            session: SessionConfig::default(),
            inference: InferenceConfig::default(),
            speech: SpeechConfig::default(),
            conduct: ConductConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.viva/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default
    /// configuration. Validates the configuration after loading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, TOML parsing fails, or
    /// validation fails.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, TOML parsing fails, or
    /// validation fails.
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default();
        config.validate()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.viva/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".viva").join("config.toml"))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The log level is not one of error/warn/info/debug/trace
    /// - The warn threshold is not strictly below the hard stop
    /// - The fallback chain is empty or names an unknown backend
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.session.warn_secs >= self.session.hardstop_secs {
            return Err(EngineError::Config(format!(
                "warn_secs ({}) must be below hardstop_secs ({})",
                self.session.warn_secs, self.session.hardstop_secs
            )));
        }

        if self.inference.chain.is_empty() {
            return Err(EngineError::Config(
                "Inference chain must name at least one backend".to_string(),
            ));
        }

        let valid_backends = ["azure", "openai", "ollama"];
        for name in &self.inference.chain {
            if !valid_backends.contains(&name.as_str()) {
                return Err(EngineError::Config(format!(
                    "Unknown backend '{}' in chain. Must be one of: {}",
                    name,
                    valid_backends.join(", ")
                )));
            }
        }

        if self.session.call_timeout_secs == 0 {
            return Err(EngineError::Config(
                "call_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.warn_secs, 780);
        assert_eq!(config.session.hardstop_secs, 890);
        assert_eq!(config.inference.chain, vec!["azure", "openai", "ollama"]);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [session]
            warn_secs = 600
            hardstop_secs = 700
            "#,
        )
        .unwrap();

        assert_eq!(config.session.warn_secs, 600);
        assert_eq!(config.session.hardstop_secs, 700);
        assert_eq!(config.speech.stt_model, "nova-2");
        assert_eq!(config.core.log_level, "info");
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = Config::default();
        config.session.warn_secs = 900;
        config.session.hardstop_secs = 890;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_chain() {
        let mut config = Config::default();
        config.inference.chain.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_backend() {
        let mut config = Config::default();
        config.inference.chain = vec!["mainframe".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_path_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();
        fs::write(&path, toml_string).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.session.hardstop_secs, config.session.hardstop_secs);
        assert_eq!(loaded.inference.chain, config.inference.chain);
    }

    #[test]
    fn test_load_from_path_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "session = not valid").unwrap();

        assert!(Config::load_from_path(&path).is_err());
    }
}
