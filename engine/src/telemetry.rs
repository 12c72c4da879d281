//! Telemetry and Observability
//!
//! Sets up `tracing-subscriber` for structured logging. Log level comes
//! from config with an `RUST_LOG` override; debug builds get pretty
//! terminal output, release builds get JSON with span context.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with the given log level from config.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter > default "info".
pub fn init_telemetry_with_level(log_level: &str) {
    let default_filter = format!("{log_level},viva_engine={log_level}");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(false))
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .ok();
    }
}

/// Initialize the tracing subscriber with default settings.
///
/// Falls back to "info" if no `RUST_LOG` env var is set. Prefer
/// `init_telemetry_with_level` once config is available.
pub fn init_telemetry() {
    init_telemetry_with_level("info");
}
