//! # chat-logging
//!
//! Structured diagnostic logging with `tracing`.
//!
//! Output goes to stderr, so stdout can carry the chat transcript unmixed.
//! `RUST_LOG` wins over the configured level when it is set and valid.

#![deny(unsafe_code)]

use chat_settings::LoggingSettings;
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` if present, otherwise the configured level.
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()))
}

/// Initialize the global tracing subscriber.
///
/// Call once at startup. Subsequent calls are no-ops and return `false`.
pub fn init_subscriber(settings: &LoggingSettings) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .with_target(true)
        .with_writer(std::io::stderr);

    // try_init fails only when a global subscriber is already installed
    if settings.json {
        builder.json().with_current_span(true).try_init().is_ok()
    } else {
        builder.compact().try_init().is_ok()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
