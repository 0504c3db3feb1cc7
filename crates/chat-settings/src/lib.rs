//! # chat-settings
//!
//! Configuration for the chat session client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ChatSettings::default()`]
//! 2. **User file**: `~/.chat-session/settings.json` (laid over the defaults)
//! 3. **Environment variables**: `CHAT_*` overrides (highest priority)
//!
//! Command-line flags are applied on top by the binary.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, load_settings_from_path, overlay, settings_path,
};
pub use types::*;
