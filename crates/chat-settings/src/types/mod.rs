//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may specify any subset of fields and the rest keep their defaults.

mod connection;
mod logging;

pub use connection::*;
pub use logging::*;

use chat_core::{DEFAULT_ENDPOINT, Endpoint, EndpointError};
use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "endpoint": "ws://localhost:8000/ws",
///   "connection": { "connectTimeoutMs": 5000 },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    /// WebSocket address of the chat endpoint.
    pub endpoint: String,
    /// Transport timing and queueing.
    pub connection: ConnectionSettings,
    /// Diagnostic log output.
    pub logging: LoggingSettings,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connection: ConnectionSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ChatSettings {
    /// Parse the configured endpoint.
    pub fn endpoint(&self) -> Result<Endpoint, EndpointError> {
        Endpoint::parse(&self.endpoint)
    }
}
