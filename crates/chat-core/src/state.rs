//! Session connection state.

use std::fmt;

/// Lifecycle state of a [`Session`](crate::Session).
///
/// `Idle` is initial and `Closed` is terminal; no transition leaves `Closed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, no connection attempted yet.
    #[default]
    Idle,
    /// A connection attempt is in flight.
    Connecting,
    /// The connection is established and can carry messages.
    Open,
    /// Shutdown was requested; waiting for the transport to finish.
    Closing,
    /// Terminal. Reached on clean close, error, or completed shutdown.
    Closed,
}

impl SessionState {
    /// Whether the session has reached its terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether a session in this state owns a live connection handle.
    pub const fn holds_connection(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }

    /// Lowercase name, as used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
