//! Events a transport delivers to the session.

/// A notification from the transport about the connection.
///
/// A transport reports, in order: at most one `Opened`, any number of
/// `Message`s, then exactly one of `Closed` or `Error`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection handshake completed.
    Opened,
    /// A text payload arrived.
    Message(String),
    /// The connection ended cleanly, or a requested shutdown completed.
    Closed,
    /// The connection failed to establish or broke mid-session.
    Error,
}

impl ConnectionEvent {
    /// Short name for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Message(_) => "message",
            Self::Closed => "closed",
            Self::Error => "error",
        }
    }

    /// Whether this event ends the connection.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Error)
    }
}
