//! Seams between the session and a concrete transport.

use crate::endpoint::Endpoint;
use crate::errors::TransportError;

/// Starts connection attempts.
///
/// `connect` must not block: it starts exactly one attempt and returns a
/// handle at once. Progress is reported later as
/// [`ConnectionEvent`](crate::ConnectionEvent)s fed to
/// [`Session::handle_event`](crate::Session::handle_event), including failure
/// to establish (`Error`).
pub trait Connector {
    /// Handle type for one connection.
    type Handle: ConnectionHandle;

    /// Begin a connection attempt to `endpoint`.
    fn connect(&mut self, endpoint: &Endpoint) -> Self::Handle;
}

/// A live connection, exclusively owned by one session.
pub trait ConnectionHandle {
    /// Queue one text frame for transmission. Does not wait for delivery.
    fn send_text(&mut self, payload: &str) -> Result<(), TransportError>;

    /// Request shutdown. The transport reports completion with a terminal
    /// event; dropping a handle without calling this must behave the same.
    fn close(self);
}
