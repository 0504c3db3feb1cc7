//! # chat-core
//!
//! Connection lifecycle and message synchronization for a single chat session.
//!
//! A [`Session`] owns one connection handle and two logical queues:
//!
//! - the **inbound log** ([`InboundLog`]), an append-only record of every text
//!   payload received from the remote endpoint, projected for display as one
//!   newline-terminated transcript;
//! - the **outbound gate** ([`OutboundGate`]), a single pending-input slot that
//!   is validated and transmitted on demand.
//!
//! The crate performs no I/O. Transports plug in through the [`Connector`] and
//! [`ConnectionHandle`] traits and report back by feeding [`ConnectionEvent`]s
//! into [`Session::handle_event`]. All mutation happens through `&mut Session`,
//! so the caller's event loop is the single point of serialization.
//!
//! ```text
//! Idle --open()--> Connecting --Opened--> Open
//!                      |                    |
//!                      +--close()-----------+--> Closing --Closed/Error--> Closed
//!                      +--Closed/Error------+-------------------------------^
//! ```

#![deny(unsafe_code)]

pub mod endpoint;
pub mod errors;
pub mod event;
pub mod inbound;
pub mod outbound;
pub mod session;
pub mod state;
pub mod transport;

#[cfg(test)]
mod testing;

pub use endpoint::{DEFAULT_ENDPOINT, Endpoint};
pub use errors::{EndpointError, SessionError, TransportError};
pub use event::ConnectionEvent;
pub use inbound::{InboundLog, LINE_SEPARATOR};
pub use outbound::{OutboundGate, SendOutcome};
pub use session::Session;
pub use state::SessionState;
pub use transport::{ConnectionHandle, Connector};
