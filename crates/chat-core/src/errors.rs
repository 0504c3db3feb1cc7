//! Error types for the session core.
//!
//! None of these escape as panics: transport failures collapse into the
//! `Closed` state and invalid sends are reported as a
//! [`SendOutcome`](crate::SendOutcome) value.

use thiserror::Error;

use crate::state::SessionState;

/// Errors from parsing an endpoint address.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The address was empty or whitespace only.
    #[error("endpoint address is empty")]
    Empty,
    /// The address does not use the `ws` or `wss` scheme.
    #[error("unsupported endpoint scheme '{scheme}' (expected ws or wss)")]
    UnsupportedScheme {
        /// The scheme that was found.
        scheme: String,
    },
    /// The address has a scheme but no host.
    #[error("endpoint '{address}' has no host")]
    MissingHost {
        /// The offending address.
        address: String,
    },
    /// The address is not a well-formed URL.
    #[error("endpoint '{address}' is not a valid URL: {source}")]
    Malformed {
        /// The offending address.
        address: String,
        /// What the URL parser rejected.
        source: url::ParseError,
    },
}

/// Errors from driving the session state machine.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// `open()` was called on a session that has already left `Idle`.
    #[error("cannot open a session that is {state}")]
    AlreadyStarted {
        /// The state the session was in.
        state: SessionState,
    },
}

/// Errors reported by a connection handle.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The underlying connection no longer accepts frames.
    #[error("connection is no longer accepting frames")]
    ConnectionGone,
}
