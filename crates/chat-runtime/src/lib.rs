//! # chat-runtime
//!
//! Async plumbing around [`chat_core::Session`]:
//!
//! - [`ws`]: a `tokio-tungstenite` transport implementing
//!   [`chat_core::Connector`]. One task per connection attempt, reporting
//!   back through a bounded event channel.
//! - [`client`]: the session actor. A single task owns the session and applies
//!   connection events and user commands one at a time, then republishes a
//!   [`SessionView`] on a watch channel.

#![deny(unsafe_code)]

pub mod client;
pub mod ws;

pub use client::{ChatHandle, ClientOptions, SessionCommand, SessionView, spawn_session};
pub use ws::{TransportOptions, WsConnector, WsHandle};
