//! The chat session state machine.

use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::errors::SessionError;
use crate::event::ConnectionEvent;
use crate::inbound::InboundLog;
use crate::outbound::{OutboundGate, SendOutcome};
use crate::state::SessionState;
use crate::transport::{ConnectionHandle, Connector};

/// One chat connection, from `open()` to terminal close.
///
/// The session exclusively owns its connection handle. The handle is present
/// exactly while the state is `Connecting` or `Open`. A session is never
/// reused: once `Closed`, a new one must be created.
pub struct Session<C: Connector> {
    connector: C,
    handle: Option<C::Handle>,
    state: SessionState,
    inbound: InboundLog,
    outbound: OutboundGate,
}

impl<C: Connector> Session<C> {
    /// Create an idle session that will connect through `connector`.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            handle: None,
            state: SessionState::Idle,
            inbound: InboundLog::new(),
            outbound: OutboundGate::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a connection handle is currently held.
    pub fn has_connection(&self) -> bool {
        self.handle.is_some()
    }

    /// The inbound log.
    pub fn inbound(&self) -> &InboundLog {
        &self.inbound
    }

    /// Display projection of the inbound log.
    pub fn transcript(&self) -> &str {
        self.inbound.render()
    }

    /// Pending, not-yet-sent user text.
    pub fn pending(&self) -> &str {
        self.outbound.pending()
    }

    // ─── Connection manager ──────────────────────────────────────────────

    /// Start the single connection attempt for this session.
    ///
    /// Only valid from `Idle`; in any other state nothing changes and
    /// [`SessionError::AlreadyStarted`] is returned.
    pub fn open(&mut self, endpoint: &Endpoint) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            debug!(state = %self.state, "open ignored: session already started");
            return Err(SessionError::AlreadyStarted { state: self.state });
        }
        self.handle = Some(self.connector.connect(endpoint));
        self.transition(SessionState::Connecting);
        Ok(())
    }

    /// Apply one transport event.
    ///
    /// This is the only place connection events mutate the session. Events
    /// that make no sense in the current state are dropped.
    pub fn handle_event(&mut self, event: ConnectionEvent) {
        match (self.state, event) {
            (SessionState::Connecting, ConnectionEvent::Opened) => {
                self.transition(SessionState::Open);
            }
            (SessionState::Open, ConnectionEvent::Message(payload)) => {
                self.inbound.append(&payload);
                debug!(version = self.inbound.version(), "message appended");
            }
            (
                SessionState::Connecting | SessionState::Open | SessionState::Closing,
                ConnectionEvent::Closed | ConnectionEvent::Error,
            ) => {
                // The connection is already gone; dropping the handle is all
                // the cleanup left.
                drop(self.handle.take());
                self.transition(SessionState::Closed);
            }
            (state, event) => {
                debug!(%state, kind = event.kind(), "event ignored");
            }
        }
    }

    /// Request shutdown. Idempotent.
    ///
    /// With a live handle: asks the transport to close, releases the handle,
    /// and moves to `Closing`; the transport's closing event then completes
    /// the move to `Closed`. Without a handle this is a no-op.
    pub fn close(&mut self) {
        let Some(handle) = self.handle.take() else {
            debug!(state = %self.state, "close ignored: no connection");
            return;
        };
        handle.close();
        self.transition(SessionState::Closing);
    }

    // ─── Outbound gate ───────────────────────────────────────────────────

    /// Replace the pending text. Never validated here.
    pub fn set_pending(&mut self, text: impl Into<String>) {
        self.outbound.set_pending(text);
    }

    /// Transmit the pending text if the session is open and the text is not
    /// blank, then clear it.
    ///
    /// The text goes out untrimmed. Nothing is awaited; delivery is the
    /// transport's business.
    pub fn send(&mut self) -> SendOutcome {
        let payload = match self.outbound.admit(self.state) {
            Ok(payload) => payload,
            Err(outcome) => {
                debug!(?outcome, state = %self.state, "send skipped");
                return outcome;
            }
        };
        let Some(handle) = self.handle.as_mut() else {
            return SendOutcome::NotOpen;
        };
        match handle.send_text(payload) {
            Ok(()) => {
                self.outbound.clear();
                SendOutcome::Sent
            }
            Err(e) => {
                warn!(error = %e, "transport refused outbound frame");
                SendOutcome::Rejected
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "session state changed");
        self.state = next;
        debug_assert_eq!(self.handle.is_some(), self.state.holds_connection());
    }
}

impl<C: Connector> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("has_connection", &self.handle.is_some())
            .field("inbound", &self.inbound.len())
            .field("pending", &self.outbound.pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingConnector;
    use assert_matches::assert_matches;

    fn endpoint() -> Endpoint {
        Endpoint::parse("ws://host/ws").unwrap()
    }

    fn new_session() -> (Session<RecordingConnector>, RecordingConnector) {
        let connector = RecordingConnector::default();
        (Session::new(connector.clone()), connector)
    }

    fn open_session() -> (Session<RecordingConnector>, RecordingConnector) {
        let (mut session, connector) = new_session();
        session.open(&endpoint()).unwrap();
        session.handle_event(ConnectionEvent::Opened);
        (session, connector)
    }

    fn assert_handle_invariant(session: &Session<RecordingConnector>) {
        assert_eq!(session.has_connection(), session.state().holds_connection());
    }

    // ── Connection manager ──────────────────────────────────────────

    #[test]
    fn new_session_is_idle() {
        let (session, connector) = new_session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.has_connection());
        assert_eq!(session.transcript(), "");
        assert_eq!(session.pending(), "");
        assert!(connector.attempts().is_empty());
    }

    #[test]
    fn open_moves_to_connecting_with_one_attempt() {
        let (mut session, connector) = new_session();
        session.open(&endpoint()).unwrap();
        assert_eq!(session.state(), SessionState::Connecting);
        assert!(session.has_connection());
        assert_eq!(connector.attempts(), vec!["ws://host/ws".to_string()]);
    }

    #[test]
    fn open_twice_is_rejected_without_second_attempt() {
        let (mut session, connector) = new_session();
        session.open(&endpoint()).unwrap();
        assert_matches!(
            session.open(&endpoint()),
            Err(SessionError::AlreadyStarted {
                state: SessionState::Connecting
            })
        );
        assert_eq!(connector.attempts().len(), 1);
        assert_eq!(session.state(), SessionState::Connecting);
    }

    #[test]
    fn open_after_close_is_rejected() {
        let (mut session, connector) = open_session();
        session.handle_event(ConnectionEvent::Closed);
        assert_matches!(
            session.open(&endpoint()),
            Err(SessionError::AlreadyStarted {
                state: SessionState::Closed
            })
        );
        assert_eq!(connector.attempts().len(), 1);
    }

    #[test]
    fn opened_event_moves_to_open() {
        let (session, _) = open_session();
        assert_eq!(session.state(), SessionState::Open);
        assert!(session.has_connection());
    }

    #[test]
    fn opened_event_outside_connecting_is_ignored() {
        let (mut session, _) = new_session();
        session.handle_event(ConnectionEvent::Opened);
        assert_eq!(session.state(), SessionState::Idle);

        let (mut session, _) = open_session();
        session.handle_event(ConnectionEvent::Opened);
        assert_eq!(session.state(), SessionState::Open);
    }

    #[test]
    fn closed_event_while_open_terminates() {
        let (mut session, connector) = open_session();
        session.handle_event(ConnectionEvent::Closed);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.has_connection());
        // Remote close: no shutdown request needed.
        assert_eq!(connector.closes(), 0);
    }

    #[test]
    fn error_event_while_connecting_terminates() {
        let (mut session, _) = new_session();
        session.open(&endpoint()).unwrap();
        session.handle_event(ConnectionEvent::Error);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.has_connection());
    }

    #[test]
    fn error_and_clean_close_are_indistinguishable() {
        let (mut clean, _) = open_session();
        clean.handle_event(ConnectionEvent::Message("a".into()));
        clean.handle_event(ConnectionEvent::Closed);

        let (mut failed, _) = open_session();
        failed.handle_event(ConnectionEvent::Message("a".into()));
        failed.handle_event(ConnectionEvent::Error);

        assert_eq!(clean.state(), failed.state());
        assert_eq!(clean.transcript(), failed.transcript());
        assert_eq!(clean.has_connection(), failed.has_connection());
    }

    #[test]
    fn closed_is_terminal() {
        let (mut session, _) = open_session();
        session.handle_event(ConnectionEvent::Error);
        for event in [
            ConnectionEvent::Opened,
            ConnectionEvent::Message("late".into()),
            ConnectionEvent::Closed,
            ConnectionEvent::Error,
        ] {
            session.handle_event(event);
            assert_eq!(session.state(), SessionState::Closed);
        }
        assert_eq!(session.transcript(), "");
    }

    #[test]
    fn close_requests_shutdown_and_moves_to_closing() {
        let (mut session, connector) = open_session();
        session.close();
        assert_eq!(session.state(), SessionState::Closing);
        assert!(!session.has_connection());
        assert_eq!(connector.closes(), 1);

        session.handle_event(ConnectionEvent::Closed);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.has_connection());
    }

    #[test]
    fn close_twice_is_safe() {
        let (mut session, connector) = open_session();
        session.close();
        session.handle_event(ConnectionEvent::Closed);
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.has_connection());
        assert_eq!(connector.closes(), 1);
    }

    #[test]
    fn close_while_closing_is_noop() {
        let (mut session, connector) = open_session();
        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Closing);
        assert_eq!(connector.closes(), 1);
    }

    #[test]
    fn close_on_idle_is_noop() {
        let (mut session, connector) = new_session();
        session.close();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(connector.closes(), 0);
    }

    #[test]
    fn close_before_opened_never_reaches_open() {
        let (mut session, connector) = new_session();
        session.open(&endpoint()).unwrap();
        let mut seen = vec![session.state()];

        session.close();
        seen.push(session.state());
        // The transport's handshake may still complete before it notices.
        session.handle_event(ConnectionEvent::Opened);
        seen.push(session.state());
        session.handle_event(ConnectionEvent::Closed);
        seen.push(session.state());

        assert!(!seen.contains(&SessionState::Open));
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(connector.closes(), 1);
    }

    #[test]
    fn handle_invariant_holds_through_lifecycle() {
        let (mut session, _) = new_session();
        assert_handle_invariant(&session);
        session.open(&endpoint()).unwrap();
        assert_handle_invariant(&session);
        session.handle_event(ConnectionEvent::Opened);
        assert_handle_invariant(&session);
        session.handle_event(ConnectionEvent::Message("x".into()));
        assert_handle_invariant(&session);
        session.close();
        assert_handle_invariant(&session);
        session.handle_event(ConnectionEvent::Error);
        assert_handle_invariant(&session);
    }

    // ── Inbound buffer ──────────────────────────────────────────────

    #[test]
    fn messages_append_in_arrival_order() {
        let (mut session, _) = open_session();
        for payload in ["one", "two", "two", " three "] {
            session.handle_event(ConnectionEvent::Message(payload.into()));
        }
        assert_eq!(session.transcript(), "one\ntwo\ntwo\n three \n");
        assert_eq!(session.inbound().version(), 4);
    }

    #[test]
    fn messages_outside_open_are_dropped() {
        let (mut session, _) = new_session();
        session.open(&endpoint()).unwrap();
        session.handle_event(ConnectionEvent::Message("early".into()));
        session.handle_event(ConnectionEvent::Opened);
        session.close();
        session.handle_event(ConnectionEvent::Message("late".into()));
        assert_eq!(session.transcript(), "");
    }

    #[test]
    fn log_survives_close() {
        let (mut session, _) = open_session();
        session.handle_event(ConnectionEvent::Message("kept".into()));
        session.handle_event(ConnectionEvent::Closed);
        assert_eq!(session.transcript(), "kept\n");
    }

    // ── Outbound gate ───────────────────────────────────────────────

    #[test]
    fn send_transmits_untrimmed_and_clears() {
        let (mut session, connector) = open_session();
        session.set_pending("  Hi there ");
        assert_eq!(session.send(), SendOutcome::Sent);
        assert_eq!(connector.sent(), vec!["  Hi there ".to_string()]);
        assert_eq!(session.pending(), "");
    }

    #[test]
    fn send_twice_transmits_once() {
        let (mut session, connector) = open_session();
        session.set_pending("Hi there");
        assert_eq!(session.send(), SendOutcome::Sent);
        assert_eq!(session.send(), SendOutcome::Blank);
        assert_eq!(connector.sent().len(), 1);
    }

    #[test]
    fn blank_send_keeps_pending() {
        let (mut session, connector) = open_session();
        for text in ["", "   "] {
            session.set_pending(text);
            assert_eq!(session.send(), SendOutcome::Blank);
            assert_eq!(session.pending(), text);
        }
        assert!(connector.sent().is_empty());
    }

    #[test]
    fn send_before_open_is_noop() {
        let (mut session, connector) = new_session();
        session.set_pending("too soon");
        assert_eq!(session.send(), SendOutcome::NotOpen);
        session.open(&endpoint()).unwrap();
        assert_eq!(session.send(), SendOutcome::NotOpen);
        assert_eq!(session.pending(), "too soon");
        assert!(connector.sent().is_empty());
    }

    #[test]
    fn send_after_close_event_is_noop() {
        let (mut session, connector) = open_session();
        session.set_pending("after close");
        session.handle_event(ConnectionEvent::Closed);
        assert_eq!(session.send(), SendOutcome::NotOpen);
        assert_eq!(session.pending(), "after close");
        assert!(connector.sent().is_empty());
    }

    #[test]
    fn send_while_closing_is_noop() {
        let (mut session, connector) = open_session();
        session.close();
        session.set_pending("bye");
        assert_eq!(session.send(), SendOutcome::NotOpen);
        assert!(connector.sent().is_empty());
    }

    #[test]
    fn refused_send_keeps_pending() {
        let (mut session, connector) = open_session();
        connector.refuse_sends();
        session.set_pending("lost");
        assert_eq!(session.send(), SendOutcome::Rejected);
        assert_eq!(session.pending(), "lost");
        assert_eq!(session.state(), SessionState::Open);
    }

    // ── End to end ──────────────────────────────────────────────────

    #[test]
    fn hello_scenario() {
        let (mut session, connector) = new_session();
        session.open(&endpoint()).unwrap();
        assert_eq!(session.state(), SessionState::Connecting);

        session.handle_event(ConnectionEvent::Opened);
        assert_eq!(session.state(), SessionState::Open);

        session.handle_event(ConnectionEvent::Message("Hello".into()));
        assert_eq!(session.transcript(), "Hello\n");

        session.set_pending("Hi there");
        assert_eq!(session.send(), SendOutcome::Sent);
        assert_eq!(connector.sent(), vec!["Hi there".to_string()]);
        assert_eq!(session.pending(), "");

        session.handle_event(ConnectionEvent::Closed);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!session.has_connection());
    }

    #[test]
    fn debug_output_hides_handle() {
        let (session, _) = open_session();
        let out = format!("{session:?}");
        assert!(out.contains("Open"));
        assert!(out.contains("has_connection: true"));
    }
}
