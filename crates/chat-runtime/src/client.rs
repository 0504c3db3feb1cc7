//! Session actor.
//!
//! [`spawn_session`] moves a [`Session`] into a task that owns it outright.
//! Connection events and user commands are both funneled through that task's
//! `select!` loop, so every mutation is applied one at a time and in arrival
//! order. Observers never touch the session: after each step the task publishes
//! a small [`SessionView`] on a watch channel, and received text is fetched on
//! demand with [`ChatHandle::entries_since`].

use chat_core::{ConnectionEvent, Connector, Endpoint, SendOutcome, Session, SessionState};
use chat_settings::ConnectionSettings;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::ws::{TransportOptions, WsConnector};

/// Capacity of the connection event channel.
const EVENT_QUEUE: usize = 256;

/// Runtime tuning for one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientOptions {
    /// Transport timing.
    pub transport: TransportOptions,
    /// Capacity of the user command channel.
    pub command_queue: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from(&ConnectionSettings::default())
    }
}

impl From<&ConnectionSettings> for ClientOptions {
    fn from(settings: &ConnectionSettings) -> Self {
        Self {
            transport: TransportOptions::from(settings),
            command_queue: settings.command_queue,
        }
    }
}

/// User intent, applied by the session task in arrival order.
#[derive(Debug)]
pub enum SessionCommand {
    /// Replace the pending input text.
    SetPending(String),
    /// Transmit the pending text; the outcome is sent back on the channel.
    Send(oneshot::Sender<SendOutcome>),
    /// Begin a graceful close.
    Close,
    /// Fetch the messages received after `version`.
    EntriesSince {
        /// Last version the caller has seen.
        version: u64,
        /// Receives the new entries, oldest first.
        reply: oneshot::Sender<Vec<String>>,
    },
}

/// Snapshot of the session published after every processed event or command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionView {
    /// Lifecycle state.
    pub state: SessionState,
    /// Number of messages received so far.
    pub version: u64,
    /// Current content of the pending input slot.
    pub pending: String,
}

impl SessionView {
    fn capture<C: Connector>(session: &Session<C>) -> Self {
        Self {
            state: session.state(),
            version: session.inbound().version(),
            pending: session.pending().to_owned(),
        }
    }

    fn matches<C: Connector>(&self, session: &Session<C>) -> bool {
        self.state == session.state()
            && self.version == session.inbound().version()
            && self.pending == session.pending()
    }
}

/// Client side of a running session task.
///
/// The task keeps answering reads after the session reaches `Closed` and
/// exits once the handle is dropped or joined.
pub struct ChatHandle {
    commands: mpsc::Sender<SessionCommand>,
    view: watch::Receiver<SessionView>,
    task: JoinHandle<()>,
}

/// Start a session against `endpoint` and begin connecting immediately.
///
/// Must be called from within a tokio runtime.
pub fn spawn_session(endpoint: Endpoint, options: ClientOptions) -> ChatHandle {
    let (command_tx, command_rx) = mpsc::channel(options.command_queue.max(1));
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);

    let session = Session::new(WsConnector::new(event_tx, options.transport));
    let (view_tx, view_rx) = watch::channel(SessionView::capture(&session));
    let task = tokio::spawn(run_session(session, endpoint, command_rx, event_rx, view_tx));

    ChatHandle {
        commands: command_tx,
        view: view_rx,
        task,
    }
}

impl ChatHandle {
    /// Replace the pending input. Returns `false` once the session task is gone.
    pub async fn set_pending(&self, text: impl Into<String>) -> bool {
        self.commands
            .send(SessionCommand::SetPending(text.into()))
            .await
            .is_ok()
    }

    /// Transmit the pending input.
    pub async fn send(&self) -> SendOutcome {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands.send(SessionCommand::Send(reply_tx)).await.is_err() {
            return SendOutcome::NotOpen;
        }
        reply_rx.await.unwrap_or(SendOutcome::NotOpen)
    }

    /// Set the pending input and transmit it in one step.
    pub async fn submit(&self, text: impl Into<String>) -> SendOutcome {
        if !self.set_pending(text).await {
            return SendOutcome::NotOpen;
        }
        self.send().await
    }

    /// Request a graceful close. Idempotent.
    pub async fn close(&self) {
        let _ = self.commands.send(SessionCommand::Close).await;
    }

    /// Messages received after `version`, oldest first.
    pub async fn entries_since(&self, version: u64) -> Vec<String> {
        let (reply, entries) = oneshot::channel();
        if self
            .commands
            .send(SessionCommand::EntriesSince { version, reply })
            .await
            .is_err()
        {
            return Vec::new();
        }
        entries.await.unwrap_or_default()
    }

    /// Latest published snapshot.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Latest published state.
    pub fn state(&self) -> SessionState {
        self.view.borrow().state
    }

    /// Watch receiver notified after every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Wait until the session reaches `Closed`.
    pub async fn closed(&self) {
        let mut view = self.view.clone();
        let _ = view.wait_for(|v| v.state.is_terminal()).await;
    }

    /// Close the session (if still live) and wait for the task to finish.
    pub async fn join(self) {
        drop(self.commands);
        if let Err(e) = self.task.await {
            warn!(error = %e, "session task failed");
        }
    }
}

#[instrument(skip_all, fields(endpoint = %endpoint))]
async fn run_session<C: Connector>(
    mut session: Session<C>,
    endpoint: Endpoint,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut events: mpsc::Receiver<ConnectionEvent>,
    view: watch::Sender<SessionView>,
) {
    if let Err(e) = session.open(&endpoint) {
        warn!(error = %e, "session not opened");
        return;
    }
    publish(&view, &session);

    let mut accepting = true;
    while !session.state().is_terminal() {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    // the connector holds a sender, so this only happens on teardown
                    break;
                };
                session.handle_event(event);
            }
            command = commands.recv(), if accepting => match command {
                Some(command) => apply(&mut session, command, &view),
                None => {
                    debug!("all handles dropped, closing");
                    accepting = false;
                    session.close();
                }
            },
        }
        publish(&view, &session);
    }
    info!(messages = session.inbound().len(), "session ended");

    // Sends now report NotOpen; reads still see the full log.
    while let Some(command) = commands.recv().await {
        apply(&mut session, command, &view);
        publish(&view, &session);
    }
}

fn apply<C: Connector>(
    session: &mut Session<C>,
    command: SessionCommand,
    view: &watch::Sender<SessionView>,
) {
    match command {
        SessionCommand::SetPending(text) => session.set_pending(text),
        SessionCommand::Send(reply) => {
            let outcome = session.send();
            // observers see the cleared slot before the caller resumes
            publish(view, session);
            let _ = reply.send(outcome);
        }
        SessionCommand::Close => session.close(),
        SessionCommand::EntriesSince { version, reply } => {
            let entries = session
                .inbound()
                .entries_since(version)
                .map(str::to_owned)
                .collect();
            let _ = reply.send(entries);
        }
    }
}

fn publish<C: Connector>(view: &watch::Sender<SessionView>, session: &Session<C>) {
    let _ = view.send_if_modified(|current| {
        if current.matches(session) {
            return false;
        }
        *current = SessionView::capture(session);
        true
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
