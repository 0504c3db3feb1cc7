//! WebSocket transport: thin client over `tokio-tungstenite`.
//!
//! Each [`WsConnector::connect`] spawns one task that owns the socket. The
//! task talks to its [`WsHandle`] through a command channel and reports to the
//! session through the shared event channel: `Opened`, then `Message`s, then
//! exactly one `Closed` or `Error`.

use std::time::Duration;

use chat_core::{ConnectionEvent, ConnectionHandle, Connector, Endpoint, TransportError};
use chat_settings::ConnectionSettings;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, instrument, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Transport timing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportOptions {
    /// Upper bound on the opening handshake.
    pub connect_timeout: Duration,
    /// How long a graceful close waits for the peer's Close frame.
    pub close_timeout: Duration,
    /// Keep-alive Ping interval; `None` disables pings.
    pub ping_interval: Option<Duration>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::from(&ConnectionSettings::default())
    }
}

impl From<&ConnectionSettings> for TransportOptions {
    fn from(settings: &ConnectionSettings) -> Self {
        Self {
            connect_timeout: settings.connect_timeout(),
            close_timeout: settings.close_timeout(),
            ping_interval: settings.ping_interval(),
        }
    }
}

/// Instruction from a [`WsHandle`] to its connection task.
#[derive(Debug)]
enum Command {
    Send(String),
    Close,
}

/// Starts WebSocket connections that report into one event channel.
///
/// Must be used from within a tokio runtime.
pub struct WsConnector {
    events: mpsc::Sender<ConnectionEvent>,
    options: TransportOptions,
}

impl WsConnector {
    /// Create a connector delivering events to `events`.
    pub fn new(events: mpsc::Sender<ConnectionEvent>, options: TransportOptions) -> Self {
        Self { events, options }
    }
}

impl Connector for WsConnector {
    type Handle = WsHandle;

    fn connect(&mut self, endpoint: &Endpoint) -> WsHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(
            endpoint.clone(),
            cmd_rx,
            self.events.clone(),
            self.options.clone(),
        ));
        WsHandle {
            cmd_tx,
            _task: task,
        }
    }
}

/// Handle to one WebSocket connection task.
///
/// Dropping the handle has the same effect as [`ConnectionHandle::close`].
pub struct WsHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    _task: JoinHandle<()>,
}

impl ConnectionHandle for WsHandle {
    fn send_text(&mut self, payload: &str) -> Result<(), TransportError> {
        self.cmd_tx
            .send(Command::Send(payload.to_owned()))
            .map_err(|_| TransportError::ConnectionGone)
    }

    fn close(self) {
        // A closed channel means the task already finished and reported.
        let _ = self.cmd_tx.send(Command::Close);
    }
}

/// Outcome of the opening handshake.
enum Establish {
    Connected(Box<WsStream>),
    Aborted,
    Failed,
}

/// Connection task: handshake, pump frames, report one terminal event.
#[instrument(skip_all, fields(endpoint = %endpoint))]
async fn run_connection(
    endpoint: Endpoint,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::Sender<ConnectionEvent>,
    options: TransportOptions,
) {
    let terminal = match establish(&endpoint, &mut commands, options.connect_timeout).await {
        Establish::Connected(ws) => {
            info!("connected");
            if events.send(ConnectionEvent::Opened).await.is_err() {
                debug!("session gone before open was reported");
            }
            pump(*ws, &mut commands, &events, &options).await
        }
        Establish::Aborted => {
            debug!("connection attempt aborted");
            ConnectionEvent::Closed
        }
        Establish::Failed => ConnectionEvent::Error,
    };
    debug!(kind = terminal.kind(), "connection task finished");
    let _ = events.send(terminal).await;
}

/// Run the handshake, bounded by `timeout` and abortable by a close request.
async fn establish(
    endpoint: &Endpoint,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    timeout: Duration,
) -> Establish {
    let connect = tokio::time::timeout(timeout, connect_async(endpoint.as_str()));
    tokio::pin!(connect);

    loop {
        tokio::select! {
            result = &mut connect => {
                return match result {
                    Ok(Ok((ws, _response))) => Establish::Connected(Box::new(ws)),
                    Ok(Err(e)) => {
                        warn!(error = %e, "connection failed");
                        Establish::Failed
                    }
                    Err(_) => {
                        warn!(timeout_ms = timeout.as_millis(), "connection timed out");
                        Establish::Failed
                    }
                };
            }
            cmd = commands.recv() => match cmd {
                Some(Command::Send(_)) => debug!("send before open dropped"),
                Some(Command::Close) | None => return Establish::Aborted,
            },
        }
    }
}

/// Forward frames both ways until either side ends the connection.
async fn pump(
    ws: WsStream,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    events: &mpsc::Sender<ConnectionEvent>,
    options: &TransportOptions,
) -> ConnectionEvent {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let mut ping = options
        .ping_interval
        .map(|period| tokio::time::interval_at(Instant::now() + period, period));

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(Command::Send(text)) => {
                    if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                        warn!(error = %e, "send failed");
                        return ConnectionEvent::Error;
                    }
                }
                Some(Command::Close) | None => {
                    return shutdown(&mut ws_tx, &mut ws_rx, options.close_timeout).await;
                }
            },
            frame = ws_rx.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text.to_string(),
                    Some(Ok(Message::Binary(data))) => {
                        if let Ok(s) = std::str::from_utf8(&data) {
                            s.to_string()
                        } else {
                            info!(len = data.len(), "received non-UTF8 binary frame");
                            continue;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "server sent close frame");
                        // flushes the queued close reply
                        let _ = tokio::time::timeout(options.close_timeout, ws_tx.close()).await;
                        return ConnectionEvent::Closed;
                    }
                    // tungstenite answers pings on its own
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!(error = %e, "connection error");
                        return ConnectionEvent::Error;
                    }
                    None => {
                        info!("connection ended");
                        return ConnectionEvent::Closed;
                    }
                };
                if events.send(ConnectionEvent::Message(text)).await.is_err() {
                    debug!("session gone, closing");
                    return shutdown(&mut ws_tx, &mut ws_rx, options.close_timeout).await;
                }
            }
            () = next_ping(&mut ping) => {
                if let Err(e) = ws_tx.send(Message::Ping(Vec::new().into())).await {
                    warn!(error = %e, "ping failed");
                    return ConnectionEvent::Error;
                }
                debug!("sent ping");
            }
        }
    }
}

/// Graceful close: send a Close frame, then drain until the peer answers.
async fn shutdown(ws_tx: &mut WsSink, ws_rx: &mut WsSource, timeout: Duration) -> ConnectionEvent {
    if let Err(e) = ws_tx.send(Message::Close(None)).await {
        debug!(error = %e, "close frame not sent");
        return ConnectionEvent::Closed;
    }

    let drain = async {
        while let Some(Ok(frame)) = ws_rx.next().await {
            if frame.is_close() {
                break;
            }
        }
    };
    if tokio::time::timeout(timeout, drain).await.is_err() {
        debug!(timeout_ms = timeout.as_millis(), "peer did not acknowledge close");
    }
    info!("connection closed");
    ConnectionEvent::Closed
}

/// Resolve on the next keep-alive tick; never resolves when pings are off.
async fn next_ping(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            let _ = interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
