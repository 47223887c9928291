pub mod connection;
pub mod protocol;

use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, error, info, warn};

use crate::config::client::ClientConfig;
use crate::models::Direction;
pub use connection::{Connection, ConnectionState, SocketHandler, Transport};
pub use protocol::{Command, ProtocolError, ServerEvent};

#[derive(Error, Debug)]
pub enum SocketError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

enum Intent {
    Send(Command),
    Disconnect,
}

/// Frames queued by the connection state machine, flushed by the driver
/// after every step.
#[derive(Debug, Default)]
pub struct Outbox {
    frames: Vec<Message>,
}

impl Transport for Outbox {
    fn send(&mut self, text: String) {
        self.frames.push(Message::Text(text.into()));
    }

    fn close(&mut self) {
        self.frames.push(Message::Close(None));
    }
}

struct LiveConnection {
    intents: mpsc::UnboundedSender<Intent>,
    task: JoinHandle<()>,
}

/// Client side of a game session. Holds at most one live connection.
pub struct GameSocket {
    server_url: String,
    heartbeat: Duration,
    live: Option<LiveConnection>,
}

impl GameSocket {
    pub fn new(server_url: impl Into<String>, heartbeat: Duration) -> Self {
        GameSocket {
            server_url: server_url.into(),
            heartbeat,
            live: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        GameSocket::new(
            config.server_url.clone(),
            Duration::from_millis(config.heartbeat_interval_ms),
        )
    }

    /// Open a connection for `game_id` and hand inbound events to `handler`.
    ///
    /// Does nothing and returns `false` while a previous connection of this
    /// socket is still alive.
    pub fn connect<H>(&mut self, game_id: &str, player_name: &str, handler: H) -> bool
    where
        H: SocketHandler + Send + 'static,
    {
        if self.is_connected() {
            debug!(game_id, "Already connected, ignoring connect");
            return false;
        }

        let url = protocol::session_url(&self.server_url, game_id, player_name);
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(url, self.heartbeat, handler, rx));
        self.live = Some(LiveConnection { intents: tx, task });
        true
    }

    pub fn is_connected(&self) -> bool {
        self.live
            .as_ref()
            .is_some_and(|live| !live.task.is_finished())
    }

    pub fn disconnect(&self) {
        self.intent(Intent::Disconnect);
    }

    /// Wait until the current connection has closed and its close callback
    /// has run.
    pub async fn closed(&mut self) {
        if let Some(live) = self.live.take() {
            if let Err(e) = live.task.await {
                error!("Connection task failed: {}", e);
            }
        }
    }

    pub fn ping(&self) {
        self.intent(Intent::Send(Command::Ping));
    }

    pub fn move_player(&self, direction: Direction) {
        self.intent(Intent::Send(Command::MovePlayer { direction }));
    }

    pub fn reveal_area(&self) {
        self.intent(Intent::Send(Command::RevealArea));
    }

    pub fn flag_area(&self) {
        self.intent(Intent::Send(Command::FlagArea));
    }

    pub fn revive_player(&self) {
        self.intent(Intent::Send(Command::RevivePlayer));
    }

    pub fn change_camera(&self) {
        self.intent(Intent::Send(Command::ChangeCamera));
    }

    pub fn reset_game(&self) {
        self.intent(Intent::Send(Command::ResetGame));
    }

    fn intent(&self, intent: Intent) {
        // A finished task has dropped its receiver; the intent is discarded.
        if let Some(live) = &self.live {
            let _ = live.intents.send(intent);
        }
    }
}

/// Resolves once a disconnect is requested or the owning socket is dropped.
async fn wait_for_disconnect(intents: &mut mpsc::UnboundedReceiver<Intent>) {
    loop {
        match intents.recv().await {
            Some(Intent::Send(command)) => {
                debug!(command = command.name(), "Dropping command, connection not open")
            }
            Some(Intent::Disconnect) | None => return,
        }
    }
}

async fn flush<S>(write: &mut S, outbox: &mut Outbox) -> Result<(), SocketError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    for frame in outbox.frames.drain(..) {
        write.send(frame).await?;
    }
    Ok(())
}

async fn run_connection<H: SocketHandler>(
    url: String,
    heartbeat: Duration,
    handler: H,
    mut intents: mpsc::UnboundedReceiver<Intent>,
) {
    let mut conn = Connection::new(Outbox::default(), handler);
    info!(%url, "Connecting");

    // Intents queued during the handshake are drained before the connect
    // result is taken, so none of them reach the server.
    let ws_stream = tokio::select! {
        biased;
        _ = wait_for_disconnect(&mut intents) => {
            info!(%url, "Disconnect requested while connecting");
            conn.disconnect();
            conn.closed();
            return;
        }
        result = tokio_tungstenite::connect_async(url.as_str()) => match result {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                error!(%url, "Connection failed: {}", e);
                conn.closed();
                return;
            }
        },
    };

    let (mut write, mut read) = ws_stream.split();
    conn.opened();
    info!(%url, "WebSocket connected");

    let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
    let mut intents_open = true;

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = conn.receive(&text) {
                        warn!("Discarding malformed event: {}", e);
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // Binary and control frames carry no events
                Some(Err(e)) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
            },
            intent = intents.recv(), if intents_open => match intent {
                Some(Intent::Send(command)) => {
                    conn.send(command);
                }
                Some(Intent::Disconnect) => conn.disconnect(),
                None => {
                    intents_open = false;
                    conn.disconnect();
                }
            },
            _ = ticker.tick(), if conn.is_open() => {
                conn.ping();
            }
        }

        if let Err(e) = flush(&mut write, conn.transport_mut()).await {
            warn!("Write failed: {}", e);
            break;
        }
    }

    info!(%url, by_client = conn.disconnected_by_client(), "WebSocket disconnected");
    conn.closed();
}
