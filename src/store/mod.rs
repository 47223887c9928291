pub mod view;

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::models::{Game, Player};
use crate::socket::{ServerEvent, SocketHandler};
pub use view::GameView;

const NOTIFICATION_LOG_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Waiting,
    Connecting,
    Open,
    Disconnecting,
    Disconnected,
}

/// Socket callbacks turned into values, so they can be applied by whoever
/// owns the session state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Opened,
    GameUpdated(Game),
    PlayersUpdated {
        my_player_id: String,
        players: Vec<Player>,
    },
    Notification(String),
    Closed {
        by_client: bool,
    },
}

impl From<ServerEvent> for SessionEvent {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::GameUpdated(game) => SessionEvent::GameUpdated(game),
            ServerEvent::PlayersUpdated {
                my_player_id,
                players,
            } => SessionEvent::PlayersUpdated {
                my_player_id,
                players,
            },
            ServerEvent::NotificationSent(message) => SessionEvent::Notification(message),
        }
    }
}

/// Socket handler that forwards every callback into a channel.
pub struct EventForwarder {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventForwarder {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventForwarder { tx }, rx)
    }

    fn forward(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("Session event receiver gone, dropping event");
        }
    }
}

impl SocketHandler for EventForwarder {
    fn on_open(&mut self) {
        self.forward(SessionEvent::Opened);
    }

    fn on_game_updated(&mut self, game: Game) {
        self.forward(SessionEvent::GameUpdated(game));
    }

    fn on_players_updated(&mut self, my_player_id: String, players: Vec<Player>) {
        self.forward(SessionEvent::PlayersUpdated {
            my_player_id,
            players,
        });
    }

    fn on_notification(&mut self, message: String) {
        self.forward(SessionEvent::Notification(message));
    }

    fn on_close(&mut self, disconnected_by_client: bool) {
        self.forward(SessionEvent::Closed {
            by_client: disconnected_by_client,
        });
    }
}

/// Latest known session state. Snapshots are swapped, never edited.
#[derive(Debug)]
pub struct GameStore {
    status: SessionStatus,
    my_player_id: Option<String>,
    players: Option<Vec<Player>>,
    game: Option<Arc<Game>>,
    notifications: VecDeque<String>,
}

impl Default for GameStore {
    fn default() -> Self {
        GameStore {
            status: SessionStatus::Waiting,
            my_player_id: None,
            players: None,
            game: None,
            notifications: VecDeque::new(),
        }
    }
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn game(&self) -> Option<&Arc<Game>> {
        self.game.as_ref()
    }

    pub fn players(&self) -> &[Player] {
        self.players.as_deref().unwrap_or(&[])
    }

    pub fn my_player_id(&self) -> Option<&str> {
        self.my_player_id.as_deref()
    }

    pub fn my_player(&self) -> Option<&Player> {
        let id = self.my_player_id.as_deref()?;
        self.players().iter().find(|p| p.id == id)
    }

    pub fn notifications(&self) -> impl Iterator<Item = &str> + '_ {
        self.notifications.iter().map(String::as_str)
    }

    /// Start joining a session. Refused while a previous connection has not
    /// been cleaned up.
    pub fn join(&mut self) -> bool {
        match self.status {
            SessionStatus::Waiting | SessionStatus::Disconnected => {
                self.status = SessionStatus::Connecting;
                true
            }
            _ => false,
        }
    }

    pub fn leave(&mut self) {
        if matches!(
            self.status,
            SessionStatus::Connecting | SessionStatus::Open
        ) {
            self.status = SessionStatus::Disconnecting;
        }
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Opened => {
                info!("Session open");
                self.status = SessionStatus::Open;
            }
            SessionEvent::GameUpdated(game) => {
                debug!(game_id = game.id(), "Game updated");
                self.game = Some(Arc::new(game));
            }
            SessionEvent::PlayersUpdated {
                my_player_id,
                players,
            } => {
                debug!(player_id = %my_player_id, count = players.len(), "Players updated");
                self.my_player_id = Some(my_player_id);
                self.players = Some(players);
            }
            SessionEvent::Notification(message) => {
                info!(%message, "Notification");
                if self.notifications.len() == NOTIFICATION_LOG_SIZE {
                    self.notifications.pop_front();
                }
                self.notifications.push_back(message);
            }
            SessionEvent::Closed { by_client: true } => {
                info!("Left session");
                self.status = SessionStatus::Waiting;
                self.my_player_id = None;
                self.players = None;
                self.game = None;
            }
            SessionEvent::Closed { by_client: false } => {
                warn!("Disconnected from server, keeping last known state");
                self.status = SessionStatus::Disconnected;
            }
        }
    }
}
