use tracing::{debug, trace};

use super::protocol::{self, Command, ProtocolError, ServerEvent};
use crate::models::{Direction, Game, Player};

/// Write half of a message-oriented connection.
pub trait Transport {
    fn send(&mut self, text: String);
    fn close(&mut self);
}

/// Receives decoded server events, in arrival order.
pub trait SocketHandler {
    fn on_open(&mut self) {}
    fn on_game_updated(&mut self, game: Game);
    fn on_players_updated(&mut self, my_player_id: String, players: Vec<Player>);
    fn on_notification(&mut self, _message: String) {}
    /// `disconnected_by_client` is true only when `disconnect` was called
    /// before the transport closed.
    fn on_close(&mut self, disconnected_by_client: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Disconnecting,
    Disconnected,
}

impl ConnectionState {
    pub fn is_closed(self) -> bool {
        matches!(self, ConnectionState::Idle | ConnectionState::Disconnected)
    }
}

/// One game session over a transport: gates outbound commands on the open
/// state and dispatches inbound frames to the handler.
pub struct Connection<T, H> {
    transport: T,
    handler: H,
    state: ConnectionState,
    disconnected_by_client: bool,
}

impl<T: Transport, H: SocketHandler> Connection<T, H> {
    pub fn new(transport: T, handler: H) -> Self {
        Connection {
            transport,
            handler,
            state: ConnectionState::Connecting,
            disconnected_by_client: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn disconnected_by_client(&self) -> bool {
        self.disconnected_by_client
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The transport finished its handshake.
    pub fn opened(&mut self) {
        if self.state != ConnectionState::Connecting {
            return;
        }
        self.state = ConnectionState::Open;
        self.handler.on_open();
    }

    /// Decode and dispatch one inbound text frame. Frames arriving when the
    /// connection is not open are discarded.
    pub fn receive(&mut self, text: &str) -> Result<(), ProtocolError> {
        if !self.is_open() {
            trace!(state = ?self.state, "Discarding frame on inactive connection");
            return Ok(());
        }

        match protocol::decode_event(text)? {
            Some(ServerEvent::GameUpdated(game)) => self.handler.on_game_updated(game),
            Some(ServerEvent::PlayersUpdated {
                my_player_id,
                players,
            }) => self.handler.on_players_updated(my_player_id, players),
            Some(ServerEvent::NotificationSent(message)) => self.handler.on_notification(message),
            None => debug!("Ignoring unknown event type"),
        }
        Ok(())
    }

    /// The transport closed, for whatever reason. Reported once.
    pub fn closed(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.state = if self.disconnected_by_client {
            ConnectionState::Idle
        } else {
            ConnectionState::Disconnected
        };
        self.handler.on_close(self.disconnected_by_client);
    }

    /// Client-initiated close.
    pub fn disconnect(&mut self) {
        if self.state.is_closed() || self.state == ConnectionState::Disconnecting {
            return;
        }
        self.disconnected_by_client = true;
        self.state = ConnectionState::Disconnecting;
        self.transport.close();
    }

    /// Write `command` if the connection is open; otherwise drop it.
    pub fn send(&mut self, command: Command) -> bool {
        if !self.is_open() {
            debug!(command = command.name(), state = ?self.state, "Dropping command, connection not open");
            return false;
        }
        self.transport.send(command.to_json());
        true
    }

    pub fn ping(&mut self) -> bool {
        self.send(Command::Ping)
    }

    pub fn move_player(&mut self, direction: Direction) -> bool {
        self.send(Command::MovePlayer { direction })
    }

    pub fn reveal_area(&mut self) -> bool {
        self.send(Command::RevealArea)
    }

    pub fn flag_area(&mut self) -> bool {
        self.send(Command::FlagArea)
    }

    pub fn revive_player(&mut self) -> bool {
        self.send(Command::RevivePlayer)
    }

    pub fn change_camera(&mut self) -> bool {
        self.send(Command::ChangeCamera)
    }

    pub fn reset_game(&mut self) -> bool {
        self.send(Command::ResetGame)
    }
}
