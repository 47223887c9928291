use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Area, CameraMode, Direction, Game, ModelError, Player, Position, Size};

/// Errors raised while decoding an inbound server message.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid snapshot: {0}")]
    Model(#[from] ModelError),
}

// === Outbound ===

/// Intent sent to the server. Serialized as `{"type": "...", ...fields}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Ping,
    MovePlayer { direction: Direction },
    RevealArea,
    FlagArea,
    RevivePlayer,
    ChangeCamera,
    ResetGame,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::MovePlayer { .. } => "MOVE_PLAYER",
            Command::RevealArea => "REVEAL_AREA",
            Command::FlagArea => "FLAG_AREA",
            Command::RevivePlayer => "REVIVE_PLAYER",
            Command::ChangeCamera => "CHANGE_CAMERA",
            Command::ResetGame => "RESET_GAME",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// === Inbound wire shapes ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeDto {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDto {
    pub x: i32,
    pub z: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaDto {
    pub revealed: bool,
    pub flagged: bool,
    pub has_mine: bool,
    pub adj_mines_count: u8,
    #[serde(default)]
    pub boomed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDto {
    pub id: String,
    pub size: SizeDto,
    pub mines_count: u32,
    /// Indexed `areas[x][z]`.
    pub areas: Vec<Vec<AreaDto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub position: PositionDto,
    pub direction: Direction,
    #[serde(default)]
    pub guilty: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum EventDto {
    GameUpdated {
        game: GameDto,
    },
    PlayersUpdated {
        #[serde(rename = "myPlayerId")]
        my_player_id: String,
        players: Vec<PlayerDto>,
    },
    NotificationSent {
        message: String,
    },
    #[serde(other)]
    Unknown,
}

impl AreaDto {
    pub fn into_area(self) -> Result<Area, ModelError> {
        Area::new(
            self.revealed,
            self.flagged,
            self.has_mine,
            self.adj_mines_count,
            self.boomed,
        )
    }
}

impl GameDto {
    pub fn into_game(self) -> Result<Game, ModelError> {
        let columns = self
            .areas
            .into_iter()
            .map(|column| {
                column
                    .into_iter()
                    .map(AreaDto::into_area)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Game::new(
            self.id,
            Size::new(self.size.width, self.size.height),
            self.mines_count,
            columns,
            CameraMode::try_from(self.camera.unwrap_or_default())?,
        )
    }
}

impl PlayerDto {
    pub fn into_player(self) -> Player {
        Player {
            id: self.id,
            name: self.name,
            position: Position::new(self.position.x, self.position.z),
            direction: self.direction,
            guilty: self.guilty,
        }
    }
}

// === Domain events ===

/// A fully parsed server event.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    GameUpdated(Game),
    PlayersUpdated {
        my_player_id: String,
        players: Vec<Player>,
    },
    NotificationSent(String),
}

/// Decode one inbound text frame.
///
/// Returns `Ok(None)` for event types this client does not know. A known
/// event with a malformed payload is an error and yields no partial event.
pub fn decode_event(text: &str) -> Result<Option<ServerEvent>, ProtocolError> {
    let event = match serde_json::from_str::<EventDto>(text)? {
        EventDto::GameUpdated { game } => ServerEvent::GameUpdated(game.into_game()?),
        EventDto::PlayersUpdated {
            my_player_id,
            players,
        } => ServerEvent::PlayersUpdated {
            my_player_id,
            players: players.into_iter().map(PlayerDto::into_player).collect(),
        },
        EventDto::NotificationSent { message } => ServerEvent::NotificationSent(message),
        EventDto::Unknown => return Ok(None),
    };
    Ok(Some(event))
}

/// Build the WebSocket URL for one game session.
pub fn session_url(server_url: &str, game_id: &str, player_name: &str) -> String {
    format!(
        "{}/game-client/{}?player_name={}",
        server_url.trim_end_matches('/'),
        percent_encode(game_id),
        percent_encode(player_name)
    )
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn area_json(revealed: bool) -> serde_json::Value {
        json!({"revealed": revealed, "flagged": false, "hasMine": false, "adjMinesCount": 0})
    }

    fn game_json(width: usize, height: usize) -> serde_json::Value {
        let column: Vec<_> = (0..height).map(|_| area_json(false)).collect();
        let areas: Vec<_> = (0..width).map(|_| column.clone()).collect();
        json!({
            "id": "room-1",
            "size": {"width": width, "height": height},
            "minesCount": 3,
            "areas": areas,
        })
    }

    #[test]
    fn commands_serialize_with_type_tag() {
        assert_eq!(Command::Ping.to_json(), r#"{"type":"PING"}"#);
        assert_eq!(
            Command::MovePlayer {
                direction: Direction::Down
            }
            .to_json(),
            r#"{"type":"MOVE_PLAYER","direction":2}"#
        );
        assert_eq!(Command::RevealArea.to_json(), r#"{"type":"REVEAL_AREA"}"#);
        assert_eq!(Command::FlagArea.to_json(), r#"{"type":"FLAG_AREA"}"#);
        assert_eq!(Command::RevivePlayer.to_json(), r#"{"type":"REVIVE_PLAYER"}"#);
        assert_eq!(Command::ChangeCamera.to_json(), r#"{"type":"CHANGE_CAMERA"}"#);
        assert_eq!(Command::ResetGame.to_json(), r#"{"type":"RESET_GAME"}"#);
    }

    #[test]
    fn command_name_matches_wire_tag() {
        let cmd = Command::MovePlayer {
            direction: Direction::Up,
        };
        let parsed: serde_json::Value = serde_json::from_str(&cmd.to_json()).unwrap();
        assert_eq!(parsed["type"], cmd.name());
    }

    #[test]
    fn game_updated_preserves_size() {
        for (width, height) in [(1, 1), (2, 3), (5, 4)] {
            let text = json!({"type": "GAME_UPDATED", "game": game_json(width, height)}).to_string();
            let Some(ServerEvent::GameUpdated(game)) = decode_event(&text).unwrap() else {
                panic!("expected game update");
            };
            assert_eq!(game.grid_size(), Size::new(width as u32, height as u32));
            assert_eq!(game.size(), game.grid_size());
            assert_eq!(game.id(), "room-1");
            assert_eq!(game.mine_count(), 3);
            assert_eq!(game.camera(), CameraMode::default());
        }
    }

    #[test]
    fn area_indices_become_positions() {
        let mut game = game_json(2, 3);
        game["areas"][1][2] = json!({
            "revealed": true, "flagged": false, "hasMine": true, "adjMinesCount": 1, "boomed": true
        });
        game["camera"] = json!(2);
        let text = json!({"type": "GAME_UPDATED", "game": game}).to_string();

        let Some(ServerEvent::GameUpdated(game)) = decode_event(&text).unwrap() else {
            panic!("expected game update");
        };
        let area = game.area(Position::new(1, 2)).unwrap();
        assert!(area.boomed());
        assert_eq!(area.adjacent_mine_count(), 1);
        assert_eq!(game.camera().to_number(), 2);
    }

    #[test]
    fn players_updated_maps_each_player() {
        let text = json!({
            "type": "PLAYERS_UPDATED",
            "myPlayerId": "b",
            "players": [
                {"id": "a", "name": "Ann", "position": {"x": 0, "z": 1}, "direction": 0},
                {"id": "b", "name": "Bo", "position": {"x": -1, "z": 4}, "direction": 3, "guilty": true},
            ],
        })
        .to_string();

        let Some(ServerEvent::PlayersUpdated {
            my_player_id,
            players,
        }) = decode_event(&text).unwrap()
        else {
            panic!("expected players update");
        };
        assert_eq!(my_player_id, "b");
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].position, Position::new(0, 1));
        assert!(!players[0].guilty);
        assert_eq!(players[1].direction, Direction::Left);
        assert!(players[1].is_dead());
    }

    #[test]
    fn notification_carries_message() {
        let text = r#"{"type":"NOTIFICATION_SENT","message":"Bo joined"}"#;
        assert_eq!(
            decode_event(text).unwrap(),
            Some(ServerEvent::NotificationSent("Bo joined".to_string()))
        );
    }

    #[test]
    fn unknown_event_type_ignored() {
        assert_eq!(decode_event(r#"{"type":"SCORE_UPDATED","score":3}"#).unwrap(), None);
    }

    #[test]
    fn missing_type_is_an_error() {
        assert!(matches!(
            decode_event(r#"{"message":"hi"}"#),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn bad_direction_fails_whole_event() {
        let text = json!({
            "type": "PLAYERS_UPDATED",
            "myPlayerId": "a",
            "players": [{"id": "a", "name": "Ann", "position": {"x": 0, "z": 0}, "direction": 4}],
        })
        .to_string();
        assert!(decode_event(&text).is_err());
    }

    #[test]
    fn board_shape_mismatch_fails() {
        let mut game = game_json(2, 2);
        game["size"]["width"] = json!(3);
        let text = json!({"type": "GAME_UPDATED", "game": game}).to_string();
        assert!(matches!(
            decode_event(&text),
            Err(ProtocolError::Model(ModelError::InvalidBoardShape { width: 3, height: 2 }))
        ));
    }

    #[test]
    fn out_of_range_camera_fails_whole_event() {
        for camera in [6, 200] {
            let mut game = game_json(1, 1);
            game["camera"] = json!(camera);
            let text = json!({"type": "GAME_UPDATED", "game": game}).to_string();
            assert!(matches!(
                decode_event(&text),
                Err(ProtocolError::Model(ModelError::InvalidCamera(c))) if c == camera
            ));
        }
    }

    #[test]
    fn missing_field_fails() {
        let mut game = game_json(1, 1);
        game.as_object_mut().unwrap().remove("minesCount");
        let text = json!({"type": "GAME_UPDATED", "game": game}).to_string();
        assert!(matches!(decode_event(&text), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn session_url_encodes_name() {
        assert_eq!(
            session_url("ws://localhost:8080/", "room-1", "Ann Lee&co"),
            "ws://localhost:8080/game-client/room-1?player_name=Ann%20Lee%26co"
        );
    }
}
