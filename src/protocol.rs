//! Wire messages between online clients and the relay server.

use serde::{Deserialize, Serialize};

use crate::board::Cell;
use crate::common::{Coord, PlayerId};
use crate::config::GameSettings;
use crate::powerup::PowerUp;
use crate::ship::Ship;

/// Version checked during the handshake and on every heartbeat.
pub const PROTOCOL_VERSION: u8 = 1;

/// Length of generated room ids.
pub const ROOM_ID_LEN: usize = 6;

/// One frame on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// First frame sent by a client.
    Handshake { version: u8 },
    HandshakeAck { version: u8 },
    /// Liveness probe; the peer answers with `HeartbeatAck`.
    Heartbeat { version: u8 },
    HeartbeatAck { version: u8 },
    Request(ClientRequest),
    Event(ServerEvent),
}

/// Phases of a room on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Lobby,
    Placement,
    Battle,
    GameOver,
}

/// Intents sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientRequest {
    CreateRoom { settings: GameSettings },
    JoinRoom { room_id: String },
    /// Ask about a room without joining it. Unknown ids get no answer.
    GetRoomInfo { room_id: String },
    /// Host only, while in the lobby.
    UpdateSettings { settings: GameSettings },
    PlayerReady,
    /// Submit the placed board: the grid plus its ship list.
    UpdateBoard { board: Vec<Vec<Cell>>, ships: Vec<Ship> },
    PlacementDone,
    Shoot { row: u8, col: u8 },
    EndTurn,
    PlayAgain,
    UsePowerUp { power_up: PowerUp },
    Sonar { row: u8, col: u8 },
}

/// Result of one shot as broadcast to both seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotResult {
    pub row: u8,
    pub col: u8,
    pub is_hit: bool,
    pub ship_sunk: bool,
    pub ship_name: Option<String>,
    pub ship_size: Option<u8>,
    /// Cells of a sunk ship.
    pub ship_cells: Option<Vec<(u8, u8)>>,
    /// Re-shot of an already hit cell to lift fog or cloak.
    pub reveal: bool,
    pub shooting_player: PlayerId,
    pub game_over: bool,
    pub winner: Option<PlayerId>,
    pub next_player: PlayerId,
}

impl ShotResult {
    pub fn coord(&self) -> Coord {
        (self.row as usize, self.col as usize)
    }
}

/// Events pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerEvent {
    /// To the host, after `CreateRoom`.
    RoomCreated { room_id: String, player: PlayerId, settings: GameSettings },
    /// To the guest, after joining.
    PlayersReady { room_id: String, player: PlayerId, settings: GameSettings },
    JoinError { reason: String },
    /// To the host when the guest arrives.
    OpponentJoined,
    /// To the guest when the host changes settings.
    SettingsUpdated { settings: GameSettings },
    OpponentReady { player: PlayerId },
    BothPlayersConfirmed { phase: RoomPhase },
    BothPlayersReady { phase: RoomPhase, first_player: PlayerId },
    ShotResult(ShotResult),
    TurnEnded { next_player: PlayerId },
    GameReset { phase: RoomPhase },
    OpponentDisconnected { message: String },
    PowerUpUsed { player: PlayerId, power_up: PowerUp, points_left: u32 },
    /// Only to the player who scanned.
    SonarResult { row: u8, col: u8, ships: Vec<String> },
    /// Answer to `GetRoomInfo`, sent to the asking connection only.
    RoomInfo {
        room_id: String,
        phase: RoomPhase,
        settings: GameSettings,
        guest_present: bool,
    },
    /// The request was invalid; only the sender is told.
    Rejected { reason: String },
}

impl From<ClientRequest> for Message {
    fn from(req: ClientRequest) -> Self {
        Message::Request(req)
    }
}

impl From<ServerEvent> for Message {
    fn from(event: ServerEvent) -> Self {
        Message::Event(event)
    }
}
