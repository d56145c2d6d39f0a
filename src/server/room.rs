//! One multiplayer room: two seats, the lobby/placement handshake, and the
//! authoritative engine once the battle starts.
//!
//! Every method is a pure state transition returning the events to deliver.
//! The hub decides how they reach the connections.

use log::{debug, info, warn};

use crate::board::{Board, Cell};
use crate::common::{Coord, PlayerId, ShotOutcome};
use crate::config::GameSettings;
use crate::game::{check_fleet, GameEngine, ShotReport};
use crate::powerup::PowerUp;
use crate::protocol::{RoomPhase, ServerEvent, ShotResult};
use crate::ship::Ship;

/// Server-side connection identity.
pub type ConnId = u64;

pub const DISCONNECT_MESSAGE: &str = "Your opponent has disconnected";

/// An event addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: ConnId,
    pub event: ServerEvent,
}

#[derive(Debug)]
struct Seat {
    conn: ConnId,
    ready: bool,
    board: Option<Board>,
    placed: bool,
}

impl Seat {
    fn new(conn: ConnId) -> Self {
        Self {
            conn,
            ready: false,
            board: None,
            placed: false,
        }
    }

    fn reset(&mut self) {
        self.ready = false;
        self.board = None;
        self.placed = false;
    }
}

pub struct Room {
    id: String,
    settings: GameSettings,
    phase: RoomPhase,
    /// Host is player one, guest player two.
    seats: [Option<Seat>; 2],
    engine: Option<GameEngine>,
}

impl Room {
    /// New room in the lobby. `settings` must already be validated.
    pub fn new(id: String, host: ConnId, settings: GameSettings) -> Self {
        Self {
            id,
            settings,
            phase: RoomPhase::Lobby,
            seats: [Some(Seat::new(host)), None],
            engine: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Authoritative engine, present from battle start.
    pub fn engine(&self) -> Option<&GameEngine> {
        self.engine.as_ref()
    }

    pub fn seat_of(&self, conn: ConnId) -> Option<PlayerId> {
        [PlayerId::One, PlayerId::Two]
            .into_iter()
            .find(|p| self.seats[p.index()].as_ref().map(|s| s.conn) == Some(conn))
    }

    /// Connections currently seated.
    pub fn members(&self) -> Vec<ConnId> {
        self.seats.iter().flatten().map(|s| s.conn).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.iter().all(Option::is_none)
    }

    pub fn has_guest(&self) -> bool {
        self.seats[1].is_some()
    }

    /// A guest may take the second seat: host present, seat free, still in the lobby.
    pub fn can_join(&self) -> bool {
        self.phase == RoomPhase::Lobby && self.seats[0].is_some() && self.seats[1].is_none()
    }

    fn conn(&self, player: PlayerId) -> Option<ConnId> {
        self.seats[player.index()].as_ref().map(|s| s.conn)
    }

    fn seat_mut(&mut self, player: PlayerId) -> Option<&mut Seat> {
        self.seats[player.index()].as_mut()
    }

    fn to_player(&self, player: PlayerId, event: ServerEvent) -> Vec<Outbound> {
        self.conn(player)
            .map(|to| Outbound { to, event })
            .into_iter()
            .collect()
    }

    fn broadcast(&self, event: ServerEvent) -> Vec<Outbound> {
        self.members()
            .into_iter()
            .map(|to| Outbound {
                to,
                event: event.clone(),
            })
            .collect()
    }

    fn reject(conn: ConnId, reason: impl Into<String>) -> Vec<Outbound> {
        vec![Outbound {
            to: conn,
            event: ServerEvent::Rejected { reason: reason.into() },
        }]
    }

    fn drop_request(&self, conn: ConnId, what: &str) -> Vec<Outbound> {
        debug!("[Room {}] dropped {} from connection {} in {:?}", self.id, what, conn, self.phase);
        Vec::new()
    }

    /// Seat `conn` as the guest.
    pub fn join(&mut self, conn: ConnId) -> Option<Vec<Outbound>> {
        if !self.can_join() {
            return None;
        }
        self.seats[1] = Some(Seat::new(conn));
        info!("[Room {}] guest {} joined", self.id, conn);
        let mut out = self.to_player(PlayerId::One, ServerEvent::OpponentJoined);
        out.extend(self.to_player(
            PlayerId::Two,
            ServerEvent::PlayersReady {
                room_id: self.id.clone(),
                player: PlayerId::Two,
                settings: self.settings.clone(),
            },
        ));
        Some(out)
    }

    pub fn update_settings(&mut self, conn: ConnId, settings: GameSettings) -> Vec<Outbound> {
        if self.seat_of(conn) != Some(PlayerId::One) || self.phase != RoomPhase::Lobby {
            return Self::reject(conn, "Only the host may change settings in the lobby");
        }
        if let Err(e) = settings.validate() {
            return Self::reject(conn, e.to_string());
        }
        self.settings = settings;
        for seat in self.seats.iter_mut().flatten() {
            seat.ready = false;
        }
        debug!("[Room {}] settings updated", self.id);
        self.to_player(
            PlayerId::Two,
            ServerEvent::SettingsUpdated {
                settings: self.settings.clone(),
            },
        )
    }

    pub fn player_ready(&mut self, conn: ConnId) -> Vec<Outbound> {
        let Some(player) = self.seat_of(conn) else {
            return Vec::new();
        };
        if self.phase != RoomPhase::Lobby || self.seats[1].is_none() {
            return self.drop_request(conn, "player-ready");
        }
        if let Some(seat) = self.seat_mut(player) {
            seat.ready = true;
        }
        let mut out = self.broadcast(ServerEvent::OpponentReady { player });
        if self.seats.iter().flatten().filter(|s| s.ready).count() == 2 {
            for seat in self.seats.iter_mut().flatten() {
                seat.ready = false;
            }
            self.phase = RoomPhase::Placement;
            info!("[Room {}] both players confirmed, placement begins", self.id);
            out.extend(self.broadcast(ServerEvent::BothPlayersConfirmed {
                phase: RoomPhase::Placement,
            }));
        }
        out
    }

    pub fn update_board(&mut self, conn: ConnId, cells: &[Vec<Cell>], ships: &[Ship]) -> Vec<Outbound> {
        let Some(player) = self.seat_of(conn) else {
            return Vec::new();
        };
        if self.phase != RoomPhase::Placement {
            return self.drop_request(conn, "update-board");
        }
        let board = match Board::from_parts(self.settings.grid_size, cells, ships)
            .and_then(|b| check_fleet(&self.settings, &b).map(|()| b))
        {
            Ok(board) => board,
            Err(e) => {
                warn!("[Room {}] invalid board from {}: {}", self.id, player, e);
                return Self::reject(conn, e.to_string());
            }
        };
        if let Some(seat) = self.seat_mut(player) {
            seat.board = Some(board);
        }
        Vec::new()
    }

    pub fn placement_done(&mut self, conn: ConnId) -> Vec<Outbound> {
        let Some(player) = self.seat_of(conn) else {
            return Vec::new();
        };
        if self.phase != RoomPhase::Placement {
            return self.drop_request(conn, "placement-done");
        }
        match self.seat_mut(player) {
            Some(seat) if seat.board.is_some() => seat.placed = true,
            _ => return Self::reject(conn, "Submit your board before finishing placement"),
        }
        let boards = match &self.seats {
            [Some(one), Some(two)] if one.placed && two.placed => (one.board.clone(), two.board.clone()),
            _ => return Vec::new(),
        };
        let (Some(one), Some(two)) = boards else {
            return Vec::new();
        };
        match GameEngine::start(self.settings.clone(), one, two) {
            Ok(engine) => {
                self.engine = Some(engine);
                self.phase = RoomPhase::Battle;
                info!("[Room {}] battle started", self.id);
                self.broadcast(ServerEvent::BothPlayersReady {
                    phase: RoomPhase::Battle,
                    first_player: PlayerId::One,
                })
            }
            Err(e) => {
                warn!("[Room {}] could not start battle: {}", self.id, e);
                for seat in self.seats.iter_mut().flatten() {
                    seat.placed = false;
                }
                self.broadcast(ServerEvent::Rejected { reason: e.to_string() })
            }
        }
    }

    /// Player seated at `conn` whose turn it is, during battle.
    fn acting_player(&self, conn: ConnId) -> Option<PlayerId> {
        let player = self.seat_of(conn)?;
        let engine = self.engine.as_ref()?;
        (self.phase == RoomPhase::Battle && engine.current_player() == player).then_some(player)
    }

    pub fn shoot(&mut self, conn: ConnId, row: u8, col: u8) -> Vec<Outbound> {
        let Some(player) = self.acting_player(conn) else {
            return self.drop_request(conn, "out-of-turn shot");
        };
        let Some(engine) = self.engine.as_mut() else {
            return Vec::new();
        };
        let report = match engine.shoot_as(player, (row as usize, col as usize)) {
            Ok(report) => report,
            Err(e) => {
                debug!("[Room {}] dropped shot from {}: {}", self.id, player, e);
                return Vec::new();
            }
        };
        if report.winner.is_some() {
            self.phase = RoomPhase::GameOver;
            info!("[Room {}] {} won", self.id, player);
        } else if report.turn_exhausted {
            if let Err(e) = engine.end_turn() {
                warn!("[Room {}] could not end exhausted turn of {}: {}", self.id, player, e);
            }
        }
        let next_player = engine.current_player();
        self.broadcast(ServerEvent::ShotResult(shot_result(&report, next_player)))
    }

    pub fn end_turn(&mut self, conn: ConnId) -> Vec<Outbound> {
        if self.acting_player(conn).is_none() {
            return self.drop_request(conn, "end-turn");
        }
        match self.engine.as_mut().map(GameEngine::end_turn) {
            Some(Ok(next_player)) => self.broadcast(ServerEvent::TurnEnded { next_player }),
            _ => Vec::new(),
        }
    }

    pub fn use_power_up(&mut self, conn: ConnId, power_up: PowerUp) -> Vec<Outbound> {
        let Some(player) = self.acting_player(conn) else {
            return self.drop_request(conn, "use-power-up");
        };
        let Some(engine) = self.engine.as_mut() else {
            return Vec::new();
        };
        match engine.use_power_up_as(player, power_up) {
            Ok(()) => {
                let points_left = engine.power_points(player);
                self.broadcast(ServerEvent::PowerUpUsed {
                    player,
                    power_up,
                    points_left,
                })
            }
            Err(e) => Self::reject(conn, e.to_string()),
        }
    }

    pub fn sonar(&mut self, conn: ConnId, row: u8, col: u8) -> Vec<Outbound> {
        if self.acting_player(conn).is_none() {
            return self.drop_request(conn, "sonar");
        }
        let Some(engine) = self.engine.as_mut() else {
            return Vec::new();
        };
        match engine.sonar_scan((row as usize, col as usize)) {
            Ok(report) => vec![Outbound {
                to: conn,
                event: ServerEvent::SonarResult {
                    row,
                    col,
                    ships: report.ships,
                },
            }],
            Err(e) => Self::reject(conn, e.to_string()),
        }
    }

    pub fn play_again(&mut self, conn: ConnId) -> Vec<Outbound> {
        if self.seat_of(conn).is_none() || !matches!(self.phase, RoomPhase::Battle | RoomPhase::GameOver) {
            return self.drop_request(conn, "play-again");
        }
        self.engine = None;
        for seat in self.seats.iter_mut().flatten() {
            seat.reset();
        }
        self.phase = RoomPhase::Placement;
        info!("[Room {}] reset for a new game", self.id);
        self.broadcast(ServerEvent::GameReset {
            phase: RoomPhase::Placement,
        })
    }

    /// Vacate `conn`'s seat and tell whoever is left.
    pub fn leave(&mut self, conn: ConnId) -> Vec<Outbound> {
        let Some(player) = self.seat_of(conn) else {
            return Vec::new();
        };
        self.seats[player.index()] = None;
        info!("[Room {}] {} left", self.id, player);
        self.broadcast(ServerEvent::OpponentDisconnected {
            message: DISCONNECT_MESSAGE.to_string(),
        })
    }
}

fn to_wire((row, col): Coord) -> (u8, u8) {
    (row as u8, col as u8)
}

/// Wire form of a resolved shot.
pub fn shot_result(report: &ShotReport, next_player: PlayerId) -> ShotResult {
    let (row, col) = to_wire(report.coord);
    let (ship_name, ship_size, ship_cells) = match &report.outcome {
        ShotOutcome::Sunk { name, size, cells } => (
            Some(name.clone()),
            Some(*size as u8),
            Some(cells.iter().copied().map(to_wire).collect()),
        ),
        _ => (None, None, None),
    };
    ShotResult {
        row,
        col,
        is_hit: report.outcome.is_hit(),
        ship_sunk: ship_name.is_some(),
        ship_name,
        ship_size,
        ship_cells,
        reveal: report.reveal,
        shooting_player: report.shooter,
        game_over: report.winner.is_some(),
        winner: report.winner,
        next_player,
    }
}
