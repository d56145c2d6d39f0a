//! Client-side replica of an online game.
//!
//! The session never decides a shot. It applies server events in order and
//! keeps just enough state to render both boards and to evaluate the same
//! visibility and budget rules the server enforces.

use std::collections::HashSet;

use log::warn;

use crate::board::{Board, KnownBoard};
use crate::common::{Coord, PlayerId, ShotOutcome};
use crate::config::{GameSettings, STARTING_POWER_POINTS};
use crate::powerup::{PowerUp, SonarReport, TurnFlags};
use crate::protocol::{RoomPhase, ServerEvent, ShotResult};
use crate::rules::ShotBudget;
use crate::visibility::{own_view, CellView, OwnCellView, Viewer};

#[derive(Debug, Clone)]
pub struct ClientSession {
    room_id: Option<String>,
    me: PlayerId,
    settings: GameSettings,
    phase: RoomPhase,
    opponent_present: bool,
    own_board: Option<Board>,
    known: KnownBoard,
    current: PlayerId,
    winner: Option<PlayerId>,
    flags: TurnFlags,
    sonar_armed: bool,
    power_points: [u32; 2],
    shots_this_turn: u32,
    last_shot_hit: bool,
    live_ships_at_start: usize,
    cloaked: HashSet<Coord>,
    revealed: HashSet<Coord>,
    last_sonar: Option<SonarReport>,
    last_error: Option<String>,
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientSession {
    pub fn new() -> Self {
        let settings = GameSettings::default();
        Self {
            room_id: None,
            me: PlayerId::One,
            known: KnownBoard::new(settings.grid_size),
            settings,
            phase: RoomPhase::Lobby,
            opponent_present: false,
            own_board: None,
            current: PlayerId::One,
            winner: None,
            flags: TurnFlags::default(),
            sonar_armed: false,
            power_points: [0; 2],
            shots_this_turn: 0,
            last_shot_hit: false,
            live_ships_at_start: 0,
            cloaked: HashSet::new(),
            revealed: HashSet::new(),
            last_sonar: None,
            last_error: None,
        }
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn me(&self) -> PlayerId {
        self.me
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn opponent_present(&self) -> bool {
        self.opponent_present
    }

    pub fn own_board(&self) -> Option<&Board> {
        self.own_board.as_ref()
    }

    /// What our shots have revealed about the opponent board.
    pub fn known(&self) -> &KnownBoard {
        &self.known
    }

    pub fn current_player(&self) -> PlayerId {
        self.current
    }

    pub fn is_my_turn(&self) -> bool {
        self.phase == RoomPhase::Battle && self.current == self.me
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn flags(&self) -> TurnFlags {
        self.flags
    }

    pub fn sonar_armed(&self) -> bool {
        self.sonar_armed
    }

    pub fn power_points(&self, player: PlayerId) -> u32 {
        self.power_points[player.index()]
    }

    pub fn last_sonar(&self) -> Option<&SonarReport> {
        self.last_sonar.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Install our placed board before submitting it.
    pub fn set_own_board(&mut self, board: Board) {
        self.own_board = Some(board);
    }

    pub fn budget(&self) -> ShotBudget {
        ShotBudget::for_rule(
            self.settings.shooting_rule,
            self.live_ships_at_start,
            self.flags.extra_shot,
        )
    }

    pub fn shots_remaining(&self) -> Option<u32> {
        self.budget().remaining(self.shots_this_turn)
    }

    pub fn can_shoot(&self) -> bool {
        self.is_my_turn()
            && !self.sonar_armed
            && self.budget().allows(self.shots_this_turn, self.last_shot_hit)
    }

    fn viewer(&self) -> Viewer<'_> {
        Viewer {
            fog_of_war: self.settings.fog_of_war,
            scope_active: self.flags.scope_active,
            cloaked: &self.cloaked,
            revealed: &self.revealed,
        }
    }

    /// Opponent cell as we may see it.
    pub fn opponent_view(&self, coord: Coord) -> CellView {
        match self.known.cell(coord) {
            Some(cell) => self.viewer().classify(coord, cell.shot, cell.ship, cell.sunk),
            None => CellView::Unknown,
        }
    }

    pub fn opponent_views(&self) -> Vec<Vec<CellView>> {
        let side = self.known.side();
        (0..side)
            .map(|r| (0..side).map(|c| self.opponent_view((r, c))).collect())
            .collect()
    }

    pub fn own_views(&self) -> Vec<Vec<OwnCellView>> {
        let Some(board) = &self.own_board else {
            let side = self.settings.grid_size.side();
            return vec![vec![OwnCellView::Water; side]; side];
        };
        board
            .cells()
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| {
                        let sunk = board.ship_at((r, c)).map(|s| s.sunk).unwrap_or(false);
                        own_view(cell.has_ship, cell.is_hit, sunk)
                    })
                    .collect()
            })
            .collect()
    }

    /// Whether a click on `coord` would be accepted by the server.
    pub fn is_clickable(&self, coord: Coord) -> bool {
        let Some(cell) = self.known.cell(coord) else {
            return false;
        };
        if !self.is_my_turn() {
            return false;
        }
        if self.sonar_armed {
            return true;
        }
        self.can_shoot() && (!cell.shot || self.viewer().can_reshoot(coord))
    }

    /// Whether a power-up may be requested now.
    pub fn can_use_power_up(&self) -> bool {
        self.settings.power_ups_enabled
            && self.is_my_turn()
            && !self.flags.used_power_up
            && self.power_points(self.me) > 0
    }

    fn reset_boards(&mut self) {
        self.own_board = None;
        self.known = KnownBoard::new(self.settings.grid_size);
        self.cloaked.clear();
        self.revealed.clear();
        self.winner = None;
        self.flags = TurnFlags::default();
        self.sonar_armed = false;
        self.last_sonar = None;
    }

    fn begin_turn(&mut self, next: PlayerId) {
        if self.current == self.me {
            self.flags.end_of_turn();
            self.sonar_armed = false;
        }
        self.current = next;
        self.shots_this_turn = 0;
        self.last_shot_hit = false;
        if next == self.me {
            self.live_ships_at_start = self.own_board.as_ref().map(Board::live_ship_count).unwrap_or(0);
        }
    }

    /// Apply one server event.
    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::RoomCreated {
                room_id,
                player,
                settings,
            } => {
                self.room_id = Some(room_id.clone());
                self.me = *player;
                self.settings = settings.clone();
                self.phase = RoomPhase::Lobby;
                self.reset_boards();
            }
            ServerEvent::PlayersReady {
                room_id,
                player,
                settings,
            } => {
                self.room_id = Some(room_id.clone());
                self.me = *player;
                self.settings = settings.clone();
                self.phase = RoomPhase::Lobby;
                self.opponent_present = true;
                self.reset_boards();
            }
            ServerEvent::OpponentJoined => self.opponent_present = true,
            ServerEvent::SettingsUpdated { settings } => {
                self.settings = settings.clone();
                self.reset_boards();
            }
            ServerEvent::OpponentReady { .. } | ServerEvent::RoomInfo { .. } => {}
            ServerEvent::BothPlayersConfirmed { phase } | ServerEvent::GameReset { phase } => {
                self.phase = *phase;
                self.reset_boards();
            }
            ServerEvent::BothPlayersReady { phase, first_player } => {
                self.phase = *phase;
                let points = if self.settings.power_ups_enabled {
                    STARTING_POWER_POINTS
                } else {
                    0
                };
                self.power_points = [points; 2];
                self.flags = TurnFlags::default();
                self.sonar_armed = false;
                self.current = *first_player;
                self.shots_this_turn = 0;
                self.last_shot_hit = false;
                self.live_ships_at_start = self.own_board.as_ref().map(Board::live_ship_count).unwrap_or(0);
            }
            ServerEvent::ShotResult(result) => self.apply_shot(result),
            ServerEvent::TurnEnded { next_player } => self.begin_turn(*next_player),
            ServerEvent::OpponentDisconnected { .. } => self.opponent_present = false,
            ServerEvent::PowerUpUsed {
                player,
                power_up,
                points_left,
            } => {
                self.power_points[player.index()] = *points_left;
                if *player == self.me {
                    self.flags.used_power_up = true;
                    match power_up {
                        PowerUp::Sonar => self.sonar_armed = true,
                        PowerUp::ExtraShot => self.flags.extra_shot = true,
                        PowerUp::Scope => self.flags.scope_active = true,
                        PowerUp::Cloak => {}
                    }
                } else if *power_up == PowerUp::Cloak {
                    self.flags.cloak_active = true;
                }
            }
            ServerEvent::SonarResult { row, col, ships } => {
                self.sonar_armed = false;
                self.last_sonar = Some(SonarReport {
                    center: (*row as usize, *col as usize),
                    ships: ships.clone(),
                });
            }
            ServerEvent::JoinError { reason } | ServerEvent::Rejected { reason } => {
                self.last_error = Some(reason.clone());
            }
        }
    }

    fn apply_shot(&mut self, result: &ShotResult) {
        let coord = result.coord();
        let sinks = result.ship_sunk && !result.reveal;
        if result.shooting_player == self.me {
            if result.reveal {
                self.cloaked.remove(&coord);
                self.revealed.insert(coord);
            } else {
                if let Err(e) = self.known.record(coord, &outcome_of(result)) {
                    warn!("could not record shot at {:?}: {}", coord, e);
                }
                if self.flags.cloak_active {
                    self.cloaked.insert(coord);
                }
            }
            self.shots_this_turn += 1;
            self.last_shot_hit = result.is_hit && !result.reveal;
        } else if !result.reveal {
            if let Some(board) = self.own_board.as_mut() {
                if let Err(e) = board.resolve_shot(coord) {
                    warn!("could not apply opponent shot at {:?}: {}", coord, e);
                }
            }
        }
        if sinks && self.settings.power_ups_enabled {
            self.power_points[result.shooting_player.index()] += 1;
        }

        if result.game_over {
            self.winner = result.winner;
            self.phase = RoomPhase::GameOver;
        } else if result.next_player != self.current {
            self.begin_turn(result.next_player);
        }
    }
}

/// Rebuild the engine outcome from a broadcast shot.
pub fn outcome_of(result: &ShotResult) -> ShotOutcome {
    match (&result.ship_name, result.ship_sunk) {
        (Some(name), true) => ShotOutcome::Sunk {
            name: name.clone(),
            size: result.ship_size.map(usize::from).unwrap_or(0),
            cells: result
                .ship_cells
                .iter()
                .flatten()
                .map(|&(r, c)| (r as usize, c as usize))
                .collect(),
        },
        _ if result.is_hit => ShotOutcome::Hit,
        _ => ShotOutcome::Miss,
    }
}
