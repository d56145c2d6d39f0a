//! Authoritative two-player battle state.
//!
//! `GameEngine` owns both frozen boards from the moment the battle starts and
//! resolves every shot, power-up and turn switch. The server holds one per
//! room; local play drives one directly.

use std::collections::HashSet;

use log::debug;

use crate::board::Board;
use crate::common::{BoardError, Coord, PlayerId, PowerUpError, ShotError, ShotOutcome};
use crate::config::{GameSettings, STARTING_POWER_POINTS};
use crate::powerup::{PowerUp, SonarReport, TurnFlags};
use crate::rules::ShotBudget;
use crate::visibility::{own_view, CellView, OwnCellView, Viewer};

/// Current status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Over { winner: PlayerId },
}

/// Shot and hit counters for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub shots: u32,
    pub hits: u32,
}

impl PlayerStats {
    /// Hit percentage, zero before the first shot.
    pub fn accuracy(&self) -> f64 {
        if self.shots == 0 {
            0.0
        } else {
            f64::from(self.hits) / f64::from(self.shots) * 100.0
        }
    }
}

struct PlayerState {
    board: Board,
    stats: PlayerStats,
    power_points: u32,
    flags: TurnFlags,
    /// Cells this player shot under an enemy cloak; results hidden until re-shot.
    cloaked: HashSet<Coord>,
    /// Cells this player re-shot to lift fog or cloak.
    revealed: HashSet<Coord>,
}

impl PlayerState {
    fn new(board: Board, power_points: u32) -> Self {
        Self {
            board,
            stats: PlayerStats::default(),
            power_points,
            flags: TurnFlags::default(),
            cloaked: HashSet::new(),
            revealed: HashSet::new(),
        }
    }
}

/// Per-turn bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    pub current: PlayerId,
    pub shots_this_turn: u32,
    pub last_shot_hit: bool,
    pub sonar_armed: bool,
    /// Shooter's live ships when the turn began; the shipfire budget.
    pub live_ships_at_start: usize,
}

/// Everything a caller needs to render or replicate one shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotReport {
    pub shooter: PlayerId,
    pub coord: Coord,
    pub outcome: ShotOutcome,
    /// Re-shot of an already-hit cell to reveal it; statistics untouched.
    pub reveal: bool,
    pub winner: Option<PlayerId>,
    /// The shooter has no shots left this turn.
    pub turn_exhausted: bool,
}

/// Result of a board click during battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Shot(ShotReport),
    Sonar(SonarReport),
}

pub struct GameEngine {
    settings: GameSettings,
    players: [PlayerState; 2],
    turn: TurnState,
    status: GameStatus,
}

impl GameEngine {
    /// Start a battle with both placed boards. Player one shoots first.
    pub fn start(settings: GameSettings, one: Board, two: Board) -> Result<Self, BoardError> {
        for board in [&one, &two] {
            check_fleet(&settings, board)?;
        }
        let points = if settings.power_ups_enabled {
            STARTING_POWER_POINTS
        } else {
            0
        };
        let live = one.live_ship_count();
        Ok(Self {
            settings,
            players: [PlayerState::new(one, points), PlayerState::new(two, points)],
            turn: TurnState {
                current: PlayerId::One,
                shots_this_turn: 0,
                last_shot_hit: false,
                sonar_armed: false,
                live_ships_at_start: live,
            },
            status: GameStatus::InProgress,
        })
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.status {
            GameStatus::Over { winner } => Some(winner),
            GameStatus::InProgress => None,
        }
    }

    pub fn current_player(&self) -> PlayerId {
        self.turn.current
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn board(&self, player: PlayerId) -> &Board {
        &self.players[player.index()].board
    }

    pub fn stats(&self, player: PlayerId) -> PlayerStats {
        self.players[player.index()].stats
    }

    pub fn power_points(&self, player: PlayerId) -> u32 {
        self.players[player.index()].power_points
    }

    pub fn flags(&self, player: PlayerId) -> TurnFlags {
        self.players[player.index()].flags
    }

    /// Cells `player` shot under cloak whose results are still hidden.
    pub fn cloaked_cells(&self, player: PlayerId) -> &HashSet<Coord> {
        &self.players[player.index()].cloaked
    }

    fn player(&self, id: PlayerId) -> &PlayerState {
        &self.players[id.index()]
    }

    fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[id.index()]
    }

    /// Shot budget of the current turn.
    pub fn budget(&self) -> ShotBudget {
        let flags = self.player(self.turn.current).flags;
        ShotBudget::for_rule(
            self.settings.shooting_rule,
            self.turn.live_ships_at_start,
            flags.extra_shot,
        )
    }

    /// Shots left this turn; `None` when unbounded.
    pub fn shots_remaining(&self) -> Option<u32> {
        self.budget().remaining(self.turn.shots_this_turn)
    }

    fn budget_allows(&self) -> bool {
        self.budget()
            .allows(self.turn.shots_this_turn, self.turn.last_shot_hit)
    }

    /// The current player may fire another shot now.
    pub fn can_shoot(&self) -> bool {
        self.status == GameStatus::InProgress && !self.turn.sonar_armed && self.budget_allows()
    }

    /// Shot on behalf of `player`, refused when it is not their turn.
    pub fn shoot_as(&mut self, player: PlayerId, coord: Coord) -> Result<ShotReport, ShotError> {
        if player != self.turn.current {
            return Err(ShotError::NotYourTurn);
        }
        self.shoot(coord)
    }

    /// Fire the current player's shot at `coord` on the opponent's board.
    pub fn shoot(&mut self, coord: Coord) -> Result<ShotReport, ShotError> {
        if self.status != GameStatus::InProgress {
            return Err(ShotError::NotInBattle);
        }
        if self.turn.sonar_armed {
            return Err(ShotError::SonarArmed);
        }
        let shooter = self.turn.current;
        let defender = shooter.other();
        let cell = *self
            .board(defender)
            .cell(coord)
            .ok_or(ShotError::OutOfBounds)?;
        if !self.budget_allows() {
            return Err(ShotError::BudgetExhausted);
        }

        if cell.is_hit {
            if !self.viewer(shooter).can_reshoot(coord) {
                return Err(ShotError::AlreadyShot);
            }
            return Ok(self.reveal_shot(shooter, coord, cell.has_ship));
        }

        let outcome = match self.player_mut(defender).board.resolve_shot(coord) {
            Ok(outcome) => outcome,
            Err(BoardError::AlreadyShot) => return Err(ShotError::AlreadyShot),
            Err(_) => return Err(ShotError::OutOfBounds),
        };
        let power_ups = self.settings.power_ups_enabled;
        let state = self.player_mut(shooter);
        state.stats.shots += 1;
        if outcome.is_hit() {
            state.stats.hits += 1;
        }
        if power_ups && matches!(outcome, ShotOutcome::Sunk { .. }) {
            state.power_points += 1;
        }
        if state.flags.cloak_active {
            state.cloaked.insert(coord);
        }
        self.turn.shots_this_turn += 1;
        self.turn.last_shot_hit = outcome.is_hit();

        if self.board(defender).all_sunk() {
            self.status = GameStatus::Over { winner: shooter };
            debug!("{} sank the last ship at {:?}", shooter, coord);
        }
        Ok(ShotReport {
            shooter,
            coord,
            outcome,
            reveal: false,
            winner: self.winner(),
            turn_exhausted: !self.budget_allows(),
        })
    }

    fn reveal_shot(&mut self, shooter: PlayerId, coord: Coord, has_ship: bool) -> ShotReport {
        let state = self.player_mut(shooter);
        state.cloaked.remove(&coord);
        state.revealed.insert(coord);
        self.turn.shots_this_turn += 1;
        // A reveal lands no new hit, so it does not extend a tillmiss chain.
        self.turn.last_shot_hit = false;
        ShotReport {
            shooter,
            coord,
            outcome: if has_ship {
                ShotOutcome::Hit
            } else {
                ShotOutcome::Miss
            },
            reveal: true,
            winner: None,
            turn_exhausted: !self.budget_allows(),
        }
    }

    /// Pass the turn to the other player. Returns the new current player.
    pub fn end_turn(&mut self) -> Result<PlayerId, ShotError> {
        if self.status != GameStatus::InProgress {
            return Err(ShotError::NotInBattle);
        }
        let ending = self.turn.current;
        self.player_mut(ending).flags.end_of_turn();
        let next = ending.other();
        self.turn = TurnState {
            current: next,
            shots_this_turn: 0,
            last_shot_hit: false,
            sonar_armed: false,
            live_ships_at_start: self.board(next).live_ship_count(),
        };
        Ok(next)
    }

    pub fn use_power_up_as(&mut self, player: PlayerId, power_up: PowerUp) -> Result<(), PowerUpError> {
        if player != self.turn.current {
            return Err(PowerUpError::NotYourTurn);
        }
        self.use_power_up(power_up)
    }

    /// Spend one point on `power_up` for the current player.
    pub fn use_power_up(&mut self, power_up: PowerUp) -> Result<(), PowerUpError> {
        if !self.settings.power_ups_enabled {
            return Err(PowerUpError::Disabled);
        }
        if self.status != GameStatus::InProgress {
            return Err(PowerUpError::NotInBattle);
        }
        let user = self.turn.current;
        let state = self.player_mut(user);
        if state.flags.used_power_up {
            return Err(PowerUpError::AlreadyUsedThisTurn);
        }
        if state.power_points == 0 {
            return Err(PowerUpError::InsufficientPoints);
        }
        state.power_points -= 1;
        state.flags.used_power_up = true;
        match power_up {
            PowerUp::Sonar => self.turn.sonar_armed = true,
            PowerUp::ExtraShot => state.flags.extra_shot = true,
            PowerUp::Scope => state.flags.scope_active = true,
            PowerUp::Cloak => self.player_mut(user.other()).flags.cloak_active = true,
        }
        debug!("{} used {:?}", user, power_up);
        Ok(())
    }

    /// Scan the 3×3 area around `center` with armed sonar.
    pub fn sonar_scan(&mut self, center: Coord) -> Result<SonarReport, PowerUpError> {
        if !self.turn.sonar_armed {
            return Err(PowerUpError::SonarNotArmed);
        }
        let target = self.board(self.turn.current.other());
        if !target.in_bounds(center) {
            return Err(PowerUpError::OutOfBounds);
        }
        let side = target.side();
        let (row, col) = center;
        let mut ships: Vec<String> = Vec::new();
        for r in row.saturating_sub(1)..=(row + 1).min(side - 1) {
            for c in col.saturating_sub(1)..=(col + 1).min(side - 1) {
                if let Some(ship) = target.ship_at((r, c)) {
                    if !ships.contains(&ship.name) {
                        ships.push(ship.name.clone());
                    }
                }
            }
        }
        self.turn.sonar_armed = false;
        Ok(SonarReport { center, ships })
    }

    /// A board click: a sonar scan while sonar is armed, otherwise a shot.
    pub fn click(&mut self, coord: Coord) -> Result<ClickOutcome, ShotError> {
        if self.turn.sonar_armed {
            self.sonar_scan(coord)
                .map(ClickOutcome::Sonar)
                .map_err(|_| ShotError::OutOfBounds)
        } else {
            self.shoot(coord).map(ClickOutcome::Shot)
        }
    }

    fn viewer(&self, player: PlayerId) -> Viewer<'_> {
        let state = self.player(player);
        Viewer {
            fog_of_war: self.settings.fog_of_war,
            scope_active: state.flags.scope_active,
            cloaked: &state.cloaked,
            revealed: &state.revealed,
        }
    }

    /// How `viewer` sees `coord` on their opponent's board.
    pub fn opponent_view(&self, viewer: PlayerId, coord: Coord) -> CellView {
        let board = self.board(viewer.other());
        let Some(cell) = board.cell(coord) else {
            return CellView::Unknown;
        };
        let sunk = board.ship_at(coord).map(|s| s.sunk).unwrap_or(false);
        self.viewer(viewer)
            .classify(coord, cell.is_hit, cell.has_ship, sunk)
    }

    /// The whole opponent board as seen by `viewer`, row-major.
    pub fn opponent_views(&self, viewer: PlayerId) -> Vec<Vec<CellView>> {
        let side = self.settings.grid_size.side();
        (0..side)
            .map(|r| (0..side).map(|c| self.opponent_view(viewer, (r, c))).collect())
            .collect()
    }

    /// `player`'s own board with ships visible.
    pub fn own_views(&self, player: PlayerId) -> Vec<Vec<OwnCellView>> {
        let board = self.board(player);
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

    /// Whether the current player may click `coord` on the opponent board.
    pub fn is_clickable(&self, coord: Coord) -> bool {
        if self.status != GameStatus::InProgress {
            return false;
        }
        let shooter = self.turn.current;
        let Some(cell) = self.board(shooter.other()).cell(coord) else {
            return false;
        };
        if self.turn.sonar_armed {
            return true;
        }
        self.can_shoot() && (!cell.is_hit || self.viewer(shooter).can_reshoot(coord))
    }
}

/// Board must match the configured fleet exactly and carry no shots.
pub fn check_fleet(settings: &GameSettings, board: &Board) -> Result<(), BoardError> {
    if board.grid_size() != settings.grid_size {
        return Err(BoardError::Inconsistent);
    }
    let complete = settings
        .fleet()
        .iter()
        .all(|(ty, n)| board.placed_count(ty.name()) == *n);
    if !complete || board.ships().len() != settings.total_ships() {
        return Err(BoardError::PlacementIncomplete);
    }
    if board.ships().iter().any(|s| s.hits > 0) {
        return Err(BoardError::Inconsistent);
    }
    Ok(())
}
