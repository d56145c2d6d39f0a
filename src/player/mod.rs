//! Player trait and implementations
//!
//! A `Player` decides what to do; it never mutates game state itself. Local
//! matches feed its actions to a `GameEngine`, online nodes send them to the
//! server as requests.
//! - AiPlayer: hunt queue plus difficulty-based search
//! - CliPlayer: interactive terminal player

use rand::rngs::SmallRng;

use crate::ai::TargetGrid;
use crate::board::Board;
use crate::common::{BoardError, Coord, PlayerId, ShotOutcome};
use crate::placement::PlacementEngine;
use crate::powerup::{PowerUp, SonarReport};
use crate::visibility::{CellView, OwnCellView};

/// One decision taken during a battle turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction {
    /// Shoot at a cell of the opponent board.
    Fire(Coord),
    /// Spend a power point.
    PowerUp(PowerUp),
    /// Scan around a cell with armed sonar.
    Sonar(Coord),
    EndTurn,
    /// Leave the match (input closed).
    Quit,
}

/// What a player may know while choosing an action.
pub struct TurnContext<'a> {
    pub me: PlayerId,
    /// Opponent board for targeting.
    pub target: &'a dyn TargetGrid,
    /// Opponent board as rendered under the current visibility rules.
    pub opponent_view: &'a [Vec<CellView>],
    pub own_view: &'a [Vec<OwnCellView>],
    pub own_board: &'a Board,
    pub can_shoot: bool,
    /// `None` when the rule allows shooting until a miss.
    pub shots_remaining: Option<u32>,
    pub sonar_armed: bool,
    pub power_ups_enabled: bool,
    pub power_points: u32,
    pub used_power_up: bool,
}

/// Interface implemented by different player types.
///
/// A Player is responsible for:
/// - Placing ships through a placement engine
/// - Choosing turn actions
/// - Tracking feedback from shots
pub trait Player: Send {
    /// Place every configured ship.
    fn place_ships(&mut self, rng: &mut SmallRng, placement: &mut PlacementEngine) -> Result<(), BoardError>;

    /// Choose the next action of the current turn.
    fn next_action(&mut self, rng: &mut SmallRng, ctx: &TurnContext<'_>) -> TurnAction;

    /// Result of one of our shots. `grid` already includes it.
    fn handle_shot_result(&mut self, _coord: Coord, _outcome: &ShotOutcome, _grid: &dyn TargetGrid) {}

    fn handle_sonar(&mut self, _report: &SonarReport) {}

    /// An opponent shot landed on our board.
    fn handle_opponent_shot(&mut self, _coord: Coord, _outcome: &ShotOutcome) {}

    /// The last action was refused.
    fn handle_rejection(&mut self, _reason: &str) {}

    fn handle_game_over(&mut self, _winner: PlayerId) {}

    /// Forget per-game state before a rematch.
    fn reset(&mut self) {}
}

pub mod ai;
pub use ai::AiPlayer;

pub mod cli;
pub use cli::CliPlayer;
