use log::warn;
use rand::rngs::SmallRng;

use crate::ai::{AiTargeting, TargetGrid};
use crate::common::{BoardError, Coord, ShotOutcome};
use crate::config::AiDifficulty;
use crate::placement::PlacementEngine;

use super::{Player, TurnAction, TurnContext};

/// Computer player: random placement, hunt-queue targeting, no power-ups.
pub struct AiPlayer {
    targeting: AiTargeting,
}

impl AiPlayer {
    pub fn new(difficulty: AiDifficulty) -> Self {
        Self {
            targeting: AiTargeting::new(difficulty),
        }
    }

    pub fn targeting(&self) -> &AiTargeting {
        &self.targeting
    }
}

impl Default for AiPlayer {
    fn default() -> Self {
        Self::new(AiDifficulty::default())
    }
}

impl Player for AiPlayer {
    fn place_ships(&mut self, rng: &mut SmallRng, placement: &mut PlacementEngine) -> Result<(), BoardError> {
        placement.place_randomly(rng)
    }

    fn next_action(&mut self, rng: &mut SmallRng, ctx: &TurnContext<'_>) -> TurnAction {
        if !ctx.can_shoot {
            return TurnAction::EndTurn;
        }
        match self.targeting.select_target(rng, ctx.target) {
            Some(coord) => TurnAction::Fire(coord),
            None => {
                warn!("AI ({}) has no target, ending turn", ctx.me);
                TurnAction::EndTurn
            }
        }
    }

    fn handle_shot_result(&mut self, coord: Coord, outcome: &ShotOutcome, grid: &dyn TargetGrid) {
        self.targeting.observe(coord, outcome, grid);
    }

    fn reset(&mut self) {
        self.targeting.reset();
    }
}
