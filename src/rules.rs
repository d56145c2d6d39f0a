//! Shot budget per shooting rule.

use crate::config::ShootingRule;

/// How many shots a turn allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotBudget {
    /// A fixed number of shots.
    Limited(u32),
    /// Shots continue while every shot of the turn has hit.
    UntilMiss,
}

impl ShotBudget {
    /// Budget for `rule`. `live_ships` is the shooter's own fleet still
    /// afloat at turn start; `extra_shot` adds one shot except under tillmiss.
    pub fn for_rule(rule: ShootingRule, live_ships: usize, extra_shot: bool) -> Self {
        let bonus = u32::from(extra_shot);
        match rule {
            ShootingRule::OneShot => ShotBudget::Limited(1 + bonus),
            ShootingRule::TwoShots => ShotBudget::Limited(2 + bonus),
            ShootingRule::ThreeShots => ShotBudget::Limited(3 + bonus),
            ShootingRule::TillMiss => ShotBudget::UntilMiss,
            ShootingRule::ShipFire => ShotBudget::Limited(live_ships as u32 + bonus),
        }
    }

    /// Whether another shot is allowed after `shots_taken` shots this turn.
    pub fn allows(self, shots_taken: u32, last_shot_hit: bool) -> bool {
        match self {
            ShotBudget::Limited(max) => shots_taken < max,
            ShotBudget::UntilMiss => shots_taken == 0 || last_shot_hit,
        }
    }

    /// Shots left, or `None` when unbounded.
    pub fn remaining(self, shots_taken: u32) -> Option<u32> {
        match self {
            ShotBudget::Limited(max) => Some(max.saturating_sub(shots_taken)),
            ShotBudget::UntilMiss => None,
        }
    }
}
