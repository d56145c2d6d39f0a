//! Power-ups and the per-player flags they drive.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Power-ups a player can spend points on, one per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUp {
    /// Arm a 3×3 scan for the next click instead of a shot.
    Sonar,
    /// One more shot this turn.
    ExtraShot,
    /// Hide shot feedback from the opponent during their next turn.
    Cloak,
    /// Plain hit/miss visibility this turn despite fog of war.
    Scope,
}

impl PowerUp {
    pub const ALL: [PowerUp; 4] = [PowerUp::Sonar, PowerUp::ExtraShot, PowerUp::Cloak, PowerUp::Scope];

    pub fn name(self) -> &'static str {
        match self {
            PowerUp::Sonar => "sonar",
            PowerUp::ExtraShot => "extra",
            PowerUp::Cloak => "cloak",
            PowerUp::Scope => "scope",
        }
    }
}

impl FromStr for PowerUp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sonar" => Ok(PowerUp::Sonar),
            "extra" | "extrashot" | "extra-shot" => Ok(PowerUp::ExtraShot),
            "cloak" => Ok(PowerUp::Cloak),
            "scope" => Ok(PowerUp::Scope),
            other => Err(format!("unknown power-up '{}'", other)),
        }
    }
}

/// Per-turn flags of one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnFlags {
    pub used_power_up: bool,
    pub scope_active: bool,
    pub extra_shot: bool,
    /// Set by the opponent's cloak; covers this player's next turn.
    pub cloak_active: bool,
}

impl TurnFlags {
    /// Flags after this player's turn ends. Everything is turn-scoped.
    pub fn end_of_turn(&mut self) {
        *self = TurnFlags::default();
    }
}

/// Result of a sonar scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SonarReport {
    pub center: (usize, usize),
    /// Distinct ship names in the scanned area, in row-major first-seen order.
    pub ships: Vec<String>,
}
