//! Ship catalogue and match settings.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ship::ShipType;

pub const NUM_SHIP_TYPES: usize = 5;

/// Ship types in the order placement walks through them.
pub const SHIPS: [ShipType; NUM_SHIP_TYPES] = [
    ShipType::new("Carrier", 5),
    ShipType::new("Battleship", 4),
    ShipType::new("Cruiser", 3),
    ShipType::new("Submarine", 3),
    ShipType::new("Destroyer", 2),
];

/// Power points each player starts a battle with.
pub const STARTING_POWER_POINTS: u32 = 2;

/// Look up a ship type by name.
pub fn ship_type(name: &str) -> Option<ShipType> {
    SHIPS.iter().copied().find(|s| s.name() == name)
}

/// Supported square board sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GridSize {
    Seven,
    #[default]
    Ten,
    Twelve,
    Fifteen,
}

impl GridSize {
    /// Side length of the board.
    pub fn side(self) -> usize {
        u8::from(self) as usize
    }

    /// Maximum number of ships (all types together) a fleet may contain.
    pub fn max_ships(self) -> usize {
        match self {
            GridSize::Seven => 4,
            GridSize::Ten => 7,
            GridSize::Twelve => 10,
            GridSize::Fifteen => 14,
        }
    }
}

impl From<GridSize> for u8 {
    fn from(size: GridSize) -> u8 {
        match size {
            GridSize::Seven => 7,
            GridSize::Ten => 10,
            GridSize::Twelve => 12,
            GridSize::Fifteen => 15,
        }
    }
}

impl TryFrom<u8> for GridSize {
    type Error = SettingsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            7 => Ok(GridSize::Seven),
            10 => Ok(GridSize::Ten),
            12 => Ok(GridSize::Twelve),
            15 => Ok(GridSize::Fifteen),
            other => Err(SettingsError::UnsupportedGridSize(other)),
        }
    }
}

/// How many shots a player gets per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShootingRule {
    #[default]
    OneShot,
    TwoShots,
    ThreeShots,
    /// Keep shooting until a miss.
    TillMiss,
    /// One shot per own ship still afloat.
    ShipFire,
}

impl ShootingRule {
    pub const ALL: [ShootingRule; 5] = [
        ShootingRule::OneShot,
        ShootingRule::TwoShots,
        ShootingRule::ThreeShots,
        ShootingRule::TillMiss,
        ShootingRule::ShipFire,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShootingRule::OneShot => "oneshot",
            ShootingRule::TwoShots => "twoshots",
            ShootingRule::ThreeShots => "threeshots",
            ShootingRule::TillMiss => "tillmiss",
            ShootingRule::ShipFire => "shipfire",
        }
    }
}

impl FromStr for ShootingRule {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShootingRule::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SettingsError::UnknownRule(s.to_string()))
    }
}

/// Targeting strategy of the computer opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Impossible,
}

impl FromStr for AiDifficulty {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "medium" => Ok(AiDifficulty::Medium),
            "hard" => Ok(AiDifficulty::Hard),
            "impossible" => Ok(AiDifficulty::Impossible),
            _ => Err(SettingsError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Errors raised while validating match settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    UnsupportedGridSize(u8),
    UnknownRule(String),
    UnknownDifficulty(String),
    UnknownShip(String),
    EmptyFleet,
    TooManyShips { count: usize, max: usize },
    FleetTooLarge { cells: usize, max: usize },
}

impl core::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SettingsError::UnsupportedGridSize(n) => {
                write!(f, "Unsupported grid size {} (use 7, 10, 12 or 15)", n)
            }
            SettingsError::UnknownRule(r) => write!(f, "Unknown shooting rule '{}'", r),
            SettingsError::UnknownDifficulty(d) => write!(f, "Unknown AI difficulty '{}'", d),
            SettingsError::UnknownShip(s) => write!(f, "Unknown ship type '{}'", s),
            SettingsError::EmptyFleet => write!(f, "At least one ship is required"),
            SettingsError::TooManyShips { count, max } => {
                write!(f, "{} ships configured, this grid allows {}", count, max)
            }
            SettingsError::FleetTooLarge { cells, max } => {
                write!(f, "Fleet covers {} cells, this grid allows {}", cells, max)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// Settings shared by both players, fixed once the battle starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub grid_size: GridSize,
    pub shooting_rule: ShootingRule,
    pub fog_of_war: bool,
    pub power_ups_enabled: bool,
    pub ship_counts: BTreeMap<String, usize>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            grid_size: GridSize::default(),
            shooting_rule: ShootingRule::default(),
            fog_of_war: false,
            power_ups_enabled: false,
            ship_counts: SHIPS.iter().map(|s| (s.name().to_string(), 1)).collect(),
        }
    }
}

impl GameSettings {
    /// Configured count for a ship type; zero when absent.
    pub fn count_of(&self, name: &str) -> usize {
        self.ship_counts.get(name).copied().unwrap_or(0)
    }

    /// Ship types with their configured counts, in declared order.
    pub fn fleet(&self) -> Vec<(ShipType, usize)> {
        SHIPS.iter().map(|s| (*s, self.count_of(s.name()))).collect()
    }

    /// Total number of ships in a fleet.
    pub fn total_ships(&self) -> usize {
        self.ship_counts.values().fold(0, |acc, n| acc.saturating_add(*n))
    }

    /// Total number of cells a fleet occupies.
    pub fn total_ship_cells(&self) -> usize {
        self.fleet()
            .iter()
            .fold(0, |acc, (s, n)| acc.saturating_add(s.length().saturating_mul(*n)))
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(name) = self.ship_counts.keys().find(|n| ship_type(n).is_none()) {
            return Err(SettingsError::UnknownShip(name.clone()));
        }
        let max = self.grid_size.max_ships();
        if let Some(&count) = self.ship_counts.values().find(|&&n| n > max) {
            return Err(SettingsError::TooManyShips { count, max });
        }
        let count = self.total_ships();
        if count == 0 {
            return Err(SettingsError::EmptyFleet);
        }
        if count > max {
            return Err(SettingsError::TooManyShips { count, max });
        }
        let cells = self.total_ship_cells();
        let side = self.grid_size.side();
        let max_cells = side * side / 2;
        if cells > max_cells {
            return Err(SettingsError::FleetTooLarge {
                cells,
                max: max_cells,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_counts(counts: &[(&str, usize)]) -> GameSettings {
        GameSettings {
            ship_counts: counts.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            ..GameSettings::default()
        }
    }

    #[test]
    fn huge_counts_are_rejected_without_overflow() {
        let settings = with_counts(&[("Carrier", usize::MAX), ("Destroyer", 5)]);
        assert_eq!(
            settings.validate(),
            Err(SettingsError::TooManyShips {
                count: usize::MAX,
                max: 7
            })
        );
        assert_eq!(settings.total_ships(), usize::MAX);
        assert_eq!(settings.total_ship_cells(), usize::MAX);
    }

    #[test]
    fn totals_are_bounded_by_grid_maximum() {
        assert!(with_counts(&[("Destroyer", 7)]).validate().is_ok());
        assert!(matches!(
            with_counts(&[("Destroyer", 4), ("Submarine", 4)]).validate(),
            Err(SettingsError::TooManyShips { count: 8, max: 7 })
        ));
        assert_eq!(with_counts(&[]).validate(), Err(SettingsError::EmptyFleet));
    }
}
