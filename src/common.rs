//! Common types for Broadside: coordinates, shot outcomes and error enums.

use serde::{Deserialize, Serialize};

/// A `(row, col)` position on a board.
pub type Coord = (usize, usize);

/// One of the two seats in a match. Player one always shoots first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    /// The seat on the other side of the table.
    pub fn other(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    /// Player number as shown to users (1 or 2).
    pub fn number(self) -> u8 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }
}

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Result of a shot landing on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotOutcome {
    /// Shot hit only water.
    Miss,
    /// Shot hit a ship that is still afloat.
    Hit,
    /// Shot sank a ship, carrying its name, size and cells.
    Sunk {
        name: String,
        size: usize,
        cells: Vec<Coord>,
    },
}

impl ShotOutcome {
    /// Whether the shot struck a ship.
    pub fn is_hit(&self) -> bool {
        !matches!(self, ShotOutcome::Miss)
    }
}

/// Errors returned by Board operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Named ship not found in the catalogue or on the board.
    NameNotFound,
    /// Coordinate lies outside the grid.
    OutOfBounds { row: usize, col: usize },
    /// Ship placement overlaps another ship.
    ShipOverlaps,
    /// Ship cells are not a straight contiguous run of the right length.
    MalformedShip,
    /// Cell was already shot at.
    AlreadyShot,
    /// Unable to place ship (random or manual placement failed).
    UnableToPlaceShip,
    /// Grid dimensions or occupancy disagree with the ship list.
    Inconsistent,
    /// Placement is not complete yet.
    PlacementIncomplete,
}

impl core::fmt::Display for BoardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BoardError::NameNotFound => write!(f, "Ship name not found"),
            BoardError::OutOfBounds { row, col } => {
                write!(f, "Coordinate ({}, {}) is out of bounds", row, col)
            }
            BoardError::ShipOverlaps => write!(f, "Ship placement overlaps with another ship"),
            BoardError::MalformedShip => write!(f, "Ship cells do not form a straight line"),
            BoardError::AlreadyShot => write!(f, "Cell was already shot at"),
            BoardError::UnableToPlaceShip => write!(f, "Unable to place ship"),
            BoardError::Inconsistent => write!(f, "Board grid disagrees with its ship list"),
            BoardError::PlacementIncomplete => write!(f, "Not every ship has been placed"),
        }
    }
}

impl std::error::Error for BoardError {}

/// Reasons a shot is refused by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotError {
    /// The match is not in its battle phase.
    NotInBattle,
    /// Target lies outside the grid.
    OutOfBounds,
    /// The shot budget for this turn is used up.
    BudgetExhausted,
    /// The cell was already shot and may not be re-shot.
    AlreadyShot,
    /// Sonar is armed; the next click must be a sonar scan.
    SonarArmed,
    /// The caller is not the player whose turn it is.
    NotYourTurn,
}

impl core::fmt::Display for ShotError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ShotError::NotInBattle => write!(f, "The battle is not in progress"),
            ShotError::OutOfBounds => write!(f, "Target is outside the board"),
            ShotError::BudgetExhausted => write!(f, "No shots left this turn"),
            ShotError::AlreadyShot => write!(f, "That cell was already shot"),
            ShotError::SonarArmed => write!(f, "Sonar is armed, pick a cell to scan"),
            ShotError::NotYourTurn => write!(f, "It is not your turn"),
        }
    }
}

impl std::error::Error for ShotError {}

/// Reasons a power-up activation is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerUpError {
    /// Power-ups are switched off for this match.
    Disabled,
    /// A power-up was already used this turn.
    AlreadyUsedThisTurn,
    /// Not enough power points.
    InsufficientPoints,
    /// The match is not in its battle phase.
    NotInBattle,
    /// A sonar scan was requested without arming sonar first.
    SonarNotArmed,
    /// Scan target lies outside the grid.
    OutOfBounds,
    /// The caller is not the player whose turn it is.
    NotYourTurn,
}

impl core::fmt::Display for PowerUpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PowerUpError::Disabled => write!(f, "Power-ups are disabled"),
            PowerUpError::AlreadyUsedThisTurn => write!(f, "A power-up was already used this turn"),
            PowerUpError::InsufficientPoints => write!(f, "Not enough power points"),
            PowerUpError::NotInBattle => write!(f, "The battle is not in progress"),
            PowerUpError::SonarNotArmed => write!(f, "Sonar is not armed"),
            PowerUpError::OutOfBounds => write!(f, "Scan target is outside the board"),
            PowerUpError::NotYourTurn => write!(f, "It is not your turn"),
        }
    }
}

impl std::error::Error for PowerUpError {}
