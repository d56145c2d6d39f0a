//! Ship definitions and placement geometry.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::common::Coord;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn toggled(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Type of ship: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipType {
    name: &'static str,
    length: usize,
}

impl ShipType {
    /// Create a new ship type.
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    /// Ship's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ship's length.
    pub fn length(&self) -> usize {
        self.length
    }
}

/// Stable identifier of a ship within one board. Never reused on that board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipId(pub u32);

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Contiguous run of `size` cells starting at `origin` along `orientation`.
///
/// The run may leave the board; callers check it with
/// [`Board::is_valid_placement`](crate::board::Board::is_valid_placement).
pub fn compute_ship_cells(origin: Coord, size: usize, orientation: Orientation) -> Vec<Coord> {
    let (row, col) = origin;
    (0..size)
        .map(|i| match orientation {
            Orientation::Horizontal => (row, col + i),
            Orientation::Vertical => (row + i, col),
        })
        .collect()
}

/// A ship placed on a board.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub id: ShipId,
    pub name: String,
    pub size: usize,
    pub cells: Vec<Coord>,
    pub hits: usize,
    pub sunk: bool,
}

impl Ship {
    pub fn new(id: ShipId, ship_type: ShipType, cells: Vec<Coord>) -> Self {
        Self {
            id,
            name: ship_type.name().to_string(),
            size: ship_type.length(),
            cells,
            hits: 0,
            sunk: false,
        }
    }

    /// Whether the ship covers (`row`, `col`).
    pub fn contains(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }

    /// Count one more hit. Returns `true` when this hit sank the ship.
    ///
    /// Hits stop counting once the ship is sunk.
    pub fn register_hit(&mut self) -> bool {
        if self.sunk {
            return false;
        }
        self.hits += 1;
        self.sunk = self.hits == self.size;
        self.sunk
    }

    /// Orientation derived from the first two cells. Single-cell ships read as horizontal.
    pub fn orientation(&self) -> Orientation {
        match self.cells.as_slice() {
            [(r0, _), (r1, _), ..] if r0 != r1 => Orientation::Vertical,
            _ => Orientation::Horizontal,
        }
    }
}

impl fmt::Debug for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ship {{ id: {}, name: \"{}\", cells: {:?}, hits: {}/{}, sunk: {} }}",
            self.id, self.name, self.cells, self.hits, self.size, self.sunk,
        )
    }
}
