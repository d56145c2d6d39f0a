//! Board state: cell grid, placed ships, shot application.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::{BoardError, Coord, ShotOutcome};
use crate::config::{ship_type, GridSize};
use crate::ship::{compute_ship_cells, Orientation, Ship, ShipId, ShipType};

/// Attempts made by [`Board::random_placement`] before giving up.
const RANDOM_PLACEMENT_ATTEMPTS: usize = 100;

/// A single square of a board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub has_ship: bool,
    pub is_hit: bool,
    pub ship_id: Option<ShipId>,
}

/// One player's board: a square grid and the ships placed on it.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    size: GridSize,
    cells: Vec<Vec<Cell>>,
    ships: Vec<Ship>,
    next_id: u32,
}

impl Board {
    /// Create an empty board (no ships placed).
    pub fn new(size: GridSize) -> Self {
        let side = size.side();
        Board {
            size,
            cells: vec![vec![Cell::default(); side]; side],
            ships: Vec::new(),
            next_id: 0,
        }
    }

    pub fn grid_size(&self) -> GridSize {
        self.size
    }

    /// Side length of the grid.
    pub fn side(&self) -> usize {
        self.size.side()
    }

    pub fn in_bounds(&self, (row, col): Coord) -> bool {
        row < self.side() && col < self.side()
    }

    pub fn cell(&self, (row, col): Coord) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Raw grid, row-major.
    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    /// Ships in placement order.
    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id == id)
    }

    /// Ship occupying `coord`, if any.
    pub fn ship_at(&self, coord: Coord) -> Option<&Ship> {
        self.cell(coord)
            .and_then(|c| c.ship_id)
            .and_then(|id| self.ship(id))
    }

    /// Number of placed ships with the given name.
    pub fn placed_count(&self, name: &str) -> usize {
        self.ships.iter().filter(|s| s.name == name).count()
    }

    /// Returns `true` when every ship is sunk.
    pub fn all_sunk(&self) -> bool {
        self.ships.iter().all(|s| s.sunk)
    }

    /// Number of ships still afloat.
    pub fn live_ship_count(&self) -> usize {
        self.ships.iter().filter(|s| !s.sunk).count()
    }

    /// Coordinates of every occupied cell, row-major.
    pub fn occupied(&self) -> Vec<Coord> {
        let mut out = Vec::new();
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell.has_ship {
                    out.push((r, c));
                }
            }
        }
        out
    }

    /// Every cell in bounds and free of ships. Ships may touch.
    pub fn is_valid_placement(&self, cells: &[Coord]) -> bool {
        cells
            .iter()
            .all(|&c| self.cell(c).map(|cell| !cell.has_ship).unwrap_or(false))
    }

    /// Place a ship over `cells`, assigning it the next id.
    pub fn place_ship(&mut self, cells: Vec<Coord>, ship_type: ShipType) -> Result<&Ship, BoardError> {
        if let Some(&(row, col)) = cells.iter().find(|&&c| !self.in_bounds(c)) {
            return Err(BoardError::OutOfBounds { row, col });
        }
        if !self.is_valid_placement(&cells) {
            return Err(BoardError::ShipOverlaps);
        }
        let id = ShipId(self.next_id);
        self.next_id += 1;
        for &(r, c) in &cells {
            self.cells[r][c].has_ship = true;
            self.cells[r][c].ship_id = Some(id);
        }
        self.ships.push(Ship::new(id, ship_type, cells));
        let idx = self.ships.len() - 1;
        Ok(&self.ships[idx])
    }

    /// Remove the most recently placed ship named `name` and clear its cells.
    pub fn remove_ship(&mut self, name: &str) -> Option<Ship> {
        let idx = self.ships.iter().rposition(|s| s.name == name)?;
        let ship = self.ships.remove(idx);
        for &(r, c) in &ship.cells {
            self.cells[r][c].has_ship = false;
            self.cells[r][c].ship_id = None;
        }
        Some(ship)
    }

    /// Clear every ship and shot from the board.
    pub fn clear(&mut self) {
        *self = Board::new(self.size);
    }

    /// Returns a random non-overlapping origin and orientation for `ship_type`.
    pub fn random_placement<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ship_type: ShipType,
    ) -> Result<(Coord, Orientation), BoardError> {
        let side = self.side();
        let len = ship_type.length();
        if len == 0 || len > side {
            return Err(BoardError::UnableToPlaceShip);
        }
        for _ in 0..RANDOM_PLACEMENT_ATTEMPTS {
            let orient = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_r, max_c) = match orient {
                Orientation::Horizontal => (side - 1, side - len),
                Orientation::Vertical => (side - len, side - 1),
            };
            let origin = (rng.random_range(0..=max_r), rng.random_range(0..=max_c));
            if self.is_valid_placement(&compute_ship_cells(origin, len, orient)) {
                return Ok((origin, orient));
            }
        }
        Err(BoardError::UnableToPlaceShip)
    }

    /// Process a shot at `coord`, marking the cell and reporting the result.
    pub fn resolve_shot(&mut self, coord: Coord) -> Result<ShotOutcome, BoardError> {
        let (row, col) = coord;
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(BoardError::OutOfBounds { row, col })?;
        if cell.is_hit {
            return Err(BoardError::AlreadyShot);
        }
        cell.is_hit = true;
        let Some(id) = cell.ship_id else {
            return Ok(ShotOutcome::Miss);
        };
        let ship = self
            .ships
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(BoardError::Inconsistent)?;
        if ship.register_hit() {
            Ok(ShotOutcome::Sunk {
                name: ship.name.clone(),
                size: ship.size,
                cells: ship.cells.clone(),
            })
        } else {
            Ok(ShotOutcome::Hit)
        }
    }

    /// Rebuild a board submitted as a raw grid plus ship list.
    ///
    /// Ships are re-placed in order through the normal placement checks; the
    /// grid's occupancy must match the result. Shot state is not accepted.
    pub fn from_parts(size: GridSize, cells: &[Vec<Cell>], ships: &[Ship]) -> Result<Self, BoardError> {
        let side = size.side();
        if cells.len() != side || cells.iter().any(|r| r.len() != side) {
            return Err(BoardError::Inconsistent);
        }
        let mut board = Board::new(size);
        for ship in ships {
            let ty = ship_type(&ship.name).ok_or(BoardError::NameNotFound)?;
            if ship.cells.len() != ty.length() || !is_straight_run(&ship.cells) {
                return Err(BoardError::MalformedShip);
            }
            board.place_ship(ship.cells.clone(), ty)?;
        }
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell.is_hit || cell.has_ship != board.cells[r][c].has_ship {
                    return Err(BoardError::Inconsistent);
                }
            }
        }
        Ok(board)
    }
}

fn is_straight_run(cells: &[Coord]) -> bool {
    let Some(&origin) = cells.first() else {
        return false;
    };
    let horizontal = compute_ship_cells(origin, cells.len(), Orientation::Horizontal);
    let vertical = compute_ship_cells(origin, cells.len(), Orientation::Vertical);
    cells == horizontal.as_slice() || cells == vertical.as_slice()
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{ side: {}, ships: {:?} }}", self.side(), self.ships)?;
        for row in &self.cells {
            let line: String = row
                .iter()
                .map(|c| match (c.has_ship, c.is_hit) {
                    (true, true) => 'X',
                    (true, false) => 'S',
                    (false, true) => 'o',
                    (false, false) => '.',
                })
                .collect();
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}

/// What a shooter has learned about one cell of the opponent's board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KnownCell {
    pub shot: bool,
    pub ship: bool,
    pub sunk: bool,
}

/// Shooter-side knowledge of an opponent board, built from shot results only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownBoard {
    size: GridSize,
    cells: Vec<Vec<KnownCell>>,
}

impl KnownBoard {
    pub fn new(size: GridSize) -> Self {
        let side = size.side();
        Self {
            size,
            cells: vec![vec![KnownCell::default(); side]; side],
        }
    }

    pub fn grid_size(&self) -> GridSize {
        self.size
    }

    pub fn side(&self) -> usize {
        self.size.side()
    }

    pub fn cell(&self, (row, col): Coord) -> Option<&KnownCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Record a shot result. Sinking marks every cell of the sunk ship.
    pub fn record(&mut self, (row, col): Coord, outcome: &ShotOutcome) -> Result<(), BoardError> {
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(BoardError::OutOfBounds { row, col })?;
        cell.shot = true;
        cell.ship = outcome.is_hit();
        if let ShotOutcome::Sunk { cells, .. } = outcome {
            for &(r, c) in cells {
                if let Some(known) = self.cells.get_mut(r).and_then(|row| row.get_mut(c)) {
                    known.ship = true;
                    known.sunk = true;
                }
            }
        }
        Ok(())
    }
}
