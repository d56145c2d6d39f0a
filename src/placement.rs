//! Per-player ship placement.
//!
//! Ship types are walked in catalogue order; every configured instance of a
//! type must be on the board before placement is complete. Clicking an
//! invalid cell is a silent no-op reported as `false`.

use rand::Rng;

use crate::board::Board;
use crate::common::{BoardError, Coord};
use crate::config::{ship_type, GameSettings};
use crate::ship::{compute_ship_cells, Orientation, ShipType};

/// Full-layout retries used by [`PlacementEngine::place_randomly`].
const RANDOM_LAYOUT_ATTEMPTS: usize = 20;

pub struct PlacementEngine {
    fleet: Vec<(ShipType, usize)>,
    board: Board,
    orientation: Orientation,
    selected: Option<ShipType>,
}

impl PlacementEngine {
    /// Start placement on an empty board, horizontal orientation.
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            fleet: settings.fleet(),
            board: Board::new(settings.grid_size),
            orientation: Orientation::Horizontal,
            selected: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn toggle_orientation(&mut self) {
        self.orientation = self.orientation.toggled();
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Configured ship types with their counts, in catalogue order.
    pub fn fleet(&self) -> &[(ShipType, usize)] {
        &self.fleet
    }

    fn still_needed(&self, ty: ShipType) -> bool {
        self.fleet
            .iter()
            .any(|(t, n)| *t == ty && self.board.placed_count(t.name()) < *n)
    }

    /// First ship type, in catalogue order, with instances left to place.
    pub fn next_ship(&self) -> Option<ShipType> {
        self.fleet
            .iter()
            .find(|(t, n)| self.board.placed_count(t.name()) < *n)
            .map(|(t, _)| *t)
    }

    /// Ship that the next click will place: the selected type if it still
    /// needs placing, otherwise the next ship.
    pub fn active_ship(&self) -> Option<ShipType> {
        self.selected
            .filter(|t| self.still_needed(*t))
            .or_else(|| self.next_ship())
    }

    /// All configured ships are placed; "done" may be enabled.
    pub fn is_complete(&self) -> bool {
        self.next_ship().is_none()
    }

    /// Select a ship type. If instances of it are already placed the last one
    /// is lifted off the board so it can be repositioned.
    pub fn select(&mut self, name: &str) -> bool {
        let Some(ty) = ship_type(name) else {
            return false;
        };
        if !self.fleet.iter().any(|(t, n)| *t == ty && *n > 0) {
            return false;
        }
        if self.board.placed_count(name) > 0 {
            self.board.remove_ship(name);
        }
        self.selected = Some(ty);
        true
    }

    /// Cells the active ship would cover at `origin`, and whether that spot is valid.
    pub fn preview(&self, origin: Coord) -> Option<(Vec<Coord>, bool)> {
        let ty = self.active_ship()?;
        let cells = compute_ship_cells(origin, ty.length(), self.orientation);
        let valid = self.board.is_valid_placement(&cells);
        Some((cells, valid))
    }

    /// Place the active ship at `origin` with the current orientation.
    pub fn place_at(&mut self, origin: Coord) -> bool {
        let Some(ty) = self.active_ship() else {
            return false;
        };
        let cells = compute_ship_cells(origin, ty.length(), self.orientation);
        if !self.board.is_valid_placement(&cells) {
            return false;
        }
        if self.board.place_ship(cells, ty).is_err() {
            return false;
        }
        if !self.still_needed(ty) {
            self.selected = None;
        }
        true
    }

    /// Place every remaining ship at random, retrying the whole layout if a
    /// dense fleet paints itself into a corner.
    pub fn place_randomly<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), BoardError> {
        let start = self.board.clone();
        for _ in 0..RANDOM_LAYOUT_ATTEMPTS {
            if self.try_fill_randomly(rng).is_ok() {
                self.selected = None;
                return Ok(());
            }
            self.board = start.clone();
        }
        Err(BoardError::UnableToPlaceShip)
    }

    fn try_fill_randomly<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), BoardError> {
        while let Some(ty) = self.next_ship() {
            let (origin, orient) = self.board.random_placement(rng, ty)?;
            self.board
                .place_ship(compute_ship_cells(origin, ty.length(), orient), ty)?;
        }
        Ok(())
    }

    /// Remove every ship and start over.
    pub fn reset(&mut self) {
        self.board.clear();
        self.orientation = Orientation::Horizontal;
        self.selected = None;
    }

    /// Hand over the finished board. Fails while ships remain unplaced.
    pub fn finish(self) -> Result<Board, BoardError> {
        if self.is_complete() {
            Ok(self.board)
        } else {
            Err(BoardError::PlacementIncomplete)
        }
    }
}
