//! What a shooter may see of the opponent's board.
//!
//! Fog of war hides hit/miss detail behind a neutral marker unless Scope is
//! active or the cell was re-shot to reveal it. Cloaked cells stay neutral
//! regardless of fog until re-shot.

use std::collections::HashSet;

use crate::common::Coord;

/// Display state of a cell on the opponent board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    /// Not shot yet.
    Unknown,
    /// Shot here, result hidden.
    Fired,
    Miss,
    Hit,
    Sunk,
}

impl CellView {
    pub fn symbol(self) -> char {
        match self {
            CellView::Unknown => '.',
            CellView::Fired => '?',
            CellView::Miss => 'o',
            CellView::Hit => 'X',
            CellView::Sunk => '#',
        }
    }
}

/// Display state of a cell on the player's own board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnCellView {
    Water,
    Ship,
    Miss,
    Hit,
    Sunk,
}

impl OwnCellView {
    pub fn symbol(self) -> char {
        match self {
            OwnCellView::Water => '.',
            OwnCellView::Ship => 'S',
            OwnCellView::Miss => 'o',
            OwnCellView::Hit => 'X',
            OwnCellView::Sunk => '#',
        }
    }
}

/// The viewing player's visibility state.
pub struct Viewer<'a> {
    pub fog_of_war: bool,
    pub scope_active: bool,
    pub cloaked: &'a HashSet<Coord>,
    pub revealed: &'a HashSet<Coord>,
}

impl Viewer<'_> {
    /// Classify one opponent cell from what is known about it.
    pub fn classify(&self, coord: Coord, shot: bool, ship: bool, sunk: bool) -> CellView {
        if !shot {
            return CellView::Unknown;
        }
        if self.cloaked.contains(&coord) {
            return CellView::Fired;
        }
        if self.fog_of_war && !self.scope_active && !self.revealed.contains(&coord) {
            return if sunk { CellView::Sunk } else { CellView::Fired };
        }
        match (ship, sunk) {
            (false, _) => CellView::Miss,
            (true, true) => CellView::Sunk,
            (true, false) => CellView::Hit,
        }
    }

    /// Whether an already-shot cell may be shot again to reveal its result.
    pub fn can_reshoot(&self, coord: Coord) -> bool {
        self.fog_of_war || self.cloaked.contains(&coord)
    }
}

pub fn own_view(has_ship: bool, is_hit: bool, sunk: bool) -> OwnCellView {
    match (has_ship, is_hit) {
        (false, false) => OwnCellView::Water,
        (false, true) => OwnCellView::Miss,
        (true, false) => OwnCellView::Ship,
        (true, true) if sunk => OwnCellView::Sunk,
        (true, true) => OwnCellView::Hit,
    }
}
