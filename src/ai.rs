// Target selection for the computer opponent.
// A hunt queue follows up on hits; the difficulty decides how the AI searches
// when the queue is empty.

use std::collections::VecDeque;

use log::{debug, warn};
use rand::Rng;

use crate::board::{Board, KnownBoard};
use crate::common::{Coord, ShotOutcome};
use crate::config::AiDifficulty;
use crate::ship::Orientation;

/// Random rolls allowed before the AI gives up on finding a target.
pub const MAX_RANDOM_ATTEMPTS: usize = 200;

const CORNER_CHANCE: f64 = 0.3;
const PARITY_REROLL_CHANCE: f64 = 0.8;

/// Read access to the board the AI is aiming at.
///
/// The authoritative [`Board`] exposes true ship positions (used by the
/// omniscient difficulty in local play); a [`KnownBoard`] only knows what the
/// shot results revealed.
pub trait TargetGrid {
    fn side(&self) -> usize;
    fn is_shot(&self, coord: Coord) -> bool;
    fn has_ship(&self, coord: Coord) -> bool;

    fn in_bounds(&self, (row, col): Coord) -> bool {
        row < self.side() && col < self.side()
    }

    /// A shot landed here and struck a ship.
    fn is_known_hit(&self, coord: Coord) -> bool {
        self.is_shot(coord) && self.has_ship(coord)
    }
}

impl TargetGrid for Board {
    fn side(&self) -> usize {
        Board::side(self)
    }

    fn is_shot(&self, coord: Coord) -> bool {
        self.cell(coord).map(|c| c.is_hit).unwrap_or(false)
    }

    fn has_ship(&self, coord: Coord) -> bool {
        self.cell(coord).map(|c| c.has_ship).unwrap_or(false)
    }
}

impl TargetGrid for KnownBoard {
    fn side(&self) -> usize {
        KnownBoard::side(self)
    }

    fn is_shot(&self, coord: Coord) -> bool {
        self.cell(coord).map(|c| c.shot).unwrap_or(false)
    }

    fn has_ship(&self, coord: Coord) -> bool {
        self.cell(coord).map(|c| c.ship).unwrap_or(false)
    }
}

/// Targeting state of one AI player.
#[derive(Debug, Clone)]
pub struct AiTargeting {
    difficulty: AiDifficulty,
    queue: VecDeque<Coord>,
    direction: Option<Orientation>,
    hunt_hits: Vec<Coord>,
}

impl AiTargeting {
    pub fn new(difficulty: AiDifficulty) -> Self {
        Self {
            difficulty,
            queue: VecDeque::new(),
            direction: None,
            hunt_hits: Vec::new(),
        }
    }

    pub fn difficulty(&self) -> AiDifficulty {
        self.difficulty
    }

    /// Cells queued for follow-up, front first.
    pub fn hunt_queue(&self) -> &VecDeque<Coord> {
        &self.queue
    }

    /// Axis locked by two aligned hits, if any.
    pub fn direction(&self) -> Option<Orientation> {
        self.direction
    }

    /// Forget the current hunt.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.direction = None;
        self.hunt_hits.clear();
    }

    /// Pick the next cell to fire at, or `None` when no target was found.
    pub fn select_target<R: Rng + ?Sized>(&mut self, rng: &mut R, grid: &dyn TargetGrid) -> Option<Coord> {
        while let Some(coord) = self.queue.pop_front() {
            if grid.in_bounds(coord) && !grid.is_shot(coord) {
                return Some(coord);
            }
        }
        let found = match self.difficulty {
            AiDifficulty::Easy => random_target(rng, grid, pick_easy),
            AiDifficulty::Medium => random_target(rng, grid, pick_medium),
            AiDifficulty::Hard => adjacent_to_hit(grid).or_else(|| random_target(rng, grid, pick_uniform)),
            AiDifficulty::Impossible => {
                first_unshot_ship(grid).or_else(|| random_target(rng, grid, pick_uniform))
            }
        };
        if found.is_none() {
            warn!("{:?} AI found no target after {} attempts", self.difficulty, MAX_RANDOM_ATTEMPTS);
        }
        found
    }

    /// Update the hunt after one of our shots resolved.
    pub fn observe(&mut self, coord: Coord, outcome: &ShotOutcome, grid: &dyn TargetGrid) {
        match outcome {
            ShotOutcome::Miss => {}
            ShotOutcome::Sunk { .. } => self.reset(),
            ShotOutcome::Hit => self.observe_hit(coord, grid),
        }
    }

    fn observe_hit(&mut self, coord: Coord, grid: &dyn TargetGrid) {
        let axis = match self.direction {
            Some(axis) if self.on_axis(axis, coord) => Some(axis),
            Some(_) => None,
            None => match self.hunt_hits.last() {
                Some(&(r, _)) if r == coord.0 => Some(Orientation::Horizontal),
                Some(&(_, c)) if c == coord.1 => Some(Orientation::Vertical),
                _ => None,
            },
        };
        self.hunt_hits.push(coord);
        match axis {
            Some(axis) => {
                self.direction = Some(axis);
                self.extend_along(axis, coord, grid);
            }
            None => self.queue_neighbours(coord, grid),
        }
        debug!("hunt queue after hit at {:?}: {:?}", coord, self.queue);
    }

    fn on_axis(&self, axis: Orientation, coord: Coord) -> bool {
        let Some(&(r, c)) = self.hunt_hits.first() else {
            return false;
        };
        match axis {
            Orientation::Horizontal => r == coord.0,
            Orientation::Vertical => c == coord.1,
        }
    }

    fn queue_neighbours(&mut self, (row, col): Coord, grid: &dyn TargetGrid) {
        let candidates = [
            row.checked_sub(1).map(|r| (r, col)),
            Some((row + 1, col)),
            col.checked_sub(1).map(|c| (row, c)),
            Some((row, col + 1)),
        ];
        for coord in candidates.into_iter().flatten() {
            if grid.in_bounds(coord) && !grid.is_shot(coord) && !self.queue.contains(&coord) {
                self.queue.push_back(coord);
            }
        }
    }

    /// Move the two cells just past the ends of the aligned hits to the front,
    /// the end beyond `latest` first.
    fn extend_along(&mut self, axis: Orientation, latest: Coord, grid: &dyn TargetGrid) {
        let line: Vec<usize> = self
            .hunt_hits
            .iter()
            .filter(|&&(r, c)| match axis {
                Orientation::Horizontal => r == latest.0,
                Orientation::Vertical => c == latest.1,
            })
            .map(|&(r, c)| match axis {
                Orientation::Horizontal => c,
                Orientation::Vertical => r,
            })
            .collect();
        let (Some(&lo), Some(&hi)) = (line.iter().min(), line.iter().max()) else {
            return;
        };
        let latest_pos = match axis {
            Orientation::Horizontal => latest.1,
            Orientation::Vertical => latest.0,
        };
        let at = |pos: usize| match axis {
            Orientation::Horizontal => (latest.0, pos),
            Orientation::Vertical => (pos, latest.1),
        };
        let past_hi = Some(at(hi + 1));
        let past_lo = lo.checked_sub(1).map(at);
        let ordered = if latest_pos == lo {
            [past_lo, past_hi]
        } else {
            [past_hi, past_lo]
        };
        // Push in reverse so the preferred end lands at the very front.
        for coord in ordered.into_iter().rev().flatten() {
            self.queue.retain(|&q| q != coord);
            if grid.in_bounds(coord) && !grid.is_shot(coord) {
                self.queue.push_front(coord);
            }
        }
    }
}

fn random_target<R: Rng + ?Sized>(
    rng: &mut R,
    grid: &dyn TargetGrid,
    pick: fn(&mut R, usize) -> Option<Coord>,
) -> Option<Coord> {
    let side = grid.side();
    if side == 0 {
        return None;
    }
    (0..MAX_RANDOM_ATTEMPTS)
        .filter_map(|_| pick(rng, side))
        .find(|&coord| !grid.is_shot(coord))
}

fn pick_uniform<R: Rng + ?Sized>(rng: &mut R, side: usize) -> Option<Coord> {
    Some((rng.random_range(0..side), rng.random_range(0..side)))
}

fn pick_easy<R: Rng + ?Sized>(rng: &mut R, side: usize) -> Option<Coord> {
    if rng.random_bool(CORNER_CHANCE) {
        let last = side - 1;
        let corners = [(0, 0), (0, last), (last, 0), (last, last)];
        Some(corners[rng.random_range(0..corners.len())])
    } else {
        pick_uniform(rng, side)
    }
}

/// Even-parity cells are mostly re-rolled; a re-roll still costs an attempt.
fn pick_medium<R: Rng + ?Sized>(rng: &mut R, side: usize) -> Option<Coord> {
    let (row, col) = (rng.random_range(0..side), rng.random_range(0..side));
    if (row + col) % 2 == 0 && rng.random_bool(PARITY_REROLL_CHANCE) {
        None
    } else {
        Some((row, col))
    }
}

fn adjacent_to_hit(grid: &dyn TargetGrid) -> Option<Coord> {
    let side = grid.side();
    (0..side)
        .flat_map(|r| (0..side).map(move |c| (r, c)))
        .filter(|&coord| !grid.is_shot(coord))
        .find(|&(r, c)| {
            (r.saturating_sub(1)..=(r + 1).min(side - 1)).any(|nr| {
                (c.saturating_sub(1)..=(c + 1).min(side - 1))
                    .any(|nc| (nr, nc) != (r, c) && grid.is_known_hit((nr, nc)))
            })
        })
}

fn first_unshot_ship(grid: &dyn TargetGrid) -> Option<Coord> {
    let side = grid.side();
    (0..side)
        .flat_map(|r| (0..side).map(move |c| (r, c)))
        .find(|&coord| !grid.is_shot(coord) && grid.has_ship(coord))
}
