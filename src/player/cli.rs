use std::io::{self, BufRead, Cursor, Stdin, Stdout, Write};

use log::warn;
use rand::rngs::SmallRng;

use crate::ai::TargetGrid;
use crate::board::Board;
use crate::common::{BoardError, Coord, PlayerId, ShotOutcome};
use crate::placement::PlacementEngine;
use crate::powerup::{PowerUp, SonarReport};
use crate::ship::Orientation;
use crate::visibility::{own_view, CellView, OwnCellView};

use super::{Player, TurnAction, TurnContext};

/// Line-oriented input. `Stdin` shares one buffer between handles, so two
/// hot-seat players can read from it without stealing each other's lines.
pub trait LineInput: Send {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;
}

impl LineInput for Stdin {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(&mut self.lock(), buf)
    }
}

impl<T: AsRef<[u8]> + Send> LineInput for Cursor<T> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

/// Interactive player reading commands line by line.
pub struct CliPlayer<R = Stdin, W = Stdout> {
    name: String,
    input: R,
    out: W,
}

impl CliPlayer {
    /// Player on the process's stdin/stdout.
    pub fn stdio(name: impl Into<String>) -> Self {
        Self::new(name, io::stdin(), io::stdout())
    }
}

impl<R: LineInput, W: Write> CliPlayer<R, W> {
    pub fn new(name: impl Into<String>, input: R, out: W) -> Self {
        Self {
            name: name.into(),
            input,
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Prompt and read one trimmed line; `None` once input is closed.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn place_interactively(&mut self, rng: &mut SmallRng, placement: &mut PlacementEngine) -> io::Result<bool> {
        writeln!(self.out, "\n=== {}: ship placement ===", self.name)?;
        writeln!(
            self.out,
            "Enter a cell (e.g. A5), 'r' to rotate, 'select <ship>', 'random', 'reset' or 'done'."
        )?;
        loop {
            let side = placement.board().side();
            write_own_board(&mut self.out, &own_grid(placement.board()))?;
            let status = match placement.active_ship() {
                Some(ty) => format!(
                    "Placing {} (length {}), {:?}",
                    ty.name(),
                    ty.length(),
                    placement.orientation()
                ),
                None => "All ships placed".to_string(),
            };
            writeln!(self.out, "{}", status)?;
            let Some(line) = self.prompt("> ")? else {
                return Ok(false);
            };
            let mut words = line.split_whitespace();
            match words.next().map(str::to_ascii_lowercase).as_deref() {
                None => {}
                Some("r" | "rotate") => placement.toggle_orientation(),
                Some("h") => placement.set_orientation(Orientation::Horizontal),
                Some("v") => placement.set_orientation(Orientation::Vertical),
                Some("random") => {
                    if let Err(e) = placement.place_randomly(rng) {
                        writeln!(self.out, "{}", e)?;
                    }
                }
                Some("reset") => placement.reset(),
                Some("select") => {
                    let name = words.next().unwrap_or_default();
                    if !placement.select(&capitalize(name)) {
                        writeln!(self.out, "No ship called '{}'", name)?;
                    }
                }
                Some("done") if placement.is_complete() => return Ok(true),
                Some("done") => writeln!(self.out, "Place every ship first")?,
                Some(cell) => match parse_coord(cell, side) {
                    Ok(origin) => {
                        if !placement.place_at(origin) {
                            writeln!(self.out, "Cannot place there")?;
                        }
                    }
                    Err(e) => writeln!(self.out, "{}", e)?,
                },
            }
        }
    }

    fn choose_action(&mut self, ctx: &TurnContext<'_>) -> io::Result<TurnAction> {
        writeln!(self.out, "\n=== {} ({}) ===", self.name, ctx.me)?;
        writeln!(self.out, "Opponent board:")?;
        write_opponent_board(&mut self.out, ctx.opponent_view)?;
        writeln!(self.out, "Your board:")?;
        write_own_board(&mut self.out, ctx.own_view)?;
        let shots = match ctx.shots_remaining {
            Some(n) => n.to_string(),
            None => "until miss".to_string(),
        };
        write!(self.out, "Shots left: {}", shots)?;
        if ctx.power_ups_enabled {
            write!(self.out, "  Power points: {}", ctx.power_points)?;
        }
        writeln!(self.out)?;
        let side = ctx.opponent_view.len();
        loop {
            let text = if ctx.sonar_armed {
                "Sonar armed, cell to scan: "
            } else if ctx.can_shoot {
                "Target (e.g. B7), power-up (sonar/extra/cloak/scope) or 'end': "
            } else {
                "No shots left, 'end' to pass the turn: "
            };
            let Some(line) = self.prompt(text)? else {
                return Ok(TurnAction::Quit);
            };
            let word = line.to_ascii_lowercase();
            match word.as_str() {
                "" => continue,
                "end" => return Ok(TurnAction::EndTurn),
                "quit" => return Ok(TurnAction::Quit),
                _ => {}
            }
            if let Ok(power_up) = word.parse::<PowerUp>() {
                if !ctx.power_ups_enabled {
                    writeln!(self.out, "Power-ups are disabled")?;
                    continue;
                }
                return Ok(TurnAction::PowerUp(power_up));
            }
            match parse_coord(&word, side) {
                Ok(coord) if ctx.sonar_armed => return Ok(TurnAction::Sonar(coord)),
                Ok(coord) => return Ok(TurnAction::Fire(coord)),
                Err(e) => writeln!(self.out, "{}", e)?,
            }
        }
    }
}

impl<R: LineInput, W: Write + Send> Player for CliPlayer<R, W> {
    fn place_ships(&mut self, rng: &mut SmallRng, placement: &mut PlacementEngine) -> Result<(), BoardError> {
        match self.place_interactively(rng, placement) {
            Ok(true) => Ok(()),
            Ok(false) => placement.place_randomly(rng),
            Err(e) => {
                warn!("terminal error during placement: {}", e);
                placement.place_randomly(rng)
            }
        }
    }

    fn next_action(&mut self, _rng: &mut SmallRng, ctx: &TurnContext<'_>) -> TurnAction {
        self.choose_action(ctx).unwrap_or_else(|e| {
            warn!("terminal error: {}", e);
            TurnAction::Quit
        })
    }

    fn handle_shot_result(&mut self, coord: Coord, outcome: &ShotOutcome, _grid: &dyn TargetGrid) {
        let text = match outcome {
            ShotOutcome::Miss => "miss".to_string(),
            ShotOutcome::Hit => "hit".to_string(),
            ShotOutcome::Sunk { name, .. } => format!("hit, {} sunk", name),
        };
        let _ = writeln!(self.out, "{}: {}", coord_to_string(coord), text);
    }

    fn handle_sonar(&mut self, report: &SonarReport) {
        let found = if report.ships.is_empty() {
            "nothing".to_string()
        } else {
            report.ships.join(", ")
        };
        let _ = writeln!(self.out, "Sonar at {}: {}", coord_to_string(report.center), found);
    }

    fn handle_opponent_shot(&mut self, coord: Coord, outcome: &ShotOutcome) {
        let verb = if outcome.is_hit() { "hit" } else { "missed" };
        let _ = writeln!(self.out, "Opponent {} at {}", verb, coord_to_string(coord));
    }

    fn handle_rejection(&mut self, reason: &str) {
        let _ = writeln!(self.out, "{}", reason);
    }

    fn handle_game_over(&mut self, winner: PlayerId) {
        let _ = writeln!(self.out, "Game over: {} wins", winner);
    }
}

/// `(row, col)` as shown to users, e.g. `(4, 0)` → `A5`.
pub fn coord_to_string((row, col): Coord) -> String {
    let letter = (b'A' + col as u8) as char;
    format!("{}{}", letter, row + 1)
}

/// Parse `A5`-style input for a board of `side` cells.
pub fn parse_coord(input: &str, side: usize) -> Result<Coord, String> {
    let mut chars = input.trim().chars();
    let Some(letter) = chars.next() else {
        return Err("Empty input".to_string());
    };
    let last = (b'A' + side as u8 - 1) as char;
    let letter = letter.to_ascii_uppercase();
    if !letter.is_ascii_uppercase() {
        return Err(format!("Invalid column '{}', use A-{}", letter, last));
    }
    let col = (letter as u8 - b'A') as usize;
    if col >= side {
        return Err(format!("Column '{}' out of bounds, use A-{}", letter, last));
    }
    let digits: String = chars.collect();
    let row: usize = digits
        .parse()
        .map_err(|_| format!("Invalid row '{}', use 1-{}", digits, side))?;
    if row == 0 || row > side {
        return Err(format!("Row {} out of bounds, use 1-{}", row, side));
    }
    Ok((row - 1, col))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

fn own_grid(board: &Board) -> Vec<Vec<OwnCellView>> {
    board
        .cells()
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, cell)| {
                    let sunk = board.ship_at((r, c)).map(|s| s.sunk).unwrap_or(false);
                    own_view(cell.has_ship, cell.is_hit, sunk)
                })
                .collect()
        })
        .collect()
}

fn write_header<W: Write>(out: &mut W, side: usize) -> io::Result<()> {
    write!(out, "    ")?;
    for c in 0..side {
        write!(out, " {}", (b'A' + c as u8) as char)?;
    }
    writeln!(out)
}

fn write_grid<W: Write>(out: &mut W, rows: impl Iterator<Item = Vec<char>>, side: usize) -> io::Result<()> {
    write_header(out, side)?;
    for (r, row) in rows.enumerate() {
        write!(out, "  {:2}", r + 1)?;
        for ch in row {
            write!(out, " {}", ch)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_opponent_board<W: Write>(out: &mut W, view: &[Vec<CellView>]) -> io::Result<()> {
    let rows = view.iter().map(|row| row.iter().map(|v| v.symbol()).collect());
    write_grid(out, rows, view.len())?;
    writeln!(out, "    X=hit  o=miss  #=sunk  ?=fired  .=unknown")
}

pub fn write_own_board<W: Write>(out: &mut W, view: &[Vec<OwnCellView>]) -> io::Result<()> {
    let rows = view.iter().map(|row| row.iter().map(|v| v.symbol()).collect());
    write_grid(out, rows, view.len())?;
    writeln!(out, "    S=ship  X=hit  o=miss  #=sunk  .=water")
}
