//! Local match driver: two `Player`s sharing one process and one engine.
//!
//! Used for human vs AI, hot-seat, and AI vs AI simulation.

use log::{debug, info};
use rand::rngs::SmallRng;

use crate::board::Board;
use crate::common::{BoardError, PlayerId, ShotOutcome};
use crate::config::{GameSettings, SettingsError};
use crate::game::{GameEngine, PlayerStats};
use crate::placement::PlacementEngine;
use crate::player::{Player, TurnAction, TurnContext};

struct Seat {
    player: Box<dyn Player>,
    rng: SmallRng,
}

/// Outcome of a finished or abandoned local match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSummary {
    /// `None` when a player quit.
    pub winner: Option<PlayerId>,
    /// Completed turns.
    pub turns: u32,
    pub stats: [PlayerStats; 2],
}

pub struct LocalMatch {
    settings: GameSettings,
    seats: [Seat; 2],
}

impl LocalMatch {
    pub fn new(
        settings: GameSettings,
        one: (Box<dyn Player>, SmallRng),
        two: (Box<dyn Player>, SmallRng),
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings,
            seats: [
                Seat { player: one.0, rng: one.1 },
                Seat { player: two.0, rng: two.1 },
            ],
        })
    }

    fn place(&mut self, id: PlayerId) -> Result<Board, BoardError> {
        let seat = &mut self.seats[id.index()];
        let mut placement = PlacementEngine::new(&self.settings);
        seat.player.place_ships(&mut seat.rng, &mut placement)?;
        placement.finish()
    }

    /// Place both fleets and play until someone wins or quits.
    pub fn run(&mut self) -> Result<MatchSummary, BoardError> {
        let one = self.place(PlayerId::One)?;
        let two = self.place(PlayerId::Two)?;
        let mut engine = GameEngine::start(self.settings.clone(), one, two)?;
        info!(
            "local match started: {}x{}, rule {}",
            self.settings.grid_size.side(),
            self.settings.grid_size.side(),
            self.settings.shooting_rule.name()
        );

        let mut turns = 0;
        loop {
            if let Some(winner) = engine.winner() {
                for seat in &mut self.seats {
                    seat.player.handle_game_over(winner);
                }
                info!("{} wins after {} turns", winner, turns);
                return Ok(summary(&engine, Some(winner), turns));
            }
            let me = engine.current_player();
            let action = {
                let opponent_view = engine.opponent_views(me);
                let own_view = engine.own_views(me);
                let flags = engine.flags(me);
                let ctx = TurnContext {
                    me,
                    target: engine.board(me.other()),
                    opponent_view: &opponent_view,
                    own_view: &own_view,
                    own_board: engine.board(me),
                    can_shoot: engine.can_shoot(),
                    shots_remaining: engine.shots_remaining(),
                    sonar_armed: engine.turn().sonar_armed,
                    power_ups_enabled: engine.settings().power_ups_enabled,
                    power_points: engine.power_points(me),
                    used_power_up: flags.used_power_up,
                };
                let seat = &mut self.seats[me.index()];
                seat.player.next_action(&mut seat.rng, &ctx)
            };
            debug!("{}: {:?}", me, action);

            match action {
                TurnAction::Fire(coord) => match engine.shoot(coord) {
                    Ok(report) => {
                        let grid = engine.board(me.other());
                        self.seats[me.index()]
                            .player
                            .handle_shot_result(coord, &report.outcome, grid);
                        if !report.reveal {
                            self.seats[me.other().index()]
                                .player
                                .handle_opponent_shot(coord, &report.outcome);
                        }
                        if let ShotOutcome::Sunk { name, .. } = &report.outcome {
                            debug!("{} sank a {}", me, name);
                        }
                    }
                    Err(e) => self.seats[me.index()].player.handle_rejection(&e.to_string()),
                },
                TurnAction::PowerUp(kind) => {
                    if let Err(e) = engine.use_power_up(kind) {
                        self.seats[me.index()].player.handle_rejection(&e.to_string());
                    }
                }
                TurnAction::Sonar(coord) => match engine.sonar_scan(coord) {
                    Ok(report) => self.seats[me.index()].player.handle_sonar(&report),
                    Err(e) => self.seats[me.index()].player.handle_rejection(&e.to_string()),
                },
                TurnAction::EndTurn => {
                    if engine.end_turn().is_ok() {
                        turns += 1;
                    }
                }
                TurnAction::Quit => {
                    info!("{} left the match", me);
                    return Ok(summary(&engine, None, turns));
                }
            }
        }
    }
}

fn summary(engine: &GameEngine, winner: Option<PlayerId>, turns: u32) -> MatchSummary {
    MatchSummary {
        winner,
        turns,
        stats: [engine.stats(PlayerId::One), engine.stats(PlayerId::Two)],
    }
}
