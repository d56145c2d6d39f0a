use std::collections::BTreeMap;
use std::io::Cursor;

use broadside::player::cli::{parse_coord, write_opponent_board};
use broadside::{
    AiDifficulty, AiPlayer, Board, CellView, CliPlayer, GameSettings, GridSize, LocalMatch, OwnCellView,
    Player, PlayerId, PowerUp, ShootingRule, TurnAction, TurnContext,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn one_destroyer() -> GameSettings {
    GameSettings {
        grid_size: GridSize::Seven,
        shooting_rule: ShootingRule::OneShot,
        ship_counts: BTreeMap::from([("Destroyer".to_string(), 1)]),
        ..GameSettings::default()
    }
}

fn scripted(name: &str, script: &'static str) -> Box<dyn Player> {
    Box::new(CliPlayer::new(name, Cursor::new(script), Vec::new()))
}

#[test]
fn test_hotseat_script_player_one_wins() {
    // player one: destroyer on A1-B1, sinks A7-B7 in two turns
    let one = scripted("One", "a1\ndone\nA7\nend\nB7\n");
    // player two: flips orientation twice, destroyer on A7-B7
    let two = scripted("Two", "v\nr\na7\ndone\nd4\nend\n");
    let mut game = LocalMatch::new(
        one_destroyer(),
        (one, SmallRng::seed_from_u64(1)),
        (two, SmallRng::seed_from_u64(2)),
    )
    .unwrap();
    let summary = game.run().unwrap();
    assert_eq!(summary.winner, Some(PlayerId::One));
    assert_eq!(summary.turns, 2);
    assert_eq!(summary.stats[0].shots, 2);
    assert_eq!(summary.stats[0].hits, 2);
    assert_eq!(summary.stats[1].hits, 0);
}

#[test]
fn test_closed_input_places_randomly_then_quits() {
    let mut game = LocalMatch::new(
        one_destroyer(),
        (scripted("One", ""), SmallRng::seed_from_u64(3)),
        (Box::new(AiPlayer::new(AiDifficulty::Easy)), SmallRng::seed_from_u64(4)),
    )
    .unwrap();
    let summary = game.run().unwrap();
    assert_eq!(summary.winner, None);
    assert_eq!(summary.turns, 0);
}

#[test]
fn test_invalid_settings_refused() {
    let settings = GameSettings {
        ship_counts: BTreeMap::new(),
        ..GameSettings::default()
    };
    let result = LocalMatch::new(
        settings,
        (Box::new(AiPlayer::default()), SmallRng::seed_from_u64(1)),
        (Box::new(AiPlayer::default()), SmallRng::seed_from_u64(2)),
    );
    assert!(result.is_err());
}

#[test]
fn test_every_rule_finishes() {
    for rule in ShootingRule::ALL {
        let settings = GameSettings {
            shooting_rule: rule,
            power_ups_enabled: true,
            ..GameSettings::default()
        };
        let mut game = LocalMatch::new(
            settings,
            (Box::new(AiPlayer::new(AiDifficulty::Hard)), SmallRng::seed_from_u64(10)),
            (Box::new(AiPlayer::new(AiDifficulty::Hard)), SmallRng::seed_from_u64(20)),
        )
        .unwrap();
        let summary = game.run().unwrap();
        assert!(summary.winner.is_some(), "{} did not finish", rule.name());
    }
}

struct Fixture {
    board: Board,
    opponent: Vec<Vec<CellView>>,
    own: Vec<Vec<OwnCellView>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            board: Board::new(GridSize::Seven),
            opponent: vec![vec![CellView::Unknown; 7]; 7],
            own: vec![vec![OwnCellView::Water; 7]; 7],
        }
    }

    fn ctx(&self, sonar_armed: bool, power_ups_enabled: bool) -> TurnContext<'_> {
        TurnContext {
            me: PlayerId::One,
            target: &self.board,
            opponent_view: &self.opponent,
            own_view: &self.own,
            own_board: &self.board,
            can_shoot: !sonar_armed,
            shots_remaining: Some(1),
            sonar_armed,
            power_ups_enabled,
            power_points: 2,
            used_power_up: false,
        }
    }
}

#[test]
fn test_cli_actions() {
    let fixture = Fixture::new();
    let mut rng = SmallRng::seed_from_u64(0);
    let mut player = CliPlayer::new("You", Cursor::new("Z9\nsonar\nc3\n\nextra\nquit\n"), Vec::new());

    // bad cell is reported, then power-ups are refused while disabled
    assert_eq!(
        player.next_action(&mut rng, &fixture.ctx(false, false)),
        TurnAction::Fire((2, 2))
    );
    assert_eq!(
        player.next_action(&mut rng, &fixture.ctx(false, true)),
        TurnAction::PowerUp(PowerUp::ExtraShot)
    );
    assert_eq!(player.next_action(&mut rng, &fixture.ctx(false, true)), TurnAction::Quit);

    let output = String::from_utf8(player.into_output()).unwrap();
    assert!(output.contains("Column 'Z' out of bounds"));
    assert!(output.contains("Power-ups are disabled"));
}

#[test]
fn test_cli_sonar_click() {
    let fixture = Fixture::new();
    let mut rng = SmallRng::seed_from_u64(0);
    let mut player = CliPlayer::new("You", Cursor::new("d4\n"), Vec::new());
    assert_eq!(
        player.next_action(&mut rng, &fixture.ctx(true, true)),
        TurnAction::Sonar((3, 3))
    );
}

#[test]
fn test_board_rendering() {
    let mut view = vec![vec![CellView::Unknown; 7]; 7];
    view[0][0] = CellView::Hit;
    view[1][2] = CellView::Fired;
    let mut out = Vec::new();
    write_opponent_board(&mut out, &view).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0].trim(), "A B C D E F G");
    assert!(lines[1].ends_with("X . . . . . ."));
    assert!(lines[2].ends_with(". . ? . . . ."));
    assert_eq!(parse_coord("g7", 7), Ok((6, 6)));
}
