use std::collections::BTreeMap;

use broadside::{
    compute_ship_cells, ship_type, Board, BoardError, CellView, ClickOutcome, Coord, GameEngine,
    GameSettings, GameStatus, GridSize, Orientation, PlayerId, PowerUp, PowerUpError, ShootingRule,
    ShotError, ShotOutcome,
};

fn settings(rule: ShootingRule) -> GameSettings {
    GameSettings {
        grid_size: GridSize::Seven,
        shooting_rule: rule,
        ship_counts: BTreeMap::from([("Destroyer".to_string(), 2), ("Cruiser".to_string(), 1)]),
        ..GameSettings::default()
    }
}

/// Destroyers on rows 0 and 1, cruiser on row 2, all starting in column 0.
fn fleet_board() -> Board {
    let mut board = Board::new(GridSize::Seven);
    for (name, origin) in [("Destroyer", (0, 0)), ("Destroyer", (1, 0)), ("Cruiser", (2, 0))] {
        let ty = ship_type(name).unwrap();
        board
            .place_ship(compute_ship_cells(origin, ty.length(), Orientation::Horizontal), ty)
            .unwrap();
    }
    board
}

fn engine(settings: GameSettings) -> GameEngine {
    GameEngine::start(settings, fleet_board(), fleet_board()).unwrap()
}

fn shoot_all(engine: &mut GameEngine, coords: &[Coord]) {
    for &c in coords {
        engine.shoot(c).unwrap();
    }
}

#[test]
fn test_start_rejects_incomplete_fleet() {
    let mut short = Board::new(GridSize::Seven);
    let ty = ship_type("Destroyer").unwrap();
    short
        .place_ship(compute_ship_cells((0, 0), 2, Orientation::Horizontal), ty)
        .unwrap();
    let err = GameEngine::start(settings(ShootingRule::OneShot), fleet_board(), short).err();
    assert_eq!(err, Some(BoardError::PlacementIncomplete));

    let mut shot = fleet_board();
    shot.resolve_shot((0, 0)).unwrap();
    let err = GameEngine::start(settings(ShootingRule::OneShot), fleet_board(), shot).err();
    assert_eq!(err, Some(BoardError::Inconsistent));
}

#[test]
fn test_one_shot_turn() {
    let mut engine = engine(settings(ShootingRule::OneShot));
    assert_eq!(engine.current_player(), PlayerId::One);
    let report = engine.shoot((6, 6)).unwrap();
    assert_eq!(report.outcome, ShotOutcome::Miss);
    assert!(report.turn_exhausted);
    assert!(!engine.can_shoot());
    assert_eq!(engine.shoot((6, 5)).unwrap_err(), ShotError::BudgetExhausted);

    assert_eq!(engine.end_turn().unwrap(), PlayerId::Two);
    assert_eq!(engine.shots_remaining(), Some(1));
    assert_eq!(engine.shoot_as(PlayerId::One, (0, 0)).unwrap_err(), ShotError::NotYourTurn);
}

#[test]
fn test_fixed_rules_budget() {
    for (rule, shots) in [(ShootingRule::TwoShots, 2), (ShootingRule::ThreeShots, 3)] {
        let mut engine = engine(settings(rule));
        for i in 0..shots {
            assert_eq!(engine.shots_remaining(), Some(shots - i));
            engine.shoot((6, i as usize)).unwrap();
        }
        assert_eq!(engine.shoot((5, 6)).unwrap_err(), ShotError::BudgetExhausted);
    }
}

#[test]
fn test_till_miss_allows_hits_plus_one() {
    let mut engine = engine(settings(ShootingRule::TillMiss));
    assert_eq!(engine.shots_remaining(), None);
    shoot_all(&mut engine, &[(0, 0), (0, 1), (1, 0)]);
    assert!(engine.can_shoot());
    let report = engine.shoot((6, 6)).unwrap();
    assert!(report.turn_exhausted);
    assert_eq!(engine.shoot((6, 5)).unwrap_err(), ShotError::BudgetExhausted);
    assert_eq!(engine.stats(PlayerId::One).shots, 4);
    assert_eq!(engine.stats(PlayerId::One).hits, 3);
}

#[test]
fn test_ship_fire_counts_own_live_ships() {
    let mut engine = engine(settings(ShootingRule::ShipFire));
    assert_eq!(engine.shots_remaining(), Some(3));
    shoot_all(&mut engine, &[(6, 0), (6, 1), (6, 2)]);
    engine.end_turn().unwrap();

    // player two sinks a destroyer of player one
    shoot_all(&mut engine, &[(0, 0), (0, 1)]);
    assert_eq!(engine.board(PlayerId::One).live_ship_count(), 2);
    engine.end_turn().unwrap();

    assert_eq!(engine.current_player(), PlayerId::One);
    assert_eq!(engine.shots_remaining(), Some(2));
}

#[test]
fn test_player_two_wins() {
    let settings = GameSettings {
        grid_size: GridSize::Seven,
        ship_counts: BTreeMap::from([("Destroyer".to_string(), 1)]),
        ..GameSettings::default()
    };
    let destroyer_at = |origin| {
        let mut board = Board::new(GridSize::Seven);
        let ty = ship_type("Destroyer").unwrap();
        board
            .place_ship(compute_ship_cells(origin, 2, Orientation::Horizontal), ty)
            .unwrap();
        board
    };
    let mut engine = GameEngine::start(settings, destroyer_at((6, 0)), destroyer_at((0, 0))).unwrap();

    engine.shoot((3, 3)).unwrap();
    engine.end_turn().unwrap();
    assert_eq!(engine.shoot((6, 0)).unwrap().outcome, ShotOutcome::Hit);
    engine.end_turn().unwrap();
    engine.shoot((3, 4)).unwrap();
    engine.end_turn().unwrap();
    let report = engine.shoot((6, 1)).unwrap();

    assert!(matches!(report.outcome, ShotOutcome::Sunk { ref name, .. } if name == "Destroyer"));
    assert_eq!(report.winner, Some(PlayerId::Two));
    assert_eq!(engine.status(), GameStatus::Over { winner: PlayerId::Two });
    assert_eq!(engine.shoot((0, 0)).unwrap_err(), ShotError::NotInBattle);
    assert_eq!(engine.end_turn().unwrap_err(), ShotError::NotInBattle);
    assert!(!engine.is_clickable((0, 0)));
    assert_eq!(engine.stats(PlayerId::Two).accuracy(), 100.0);
}

#[test]
fn test_already_shot_without_fog() {
    let mut engine = engine(settings(ShootingRule::TwoShots));
    engine.shoot((0, 0)).unwrap();
    assert!(!engine.is_clickable((0, 0)));
    assert_eq!(engine.shoot((0, 0)).unwrap_err(), ShotError::AlreadyShot);
    assert_eq!(engine.shoot((7, 0)).unwrap_err(), ShotError::OutOfBounds);
    assert_eq!(engine.shots_remaining(), Some(1));
}

#[test]
fn test_power_ups_disabled() {
    let mut engine = engine(settings(ShootingRule::OneShot));
    assert_eq!(engine.power_points(PlayerId::One), 0);
    assert_eq!(engine.use_power_up(PowerUp::Scope).unwrap_err(), PowerUpError::Disabled);
}

fn power_settings(rule: ShootingRule) -> GameSettings {
    GameSettings {
        power_ups_enabled: true,
        ..settings(rule)
    }
}

#[test]
fn test_extra_shot_and_one_per_turn() {
    let mut engine = engine(power_settings(ShootingRule::OneShot));
    assert_eq!(engine.power_points(PlayerId::One), 2);
    engine.use_power_up(PowerUp::ExtraShot).unwrap();
    assert_eq!(engine.power_points(PlayerId::One), 1);
    assert_eq!(engine.shots_remaining(), Some(2));
    assert_eq!(
        engine.use_power_up(PowerUp::Scope).unwrap_err(),
        PowerUpError::AlreadyUsedThisTurn
    );
    shoot_all(&mut engine, &[(6, 0), (6, 1)]);
    assert!(!engine.can_shoot());

    engine.end_turn().unwrap();
    assert_eq!(
        engine.use_power_up_as(PlayerId::One, PowerUp::Scope).unwrap_err(),
        PowerUpError::NotYourTurn
    );
    engine.end_turn().unwrap();
    assert_eq!(engine.shots_remaining(), Some(1));
    assert!(!engine.flags(PlayerId::One).used_power_up);
}

#[test]
fn test_points_never_go_negative() {
    let mut engine = engine(power_settings(ShootingRule::OneShot));
    for _ in 0..2 {
        engine.use_power_up(PowerUp::Scope).unwrap();
        engine.end_turn().unwrap();
        engine.end_turn().unwrap();
    }
    assert_eq!(engine.power_points(PlayerId::One), 0);
    assert_eq!(
        engine.use_power_up(PowerUp::Scope).unwrap_err(),
        PowerUpError::InsufficientPoints
    );
    assert_eq!(engine.power_points(PlayerId::One), 0);
    assert!(!engine.flags(PlayerId::One).used_power_up);
}

#[test]
fn test_sinking_earns_a_point() {
    let mut engine = engine(power_settings(ShootingRule::TwoShots));
    shoot_all(&mut engine, &[(0, 0), (0, 1)]);
    assert_eq!(engine.power_points(PlayerId::One), 3);
    assert_eq!(engine.power_points(PlayerId::Two), 2);
}

#[test]
fn test_sonar_scan() {
    let mut engine = engine(power_settings(ShootingRule::OneShot));
    engine.use_power_up(PowerUp::Sonar).unwrap();
    assert!(engine.turn().sonar_armed);
    assert!(!engine.can_shoot());
    assert_eq!(engine.shoot((0, 0)).unwrap_err(), ShotError::SonarArmed);
    assert!(engine.is_clickable((6, 6)));

    let report = match engine.click((1, 1)).unwrap() {
        ClickOutcome::Sonar(report) => report,
        other => panic!("expected sonar, got {:?}", other),
    };
    assert_eq!(report.ships, vec!["Destroyer".to_string(), "Cruiser".to_string()]);
    assert!(!engine.turn().sonar_armed);
    // scanning did not spend a shot
    assert_eq!(engine.shots_remaining(), Some(1));
    assert_eq!(engine.sonar_scan((1, 1)).unwrap_err(), PowerUpError::SonarNotArmed);
    assert!(matches!(engine.click((5, 5)).unwrap(), ClickOutcome::Shot(_)));
}

#[test]
fn test_sonar_clipped_at_corner() {
    let mut engine = engine(power_settings(ShootingRule::OneShot));
    engine.use_power_up(PowerUp::Sonar).unwrap();
    let report = engine.sonar_scan((6, 6)).unwrap();
    assert!(report.ships.is_empty());
}

#[test]
fn test_sonar_disarmed_at_turn_end() {
    let mut engine = engine(power_settings(ShootingRule::OneShot));
    engine.use_power_up(PowerUp::Sonar).unwrap();
    engine.end_turn().unwrap();
    assert!(!engine.turn().sonar_armed);
    assert!(engine.can_shoot());
}

#[test]
fn test_fog_hides_results_until_scope_or_reshot() {
    let fog = GameSettings {
        fog_of_war: true,
        ..power_settings(ShootingRule::ThreeShots)
    };
    let mut engine = engine(fog);
    engine.shoot((0, 0)).unwrap();
    engine.shoot((6, 6)).unwrap();
    assert_eq!(engine.opponent_view(PlayerId::One, (0, 0)), CellView::Fired);
    assert_eq!(engine.opponent_view(PlayerId::One, (6, 6)), CellView::Fired);
    assert_eq!(engine.opponent_view(PlayerId::One, (5, 5)), CellView::Unknown);

    // re-shooting reveals without touching statistics
    assert!(engine.is_clickable((0, 0)));
    let report = engine.shoot((0, 0)).unwrap();
    assert!(report.reveal);
    assert_eq!(report.outcome, ShotOutcome::Hit);
    assert!(report.turn_exhausted);
    assert_eq!(engine.stats(PlayerId::One).shots, 2);
    assert_eq!(engine.opponent_view(PlayerId::One, (0, 0)), CellView::Hit);
    assert_eq!(engine.opponent_view(PlayerId::One, (6, 6)), CellView::Fired);

    engine.end_turn().unwrap();
    engine.end_turn().unwrap();
    engine.use_power_up(PowerUp::Scope).unwrap();
    assert_eq!(engine.opponent_view(PlayerId::One, (6, 6)), CellView::Miss);
    engine.end_turn().unwrap();
    assert_eq!(engine.opponent_view(PlayerId::One, (6, 6)), CellView::Fired);
}

#[test]
fn test_fog_still_shows_sunk_ships() {
    let fog = GameSettings {
        fog_of_war: true,
        ..settings(ShootingRule::TwoShots)
    };
    let mut engine = engine(fog);
    shoot_all(&mut engine, &[(0, 0), (0, 1)]);
    assert_eq!(engine.opponent_view(PlayerId::One, (0, 0)), CellView::Sunk);
    assert_eq!(engine.opponent_view(PlayerId::One, (0, 1)), CellView::Sunk);
}

#[test]
fn test_cloak_hides_opponent_feedback_for_one_turn() {
    let mut engine = engine(power_settings(ShootingRule::TwoShots));
    engine.use_power_up(PowerUp::Cloak).unwrap();
    assert!(engine.flags(PlayerId::Two).cloak_active);
    engine.end_turn().unwrap();

    let report = engine.shoot((0, 0)).unwrap();
    assert_eq!(report.outcome, ShotOutcome::Hit);
    assert!(engine.cloaked_cells(PlayerId::Two).contains(&(0, 0)));
    assert_eq!(engine.opponent_view(PlayerId::Two, (0, 0)), CellView::Fired);
    assert!(engine.is_clickable((0, 0)));

    let reveal = engine.shoot((0, 0)).unwrap();
    assert!(reveal.reveal);
    assert_eq!(engine.opponent_view(PlayerId::Two, (0, 0)), CellView::Hit);
    assert_eq!(engine.stats(PlayerId::Two).shots, 1);

    engine.end_turn().unwrap();
    engine.end_turn().unwrap();
    assert!(!engine.flags(PlayerId::Two).cloak_active);
    engine.shoot((1, 0)).unwrap();
    assert_eq!(engine.opponent_view(PlayerId::Two, (1, 0)), CellView::Hit);
}

#[test]
fn test_own_views_show_damage() {
    let mut engine = engine(settings(ShootingRule::TwoShots));
    engine.end_turn().unwrap();
    shoot_all(&mut engine, &[(0, 0), (6, 6)]);
    let own = engine.own_views(PlayerId::One);
    assert_eq!(own[0][0].symbol(), 'X');
    assert_eq!(own[0][1].symbol(), 'S');
    assert_eq!(own[6][6].symbol(), 'o');
    assert_eq!(own[5][5].symbol(), '.');
}
