use broadside::{AiDifficulty, AiPlayer, GameSettings, LocalMatch, PlayerId};
use rand::{rngs::SmallRng, SeedableRng};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <seed1> <seed2>", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;

    let mut game = LocalMatch::new(
        GameSettings::default(),
        (
            Box::new(AiPlayer::new(AiDifficulty::Medium)),
            SmallRng::seed_from_u64(seed1),
        ),
        (
            Box::new(AiPlayer::new(AiDifficulty::Medium)),
            SmallRng::seed_from_u64(seed2),
        ),
    )?;
    let summary = game.run()?;

    let winner = summary.winner.map(|p| match p {
        PlayerId::One => "player1",
        PlayerId::Two => "player2",
    });
    let result = json!({
        "player1": {"shots": summary.stats[0].shots, "hits": summary.stats[0].hits},
        "player2": {"shots": summary.stats[1].shots, "hits": summary.stats[1].hits},
        "turns": summary.turns,
        "winner": winner,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
