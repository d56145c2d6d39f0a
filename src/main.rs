use std::collections::BTreeMap;

use broadside::client::{OnlineNode, Role, SessionEnd};
use broadside::server::{run_server, ServerConfig, DEFAULT_BIND};
use broadside::transport::{HeartbeatTransport, TcpTransport};
use broadside::{
    init_logging, AiDifficulty, AiPlayer, CliPlayer, GameSettings, GridSize, LocalMatch, Player,
    ShootingRule,
};
use clap::{Args, Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(author, version, about = "Battleship with power-ups, an AI and online rooms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct SettingsArgs {
    /// Board side length: 7, 10, 12 or 15.
    #[arg(long, default_value_t = 10)]
    grid: u8,
    /// Shooting rule: oneshot, twoshots, threeshots, tillmiss or shipfire.
    #[arg(long, default_value = "oneshot")]
    rule: ShootingRule,
    /// Hide hit/miss detail on the opponent board.
    #[arg(long)]
    fog: bool,
    /// Enable sonar, extra shot, cloak and scope.
    #[arg(long)]
    power_ups: bool,
    /// Fleet override, e.g. --ship destroyer=2 --ship carrier=1 (repeatable).
    #[arg(long = "ship", value_parser = parse_ship_count)]
    ships: Vec<(String, usize)>,
}

impl SettingsArgs {
    fn to_settings(&self) -> anyhow::Result<GameSettings> {
        let mut settings = GameSettings {
            grid_size: GridSize::try_from(self.grid)?,
            shooting_rule: self.rule,
            fog_of_war: self.fog,
            power_ups_enabled: self.power_ups,
            ..GameSettings::default()
        };
        if !self.ships.is_empty() {
            settings.ship_counts = self.ships.iter().cloned().collect::<BTreeMap<_, _>>();
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the computer in the terminal.
    Play {
        #[command(flatten)]
        settings: SettingsArgs,
        #[arg(long, default_value = "medium")]
        difficulty: AiDifficulty,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Two players taking turns at one terminal.
    Hotseat {
        #[command(flatten)]
        settings: SettingsArgs,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the relay server.
    Serve {
        #[arg(long, env = "BROADSIDE_BIND", default_value = DEFAULT_BIND)]
        bind: String,
    },
    /// Create an online room and play in it.
    Host {
        #[arg(long, default_value = "127.0.0.1:3000")]
        connect: String,
        #[command(flatten)]
        settings: SettingsArgs,
        /// Let the computer play this seat.
        #[arg(long)]
        ai: bool,
        #[arg(long, default_value = "medium")]
        difficulty: AiDifficulty,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Join an online room by id.
    Join {
        room: String,
        #[arg(long, default_value = "127.0.0.1:3000")]
        connect: String,
        #[arg(long)]
        ai: bool,
        #[arg(long, default_value = "medium")]
        difficulty: AiDifficulty,
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// `name=count` with a case-insensitive ship name.
fn parse_ship_count(s: &str) -> Result<(String, usize), String> {
    let (name, count) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=COUNT, got '{}'", s))?;
    let ty = broadside::SHIPS
        .iter()
        .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| format!("unknown ship '{}'", name))?;
    let count = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid count '{}'", count))?;
    Ok((ty.name().to_string(), count))
}

fn make_rng(seed: Option<u64>, offset: u64) -> SmallRng {
    match seed {
        Some(s) => SmallRng::seed_from_u64(s.wrapping_add(offset)),
        None => SmallRng::from_rng(&mut rand::rng()),
    }
}

fn seat(ai: bool, difficulty: AiDifficulty, name: &str) -> Box<dyn Player> {
    if ai {
        Box::new(AiPlayer::new(difficulty))
    } else {
        Box::new(CliPlayer::stdio(name))
    }
}

async fn play_online(connect: &str, role: Role, player: Box<dyn Player>, rng: SmallRng) -> anyhow::Result<()> {
    let transport = HeartbeatTransport::with_defaults(TcpTransport::connect(connect).await?);
    let mut node = OnlineNode::new(player, transport, rng);
    match node.run(role).await? {
        SessionEnd::GameOver { winner } if winner == node.session().me() => println!("You win!"),
        SessionEnd::GameOver { winner } => println!("{} wins.", winner),
        SessionEnd::OpponentLeft => println!("Your opponent has disconnected."),
        SessionEnd::Quit => println!("Left the game."),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            settings,
            difficulty,
            seed,
        } => {
            if let Some(s) = seed {
                println!("Using fixed seed: {} (game will be reproducible)", s);
            }
            let mut game = LocalMatch::new(
                settings.to_settings()?,
                (Box::new(CliPlayer::stdio("You")), make_rng(seed, 0)),
                (Box::new(AiPlayer::new(difficulty)), make_rng(seed, 1)),
            )?;
            let summary = game.run()?;
            match summary.winner {
                Some(winner) => println!(
                    "{} wins after {} turns. Accuracy: you {:.0}%, AI {:.0}%",
                    winner,
                    summary.turns,
                    summary.stats[0].accuracy(),
                    summary.stats[1].accuracy()
                ),
                None => println!("Game abandoned."),
            }
        }
        Commands::Hotseat { settings, seed } => {
            let mut game = LocalMatch::new(
                settings.to_settings()?,
                (Box::new(CliPlayer::stdio("Player 1")), make_rng(seed, 0)),
                (Box::new(CliPlayer::stdio("Player 2")), make_rng(seed, 1)),
            )?;
            let summary = game.run()?;
            if let Some(winner) = summary.winner {
                println!("{} wins after {} turns.", winner, summary.turns);
            }
        }
        Commands::Serve { bind } => {
            run_server(ServerConfig { bind }).await?;
        }
        Commands::Host {
            connect,
            settings,
            ai,
            difficulty,
            seed,
        } => {
            let role = Role::Host(settings.to_settings()?);
            play_online(&connect, role, seat(ai, difficulty, "Host"), make_rng(seed, 0)).await?;
        }
        Commands::Join {
            room,
            connect,
            ai,
            difficulty,
            seed,
        } => {
            play_online(&connect, Role::Guest(room), seat(ai, difficulty, "Guest"), make_rng(seed, 0)).await?;
        }
    }

    Ok(())
}
