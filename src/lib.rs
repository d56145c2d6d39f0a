mod ai;
mod board;
mod common;
mod config;
mod game;
mod local;
mod logging;
mod placement;
mod powerup;
mod rules;
mod ship;
mod visibility;

pub mod client;
pub mod player;
pub mod protocol;
pub mod server;
pub mod transport;

pub use ai::*;
pub use board::*;
pub use common::*;
pub use config::*;
pub use game::*;
pub use local::*;
pub use logging::{init_logging, LOG_ENV};
pub use placement::*;
pub use player::{AiPlayer, CliPlayer, Player, TurnAction, TurnContext};
pub use powerup::*;
pub use protocol::*;
pub use rules::*;
pub use ship::*;
pub use visibility::*;
