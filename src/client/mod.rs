//! Online client: event replication and the node driving a local player.

pub mod node;
pub mod session;

pub use node::{OnlineNode, Role, SessionEnd};
pub use session::ClientSession;
