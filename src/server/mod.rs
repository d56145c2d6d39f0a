//! Relay server: rooms, the hub actor, and the TCP listener.

pub mod hub;
pub mod listener;
pub mod room;
pub mod store;

pub use hub::{Hub, HubCommand};
pub use listener::{run_server, serve, serve_connection, ServerConfig, DEFAULT_BIND};
pub use room::{ConnId, Outbound, Room};
pub use store::{InMemoryRoomStore, RoomStore};
