//! The hub: a single task owning every room and connection.
//!
//! Connection tasks forward decoded requests as [`HubCommand`]s over an
//! unbounded queue. The hub applies them one at a time, so room transitions
//! are atomic and both seats see broadcasts in the order they were produced.

use std::collections::HashMap;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::Rng;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::common::PlayerId;
use crate::config::GameSettings;
use crate::protocol::{ClientRequest, Message, ServerEvent, ROOM_ID_LEN};

use super::room::{ConnId, Outbound, Room};
use super::store::RoomStore;

const ROOM_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub const ROOM_NOT_FOUND: &str = "Room not found";
pub const ROOM_FULL: &str = "Room is full";

#[derive(Debug)]
pub enum HubCommand {
    /// A connection finished its handshake; events for it go to `outbox`.
    Connect {
        conn: ConnId,
        outbox: UnboundedSender<Message>,
    },
    Request {
        conn: ConnId,
        request: ClientRequest,
    },
    Disconnect {
        conn: ConnId,
    },
}

struct Connection {
    outbox: UnboundedSender<Message>,
    room: Option<String>,
}

pub struct Hub<S: RoomStore> {
    store: S,
    connections: HashMap<ConnId, Connection>,
    rng: SmallRng,
}

impl<S: RoomStore> Hub<S> {
    pub fn new(store: S, rng: SmallRng) -> Self {
        Self {
            store,
            connections: HashMap::new(),
            rng,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Room the connection currently sits in.
    pub fn room_of(&self, conn: ConnId) -> Option<&str> {
        self.connections.get(&conn)?.room.as_deref()
    }

    /// Process commands until every sender is gone.
    pub async fn run(mut self, mut commands: UnboundedReceiver<HubCommand>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }
        debug!("hub stopped");
    }

    pub fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Connect { conn, outbox } => {
                debug!("connection {} registered", conn);
                self.connections.insert(conn, Connection { outbox, room: None });
            }
            HubCommand::Disconnect { conn } => {
                self.leave_room(conn);
                self.connections.remove(&conn);
                debug!("connection {} closed", conn);
            }
            HubCommand::Request { conn, request } => {
                if !self.connections.contains_key(&conn) {
                    debug!("request from unknown connection {}", conn);
                    return;
                }
                self.handle_request(conn, request);
            }
        }
    }

    fn handle_request(&mut self, conn: ConnId, request: ClientRequest) {
        let request = match request {
            ClientRequest::CreateRoom { settings } => return self.create_room(conn, settings),
            ClientRequest::JoinRoom { room_id } => return self.join_room(conn, &room_id),
            ClientRequest::GetRoomInfo { room_id } => return self.room_info(conn, &room_id),
            other => other,
        };
        let Some(room_id) = self.room_of(conn).map(str::to_string) else {
            debug!("connection {} sent {:?} outside a room", conn, request);
            return;
        };
        let Some(room) = self.store.get_mut(&room_id) else {
            return;
        };
        let out = match request {
            ClientRequest::UpdateSettings { settings } => room.update_settings(conn, settings),
            ClientRequest::PlayerReady => room.player_ready(conn),
            ClientRequest::UpdateBoard { board, ships } => room.update_board(conn, &board, &ships),
            ClientRequest::PlacementDone => room.placement_done(conn),
            ClientRequest::Shoot { row, col } => room.shoot(conn, row, col),
            ClientRequest::EndTurn => room.end_turn(conn),
            ClientRequest::PlayAgain => room.play_again(conn),
            ClientRequest::UsePowerUp { power_up } => room.use_power_up(conn, power_up),
            ClientRequest::Sonar { row, col } => room.sonar(conn, row, col),
            ClientRequest::CreateRoom { .. }
            | ClientRequest::JoinRoom { .. }
            | ClientRequest::GetRoomInfo { .. } => Vec::new(),
        };
        self.dispatch(out);
    }

    fn create_room(&mut self, conn: ConnId, settings: GameSettings) {
        if let Err(e) = settings.validate() {
            self.send(conn, ServerEvent::Rejected { reason: e.to_string() });
            return;
        }
        self.leave_room(conn);
        let room_id = self.fresh_room_id();
        self.store.insert(Room::new(room_id.clone(), conn, settings.clone()));
        if let Some(c) = self.connections.get_mut(&conn) {
            c.room = Some(room_id.clone());
        }
        info!("Room created: {} by connection {}", room_id, conn);
        self.send(
            conn,
            ServerEvent::RoomCreated {
                room_id,
                player: PlayerId::One,
                settings,
            },
        );
    }

    fn room_info(&self, conn: ConnId, room_id: &str) {
        let Some(room) = self.store.get(room_id) else {
            debug!("connection {} asked about unknown room {}", conn, room_id);
            return;
        };
        let event = ServerEvent::RoomInfo {
            room_id: room.id().to_string(),
            phase: room.phase(),
            settings: room.settings().clone(),
            guest_present: room.has_guest(),
        };
        self.send(conn, event);
    }

    fn join_room(&mut self, conn: ConnId, room_id: &str) {
        let joinable = match self.store.get(room_id) {
            None => Err(ROOM_NOT_FOUND),
            Some(room) if !room.can_join() || room.seat_of(conn).is_some() => Err(ROOM_FULL),
            Some(_) => Ok(()),
        };
        if let Err(reason) = joinable {
            debug!("connection {} could not join {}: {}", conn, room_id, reason);
            self.send(conn, ServerEvent::JoinError { reason: reason.to_string() });
            return;
        }
        self.leave_room(conn);
        let out = self.store.get_mut(room_id).and_then(|room| room.join(conn));
        if let Some(out) = out {
            if let Some(c) = self.connections.get_mut(&conn) {
                c.room = Some(room_id.to_string());
            }
            self.dispatch(out);
        }
    }

    /// Take `conn` out of its room, notify the peer, drop the room once empty.
    fn leave_room(&mut self, conn: ConnId) {
        let Some(room_id) = self.connections.get_mut(&conn).and_then(|c| c.room.take()) else {
            return;
        };
        let Some(room) = self.store.get_mut(&room_id) else {
            return;
        };
        let out = room.leave(conn);
        let empty = room.is_empty();
        self.dispatch(out);
        if empty {
            self.store.remove(&room_id);
            info!("Room closed: {}", room_id);
        }
    }

    fn fresh_room_id(&mut self) -> String {
        loop {
            let id: String = (0..ROOM_ID_LEN)
                .map(|_| ROOM_ID_ALPHABET[self.rng.random_range(0..ROOM_ID_ALPHABET.len())] as char)
                .collect();
            if !self.store.contains(&id) {
                return id;
            }
        }
    }

    fn send(&self, conn: ConnId, event: ServerEvent) {
        if let Some(c) = self.connections.get(&conn) {
            if c.outbox.send(Message::Event(event)).is_err() {
                debug!("outbox of connection {} is closed", conn);
            }
        }
    }

    fn dispatch(&self, out: Vec<Outbound>) {
        for Outbound { to, event } in out {
            self.send(to, event);
        }
    }
}
