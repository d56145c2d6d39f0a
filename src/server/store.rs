//! Room storage, kept behind a trait so the hub never depends on how rooms
//! are held.

use std::collections::HashMap;

use super::room::Room;

pub trait RoomStore: Send {
    fn insert(&mut self, room: Room);
    fn get(&self, id: &str) -> Option<&Room>;
    fn get_mut(&mut self, id: &str) -> Option<&mut Room>;
    fn remove(&mut self, id: &str) -> Option<Room>;
    fn len(&self) -> usize;

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rooms in a process-local map. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: HashMap<String, Room>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for InMemoryRoomStore {
    fn insert(&mut self, room: Room) {
        self.rooms.insert(room.id().to_string(), room);
    }

    fn get(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    fn remove(&mut self, id: &str) -> Option<Room> {
        self.rooms.remove(id)
    }

    fn len(&self) -> usize {
        self.rooms.len()
    }
}
