use broadside::server::hub::{ROOM_FULL, ROOM_NOT_FOUND};
use broadside::server::{ConnId, Hub, HubCommand, InMemoryRoomStore, RoomStore};
use broadside::{ClientRequest, GameSettings, GridSize, Message, PlayerId, RoomPhase, ServerEvent, ROOM_ID_LEN};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

struct Harness {
    hub: Hub<InMemoryRoomStore>,
}

impl Harness {
    fn new() -> Self {
        Self {
            hub: Hub::new(InMemoryRoomStore::new(), SmallRng::seed_from_u64(1)),
        }
    }

    fn connect(&mut self, conn: ConnId) -> UnboundedReceiver<Message> {
        let (outbox, rx) = unbounded_channel();
        self.hub.handle(HubCommand::Connect { conn, outbox });
        rx
    }

    fn request(&mut self, conn: ConnId, request: ClientRequest) {
        self.hub.handle(HubCommand::Request { conn, request });
    }

    /// Host creates a room and a guest joins it. Returns the room id.
    fn open_room(&mut self, host: &mut UnboundedReceiver<Message>, guest: ConnId) -> String {
        self.request(
            1,
            ClientRequest::CreateRoom {
                settings: GameSettings::default(),
            },
        );
        let room_id = match drain(host).as_slice() {
            [ServerEvent::RoomCreated {
                room_id,
                player,
                settings,
            }] => {
                assert_eq!(*player, PlayerId::One);
                assert_eq!(*settings, GameSettings::default());
                room_id.clone()
            }
            other => panic!("expected RoomCreated, got {:?}", other),
        };
        self.request(
            guest,
            ClientRequest::JoinRoom {
                room_id: room_id.clone(),
            },
        );
        room_id
    }
}

fn drain(rx: &mut UnboundedReceiver<Message>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        match msg {
            Message::Event(event) => events.push(event),
            other => panic!("unexpected frame {:?}", other),
        }
    }
    events
}

#[test]
fn test_create_and_join() {
    let mut h = Harness::new();
    let mut host = h.connect(1);
    let mut guest = h.connect(2);
    let room_id = h.open_room(&mut host, 2);

    assert_eq!(room_id.len(), ROOM_ID_LEN);
    assert!(room_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    assert_eq!(drain(&mut host), vec![ServerEvent::OpponentJoined]);
    assert!(matches!(
        drain(&mut guest).as_slice(),
        [ServerEvent::PlayersReady { player: PlayerId::Two, .. }]
    ));
    assert_eq!(h.hub.room_of(2), Some(room_id.as_str()));
}

#[test]
fn test_join_errors() {
    let mut h = Harness::new();
    let mut host = h.connect(1);
    let _guest = h.connect(2);
    let mut third = h.connect(3);
    let room_id = h.open_room(&mut host, 2);

    h.request(
        3,
        ClientRequest::JoinRoom {
            room_id: "nope42".to_string(),
        },
    );
    assert_eq!(
        drain(&mut third),
        vec![ServerEvent::JoinError {
            reason: ROOM_NOT_FOUND.to_string()
        }]
    );

    h.request(3, ClientRequest::JoinRoom { room_id });
    assert_eq!(
        drain(&mut third),
        vec![ServerEvent::JoinError {
            reason: ROOM_FULL.to_string()
        }]
    );
    assert_eq!(h.hub.room_of(3), None);
}

#[test]
fn test_host_cannot_join_own_room() {
    let mut h = Harness::new();
    let mut host = h.connect(1);
    h.request(
        1,
        ClientRequest::CreateRoom {
            settings: GameSettings::default(),
        },
    );
    let room_id = match drain(&mut host).as_slice() {
        [ServerEvent::RoomCreated { room_id, .. }] => room_id.clone(),
        other => panic!("expected RoomCreated, got {:?}", other),
    };
    h.request(1, ClientRequest::JoinRoom { room_id: room_id.clone() });
    assert_eq!(
        drain(&mut host),
        vec![ServerEvent::JoinError {
            reason: ROOM_FULL.to_string()
        }]
    );
    assert!(h.hub.store().contains(&room_id));
}

#[test]
fn test_invalid_settings_rejected() {
    let mut h = Harness::new();
    let mut host = h.connect(1);
    let mut settings = GameSettings::default();
    settings.ship_counts.insert("Destroyer".to_string(), 9);
    h.request(1, ClientRequest::CreateRoom { settings });
    assert!(matches!(drain(&mut host).as_slice(), [ServerEvent::Rejected { .. }]));
    assert!(h.hub.store().is_empty());
}

#[test]
fn test_requests_outside_room_are_ignored() {
    let mut h = Harness::new();
    let mut lone = h.connect(1);
    h.request(1, ClientRequest::PlayerReady);
    h.request(1, ClientRequest::Shoot { row: 0, col: 0 });
    h.request(7, ClientRequest::EndTurn);
    assert!(drain(&mut lone).is_empty());
}

#[test]
fn test_ready_flow_reaches_placement() {
    let mut h = Harness::new();
    let mut host = h.connect(1);
    let mut guest = h.connect(2);
    h.open_room(&mut host, 2);
    drain(&mut host);
    drain(&mut guest);

    h.request(1, ClientRequest::PlayerReady);
    h.request(2, ClientRequest::PlayerReady);
    let confirmed = ServerEvent::BothPlayersConfirmed {
        phase: RoomPhase::Placement,
    };
    assert_eq!(drain(&mut host).last(), Some(&confirmed));
    assert_eq!(drain(&mut guest).last(), Some(&confirmed));
}

#[test]
fn test_disconnect_tears_down_room() {
    let mut h = Harness::new();
    let mut host = h.connect(1);
    let mut guest = h.connect(2);
    let room_id = h.open_room(&mut host, 2);
    drain(&mut host);
    drain(&mut guest);

    h.hub.handle(HubCommand::Disconnect { conn: 2 });
    assert!(matches!(
        drain(&mut host).as_slice(),
        [ServerEvent::OpponentDisconnected { .. }]
    ));
    assert!(h.hub.store().contains(&room_id));

    h.hub.handle(HubCommand::Disconnect { conn: 1 });
    assert!(!h.hub.store().contains(&room_id));
    assert_eq!(h.hub.store().len(), 0);
}

#[test]
fn test_creating_again_leaves_previous_room() {
    let mut h = Harness::new();
    let mut host = h.connect(1);
    let mut guest = h.connect(2);
    let first = h.open_room(&mut host, 2);
    drain(&mut host);
    drain(&mut guest);

    h.request(
        1,
        ClientRequest::CreateRoom {
            settings: GameSettings::default(),
        },
    );
    assert!(matches!(
        drain(&mut guest).as_slice(),
        [ServerEvent::OpponentDisconnected { .. }]
    ));
    let second = h.hub.room_of(1).unwrap().to_string();
    assert_ne!(first, second);
    assert_eq!(h.hub.store().len(), 2);
}

#[test]
fn test_overflowing_ship_counts_rejected() {
    let mut h = Harness::new();
    let mut host = h.connect(1);
    let _guest = h.connect(2);
    let mut settings = GameSettings::default();
    settings.ship_counts.insert("Carrier".to_string(), usize::MAX);
    settings.ship_counts.insert("Destroyer".to_string(), 5);
    h.request(1, ClientRequest::CreateRoom { settings });
    assert!(matches!(drain(&mut host).as_slice(), [ServerEvent::Rejected { .. }]));
    assert!(h.hub.store().is_empty());

    // the hub keeps serving after the bad request
    let room_id = h.open_room(&mut host, 2);
    assert!(h.hub.store().contains(&room_id));
    assert_eq!(drain(&mut host), vec![ServerEvent::OpponentJoined]);

    let mut huge = GameSettings::default();
    huge.ship_counts.insert("Submarine".to_string(), usize::MAX);
    h.request(1, ClientRequest::UpdateSettings { settings: huge });
    assert!(matches!(drain(&mut host).as_slice(), [ServerEvent::Rejected { .. }]));
}

#[test]
fn test_room_info_goes_to_sender_only() {
    let mut h = Harness::new();
    let mut host = h.connect(1);
    let mut guest = h.connect(2);
    let mut visitor = h.connect(3);
    h.request(
        1,
        ClientRequest::CreateRoom {
            settings: GameSettings {
                grid_size: GridSize::Twelve,
                ..GameSettings::default()
            },
        },
    );
    let room_id = h.hub.room_of(1).unwrap().to_string();
    drain(&mut host);

    h.request(3, ClientRequest::GetRoomInfo { room_id: room_id.clone() });
    match drain(&mut visitor).as_slice() {
        [ServerEvent::RoomInfo {
            room_id: id,
            phase,
            settings,
            guest_present,
        }] => {
            assert_eq!(id, &room_id);
            assert_eq!(*phase, RoomPhase::Lobby);
            assert_eq!(settings.grid_size, GridSize::Twelve);
            assert!(!guest_present);
        }
        other => panic!("expected RoomInfo, got {:?}", other),
    }
    assert!(drain(&mut host).is_empty());
    assert_eq!(h.hub.room_of(3), None);

    h.request(2, ClientRequest::JoinRoom { room_id: room_id.clone() });
    drain(&mut guest);
    h.request(3, ClientRequest::GetRoomInfo { room_id });
    assert!(matches!(
        drain(&mut visitor).as_slice(),
        [ServerEvent::RoomInfo { guest_present: true, .. }]
    ));

    h.request(3, ClientRequest::GetRoomInfo { room_id: "nope42".to_string() });
    assert!(drain(&mut visitor).is_empty());
}
