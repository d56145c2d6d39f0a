//! Online client node: drives a [`Player`] against the relay server.

use log::{debug, info, warn};
use rand::rngs::SmallRng;

use crate::common::PlayerId;
use crate::config::GameSettings;
use crate::placement::PlacementEngine;
use crate::player::{Player, TurnAction, TurnContext};
use crate::powerup::SonarReport;
use crate::protocol::{ClientRequest, Message, ServerEvent, PROTOCOL_VERSION};
use crate::transport::Transport;

use super::session::{outcome_of, ClientSession};

/// How this node enters a room.
#[derive(Debug, Clone)]
pub enum Role {
    Host(GameSettings),
    Guest(String),
}

/// How an online session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    GameOver { winner: PlayerId },
    OpponentLeft,
    /// The local player quit.
    Quit,
}

pub struct OnlineNode<T: Transport> {
    transport: T,
    player: Box<dyn Player>,
    session: ClientSession,
    rng: SmallRng,
}

impl<T: Transport> OnlineNode<T> {
    pub fn new(player: Box<dyn Player>, transport: T, rng: SmallRng) -> Self {
        Self {
            transport,
            player,
            session: ClientSession::new(),
            rng,
        }
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    async fn request(&mut self, request: ClientRequest) -> anyhow::Result<()> {
        self.transport.send(Message::Request(request)).await
    }

    async fn handshake(&mut self) -> anyhow::Result<()> {
        self.transport
            .send(Message::Handshake {
                version: PROTOCOL_VERSION,
            })
            .await?;
        match self.transport.recv().await? {
            Message::HandshakeAck { version } if version == PROTOCOL_VERSION => Ok(()),
            Message::HandshakeAck { version } => Err(anyhow::anyhow!(
                "Protocol version mismatch in HandshakeAck: expected {}, got {}",
                PROTOCOL_VERSION,
                version
            )),
            other => {
                warn!("expected HandshakeAck, got {:?}", other);
                Err(anyhow::anyhow!("Expected HandshakeAck (closing session)"))
            }
        }
    }

    /// Handshake, enter the room, play one game.
    pub async fn run(&mut self, role: Role) -> anyhow::Result<SessionEnd> {
        self.handshake().await?;
        match role {
            Role::Host(settings) => self.request(ClientRequest::CreateRoom { settings }).await?,
            Role::Guest(room_id) => self.request(ClientRequest::JoinRoom { room_id }).await?,
        }

        loop {
            let event = match self.transport.recv().await? {
                Message::Event(event) => event,
                other => {
                    debug!("ignoring frame {:?}", other);
                    continue;
                }
            };
            self.session.apply(&event);
            if let Some(end) = self.react(event).await? {
                return Ok(end);
            }
        }
    }

    async fn react(&mut self, event: ServerEvent) -> anyhow::Result<Option<SessionEnd>> {
        match event {
            ServerEvent::RoomCreated { room_id, .. } => {
                info!("Room created: {} (share this id with your opponent)", room_id);
            }
            ServerEvent::OpponentJoined | ServerEvent::PlayersReady { .. } => {
                info!("Opponent present, confirming settings");
                self.request(ClientRequest::PlayerReady).await?;
            }
            ServerEvent::SettingsUpdated { .. } => {
                self.request(ClientRequest::PlayerReady).await?;
            }
            ServerEvent::JoinError { reason } => {
                return Err(anyhow::anyhow!("Could not join room: {}", reason));
            }
            ServerEvent::BothPlayersConfirmed { .. } | ServerEvent::GameReset { .. } => {
                self.player.reset();
                self.place_and_submit().await?;
            }
            ServerEvent::BothPlayersReady { .. } | ServerEvent::TurnEnded { .. } => {
                return self.act_if_my_turn().await;
            }
            ServerEvent::ShotResult(result) => {
                let coord = result.coord();
                let outcome = outcome_of(&result);
                if result.shooting_player == self.session.me() {
                    self.player.handle_shot_result(coord, &outcome, self.session.known());
                } else if !result.reveal {
                    self.player.handle_opponent_shot(coord, &outcome);
                }
                if let Some(winner) = result.winner.filter(|_| result.game_over) {
                    self.player.handle_game_over(winner);
                    return Ok(Some(SessionEnd::GameOver { winner }));
                }
                return self.act_if_my_turn().await;
            }
            ServerEvent::PowerUpUsed { player, .. } => {
                if player == self.session.me() {
                    return self.act_if_my_turn().await;
                }
            }
            ServerEvent::SonarResult { row, col, ships } => {
                self.player.handle_sonar(&SonarReport {
                    center: (row as usize, col as usize),
                    ships,
                });
                return self.act_if_my_turn().await;
            }
            ServerEvent::Rejected { reason } => {
                self.player.handle_rejection(&reason);
                return self.act_if_my_turn().await;
            }
            ServerEvent::OpponentDisconnected { message } => {
                info!("{}", message);
                return Ok(Some(SessionEnd::OpponentLeft));
            }
            ServerEvent::RoomInfo {
                room_id,
                phase,
                guest_present,
                ..
            } => {
                debug!("Room {} is in {:?} (guest present: {})", room_id, phase, guest_present);
            }
            ServerEvent::OpponentReady { .. } => {}
        }
        Ok(None)
    }

    async fn place_and_submit(&mut self) -> anyhow::Result<()> {
        let mut placement = PlacementEngine::new(self.session.settings());
        self.player
            .place_ships(&mut self.rng, &mut placement)
            .map_err(|e| anyhow::anyhow!(e))?;
        let board = placement.finish().map_err(|e| anyhow::anyhow!(e))?;
        let request = ClientRequest::UpdateBoard {
            board: board.cells().to_vec(),
            ships: board.ships().to_vec(),
        };
        self.session.set_own_board(board);
        self.request(request).await?;
        self.request(ClientRequest::PlacementDone).await
    }

    /// Ask the player for an action and send it. Invalid actions end the turn.
    async fn act_if_my_turn(&mut self) -> anyhow::Result<Option<SessionEnd>> {
        if !self.session.is_my_turn() {
            return Ok(None);
        }
        let action = self.choose_action();
        let request = match action {
            TurnAction::Fire(coord) if !self.session.sonar_armed() && self.session.is_clickable(coord) => {
                ClientRequest::Shoot {
                    row: coord.0 as u8,
                    col: coord.1 as u8,
                }
            }
            TurnAction::Sonar(coord) if self.session.sonar_armed() && self.session.is_clickable(coord) => {
                ClientRequest::Sonar {
                    row: coord.0 as u8,
                    col: coord.1 as u8,
                }
            }
            TurnAction::PowerUp(power_up) if self.session.can_use_power_up() => {
                ClientRequest::UsePowerUp { power_up }
            }
            TurnAction::EndTurn => ClientRequest::EndTurn,
            TurnAction::Quit => return Ok(Some(SessionEnd::Quit)),
            invalid => {
                warn!("{:?} is not allowed now, ending turn", invalid);
                self.player.handle_rejection("That action is not allowed now, turn passed");
                ClientRequest::EndTurn
            }
        };
        self.request(request).await?;
        Ok(None)
    }

    fn choose_action(&mut self) -> TurnAction {
        let session = &self.session;
        let opponent_view = session.opponent_views();
        let own_view = session.own_views();
        let Some(own_board) = session.own_board() else {
            return TurnAction::EndTurn;
        };
        let ctx = TurnContext {
            me: session.me(),
            target: session.known(),
            opponent_view: &opponent_view,
            own_view: &own_view,
            own_board,
            can_shoot: session.can_shoot(),
            shots_remaining: session.shots_remaining(),
            sonar_armed: session.sonar_armed(),
            power_ups_enabled: session.settings().power_ups_enabled,
            power_points: session.power_points(session.me()),
            used_power_up: session.flags().used_power_up,
        };
        self.player.next_action(&mut self.rng, &ctx)
    }
}
