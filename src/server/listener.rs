//! TCP front of the relay server: accept loop and per-connection tasks.

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::protocol::{Message, PROTOCOL_VERSION};
use crate::transport::{TcpTransport, Transport};

use super::hub::{Hub, HubCommand};
use super::room::ConnId;
use super::store::InMemoryRoomStore;

/// Address used when neither `--bind` nor `BROADSIDE_BIND` is given.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Bind and serve until the listener fails.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&config.bind).await?;
    info!("Server running on {}", listener.local_addr()?);
    serve(listener).await
}

/// Serve connections from an already bound listener.
pub async fn serve(listener: TcpListener) -> anyhow::Result<()> {
    let (hub_tx, hub_rx) = unbounded_channel();
    let hub = Hub::new(InMemoryRoomStore::new(), SmallRng::from_rng(&mut rand::rng()));
    tokio::spawn(hub.run(hub_rx));

    let mut next_conn: ConnId = 0;
    loop {
        let (stream, addr) = listener.accept().await?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay failed for {}: {}", addr, e);
        }
        next_conn += 1;
        let conn = next_conn;
        let hub = hub_tx.clone();
        info!("User connected: {} ({})", conn, addr);
        tokio::spawn(async move {
            match serve_connection(conn, TcpTransport::new(stream), hub).await {
                Ok(()) => info!("User disconnected: {}", conn),
                Err(e) => info!("User disconnected: {} ({})", conn, e),
            }
        });
    }
}

/// Drive one client: handshake, then relay requests to the hub and events back.
pub async fn serve_connection<T: Transport>(
    conn: ConnId,
    mut transport: T,
    hub: UnboundedSender<HubCommand>,
) -> anyhow::Result<()> {
    match transport.recv().await? {
        Message::Handshake { version } if version == PROTOCOL_VERSION => {
            transport
                .send(Message::HandshakeAck {
                    version: PROTOCOL_VERSION,
                })
                .await?;
        }
        Message::Handshake { version } => {
            warn!("connection {}: protocol version mismatch, expected {}, got {}", conn, PROTOCOL_VERSION, version);
            return Err(anyhow::anyhow!(
                "Protocol version mismatch: expected {}, got {}",
                PROTOCOL_VERSION,
                version
            ));
        }
        other => {
            warn!("connection {}: expected Handshake, got {:?}", conn, other);
            return Err(anyhow::anyhow!("Expected Handshake (closing session)"));
        }
    }

    let (outbox, mut events) = unbounded_channel();
    hub.send(HubCommand::Connect { conn, outbox })
        .map_err(|_| anyhow::anyhow!("Hub is gone"))?;

    let result = loop {
        tokio::select! {
            msg = transport.recv() => match msg {
                Ok(Message::Request(request)) => {
                    if hub.send(HubCommand::Request { conn, request }).is_err() {
                        break Err(anyhow::anyhow!("Hub is gone"));
                    }
                }
                Ok(Message::Heartbeat { version }) if version == PROTOCOL_VERSION => {
                    if let Err(e) = transport.send(Message::HeartbeatAck { version }).await {
                        break Err(e);
                    }
                }
                Ok(Message::HeartbeatAck { .. }) => {}
                Ok(other) => {
                    warn!("connection {}: unexpected frame {:?}", conn, other);
                    break Err(anyhow::anyhow!("Unexpected frame from client"));
                }
                Err(e) => break Err(e),
            },
            event = events.recv() => match event {
                Some(msg) => {
                    if let Err(e) = transport.send(msg).await {
                        break Err(e);
                    }
                }
                None => break Ok(()),
            },
        }
    };

    let _ = hub.send(HubCommand::Disconnect { conn });
    result
}
