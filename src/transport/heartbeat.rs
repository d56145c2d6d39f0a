use log::warn;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

use crate::protocol::{Message, PROTOCOL_VERSION};
use crate::transport::Transport;

/// Default heartbeat interval (10 seconds).
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Default idle timeout before considering the connection dead (45 seconds).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(45);

/// Transport wrapper that adds heartbeats and idle connection detection.
///
/// While a `recv` is pending a `Heartbeat` goes out every interval. Incoming
/// heartbeats are answered with `HeartbeatAck`; acks only refresh the idle
/// clock. Neither is returned to the caller. Only received traffic counts as
/// activity, so a silent peer times out even while we keep sending.
///
/// Can be disabled for transports that need no liveness checks (e.g.
/// `InMemoryTransport`).
pub struct HeartbeatTransport<T: Transport> {
    inner: T,
    heartbeat_interval: Duration,
    idle_timeout: Duration,
    last_received: Instant,
    enabled: bool,
}

impl<T: Transport> HeartbeatTransport<T> {
    pub fn new(inner: T, heartbeat_interval: Duration, idle_timeout: Duration) -> Self {
        Self {
            inner,
            heartbeat_interval,
            idle_timeout,
            last_received: Instant::now(),
            enabled: true,
        }
    }

    /// Heartbeats with the default 10 s interval and 45 s idle timeout.
    pub fn with_defaults(inner: T) -> Self {
        Self::new(inner, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_IDLE_TIMEOUT)
    }

    /// Pass-through wrapper; heartbeat frames are still filtered out.
    pub fn disabled(inner: T) -> Self {
        Self {
            enabled: false,
            ..Self::with_defaults(inner)
        }
    }

    fn is_idle_timeout(&self) -> bool {
        self.last_received.elapsed() > self.idle_timeout
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn check_version(version: u8) -> anyhow::Result<()> {
    if version != PROTOCOL_VERSION {
        warn!("heartbeat version mismatch: expected {}, got {}", PROTOCOL_VERSION, version);
        return Err(anyhow::anyhow!(
            "Heartbeat version mismatch: expected {}, got {}",
            PROTOCOL_VERSION,
            version
        ));
    }
    Ok(())
}

#[async_trait::async_trait]
impl<T: Transport> Transport for HeartbeatTransport<T> {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        self.inner.send(msg).await
    }

    async fn recv(&mut self) -> anyhow::Result<Message> {
        let mut heartbeat_timer = interval(self.heartbeat_interval);
        heartbeat_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        heartbeat_timer.tick().await; // First tick completes immediately

        loop {
            tokio::select! {
                msg = self.inner.recv() => {
                    match msg? {
                        Message::Heartbeat { version } => {
                            check_version(version)?;
                            self.last_received = Instant::now();
                            self.inner.send(Message::HeartbeatAck { version: PROTOCOL_VERSION }).await?;
                        }
                        Message::HeartbeatAck { version } => {
                            check_version(version)?;
                            self.last_received = Instant::now();
                        }
                        other => {
                            self.last_received = Instant::now();
                            return Ok(other);
                        }
                    }
                }
                _ = heartbeat_timer.tick(), if self.enabled => {
                    if self.is_idle_timeout() {
                        warn!("idle timeout exceeded ({:?})", self.idle_timeout);
                        return Err(anyhow::anyhow!(
                            "Connection idle timeout exceeded ({:?})",
                            self.idle_timeout
                        ));
                    }
                    self.inner.send(Message::Heartbeat { version: PROTOCOL_VERSION }).await?;
                }
            }
        }
    }
}
