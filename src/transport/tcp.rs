use std::io::ErrorKind;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::protocol::Message;
use crate::transport::Transport;

/// Default timeout for writing one frame (30 seconds).
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum frame payload (1 MB).
pub const MAX_FRAME_SIZE: u32 = 1_000_000;

const READ_CHUNK: usize = 4096;

/// Length-prefixed bincode frames over TCP.
///
/// Every frame is a 4-byte big-endian payload length followed by the payload.
/// `recv` buffers partial frames internally, so it is safe to cancel inside
/// `tokio::select!` without losing bytes.
pub struct TcpTransport {
    stream: TcpStream,
    buffer: Vec<u8>,
    send_timeout: Duration,
    max_frame_size: u32,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, DEFAULT_SEND_TIMEOUT, MAX_FRAME_SIZE)
    }

    pub fn with_config(stream: TcpStream, send_timeout: Duration, max_frame_size: u32) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
            send_timeout,
            max_frame_size,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }

    pub fn peer_addr(&self) -> Option<std::net::SocketAddr> {
        self.stream.peer_addr().ok()
    }

    /// Pop one complete frame off the buffer, if there is one.
    fn take_frame(&mut self) -> anyhow::Result<Option<Message>> {
        if self.buffer.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_be_bytes([self.buffer[0], self.buffer[1], self.buffer[2], self.buffer[3]]);
        if len == 0 {
            return Err(anyhow::anyhow!("Invalid message length: 0"));
        }
        if len > self.max_frame_size {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                len,
                self.max_frame_size
            ));
        }
        let end = 4 + len as usize;
        if self.buffer.len() < end {
            return Ok(None);
        }
        let msg = bincode::deserialize(&self.buffer[4..end])
            .map_err(|e| anyhow::anyhow!("Deserialization error: {}", e));
        self.buffer.drain(..end);
        msg.map(Some)
    }
}

fn io_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset => anyhow::anyhow!("Connection closed by peer"),
        _ => anyhow::anyhow!("I/O error: {}", e),
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        let data = bincode::serialize(&msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
        if data.len() as u64 > u64::from(self.max_frame_size) {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                data.len(),
                self.max_frame_size
            ));
        }
        let mut frame = Vec::with_capacity(4 + data.len());
        frame.extend_from_slice(&(data.len() as u32).to_be_bytes());
        frame.extend_from_slice(&data);

        let write = async {
            self.stream.write_all(&frame).await.map_err(io_error)?;
            self.stream.flush().await.map_err(io_error)
        };
        timeout(self.send_timeout, write)
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.send_timeout))?
    }

    async fn recv(&mut self) -> anyhow::Result<Message> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(msg) = self.take_frame()? {
                return Ok(msg);
            }
            let n = self.stream.read(&mut chunk).await.map_err(io_error)?;
            if n == 0 {
                return Err(anyhow::anyhow!("Connection closed by peer"));
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }
}
