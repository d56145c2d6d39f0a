use std::time::Duration;

use broadside::transport::{HeartbeatTransport, InMemoryTransport, TcpTransport, Transport};
use broadside::{ClientRequest, GameSettings, Message, PlayerId, ServerEvent, PROTOCOL_VERSION};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

async fn tcp_pair() -> anyhow::Result<(TcpTransport, TcpStream)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let client = TcpStream::connect(addr).await?;
    let (server, _) = listener.accept().await?;
    Ok((TcpTransport::new(server), client))
}

fn frame(msg: &Message) -> Vec<u8> {
    let data = bincode::serialize(msg).unwrap();
    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(&data);
    out
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tcp_roundtrip() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut transport = TcpTransport::new(socket);
        let msg = transport.recv().await.unwrap();
        assert_eq!(
            msg,
            Message::Request(ClientRequest::CreateRoom {
                settings: GameSettings::default()
            })
        );
        transport
            .send(
                ServerEvent::RoomCreated {
                    room_id: "a1b2c3".to_string(),
                    player: PlayerId::One,
                    settings: GameSettings::default(),
                }
                .into(),
            )
            .await
            .unwrap();
    });

    let mut client = TcpTransport::connect(addr).await?;
    assert!(client.peer_addr().is_some());
    client
        .send(
            ClientRequest::CreateRoom {
                settings: GameSettings::default(),
            }
            .into(),
        )
        .await?;
    let reply = client.recv().await?;
    assert!(matches!(
        reply,
        Message::Event(ServerEvent::RoomCreated { ref room_id, .. }) if room_id == "a1b2c3"
    ));
    server.await.unwrap();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_two_frames_in_one_write() -> anyhow::Result<()> {
    let (mut transport, mut raw) = tcp_pair().await?;
    let first = Message::Request(ClientRequest::PlayerReady);
    let second = Message::Request(ClientRequest::Shoot { row: 3, col: 4 });
    let mut bytes = frame(&first);
    bytes.extend(frame(&second));
    raw.write_all(&bytes).await?;

    assert_eq!(transport.recv().await?, first);
    assert_eq!(transport.recv().await?, second);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_recv_survives_cancellation_mid_frame() -> anyhow::Result<()> {
    let (mut transport, mut raw) = tcp_pair().await?;
    let msg = Message::Request(ClientRequest::Sonar { row: 1, col: 2 });
    let bytes = frame(&msg);
    let (head, tail) = bytes.split_at(3);

    raw.write_all(head).await?;
    let cancelled = tokio::time::timeout(Duration::from_millis(50), transport.recv()).await;
    assert!(cancelled.is_err());

    raw.write_all(tail).await?;
    assert_eq!(transport.recv().await?, msg);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_zero_length_frame_rejected() -> anyhow::Result<()> {
    let (mut transport, mut raw) = tcp_pair().await?;
    raw.write_all(&0u32.to_be_bytes()).await?;
    let err = transport.recv().await.unwrap_err();
    assert!(err.to_string().contains("Invalid message length"), "{}", err);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_frame_rejected() -> anyhow::Result<()> {
    let (mut transport, mut raw) = tcp_pair().await?;
    raw.write_all(&2_000_000u32.to_be_bytes()).await?;
    let err = transport.recv().await.unwrap_err();
    assert!(err.to_string().contains("Message too large"), "{}", err);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_garbage_payload_rejected() -> anyhow::Result<()> {
    let (mut transport, mut raw) = tcp_pair().await?;
    let mut bytes = 4u32.to_be_bytes().to_vec();
    bytes.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);
    raw.write_all(&bytes).await?;
    let err = transport.recv().await.unwrap_err();
    assert!(err.to_string().contains("Deserialization error"), "{}", err);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_peer_close_reported() -> anyhow::Result<()> {
    let (mut transport, raw) = tcp_pair().await?;
    drop(raw);
    let err = transport.recv().await.unwrap_err();
    assert!(err.to_string().contains("closed"), "{}", err);
    Ok(())
}

#[tokio::test]
async fn test_in_memory_pair() -> anyhow::Result<()> {
    let (mut a, mut b) = InMemoryTransport::pair();
    a.send(ClientRequest::EndTurn.into()).await?;
    assert_eq!(b.recv().await?, Message::Request(ClientRequest::EndTurn));
    drop(a);
    assert!(b.recv().await.is_err());
    assert!(b.send(ClientRequest::EndTurn.into()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_heartbeat_answered_and_hidden() -> anyhow::Result<()> {
    let (inner, mut peer) = InMemoryTransport::pair();
    let mut transport = HeartbeatTransport::with_defaults(inner);

    peer.send(Message::Heartbeat {
        version: PROTOCOL_VERSION,
    })
    .await?;
    peer.send(Message::HeartbeatAck {
        version: PROTOCOL_VERSION,
    })
    .await?;
    peer.send(ClientRequest::PlayAgain.into()).await?;

    assert_eq!(transport.recv().await?, Message::Request(ClientRequest::PlayAgain));
    assert_eq!(
        peer.recv().await?,
        Message::HeartbeatAck {
            version: PROTOCOL_VERSION
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_silent_peer_times_out() {
    let (inner, mut peer) = InMemoryTransport::pair();
    let mut transport = HeartbeatTransport::new(inner, Duration::from_millis(20), Duration::from_millis(80));

    let err = transport.recv().await.unwrap_err();
    assert!(err.to_string().contains("idle timeout"), "{}", err);
    // heartbeats went out while we waited
    assert!(matches!(peer.recv().await, Ok(Message::Heartbeat { .. })));
}

#[tokio::test]
async fn test_heartbeat_version_mismatch() {
    let (inner, mut peer) = InMemoryTransport::pair();
    let mut transport = HeartbeatTransport::with_defaults(inner);
    peer.send(Message::Heartbeat { version: 42 }).await.unwrap();
    let err = transport.recv().await.unwrap_err();
    assert!(err.to_string().contains("version mismatch"), "{}", err);
}

#[tokio::test]
async fn test_disabled_heartbeat_passes_through() -> anyhow::Result<()> {
    let (inner, mut peer) = InMemoryTransport::pair();
    let mut transport = HeartbeatTransport::disabled(inner);
    peer.send(ClientRequest::PlacementDone.into()).await?;
    assert_eq!(transport.recv().await?, Message::Request(ClientRequest::PlacementDone));
    transport.send(ClientRequest::EndTurn.into()).await?;
    let mut inner = transport.into_inner();
    peer.send(ClientRequest::EndTurn.into()).await?;
    assert_eq!(inner.recv().await?, Message::Request(ClientRequest::EndTurn));
    assert_eq!(peer.recv().await?, Message::Request(ClientRequest::EndTurn));
    Ok(())
}
