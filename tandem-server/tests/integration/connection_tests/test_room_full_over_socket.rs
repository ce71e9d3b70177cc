use tandem_core::SignalMessage;

use crate::integration::init_tracing;
use crate::utils::{TestClient, spawn_test_server};

#[tokio::test]
async fn test_third_socket_gets_room_full_and_is_closed() {
    init_tracing();

    let addr = spawn_test_server().await.unwrap();

    let mut a = TestClient::connect(addr, "r1").await.unwrap();
    assert_eq!(a.recv().await.unwrap(), SignalMessage::ParticipantCount(1));
    let mut b = TestClient::connect(addr, "r1").await.unwrap();
    assert_eq!(b.recv().await.unwrap(), SignalMessage::CreateOffer);
    assert_eq!(b.recv().await.unwrap(), SignalMessage::ParticipantCount(2));
    assert_eq!(a.recv().await.unwrap(), SignalMessage::PeerJoined);
    assert_eq!(a.recv().await.unwrap(), SignalMessage::ParticipantCount(2));

    let mut c = TestClient::connect(addr, "r1").await.unwrap();
    assert_eq!(c.recv().await.unwrap(), SignalMessage::RoomFull);
    c.expect_closed().await.expect("rejected socket must be closed");

    // A and B are untouched: no count change, and they still reach each other.
    a.send(&SignalMessage::Hangup).await.unwrap();
    assert_eq!(b.recv().await.unwrap(), SignalMessage::Hangup);
}

#[tokio::test]
async fn test_missing_room_is_refused() {
    init_tracing();

    let addr = spawn_test_server().await.unwrap();

    let url = format!("ws://{}/ws", addr);
    assert!(tokio_tungstenite::connect_async(url).await.is_err());

    let blank = format!("ws://{}/ws?room=%20", addr);
    assert!(tokio_tungstenite::connect_async(blank).await.is_err());
}
