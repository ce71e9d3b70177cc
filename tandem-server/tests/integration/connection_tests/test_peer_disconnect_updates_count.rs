use tandem_core::SignalMessage;

use crate::integration::init_tracing;
use crate::utils::{TestClient, spawn_test_server};

#[tokio::test]
async fn test_peer_disconnect_updates_count() {
    init_tracing();

    let addr = spawn_test_server().await.unwrap();

    let mut a = TestClient::connect(addr, "leaving").await.unwrap();
    assert_eq!(a.recv().await.unwrap(), SignalMessage::ParticipantCount(1));
    let mut b = TestClient::connect(addr, "leaving").await.unwrap();
    assert_eq!(b.recv().await.unwrap(), SignalMessage::CreateOffer);
    assert_eq!(a.recv().await.unwrap(), SignalMessage::PeerJoined);
    assert_eq!(a.recv().await.unwrap(), SignalMessage::ParticipantCount(2));

    b.close().await.unwrap();
    assert_eq!(a.recv().await.unwrap(), SignalMessage::ParticipantCount(1));

    // The freed seat is available again and the newcomer is told to offer.
    let mut c = TestClient::connect(addr, "leaving").await.unwrap();
    assert_eq!(c.recv().await.unwrap(), SignalMessage::CreateOffer);
    assert_eq!(a.recv().await.unwrap(), SignalMessage::PeerJoined);
}
