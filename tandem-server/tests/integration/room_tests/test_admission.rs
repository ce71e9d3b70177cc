use std::sync::Arc;

use tandem_core::{ConnectionId, RoomId, SignalMessage};
use tandem_server::JoinOutcome;

use crate::integration::{create_test_manager, init_tracing};
use crate::utils::{Delivered, wait_for_delivery};

#[tokio::test]
async fn test_third_join_is_rejected() {
    init_tracing();

    let (manager, mut rx, output) = create_test_manager();
    let room = RoomId::parse("r1").unwrap();
    let (a, b, c) = (ConnectionId::new(), ConnectionId::new(), ConnectionId::new());

    assert_eq!(manager.join(&room, a).await.unwrap(), JoinOutcome::Admitted);
    assert_eq!(manager.join(&room, b).await.unwrap(), JoinOutcome::Admitted);
    assert_eq!(manager.join(&room, c).await.unwrap(), JoinOutcome::Rejected);

    assert_eq!(
        output.deliveries_for(&c),
        vec![Delivered::Signal(SignalMessage::RoomFull), Delivered::Close]
    );

    // The rejected connection is not a member: its traffic goes nowhere,
    // while the two members still reach each other.
    let hangup: Arc<str> = Arc::from(r#"{"type":"hangup"}"#);
    manager
        .relay(&room, c, SignalMessage::Hangup, hangup.clone())
        .await;
    manager.relay(&room, a, SignalMessage::Hangup, hangup).await;

    let (to, _) = wait_for_delivery(&mut rx, |_, d| matches!(d, Delivered::Relay(_)))
        .await
        .expect("member relay should arrive");
    assert_eq!(to, b);
    assert!(
        !output
            .deliveries_for(&a)
            .iter()
            .any(|d| matches!(d, Delivered::Relay(_)))
    );
}

#[tokio::test]
async fn test_participant_count_follows_membership() {
    init_tracing();

    let (manager, mut rx, output) = create_test_manager();
    let room = RoomId::parse("counting").unwrap();
    let (a, b) = (ConnectionId::new(), ConnectionId::new());

    manager.join(&room, a).await.unwrap();
    assert_eq!(
        output.deliveries_for(&a),
        vec![Delivered::Signal(SignalMessage::ParticipantCount(1))]
    );

    manager.join(&room, b).await.unwrap();
    manager.leave(&room, b).await;

    // The first count(1) came from a's own join; wait for the one after b left.
    let mut ones = 0;
    wait_for_delivery(&mut rx, |conn, d| {
        if *conn == a && *d == Delivered::Signal(SignalMessage::ParticipantCount(1)) {
            ones += 1;
        }
        ones == 2
    })
    .await
    .unwrap();

    assert_eq!(
        output.deliveries_for(&a),
        vec![
            Delivered::Signal(SignalMessage::ParticipantCount(1)),
            Delivered::Signal(SignalMessage::PeerJoined),
            Delivered::Signal(SignalMessage::ParticipantCount(2)),
            Delivered::Signal(SignalMessage::ParticipantCount(1)),
        ]
    );
}

#[tokio::test]
async fn test_concurrent_joins_admit_exactly_two() {
    init_tracing();

    let (manager, _rx, _output) = create_test_manager();
    let room = RoomId::parse("crowded").unwrap();

    let mut joins = Vec::new();
    for _ in 0..10 {
        let manager = manager.clone();
        let room = room.clone();
        joins.push(tokio::spawn(async move {
            manager.join(&room, ConnectionId::new()).await.unwrap()
        }));
    }

    let mut admitted = 0;
    for join in joins {
        if join.await.unwrap() == JoinOutcome::Admitted {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 2);
    assert_eq!(manager.room_count(), 1);
}
