use std::sync::Arc;
use std::time::Duration;
use tandem_client::{
    CallEvent, CallHandle, Connectivity, NegotiationState, SessionConfig, SessionError,
    SessionInput, SessionStatus, join_room,
};
use tandem_core::RoomId;
use url::Url;

use crate::integration::init_tracing;
use crate::utils::{
    MockFactory, SESSION_TIMEOUT_MS, TransportCall, spawn_test_server, wait_for_event,
};

async fn join(server: &Url, room: &str, factory: &MockFactory, config: SessionConfig) -> CallHandle {
    let room = RoomId::parse(room).unwrap();
    join_room(server, &room, config, Arc::new(factory.clone()))
        .await
        .expect("failed to join room")
}

async fn wait_status<F>(call: &mut CallHandle, pred: F) -> SessionStatus
where
    F: FnMut(&SessionStatus) -> bool,
{
    let timeout = Duration::from_millis(SESSION_TIMEOUT_MS);
    *tokio::time::timeout(timeout, call.status.wait_for(pred))
        .await
        .expect("timeout waiting for session status")
        .expect("session dropped its status channel")
}

fn applied_candidates(factory: &MockFactory, generation: u64) -> usize {
    factory
        .calls_for(generation)
        .iter()
        .filter(|c| matches!(c, TransportCall::AddCandidate(_)))
        .count()
}

/// Joins two trickling peers and waits until both have settled.
async fn connected_pair(
    server: &Url,
    room: &str,
    config: SessionConfig,
) -> (CallHandle, MockFactory, CallHandle, MockFactory) {
    let a_factory = MockFactory::with_trickle();
    let b_factory = MockFactory::with_trickle();

    let mut a = join(server, room, &a_factory, config.clone()).await;
    wait_for_event(&mut a.events, |e| matches!(e, CallEvent::ParticipantCount(1)))
        .await
        .unwrap();

    let mut b = join(server, room, &b_factory, config).await;
    wait_for_event(&mut a.events, |e| matches!(e, CallEvent::PeerJoined))
        .await
        .unwrap();

    for call in [&mut a, &mut b] {
        let status = wait_status(call, |s| {
            s.negotiation == NegotiationState::Stable && s.has_remote_description
        })
        .await;
        assert_eq!(status.generation, 1);
    }

    (a, a_factory, b, b_factory)
}

#[tokio::test]
async fn test_newcomer_offers_and_both_sides_settle() {
    init_tracing();
    let server = spawn_test_server().await.unwrap();
    let (mut a, a_factory, mut b, b_factory) =
        connected_pair(&server, "r1", SessionConfig::default()).await;

    // The second joiner is told to offer; the first one answers.
    assert!(b_factory.calls_for(1).contains(&TransportCall::CreateOffer));
    assert!(!a_factory.calls_for(1).contains(&TransportCall::CreateOffer));
    assert!(a_factory.calls_for(1).contains(&TransportCall::CreateAnswer));

    // Each side trickles one candidate; give them time to cross.
    tokio::time::timeout(Duration::from_secs(5), async {
        while applied_candidates(&a_factory, 1) < 1 || applied_candidates(&b_factory, 1) < 1 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("candidates never crossed");

    // A hangs up; B learns about it through the relay.
    a.input.send(SessionInput::HangUp).await.unwrap();
    for call in [&mut a, &mut b] {
        let status = wait_status(call, |s| s.generation == 2).await;
        assert_eq!(status.negotiation, NegotiationState::Idle);
    }
    wait_for_event(&mut b.events, |e| matches!(e, CallEvent::CallEnded))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_lost_link_ends_call_on_both_sides() {
    init_tracing();
    let server = spawn_test_server().await.unwrap();
    let config = SessionConfig {
        grace_period: Duration::from_millis(200),
        ..SessionConfig::default()
    };
    let (mut a, a_factory, mut b, b_factory) = connected_pair(&server, "r2", config).await;

    a_factory.emit_connectivity(Connectivity::Connected);
    b_factory.emit_connectivity(Connectivity::Connected);
    wait_for_event(&mut a.events, |e| matches!(e, CallEvent::CallConnected))
        .await
        .unwrap();

    a_factory.emit_connectivity(Connectivity::Disconnected);

    for call in [&mut a, &mut b] {
        let status = wait_status(call, |s| s.generation == 2).await;
        assert_eq!(status.negotiation, NegotiationState::Idle);
        assert_eq!(status.queued_candidates, 0);
    }
}

#[tokio::test]
async fn test_third_peer_is_turned_away() {
    init_tracing();
    let server = spawn_test_server().await.unwrap();
    let (_a, _, _b, _) = connected_pair(&server, "r3", SessionConfig::default()).await;

    let c_factory = MockFactory::new();
    let mut c = join(&server, "r3", &c_factory, SessionConfig::default()).await;

    wait_for_event(&mut c.events, |e| matches!(e, CallEvent::RoomFull))
        .await
        .unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), &mut c.task)
        .await
        .expect("session did not stop")
        .expect("session panicked");
    assert!(matches!(result, Err(SessionError::RoomFull)));
}
