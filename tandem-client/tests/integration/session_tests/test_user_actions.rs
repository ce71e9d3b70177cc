use std::time::Duration;
use tandem_client::transport::{RemoteMedia, TransportEvent};
use tandem_client::{CallEvent, Connectivity, LinkState, SessionError, SessionInput};
use tandem_core::SignalMessage;

use crate::integration::init_tracing;
use crate::utils::{Harness, MockFactory, TransportCall, wait_for_event};

#[tokio::test]
async fn test_call_button_requests_a_call_when_idle() {
    init_tracing();
    let mut h = Harness::start(MockFactory::new()).await;

    h.press(SessionInput::Call).await;
    assert_eq!(
        h.next_outbound_of("request-to-call").await.unwrap(),
        SignalMessage::RequestToCall
    );
    assert_eq!(h.current_status().generation, 1);
}

#[tokio::test]
async fn test_call_button_hangs_up_during_a_call() {
    init_tracing();
    let mut h = Harness::start(MockFactory::new()).await;
    h.establish_as_offerer().await.unwrap();
    h.factory.emit_connectivity(Connectivity::Connected);
    h.wait_for_status(|s| s.link == LinkState::Connected)
        .await
        .unwrap();

    h.press(SessionInput::Call).await;
    assert_eq!(
        h.next_outbound_of("hangup").await.unwrap(),
        SignalMessage::Hangup
    );
    h.wait_for_status(|s| s.generation == 2).await.unwrap();
}

#[tokio::test]
async fn test_explicit_hang_up() {
    init_tracing();
    let mut h = Harness::start(MockFactory::new()).await;

    h.press(SessionInput::HangUp).await;
    h.next_outbound_of("hangup").await.unwrap();
    let status = h.wait_for_status(|s| s.generation == 2).await.unwrap();
    assert_eq!(status.link, LinkState::Pending);
    assert!(h.factory.calls_for(1).contains(&TransportCall::Close));
}

#[tokio::test]
async fn test_room_events_are_reported() {
    init_tracing();
    let mut h = Harness::start(MockFactory::new()).await;

    h.signal(SignalMessage::ParticipantCount(1)).await;
    h.signal(SignalMessage::PeerJoined).await;
    h.signal(SignalMessage::ParticipantCount(2)).await;
    h.factory
        .latest_sink()
        .emit(TransportEvent::RemoteMedia(RemoteMedia::new("remote-video")));

    let first = wait_for_event(&mut h.events, |_| true).await.unwrap();
    assert!(matches!(first, CallEvent::ParticipantCount(1)));
    let second = wait_for_event(&mut h.events, |_| true).await.unwrap();
    assert!(matches!(second, CallEvent::PeerJoined));
    let third = wait_for_event(&mut h.events, |_| true).await.unwrap();
    assert!(matches!(third, CallEvent::ParticipantCount(2)));

    let media = wait_for_event(&mut h.events, |e| matches!(e, CallEvent::RemoteStream(_)))
        .await
        .unwrap();
    let CallEvent::RemoteStream(media) = media else {
        unreachable!()
    };
    assert_eq!(media.downcast_ref::<&str>(), Some(&"remote-video"));
}

#[tokio::test]
async fn test_room_full_ends_the_session() {
    init_tracing();
    let mut h = Harness::start(MockFactory::new()).await;

    h.signal(SignalMessage::RoomFull).await;
    let result = tokio::time::timeout(Duration::from_secs(5), &mut h.task)
        .await
        .expect("session did not stop")
        .expect("session panicked");
    assert!(matches!(result, Err(SessionError::RoomFull)));

    let events = h.drain_events();
    assert!(events.iter().any(|e| matches!(e, CallEvent::RoomFull)));
    assert!(h.factory.calls_for(1).contains(&TransportCall::Close));
}

#[tokio::test]
async fn test_signaling_loss_stops_cleanly() {
    init_tracing();
    let mut h = Harness::start(MockFactory::new()).await;

    h.press(SessionInput::SignalingClosed).await;
    let result = tokio::time::timeout(Duration::from_secs(5), &mut h.task)
        .await
        .expect("session did not stop")
        .expect("session panicked");
    assert!(result.is_ok());
    assert!(h.factory.calls_for(1).contains(&TransportCall::Close));
    assert_eq!(h.factory.created(), 1);
}
