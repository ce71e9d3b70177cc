use crate::room::JoinOutcome;
use crate::signaling::{Outbound, SignalingService};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tandem_core::{ConnectionId, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// How long a rejected socket gets to flush its `room-full` notice.
const REJECT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
pub struct JoinParams {
    room: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<JoinParams>,
    State(service): State<SignalingService>,
) -> Response {
    let room = match params.room.map(RoomId::parse) {
        Some(Ok(room)) => room,
        _ => {
            warn!("WebSocket request without a room parameter, refusing");
            return (StatusCode::BAD_REQUEST, "missing room parameter").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, room, service))
}

async fn handle_socket(socket: WebSocket, room: RoomId, service: SignalingService) {
    let conn = ConnectionId::new();
    info!(%conn, %room, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel(service.outbox_capacity());

    let handle = service.connections().register(conn, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            let (msg, last) = match out {
                Outbound::Signal(signal) => match signal.encode() {
                    Ok(json) => (Message::Text(json.into()), false),
                    Err(e) => {
                        error!("Failed to serialize signal message: {}", e);
                        continue;
                    }
                },
                Outbound::Relay(raw) => (Message::Text(String::from(&*raw).into()), false),
                Outbound::Ping => (Message::Ping(Bytes::new()), false),
                Outbound::Close => (Message::Close(None), true),
            };

            if sender.send(msg).await.is_err() || last {
                break;
            }
        }
    });

    match service.rooms().join(&room, conn).await {
        Ok(JoinOutcome::Admitted) => {}
        Ok(JoinOutcome::Rejected) => {
            let _ = tokio::time::timeout(REJECT_FLUSH_TIMEOUT, &mut send_task).await;
            send_task.abort();
            service.connections().unregister(&conn);
            info!(%conn, %room, "WebSocket closed after room-full rejection");
            return;
        }
        Err(e) => {
            error!(%conn, "Join failed: {}", e);
            send_task.abort();
            service.connections().unregister(&conn);
            return;
        }
    }

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let room = room.clone();
        let handle = handle.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                handle.mark_alive();

                match msg {
                    Message::Text(text) => match SignalMessage::decode(text.as_str()) {
                        Ok(signal) => {
                            let raw: Arc<str> = Arc::from(text.as_str());
                            service.rooms().relay(&room, conn, signal, raw).await;
                        }
                        Err(e) => debug!(%conn, "Dropping malformed message: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
        _ = handle.killed() => {
            recv_task.abort();
            send_task.abort();
        }
    };

    service.rooms().leave(&room, conn).await;
    service.connections().unregister(&conn);
    info!(%conn, %room, "WebSocket disconnected");
}
