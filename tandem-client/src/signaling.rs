use crate::SessionError;
use crate::session::{CallEvent, Session, SessionConfig, SessionInput, SessionStatus};
use crate::transport::TransportFactory;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tandem_core::{RoomId, SignalMessage};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use url::Url;

const INPUT_CAPACITY: usize = 64;

/// Builds the socket url for `room` from the server's base address.
///
/// `http`/`https` bases are mapped to `ws`/`wss`.
pub fn signaling_url(server: &Url, room: &RoomId) -> Result<Url, SessionError> {
    let mut url = server.join("ws")?;
    let scheme = match url.scheme() {
        "http" => Some("ws"),
        "https" => Some("wss"),
        _ => None,
    };
    if let Some(scheme) = scheme {
        // Both sides of the mapping are special schemes, so this cannot fail.
        let _ = url.set_scheme(scheme);
    }
    url.query_pairs_mut()
        .clear()
        .append_pair("room", room.as_str());
    Ok(url)
}

/// Opens the signaling socket and pumps it in both directions.
///
/// Incoming messages are pushed into `inputs` as [`SessionInput::Signal`],
/// followed by [`SessionInput::SignalingClosed`] once the socket ends.
/// The returned sender takes messages for the server.
pub async fn connect_signaling(
    server: &Url,
    room: &RoomId,
    inputs: mpsc::Sender<SessionInput>,
) -> Result<mpsc::UnboundedSender<SignalMessage>, SessionError> {
    let url = signaling_url(server, room)?;
    let (socket, _) = connect_async(url.as_str()).await?;
    info!(%url, "Connected to signaling server");

    let (mut sink, mut stream) = socket.split();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<SignalMessage>();

    tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match msg.encode() {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode {} message: {}", msg.kind(), e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::text(text)).await {
                warn!("Signaling send failed: {}", e);
                break;
            }
        }
        let _ = sink.close().await;
        debug!("Signaling writer finished");
    });

    tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Signaling socket error: {}", e);
                    break;
                }
            };

            match SignalMessage::decode(text.as_str()) {
                Ok(msg) => {
                    if inputs.send(SessionInput::Signal(msg)).await.is_err() {
                        return;
                    }
                }
                Err(e) => debug!("Ignoring malformed signaling message: {}", e),
            }
        }

        info!("Signaling socket closed");
        let _ = inputs.send(SessionInput::SignalingClosed).await;
    });

    Ok(outbound)
}

/// A running call session joined to a room.
pub struct CallHandle {
    /// User actions: [`SessionInput::Call`] and [`SessionInput::HangUp`].
    pub input: mpsc::Sender<SessionInput>,
    pub events: mpsc::UnboundedReceiver<CallEvent>,
    pub status: watch::Receiver<SessionStatus>,
    pub task: JoinHandle<Result<(), SessionError>>,
}

/// Connects to the server, joins `room` and spawns the session driver.
pub async fn join_room(
    server: &Url,
    room: &RoomId,
    config: SessionConfig,
    factory: Arc<dyn TransportFactory>,
) -> Result<CallHandle, SessionError> {
    let (input, inputs) = mpsc::channel(INPUT_CAPACITY);
    let outbound = connect_signaling(server, room, input.clone()).await?;

    let (session, handles) = Session::new(config, factory, outbound);
    let task = tokio::spawn(session.run(inputs));

    Ok(CallHandle {
        input,
        events: handles.events,
        status: handles.status,
        task,
    })
}
