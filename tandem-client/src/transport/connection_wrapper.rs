use crate::supervisor::Connectivity;
use crate::transport::{EventSink, PeerTransport, RemoteMedia, TransportEvent, TransportFactory};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Arc;
use tandem_core::{IceCandidateInit, IceServerConfig, SdpType, SessionDescription};
use tracing::{debug, info, trace};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Peer transport backed by a webrtc-rs `RTCPeerConnection`.
pub struct RtcTransport {
    generation: u64,
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcTransport {
    pub async fn new(
        ice_servers: &[IceServerConfig],
        local_tracks: &[Arc<dyn TrackLocal + Send + Sync>],
        events: EventSink,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let generation = events.generation();
        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        if local_tracks.is_empty() {
            // Nothing to send, but still negotiate one audio and one video section.
            for kind in [RTPCodecType::Audio, RTPCodecType::Video] {
                let init = RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                };
                peer_connection
                    .add_transceiver_from_kind(kind, Some(init))
                    .await?;
            }
        } else {
            for track in local_tracks {
                let sender = peer_connection.add_track(track.clone()).await?;
                // RTCP has to be read for interceptors like NACK to work.
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 1500];
                    while sender.read(&mut buf).await.is_ok() {}
                });
            }
        }

        let state_events = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    info!(generation = events.generation(), state = %s, "ICE connection state changed");
                    if let Some(connectivity) = to_connectivity(s) {
                        events.emit(TransportEvent::Connectivity(connectivity));
                    }
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let Some(candidate) = c else {
                    trace!("ICE gathering complete");
                    return;
                };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events.emit(TransportEvent::LocalCandidate(IceCandidateInit {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                }));
            })
        }));

        let track_events = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();
                Box::pin(async move {
                    debug!(kind = %track.kind(), "Remote track arrived");
                    events.emit(TransportEvent::RemoteMedia(RemoteMedia::new(track)));
                })
            },
        ));

        Ok(Self {
            generation,
            peer_connection,
        })
    }
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidateInit) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        debug!(generation = self.generation, "Closing peer connection");
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Produces [`RtcTransport`]s. Local tracks, if any, are attached to every
/// connection it builds; without them the connection only receives.
#[derive(Default, Clone)]
pub struct RtcTransportFactory {
    local_tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl RtcTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local_tracks(tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>) -> Self {
        Self {
            local_tracks: tracks,
        }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: EventSink,
    ) -> Result<Box<dyn PeerTransport>> {
        let transport = RtcTransport::new(ice_servers, &self.local_tracks, events).await?;
        Ok(Box::new(transport))
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp)?,
        SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp)?,
        SdpType::Rollback => bail!("rollback descriptions are not supported"),
    };
    Ok(rtc)
}

fn to_connectivity(state: RTCIceConnectionState) -> Option<Connectivity> {
    match state {
        RTCIceConnectionState::New => Some(Connectivity::New),
        RTCIceConnectionState::Checking => Some(Connectivity::Checking),
        RTCIceConnectionState::Connected => Some(Connectivity::Connected),
        RTCIceConnectionState::Completed => Some(Connectivity::Completed),
        RTCIceConnectionState::Disconnected => Some(Connectivity::Disconnected),
        RTCIceConnectionState::Failed => Some(Connectivity::Failed),
        RTCIceConnectionState::Closed => Some(Connectivity::Closed),
        _ => None,
    }
}
