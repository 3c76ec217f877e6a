use crate::config::DATA_CHANNEL_LABEL;
use crate::error::SessionError;
use crate::media::{LocalTrack, TrackKind};
use crate::speaker::AudioFrame;
use crate::transport::{PeerTransport, TransportEvent, TransportFactory};
use async_trait::async_trait;
use bytes::Bytes;
use huddle_core::{CandidateInit, IceServerConfig, PeerId, SdpKind, SessionDescription};
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_remote::TrackRemote;

/// Pairwise connection backed by the webrtc crate.
pub struct RtcTransport {
    peer_id: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
    channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    channel_open: Arc<AtomicBool>,
    senders: Mutex<Vec<(TrackKind, Arc<RTCRtpSender>)>>,
    events: mpsc::Sender<TransportEvent>,
}

impl RtcTransport {
    /// Set up a peer connection with all callbacks wired into `event_tx`.
    pub async fn connect(
        peer_id: PeerId,
        ice_servers: Vec<IceServerConfig>,
        window: usize,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, SessionError> {
        let mut media = MediaEngine::default();
        media
            .register_default_codecs()
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        let registry = register_default_interceptors(Registry::new(), &mut media)
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .into_iter()
                .map(|server| RTCIceServer {
                    urls: server.urls,
                    username: server.username.unwrap_or_default(),
                    credential: server.credential.unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| SessionError::Transport(e.to_string()))?,
        );

        let channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>> = Arc::new(Mutex::new(None));
        let channel_open = Arc::new(AtomicBool::new(false));

        // Connectivity status is the only failure signal the session gets for
        // an established pair; Failed/Disconnected/Closed all collapse into
        // one event.
        let state_tx = event_tx.clone();
        let state_id = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let id = state_id.clone();

                Box::pin(async move {
                    info!("connection state for {id}: {s}");
                    match s {
                        RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed => {
                            let _ = tx.send(TransportEvent::ConnectionFailed(id)).await;
                        }
                        _ => {}
                    }
                })
            },
        ));

        // Trickle ICE: every local candidate goes straight to the relay.
        let ice_tx = event_tx.clone();
        let ice_id = peer_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let id = ice_id.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = CandidateInit {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(id, candidate))
                    .await;
            })
        }));

        // Answerer side: the offerer creates the channel, we receive it.
        let dc_tx = event_tx.clone();
        let dc_id = peer_id.clone();
        let dc_slot = channel.clone();
        let dc_open = channel_open.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let id = dc_id.clone();
            let slot = dc_slot.clone();
            let open = dc_open.clone();

            Box::pin(async move {
                debug!("incoming side channel '{}' from {id}", dc.label());
                wire_channel(id, dc.clone(), open, tx);
                *slot.lock() = Some(dc);
            })
        }));

        // First remote audio stream feeds the speaking detector.
        let track_tx = event_tx.clone();
        let track_id = peer_id.clone();
        let audio_claimed = Arc::new(AtomicBool::new(false));
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
            let tx = track_tx.clone();
            let id = track_id.clone();
            let claimed = audio_claimed.clone();

            Box::pin(async move {
                if track.kind() != RTPCodecType::Audio {
                    return;
                }
                if claimed.swap(true, Ordering::SeqCst) {
                    return;
                }
                let (frame_tx, frame_rx) = mpsc::channel(8);
                if tx
                    .send(TransportEvent::RemoteAudio(id.clone(), frame_rx))
                    .await
                    .is_err()
                {
                    return;
                }
                tokio::spawn(read_audio_windows(track, window, frame_tx));
            })
        }));

        Ok(Self {
            peer_id,
            peer_connection,
            channel,
            channel_open,
            senders: Mutex::new(Vec::new()),
            events: event_tx,
        })
    }

    fn to_rtc_description(
        description: SessionDescription,
    ) -> Result<RTCSessionDescription, SessionError> {
        match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp),
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp),
        }
        .map_err(|e| SessionError::Negotiation(e.to_string()))
    }
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn create_offer(&self) -> Result<SessionDescription, SessionError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(|e| SessionError::Negotiation(e.to_string()))?;
        Ok(SessionDescription {
            kind: SdpKind::Offer,
            sdp: offer.sdp,
        })
    }

    async fn create_answer(&self) -> Result<SessionDescription, SessionError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| SessionError::Negotiation(e.to_string()))?;
        Ok(SessionDescription {
            kind: SdpKind::Answer,
            sdp: answer.sdp,
        })
    }

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), SessionError> {
        let desc = Self::to_rtc_description(description)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .map_err(|e| SessionError::Negotiation(e.to_string()))
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), SessionError> {
        let desc = Self::to_rtc_description(description)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| SessionError::Negotiation(e.to_string()))
    }

    async fn add_ice_candidate(&self, candidate: CandidateInit) -> Result<(), SessionError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| SessionError::Negotiation(e.to_string()))
    }

    async fn attach_track(&self, track: LocalTrack) -> Result<(), SessionError> {
        let sender = self
            .peer_connection
            .add_track(track.rtp.clone())
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        self.senders.lock().push((track.kind, sender));
        Ok(())
    }

    async fn replace_track(&self, track: LocalTrack) -> Result<bool, SessionError> {
        let existing = {
            let senders = self.senders.lock();
            senders
                .iter()
                .find(|(kind, _)| *kind == track.kind)
                .map(|(_, sender)| sender.clone())
        };

        match existing {
            Some(sender) => {
                sender
                    .replace_track(Some(track.rtp.clone()))
                    .await
                    .map_err(|e| SessionError::Transport(e.to_string()))?;
                Ok(true)
            }
            None => {
                self.attach_track(track).await?;
                Ok(false)
            }
        }
    }

    async fn open_channel(&self) -> Result<(), SessionError> {
        let dc = self
            .peer_connection
            .create_data_channel(DATA_CHANNEL_LABEL, None)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        wire_channel(
            self.peer_id.clone(),
            dc.clone(),
            self.channel_open.clone(),
            self.events.clone(),
        );
        *self.channel.lock() = Some(dc);
        Ok(())
    }

    async fn send(&self, payload: Bytes) -> Result<(), SessionError> {
        let channel = self.channel.lock().clone();
        let Some(channel) = channel else {
            return Err(SessionError::Transport("side channel not open".to_owned()));
        };
        channel
            .send(&payload)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        Ok(())
    }

    fn channel_open(&self) -> bool {
        self.channel_open.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.channel_open.store(false, Ordering::SeqCst);
        if let Err(e) = self.peer_connection.close().await {
            debug!("closing connection to {}: {e}", self.peer_id);
        }
    }
}

/// Hook open/message/close on a side channel, whichever side created it.
fn wire_channel(
    peer_id: PeerId,
    dc: Arc<RTCDataChannel>,
    open: Arc<AtomicBool>,
    events: mpsc::Sender<TransportEvent>,
) {
    let open_tx = events.clone();
    let open_id = peer_id.clone();
    let open_flag = open.clone();
    dc.on_open(Box::new(move || {
        let tx = open_tx.clone();
        let id = open_id.clone();
        let open = open_flag.clone();

        Box::pin(async move {
            info!("side channel open for {id}");
            open.store(true, Ordering::SeqCst);
            let _ = tx.send(TransportEvent::ChannelOpen(id)).await;
        })
    }));

    let msg_tx = events;
    let msg_id = peer_id.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = msg_tx.clone();
        let id = msg_id.clone();

        Box::pin(async move {
            let _ = tx.send(TransportEvent::ChannelMessage(id, msg.data)).await;
        })
    }));

    dc.on_close(Box::new(move || {
        let open = open.clone();
        let id = peer_id.clone();

        Box::pin(async move {
            debug!("side channel closed for {id}");
            open.store(false, Ordering::SeqCst);
        })
    }));
}

/// Chunk a remote audio track into fixed-size amplitude windows. Windows are
/// dropped when the detector lags; sampling only ever wants the freshest one.
async fn read_audio_windows(
    track: Arc<TrackRemote>,
    window: usize,
    frames: mpsc::Sender<AudioFrame>,
) {
    let mut buffer: AudioFrame = Vec::with_capacity(window);
    while let Ok((packet, _)) = track.read_rtp().await {
        for &byte in packet.payload.iter() {
            buffer.push(byte);
            if buffer.len() == window {
                let full = std::mem::replace(&mut buffer, Vec::with_capacity(window));
                if frames.try_send(full).is_err() && frames.is_closed() {
                    return;
                }
            }
        }
    }
}

/// Builds `RtcTransport`s for the session.
pub struct RtcTransportFactory {
    window: usize,
}

impl RtcTransportFactory {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        peer_id: PeerId,
        ice_servers: Vec<IceServerConfig>,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, SessionError> {
        match RtcTransport::connect(peer_id.clone(), ice_servers, self.window, events).await {
            Ok(transport) => Ok(Arc::new(transport)),
            Err(e) => {
                warn!("failed to create transport for {peer_id}: {e}");
                Err(e)
            }
        }
    }
}
