use crate::config::{SessionConfig, UNKNOWN_PEER_LABEL};
use crate::error::SessionError;
use crate::media::{LocalTrack, MediaSource, TrackKind};
use crate::protocol::{DataEnvelope, EnvelopeKind, MutePayload, linkify, sanitize};
use crate::session::event::{ChatMessage, SessionEvent};
use crate::session::peer::{Peer, PeerStage, Reaction, Role};
use crate::session::{InternalEvent, SessionCommand};
use crate::signaling::SignalingLink;
use crate::speaker;
use crate::transport::{TransportEvent, TransportFactory};
use bytes::Bytes;
use huddle_core::{
    CandidateInit, IceServerConfig, PeerId, RoomId, SdpKind, SessionDescription, SignalMessage,
    UserData,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Why a transition precondition failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStateError {
    NotFound,
    InvalidStage(PeerStage),
}

/// The UI's grip on a running session.
pub struct SessionHandle {
    pub commands: mpsc::Sender<SessionCommand>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

/// Coordinator for one joined room: owns every peer record, side channel and
/// speaking detector, keyed by peer id, with create-on-add/destroy-on-remove
/// lifecycle. All mutation happens on the single [`RoomSession::run`] loop;
/// the discipline replacing locks is re-validating the target peer after
/// every suspension point.
pub struct RoomSession {
    config: SessionConfig,
    room: RoomId,
    local_name: String,
    local_info: String,
    local_id: Option<PeerId>,
    ice_servers: Vec<IceServerConfig>,

    peers: HashMap<PeerId, Peer>,
    chats: Vec<ChatMessage>,
    local_audio: Option<LocalTrack>,
    local_video: Option<LocalTrack>,
    audio_enabled: bool,
    video_enabled: bool,
    local_reaction: Option<Reaction>,
    reaction_seq: u64,
    notice_seq: u64,

    link: Arc<dyn SignalingLink>,
    factory: Arc<dyn TransportFactory>,
    media: Arc<dyn MediaSource>,

    signal_rx: mpsc::Receiver<SignalMessage>,
    engine_rx: mpsc::Receiver<TransportEvent>,
    engine_tx: mpsc::Sender<TransportEvent>,
    internal_rx: mpsc::Receiver<InternalEvent>,
    internal_tx: mpsc::Sender<InternalEvent>,
    command_rx: mpsc::Receiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl RoomSession {
    pub fn new(
        config: SessionConfig,
        room: RoomId,
        user_data: UserData,
        link: Arc<dyn SignalingLink>,
        signal_rx: mpsc::Receiver<SignalMessage>,
        factory: Arc<dyn TransportFactory>,
        media: Arc<dyn MediaSource>,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (engine_tx, engine_rx) = mpsc::channel(256);
        let (internal_tx, internal_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let ice_servers = config.ice_servers.clone();
        let session = Self {
            config,
            room,
            local_name: user_data.display_name,
            local_info: user_data.client_info,
            local_id: None,
            ice_servers,
            peers: HashMap::new(),
            chats: Vec::new(),
            local_audio: None,
            local_video: None,
            audio_enabled: false,
            video_enabled: false,
            local_reaction: None,
            reaction_seq: 0,
            notice_seq: 0,
            link,
            factory,
            media,
            signal_rx,
            engine_rx,
            engine_tx,
            internal_rx,
            internal_tx,
            command_rx,
            events: event_tx,
        };

        (
            session,
            SessionHandle {
                commands: command_tx,
                events: event_rx,
            },
        )
    }

    /// Local chat history: append-only, already sanitized and linkified.
    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chats
    }

    /// Run the session loop until the signaling link dies or the UI leaves.
    /// Spawn via `tokio::spawn`.
    pub async fn run(mut self) {
        info!("session loop started for room '{}'", self.room);

        self.init_local_media().await;

        loop {
            tokio::select! {
                signal = self.signal_rx.recv() => match signal {
                    Some(msg) => self.handle_signal(msg).await,
                    None => {
                        info!("signaling link closed, tearing down all peers");
                        self.shutdown().await;
                        break;
                    }
                },

                event = self.engine_rx.recv() => {
                    if let Some(event) = event {
                        self.handle_transport_event(event).await;
                    }
                },

                Some(event) = self.internal_rx.recv() => {
                    self.handle_internal(event).await;
                },

                command = self.command_rx.recv() => match command {
                    Some(SessionCommand::Leave) | None => {
                        info!("leaving room '{}'", self.room);
                        self.shutdown().await;
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                },
            }
        }

        info!("session loop finished");
    }

    // ---- signaling ----------------------------------------------------

    async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::Welcome {
                peer_id,
                ice_servers,
            } => {
                info!("welcomed as {peer_id}");
                self.local_id = Some(peer_id);
                if !ice_servers.is_empty() {
                    self.ice_servers = ice_servers;
                }
                let join = SignalMessage::Join {
                    room: self.room.clone(),
                    user_data: UserData::new(self.local_name.clone(), self.local_info.clone()),
                };
                if let Err(e) = self.link.send(join).await {
                    warn!("failed to send join: {e}");
                }
            }

            SignalMessage::AddPeer {
                peer_id,
                should_create_offer,
                user_data,
            } => {
                self.handle_add_peer(peer_id, should_create_offer, user_data)
                    .await;
            }

            SignalMessage::SessionDescription {
                peer_id,
                session_description,
            } => {
                self.handle_remote_description(peer_id, session_description)
                    .await;
            }

            SignalMessage::IceCandidate {
                peer_id,
                ice_candidate,
            } => {
                self.handle_remote_candidate(peer_id, ice_candidate).await;
            }

            SignalMessage::RemovePeer { peer_id } => {
                self.close_peer(&peer_id).await;
            }

            // Client-to-server shape; not valid input here.
            SignalMessage::Join { .. } => {}
        }
    }

    async fn handle_add_peer(
        &mut self,
        peer_id: PeerId,
        should_create_offer: bool,
        user_data: UserData,
    ) {
        if let Some(peer) = self.peers.get_mut(&peer_id) {
            // Same identity re-joined: refresh the profile, keep the session.
            peer.user_data = UserData {
                display_name: sanitize(&user_data.display_name),
                client_info: sanitize(&user_data.client_info),
            };
            let name = peer.display_name().to_owned();
            self.emit(SessionEvent::DisplayName { peer_id, name });
            return;
        }

        let role = if should_create_offer {
            Role::Offerer
        } else {
            Role::Answerer
        };

        let transport = match self
            .factory
            .create(
                peer_id.clone(),
                self.ice_servers.clone(),
                self.engine_tx.clone(),
            )
            .await
        {
            Ok(transport) => transport,
            Err(e) => {
                warn!("failed to create connection for {peer_id}: {e}");
                self.notice("Could not set up a peer connection".to_owned());
                return;
            }
        };

        // The factory awaited; a duplicate may have landed in the meantime.
        if self.peers.contains_key(&peer_id) {
            transport.close().await;
            return;
        }

        let peer = Peer::new(peer_id.clone(), user_data, role, transport);
        self.emit(SessionEvent::PeerAdded {
            peer_id: peer_id.clone(),
            user_data: peer.user_data.clone(),
        });
        self.peers.insert(peer_id.clone(), peer);
        info!("peer {peer_id} added as {role:?}");

        self.connect_peer(peer_id).await;
    }

    /// Idle -> Connecting: attach current local tracks; the offerer also
    /// opens the side channel and starts negotiation.
    async fn connect_peer(&mut self, peer_id: PeerId) {
        let (role, transport) = match self.expect_peer("connect", &peer_id, &[PeerStage::Idle]) {
            Ok(peer) => {
                peer.stage = PeerStage::Connecting;
                (peer.role, peer.transport.clone())
            }
            Err(_) => return,
        };

        let tracks = [self.local_audio.clone(), self.local_video.clone()];
        for track in tracks.into_iter().flatten() {
            if let Err(e) = transport.attach_track(track).await {
                warn!("failed to attach local track for {peer_id}: {e}");
            }
        }

        if role == Role::Offerer {
            if let Err(e) = transport.open_channel().await {
                warn!("failed to open side channel to {peer_id}: {e}");
            }
            self.negotiate(peer_id).await;
        }
    }

    /// Build a local offer, store it, send it through the relay.
    async fn negotiate(&mut self, peer_id: PeerId) {
        const STAGES: &[PeerStage] = &[PeerStage::Connecting, PeerStage::Negotiating];

        let transport = match self.expect_peer("negotiate", &peer_id, STAGES) {
            Ok(peer) => peer.transport.clone(),
            Err(_) => return,
        };

        let offer = match transport.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                self.report_negotiation(&peer_id, e);
                return;
            }
        };
        if let Err(e) = transport.set_local_description(offer.clone()).await {
            self.report_negotiation(&peer_id, e);
            return;
        }

        // The commit awaited; the peer may be gone by now.
        if self.expect_peer("offer relay", &peer_id, STAGES).is_err() {
            return;
        }
        if let Err(e) = self
            .link
            .send(SignalMessage::SessionDescription {
                peer_id: peer_id.clone(),
                session_description: offer,
            })
            .await
        {
            warn!("failed to relay offer to {peer_id}: {e}");
        }
    }

    async fn handle_remote_description(
        &mut self,
        peer_id: PeerId,
        description: SessionDescription,
    ) {
        const STAGES: &[PeerStage] = &[
            PeerStage::Connecting,
            PeerStage::Connected,
            PeerStage::Negotiating,
        ];

        let transport = match self.expect_peer("session description", &peer_id, STAGES) {
            Ok(peer) => peer.transport.clone(),
            Err(_) => return,
        };

        let kind = description.kind;
        if let Err(e) = transport.set_remote_description(description).await {
            self.report_negotiation(&peer_id, e);
            return;
        }

        // Remote description accepted: mark it and drain the buffered
        // candidates in their original arrival order.
        let queued: Vec<CandidateInit> =
            match self.expect_peer("candidate drain", &peer_id, STAGES) {
                Ok(peer) => {
                    peer.remote_description_set = true;
                    peer.pending_candidates.drain(..).collect()
                }
                Err(_) => return,
            };
        for candidate in queued {
            if let Err(e) = transport.add_ice_candidate(candidate).await {
                warn!("skipping buffered candidate for {peer_id}: {e}");
            }
        }

        match kind {
            SdpKind::Offer => {
                let answer = match transport.create_answer().await {
                    Ok(answer) => answer,
                    Err(e) => {
                        self.report_negotiation(&peer_id, e);
                        return;
                    }
                };
                if let Err(e) = transport.set_local_description(answer.clone()).await {
                    self.report_negotiation(&peer_id, e);
                    return;
                }

                match self.expect_peer("answer relay", &peer_id, STAGES) {
                    Ok(peer) => peer.stage = PeerStage::Connected,
                    Err(_) => return,
                }
                if let Err(e) = self
                    .link
                    .send(SignalMessage::SessionDescription {
                        peer_id: peer_id.clone(),
                        session_description: answer,
                    })
                    .await
                {
                    warn!("failed to relay answer to {peer_id}: {e}");
                }
            }
            SdpKind::Answer => {
                if let Ok(peer) = self.expect_peer("offer completion", &peer_id, STAGES) {
                    peer.stage = PeerStage::Connected;
                }
            }
        }
    }

    async fn handle_remote_candidate(&mut self, peer_id: PeerId, candidate: CandidateInit) {
        const STAGES: &[PeerStage] = &[
            PeerStage::Connecting,
            PeerStage::Connected,
            PeerStage::Negotiating,
        ];

        let transport = match self.expect_peer("candidate", &peer_id, STAGES) {
            Ok(peer) => {
                if !peer.remote_description_set {
                    peer.pending_candidates.push_back(candidate);
                    return;
                }
                peer.transport.clone()
            }
            Err(_) => return,
        };

        if let Err(e) = transport.add_ice_candidate(candidate).await {
            warn!("failed to apply candidate from {peer_id}: {e}");
        }
    }

    // ---- transport events ---------------------------------------------

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGenerated(peer_id, candidate) => {
                if !self.peers.contains_key(&peer_id) {
                    return;
                }
                if let Err(e) = self
                    .link
                    .send(SignalMessage::IceCandidate {
                        peer_id: peer_id.clone(),
                        ice_candidate: candidate,
                    })
                    .await
                {
                    warn!("failed to relay candidate to {peer_id}: {e}");
                }
            }

            TransportEvent::ChannelOpen(peer_id) => {
                debug!("side channel open for {peer_id}");
                let Some(peer) = self.peers.get(&peer_id) else {
                    return;
                };
                let transport = peer.transport.clone();
                // Introduce ourselves as soon as the channel can carry it.
                let Some(envelope) =
                    self.build_envelope(EnvelopeKind::PeerName, self.local_name.clone())
                else {
                    return;
                };
                match envelope.encode() {
                    Ok(payload) => {
                        if let Err(e) = transport.send(payload).await {
                            warn!("failed to announce name to {peer_id}: {e}");
                        }
                    }
                    Err(e) => warn!("failed to encode name announce: {e}"),
                }
            }

            TransportEvent::ChannelMessage(peer_id, data) => {
                self.handle_channel_message(peer_id, data).await;
            }

            TransportEvent::RemoteAudio(peer_id, frames) => {
                let threshold = self.config.volume_threshold;
                let interval = self.config.sample_interval;
                let internal_tx = self.internal_tx.clone();
                let Some(peer) = self.peers.get_mut(&peer_id) else {
                    return;
                };
                let handle = speaker::spawn(peer_id, frames, threshold, interval, internal_tx);
                if let Some(old) = peer.speaker.replace(handle) {
                    old.abort();
                }
            }

            TransportEvent::ConnectionFailed(peer_id) => {
                // Reactive path: the connectivity layer noticed before we did.
                info!("connectivity lost for {peer_id}");
                self.close_peer(&peer_id).await;
            }
        }
    }

    // ---- side-channel protocol ----------------------------------------

    async fn handle_channel_message(&mut self, from: PeerId, data: Bytes) {
        let envelope = match DataEnvelope::decode(&data) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("dropping malformed envelope from {from}: {e}");
                return;
            }
        };
        self.handle_envelope(envelope).await;
    }

    async fn handle_envelope(&mut self, envelope: DataEnvelope) {
        let sender = envelope.peer_id.clone();

        if envelope.kind != EnvelopeKind::PeerName && !self.peers.contains_key(&sender) {
            warn!(
                "dropping {:?} envelope from unknown sender {sender}",
                envelope.kind
            );
            return;
        }

        match envelope.kind {
            EnvelopeKind::PeerName => {
                let Some(peer) = self.peers.get_mut(&sender) else {
                    debug!("name announce from unknown sender {sender}");
                    return;
                };
                let name = sanitize(&envelope.message);
                peer.user_data.display_name = name.clone();
                self.emit(SessionEvent::DisplayName {
                    peer_id: sender,
                    name,
                });
            }

            EnvelopeKind::Chat => {
                let display_name = self.resolve_display_name(&sender, &envelope.name);
                let chat = ChatMessage {
                    peer_id: sender,
                    display_name,
                    text: linkify(&envelope.message),
                    date: envelope.date,
                    local: false,
                };
                self.chats.push(chat.clone());
                self.emit(SessionEvent::Chat(chat));
            }

            EnvelopeKind::Mute => {
                let payload: MutePayload = match serde_json::from_str(&envelope.message) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("dropping malformed mute payload from {sender}: {e}");
                        return;
                    }
                };
                let Some(peer) = self.peers.get_mut(&sender) else {
                    return;
                };
                // Only the sender's own recorded flag ever moves here.
                match payload.kind {
                    TrackKind::Audio => peer.flags.audio_muted = payload.status,
                    TrackKind::Video => peer.flags.video_muted = payload.status,
                }
                self.emit(SessionEvent::Mute {
                    peer_id: sender,
                    kind: payload.kind,
                    muted: payload.status,
                });
            }

            EnvelopeKind::Reaction => {
                self.display_reaction(Some(sender), envelope.message);
            }
        }
    }

    fn resolve_display_name(&self, sender: &PeerId, envelope_name: &str) -> String {
        if let Some(peer) = self.peers.get(sender) {
            if !peer.user_data.display_name.is_empty() {
                return peer.user_data.display_name.clone();
            }
        }
        let name = sanitize(envelope_name);
        if name.is_empty() {
            UNKNOWN_PEER_LABEL.to_owned()
        } else {
            name
        }
    }

    /// Show a reaction and schedule its clear. A newer reaction bumps the
    /// sequence, so the superseded timer finds a stale seq and leaves the
    /// replacement alone.
    fn display_reaction(&mut self, target: Option<PeerId>, symbol: String) {
        self.reaction_seq += 1;
        let seq = self.reaction_seq;
        let reaction = Reaction {
            symbol: symbol.clone(),
            seq,
        };

        let event_id = match &target {
            Some(peer_id) => {
                let Some(peer) = self.peers.get_mut(peer_id) else {
                    return;
                };
                peer.latest_reaction = Some(reaction);
                peer_id.clone()
            }
            None => {
                let Some(local_id) = self.local_id.clone() else {
                    return;
                };
                self.local_reaction = Some(reaction);
                local_id
            }
        };

        self.emit(SessionEvent::Reaction {
            peer_id: event_id,
            symbol: Some(symbol),
        });

        let tx = self.internal_tx.clone();
        let window = self.config.reaction_display;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = tx
                .send(InternalEvent::ClearReaction {
                    peer_id: target,
                    seq,
                })
                .await;
        });
    }

    // ---- internal events ----------------------------------------------

    async fn handle_internal(&mut self, event: InternalEvent) {
        match event {
            InternalEvent::Talking { peer_id, talking } => {
                let Some(peer) = self.peers.get_mut(&peer_id) else {
                    return;
                };
                if peer.flags.talking != talking {
                    peer.flags.talking = talking;
                    self.emit(SessionEvent::Talking { peer_id, talking });
                }
            }

            InternalEvent::ClearReaction { peer_id, seq } => match peer_id {
                Some(peer_id) => {
                    let Some(peer) = self.peers.get_mut(&peer_id) else {
                        return;
                    };
                    if peer
                        .latest_reaction
                        .as_ref()
                        .is_some_and(|reaction| reaction.seq == seq)
                    {
                        peer.latest_reaction = None;
                        self.emit(SessionEvent::Reaction {
                            peer_id,
                            symbol: None,
                        });
                    }
                }
                None => {
                    if self
                        .local_reaction
                        .as_ref()
                        .is_some_and(|reaction| reaction.seq == seq)
                    {
                        self.local_reaction = None;
                        if let Some(local_id) = self.local_id.clone() {
                            self.emit(SessionEvent::Reaction {
                                peer_id: local_id,
                                symbol: None,
                            });
                        }
                    }
                }
            },

            InternalEvent::ClearNotice { seq } => {
                if self.notice_seq == seq {
                    self.emit(SessionEvent::NoticeCleared);
                }
            }
        }
    }

    // ---- UI commands ---------------------------------------------------

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SendChat(text) => {
                if text.is_empty() {
                    return;
                }
                let markup = linkify(&text);
                let Some(envelope) = self.build_envelope(EnvelopeKind::Chat, markup.clone())
                else {
                    warn!("chat before join, ignoring");
                    return;
                };
                let chat = ChatMessage {
                    peer_id: envelope.peer_id.clone(),
                    display_name: self.local_name.clone(),
                    text: markup,
                    date: envelope.date.clone(),
                    local: true,
                };
                self.chats.push(chat.clone());
                self.emit(SessionEvent::Chat(chat));
                self.broadcast(envelope).await;
            }

            SessionCommand::AnnounceName(name) => {
                self.local_name = name.clone();
                let Some(envelope) = self.build_envelope(EnvelopeKind::PeerName, name) else {
                    return;
                };
                self.broadcast(envelope).await;
            }

            SessionCommand::SendReaction(symbol) => {
                let Some(envelope) =
                    self.build_envelope(EnvelopeKind::Reaction, symbol.clone())
                else {
                    return;
                };
                self.broadcast(envelope).await;
                self.display_reaction(None, symbol);
            }

            SessionCommand::SetTrackEnabled { kind, enabled } => {
                let current = match kind {
                    TrackKind::Audio => self.audio_enabled,
                    TrackKind::Video => self.video_enabled,
                };
                if current == enabled {
                    return;
                }
                if enabled {
                    self.start_track(kind).await;
                } else {
                    self.stop_track(kind).await;
                }
            }

            // Intercepted by the run loop.
            SessionCommand::Leave => {}
        }
    }

    /// Re-acquire a local track of `kind` and route it to every peer: swap in
    /// place where a compatible sender exists, renegotiate where the kind is
    /// genuinely new on that transport.
    async fn start_track(&mut self, kind: TrackKind) {
        let track = match self.media.acquire(kind).await {
            Ok(track) => track,
            Err(e) => {
                warn!("media acquisition failed: {e}");
                self.notice(format!(
                    "Unable to start {kind}. Check device permissions."
                ));
                self.set_enabled(kind, false);
                self.emit(SessionEvent::LocalTrack {
                    kind,
                    enabled: false,
                });
                return;
            }
        };

        match kind {
            TrackKind::Audio => self.local_audio = Some(track.clone()),
            TrackKind::Video => self.local_video = Some(track.clone()),
        }

        let peer_ids: Vec<PeerId> = self.peers.keys().cloned().collect();
        for peer_id in peer_ids {
            // Re-fetch per iteration; earlier awaits may have closed peers.
            let Some(peer) = self.peers.get_mut(&peer_id) else {
                continue;
            };
            let transport = peer.transport.clone();
            match transport.replace_track(track.clone()).await {
                Ok(true) => {}
                Ok(false) => {
                    // Track kind is new on this transport: fresh offer round.
                    let Some(peer) = self.peers.get_mut(&peer_id) else {
                        continue;
                    };
                    if peer.stage == PeerStage::Connected {
                        peer.stage = PeerStage::Negotiating;
                        self.negotiate(peer_id).await;
                    }
                }
                Err(e) => {
                    warn!("failed to update outgoing {kind} track for {peer_id}: {e}");
                }
            }
        }

        self.set_enabled(kind, true);
        self.emit(SessionEvent::LocalTrack {
            kind,
            enabled: true,
        });
        self.send_mute(kind, false).await;
    }

    async fn stop_track(&mut self, kind: TrackKind) {
        // Stopping capture is the provider's side; dropping the handle is ours.
        match kind {
            TrackKind::Audio => self.local_audio = None,
            TrackKind::Video => self.local_video = None,
        }
        self.set_enabled(kind, false);
        self.emit(SessionEvent::LocalTrack {
            kind,
            enabled: false,
        });
        self.send_mute(kind, true).await;
    }

    fn set_enabled(&mut self, kind: TrackKind, enabled: bool) {
        match kind {
            TrackKind::Audio => self.audio_enabled = enabled,
            TrackKind::Video => self.video_enabled = enabled,
        }
    }

    async fn send_mute(&mut self, kind: TrackKind, status: bool) {
        let payload = MutePayload { kind, status };
        let Ok(message) = serde_json::to_string(&payload) else {
            return;
        };
        let Some(envelope) = self.build_envelope(EnvelopeKind::Mute, message) else {
            return;
        };
        self.broadcast(envelope).await;
    }

    // ---- lifecycle -----------------------------------------------------

    /// Any state -> Closed. Final and idempotent: a second call, or one for
    /// an id never added, changes nothing.
    async fn close_peer(&mut self, peer_id: &PeerId) {
        let Some(mut peer) = self.peers.remove(peer_id) else {
            return;
        };
        peer.stage = PeerStage::Closed;
        if let Some(speaker) = peer.speaker.take() {
            speaker.abort();
        }
        peer.transport.close().await;
        self.emit(SessionEvent::PeerRemoved {
            peer_id: peer_id.clone(),
        });
        info!("peer {peer_id} closed");
    }

    async fn shutdown(&mut self) {
        let peer_ids: Vec<PeerId> = self.peers.keys().cloned().collect();
        for peer_id in peer_ids {
            self.close_peer(&peer_id).await;
        }
    }

    async fn init_local_media(&mut self) {
        for kind in [TrackKind::Audio, TrackKind::Video] {
            match self.media.acquire(kind).await {
                Ok(track) => {
                    match kind {
                        TrackKind::Audio => self.local_audio = Some(track),
                        TrackKind::Video => self.local_video = Some(track),
                    }
                    self.set_enabled(kind, true);
                    self.emit(SessionEvent::LocalTrack {
                        kind,
                        enabled: true,
                    });
                }
                Err(e) => {
                    warn!("initial {kind} acquisition failed: {e}");
                    self.notice(format!(
                        "Unable to start {kind}. Check device permissions."
                    ));
                    self.set_enabled(kind, false);
                    self.emit(SessionEvent::LocalTrack {
                        kind,
                        enabled: false,
                    });
                }
            }
        }
    }

    // ---- plumbing -------------------------------------------------------

    /// The one precondition every transition goes through: the peer exists
    /// and sits in an expected stage.
    fn expect_peer(
        &mut self,
        op: &str,
        peer_id: &PeerId,
        stages: &[PeerStage],
    ) -> Result<&mut Peer, PeerStateError> {
        match self.peers.get_mut(peer_id) {
            None => {
                debug!("{op}: peer {peer_id} is gone");
                Err(PeerStateError::NotFound)
            }
            Some(peer) if !stages.contains(&peer.stage) => {
                warn!("{op}: peer {peer_id} in unexpected stage {:?}", peer.stage);
                Err(PeerStateError::InvalidStage(peer.stage))
            }
            Some(peer) => Ok(peer),
        }
    }

    fn build_envelope(&self, kind: EnvelopeKind, message: String) -> Option<DataEnvelope> {
        let peer_id = self.local_id.clone()?;
        Some(DataEnvelope {
            kind,
            name: self.local_name.clone(),
            peer_id,
            message,
            date: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Best-effort fan-out: every open side channel gets the envelope, the
    /// rest are skipped.
    async fn broadcast(&mut self, envelope: DataEnvelope) {
        let payload = match envelope.encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("failed to encode envelope: {e}");
                return;
            }
        };
        for peer in self.peers.values() {
            if !peer.transport.channel_open() {
                continue;
            }
            if let Err(e) = peer.transport.send(payload.clone()).await {
                warn!("side-channel send to {} failed: {e}", peer.id);
            }
        }
    }

    fn report_negotiation(&mut self, peer_id: &PeerId, err: SessionError) {
        // The peer entry stays; the connectivity layer's failure signal is
        // what eventually closes it.
        warn!("negotiation with {peer_id} failed: {err}");
        self.notice("Connection negotiation failed".to_owned());
    }

    fn notice(&mut self, text: String) {
        self.notice_seq += 1;
        let seq = self.notice_seq;
        self.emit(SessionEvent::Notice { text });

        let tx = self.internal_tx.clone();
        let window = self.config.notice_dismiss;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = tx.send(InternalEvent::ClearNotice { seq }).await;
        });
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
