use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use huddle_core::{CandidateInit, IceServerConfig, PeerId, SessionDescription, SignalMessage, UserData};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
}

/// Connection map plus serialization for everything leaving the server. One
/// outbox per socket, drained by a single writer task, so sends to one
/// recipient keep their order.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    ice_servers: Arc<Vec<IceServerConfig>>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
            ice_servers: Arc::new(ice_servers),
        }
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub fn register(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(peer_id, tx);
    }

    pub fn unregister(&self, peer_id: &PeerId) {
        self.inner.peers.remove(peer_id);
    }

    pub fn send_signal(&self, peer_id: &PeerId, msg: SignalMessage) {
        if let Some(peer) = self.inner.peers.get(peer_id) {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        error!("failed to queue message for {peer_id}: {e}");
                    }
                }
                Err(e) => error!("failed to serialize signal message: {e}"),
            }
        } else {
            warn!("dropping signal for disconnected session {peer_id}");
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn add_peer(
        &self,
        to: &PeerId,
        peer_id: PeerId,
        should_create_offer: bool,
        user_data: UserData,
    ) {
        self.send_signal(
            to,
            SignalMessage::AddPeer {
                peer_id,
                should_create_offer,
                user_data,
            },
        );
    }

    async fn session_description(&self, to: &PeerId, from: PeerId, description: SessionDescription) {
        self.send_signal(
            to,
            SignalMessage::SessionDescription {
                peer_id: from,
                session_description: description,
            },
        );
    }

    async fn ice_candidate(&self, to: &PeerId, from: PeerId, candidate: CandidateInit) {
        self.send_signal(
            to,
            SignalMessage::IceCandidate {
                peer_id: from,
                ice_candidate: candidate,
            },
        );
    }

    async fn remove_peer(&self, to: &PeerId, peer_id: PeerId) {
        self.send_signal(to, SignalMessage::RemovePeer { peer_id });
    }
}
