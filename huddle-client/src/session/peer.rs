use crate::config::UNKNOWN_PEER_LABEL;
use crate::protocol::sanitize;
use crate::transport::PeerTransport;
use huddle_core::{CandidateInit, PeerId, UserData};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Which side originates the pairwise negotiation. Assigned by the registry:
/// members already in the room offer, the joiner answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

/// Lifecycle of one pairwise connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStage {
    Idle,
    Connecting,
    Connected,
    Negotiating,
    Closed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerFlags {
    pub audio_muted: bool,
    pub video_muted: bool,
    pub talking: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Reaction {
    pub symbol: String,
    pub seq: u64,
}

/// Everything the session tracks about one remote participant. Built complete
/// by [`Peer::new`]; no field is backfilled later.
pub struct Peer {
    pub id: PeerId,
    pub user_data: UserData,
    pub role: Role,
    pub stage: PeerStage,
    pub transport: Arc<dyn PeerTransport>,
    /// Candidates that arrived before the remote description was accepted,
    /// in arrival order. Drained right after acceptance; empty once
    /// Connected.
    pub pending_candidates: VecDeque<CandidateInit>,
    pub remote_description_set: bool,
    pub flags: PeerFlags,
    pub(crate) latest_reaction: Option<Reaction>,
    pub(crate) speaker: Option<JoinHandle<()>>,
}

impl Peer {
    pub fn new(
        id: PeerId,
        user_data: UserData,
        role: Role,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        // Remote text is sanitized at the door, once.
        let user_data = UserData {
            display_name: sanitize(&user_data.display_name),
            client_info: sanitize(&user_data.client_info),
        };
        Self {
            id,
            user_data,
            role,
            stage: PeerStage::Idle,
            transport,
            pending_candidates: VecDeque::new(),
            remote_description_set: false,
            flags: PeerFlags::default(),
            latest_reaction: None,
            speaker: None,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.user_data.display_name.is_empty() {
            UNKNOWN_PEER_LABEL
        } else {
            &self.user_data.display_name
        }
    }
}
