use crate::model::peer::{PeerId, UserData};
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Negotiated parameter set exchanged between two participants. The relay
/// never looks past `kind`; the sdp body is opaque to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

/// Proposed network path for a pairwise transport. Opaque to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInit {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// Everything that crosses the signaling socket, both directions.
///
/// Client -> server: `Join` plus the two relay shapes, where `peer_id` names
/// the addressee. Server -> client: `Welcome`, `AddPeer`, `RemovePeer` plus
/// the relay shapes, where `peer_id` names the originator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum SignalMessage {
    Join {
        room: RoomId,
        user_data: UserData,
    },
    Welcome {
        peer_id: PeerId,
        ice_servers: Vec<IceServerConfig>,
    },
    AddPeer {
        peer_id: PeerId,
        should_create_offer: bool,
        user_data: UserData,
    },
    SessionDescription {
        peer_id: PeerId,
        session_description: SessionDescription,
    },
    IceCandidate {
        peer_id: PeerId,
        ice_candidate: CandidateInit,
    },
    RemovePeer {
        peer_id: PeerId,
    },
}
