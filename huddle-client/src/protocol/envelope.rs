use crate::error::SessionError;
use crate::media::TrackKind;
use bytes::Bytes;
use huddle_core::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvelopeKind {
    PeerName,
    Chat,
    Mute,
    Reaction,
}

/// One self-contained side-channel message: `{type, name, peerId, message,
/// date}` on the wire, no fragmentation. Delivery is best-effort broadcast;
/// nothing is retried or replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub name: String,
    #[serde(rename = "peerId")]
    pub peer_id: PeerId,
    pub message: String,
    pub date: String,
}

impl DataEnvelope {
    /// Decode one envelope. Parse failures and envelopes missing the type or
    /// sender id fields are rejected; callers drop and log, never surface.
    pub fn decode(data: &[u8]) -> Result<Self, SessionError> {
        serde_json::from_slice(data).map_err(|e| SessionError::Protocol(e.to_string()))
    }

    pub fn encode(&self) -> Result<Bytes, SessionError> {
        let raw = serde_json::to_vec(self).map_err(|e| SessionError::Protocol(e.to_string()))?;
        Ok(Bytes::from(raw))
    }
}

/// Payload of a `mute` envelope, carried JSON-encoded in `message`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MutePayload {
    pub kind: TrackKind,
    pub status: bool,
}
