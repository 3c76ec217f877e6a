use crate::error::SessionError;
use crate::media::LocalTrack;
use crate::transport::TransportEvent;
use async_trait::async_trait;
use bytes::Bytes;
use huddle_core::{CandidateInit, IceServerConfig, PeerId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One pairwise connection object. The session owns exactly one per remote
/// peer and is the only caller; implementations report asynchronous activity
/// through the event channel handed to the factory.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, SessionError>;

    async fn create_answer(&self) -> Result<SessionDescription, SessionError>;

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), SessionError>;

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), SessionError>;

    async fn add_ice_candidate(&self, candidate: CandidateInit) -> Result<(), SessionError>;

    /// Add an outgoing track to the connection.
    async fn attach_track(&self, track: LocalTrack) -> Result<(), SessionError>;

    /// Swap the outgoing track on an already-established sender of the same
    /// kind. `Ok(true)` means the swap happened in place and no renegotiation
    /// is needed; `Ok(false)` means no compatible sender existed and the track
    /// was added fresh instead.
    async fn replace_track(&self, track: LocalTrack) -> Result<bool, SessionError>;

    /// Open the application side channel (offerer side).
    async fn open_channel(&self) -> Result<(), SessionError>;

    /// Send one envelope over the side channel.
    async fn send(&self, payload: Bytes) -> Result<(), SessionError>;

    /// The side channel is currently open for writing.
    fn channel_open(&self) -> bool;

    /// Tear the connection down. Final and idempotent.
    async fn close(&self);
}

/// Builds one transport per added peer (the session never reuses one).
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: PeerId,
        ice_servers: Vec<IceServerConfig>,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, SessionError>;
}
