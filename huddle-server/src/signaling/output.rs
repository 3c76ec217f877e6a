use async_trait::async_trait;
use huddle_core::{CandidateInit, PeerId, SessionDescription, UserData};

/// Outbound side of the signaling layer, as seen by the registry. The socket
/// service implements it; tests substitute a recording mock.
///
/// Every method addresses one recipient (`to`). Delivery is best-effort: a
/// recipient whose socket is gone is dropped with a log entry, never an error.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Announce a peer to `to`, with the role flag for their pairing.
    async fn add_peer(
        &self,
        to: &PeerId,
        peer_id: PeerId,
        should_create_offer: bool,
        user_data: UserData,
    );

    /// Relay a session description originated by `from`.
    async fn session_description(&self, to: &PeerId, from: PeerId, description: SessionDescription);

    /// Relay a connectivity candidate originated by `from`.
    async fn ice_candidate(&self, to: &PeerId, from: PeerId, candidate: CandidateInit);

    /// Tell `to` that a peer left or dropped.
    async fn remove_peer(&self, to: &PeerId, peer_id: PeerId);
}
