use huddle_core::{CandidateInit, PeerId, RoomId, SessionDescription, UserData};

/// Commands entering the registry loop from the socket layer.
#[derive(Debug)]
pub enum RegistryCommand {
    /// A connected session wants to join a room.
    Join {
        peer_id: PeerId,
        room: RoomId,
        user_data: UserData,
    },

    /// Forward a session description to `to`, untouched.
    RelayDescription {
        from: PeerId,
        to: PeerId,
        description: SessionDescription,
    },

    /// Forward a connectivity candidate to `to`, untouched.
    RelayCandidate {
        from: PeerId,
        to: PeerId,
        candidate: CandidateInit,
    },

    /// The signaling socket dropped; equivalent to leaving every joined room.
    Disconnect { peer_id: PeerId },
}
