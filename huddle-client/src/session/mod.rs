mod command;
mod event;
mod peer;
#[allow(clippy::module_inception)]
mod session;

pub use command::SessionCommand;
pub use event::{ChatMessage, SessionEvent};
pub use peer::{Peer, PeerFlags, PeerStage, Role};
pub use session::{PeerStateError, RoomSession, SessionHandle};

use huddle_core::PeerId;

/// Timer and detector traffic re-entering the session loop. Everything here
/// mutates state only after the loop re-validates its target.
#[derive(Debug)]
pub(crate) enum InternalEvent {
    Talking { peer_id: PeerId, talking: bool },
    /// Clear a reaction if its sequence is still current. `None` targets the
    /// local participant.
    ClearReaction { peer_id: Option<PeerId>, seq: u64 },
    /// Clear the transient notice if it is still the one that set the timer.
    ClearNotice { seq: u64 },
}
