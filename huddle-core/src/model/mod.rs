mod peer;
mod room;
mod signaling;

pub use peer::{PeerId, UserData};
pub use room::RoomId;
pub use signaling::{CandidateInit, IceServerConfig, SdpKind, SessionDescription, SignalMessage};
