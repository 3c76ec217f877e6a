pub mod model;

pub use model::{
    CandidateInit, IceServerConfig, PeerId, RoomId, SdpKind, SessionDescription, SignalMessage,
    UserData,
};
