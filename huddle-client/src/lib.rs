pub mod config;
pub mod error;
pub mod media;
pub mod protocol;
pub mod session;
pub mod signaling;
pub mod speaker;
pub mod transport;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{
    ChatMessage, Peer, PeerStage, Role, RoomSession, SessionCommand, SessionEvent, SessionHandle,
};
