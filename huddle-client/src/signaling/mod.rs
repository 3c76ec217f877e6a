mod link;
mod ws;

pub use link::SignalingLink;
pub use ws::WsSignaling;
