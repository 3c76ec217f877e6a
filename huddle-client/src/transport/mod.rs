mod event;
mod peer_transport;
mod rtc;

pub use event::TransportEvent;
pub use peer_transport::{PeerTransport, TransportFactory};
pub use rtc::{RtcTransport, RtcTransportFactory};
