use thiserror::Error;

/// Failure categories of a room session. Every variant is scoped to the peer
/// or operation that raised it; none of them tears down unrelated peers.
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    /// The signaling transport itself failed or dropped.
    #[error("signaling transport failed: {0}")]
    Transport(String),

    /// Capture device could not be acquired.
    #[error("media acquisition failed: {0}")]
    Media(String),

    /// A local or remote description commit was rejected.
    #[error("negotiation rejected: {0}")]
    Negotiation(String),

    /// A side-channel envelope could not be decoded.
    #[error("malformed side-channel message: {0}")]
    Protocol(String),
}
