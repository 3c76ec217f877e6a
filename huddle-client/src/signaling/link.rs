use crate::error::SessionError;
use async_trait::async_trait;
use huddle_core::SignalMessage;

/// Upstream half of the signaling channel. Incoming messages arrive through
/// the receiver handed out at connect time; the session loop owns that end.
#[async_trait]
pub trait SignalingLink: Send + Sync {
    async fn send(&self, message: SignalMessage) -> Result<(), SessionError>;
}
