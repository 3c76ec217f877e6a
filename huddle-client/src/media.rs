use crate::error::SessionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_local::TrackLocal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a locally captured track. Dropping the handle releases this
/// side's claim on it; stopping the device is the provider's business.
#[derive(Clone)]
pub struct LocalTrack {
    pub kind: TrackKind,
    pub id: String,
    pub rtp: Arc<dyn TrackLocal + Send + Sync>,
}

impl LocalTrack {
    pub fn new(kind: TrackKind, id: impl Into<String>, rtp: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        Self {
            kind,
            id: id.into(),
            rtp,
        }
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

/// Capture provider. Device enumeration, permissions and the capture loop are
/// all external; the session only ever asks for a fresh track of a kind.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, kind: TrackKind) -> Result<LocalTrack, SessionError>;
}
