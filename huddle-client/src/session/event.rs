use crate::media::TrackKind;
use huddle_core::{PeerId, UserData};

/// One line of local chat history. The stored text is already sanitized and
/// linkified; there is no raw copy.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub peer_id: PeerId,
    pub display_name: String,
    pub text: String,
    pub date: String,
    pub local: bool,
}

/// State changes the UI renders. Granular on purpose: the session owns the
/// state, the UI only mirrors it.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    PeerAdded { peer_id: PeerId, user_data: UserData },
    PeerRemoved { peer_id: PeerId },
    DisplayName { peer_id: PeerId, name: String },
    Chat(ChatMessage),
    Talking { peer_id: PeerId, talking: bool },
    Mute { peer_id: PeerId, kind: TrackKind, muted: bool },
    /// `None` clears an expired reaction.
    Reaction { peer_id: PeerId, symbol: Option<String> },
    /// Local toggle state, including forced-off after an acquisition failure.
    LocalTrack { kind: TrackKind, enabled: bool },
    /// Transient notice; auto-cleared by `NoticeCleared`.
    Notice { text: String },
    NoticeCleared,
}
