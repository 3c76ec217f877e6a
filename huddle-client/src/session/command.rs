use crate::media::TrackKind;

/// What the UI can ask of a running session.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Send a chat line to everyone with an open side channel.
    SendChat(String),

    /// Change the local display name and re-announce it.
    AnnounceName(String),

    /// Flash a reaction on every peer's view of us (and our own tile).
    SendReaction(String),

    /// Toggle a local capture kind. Disabling stops the track; enabling
    /// re-acquires one from the media source.
    SetTrackEnabled { kind: TrackKind, enabled: bool },

    /// Tear the whole session down.
    Leave,
}
