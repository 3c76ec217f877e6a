use crate::speaker::AudioFrame;
use bytes::Bytes;
use huddle_core::{CandidateInit, PeerId};
use tokio::sync::mpsc;

/// Events a per-peer transport feeds back into the session loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// A local network path was found; relay it to the peer.
    CandidateGenerated(PeerId, CandidateInit),

    /// The side channel is open and writable.
    ChannelOpen(PeerId),

    /// One self-contained side-channel message arrived.
    ChannelMessage(PeerId, Bytes),

    /// A remote audio stream started; the receiver yields amplitude windows
    /// for the speaking detector.
    RemoteAudio(PeerId, mpsc::Receiver<AudioFrame>),

    /// The connectivity layer reports the pairwise transport failed, dropped
    /// or closed.
    ConnectionFailed(PeerId),
}
