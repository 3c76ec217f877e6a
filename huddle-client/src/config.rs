use huddle_core::IceServerConfig;
use std::time::Duration;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_TURN_ADDR: &str = "turn:openrelay.metered.ca:443";

/// Label of the application side channel opened by the offerer.
pub const DATA_CHANNEL_LABEL: &str = "data";

/// Placeholder shown for a peer that has not announced a display name yet.
pub const UNKNOWN_PEER_LABEL: &str = "unknown";

/// Fixed knobs of a room session. None of these are negotiated at runtime;
/// the detector constants are deliberately plain threshold/window values with
/// no smoothing.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Mean byte amplitude above which a peer counts as talking.
    pub volume_threshold: f32,
    /// Frequency-bin window handed to the detector per sample.
    pub audio_window_size: usize,
    /// Detector cadence.
    pub sample_interval: Duration,
    /// How long a reaction stays on a tile.
    pub reaction_display: Duration,
    /// Auto-dismiss window for transient notices.
    pub notice_dismiss: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                IceServerConfig {
                    urls: vec![DEFAULT_STUN_ADDR.to_owned()],
                    username: None,
                    credential: None,
                },
                IceServerConfig {
                    urls: vec![DEFAULT_TURN_ADDR.to_owned()],
                    username: Some("openrelayproject".to_owned()),
                    credential: Some("openrelayproject".to_owned()),
                },
            ],
            volume_threshold: 24.0,
            audio_window_size: 256,
            sample_interval: Duration::from_millis(16),
            reaction_display: Duration::from_secs(4),
            notice_dismiss: Duration::from_millis(3500),
        }
    }
}
