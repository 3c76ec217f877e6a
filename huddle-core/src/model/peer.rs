use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of one signaling session. Assigned by the server at accept time
/// and never reused.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
pub struct PeerId(pub Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote-supplied participant profile. Treated as untrusted text everywhere.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub display_name: String,
    pub client_info: String,
}

impl UserData {
    pub fn new(display_name: impl Into<String>, client_info: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            client_info: client_info.into(),
        }
    }
}
