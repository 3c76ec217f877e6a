pub mod registry;
pub mod routes;
pub mod signaling;

pub use registry::{JoinOutcome, RegistryActor, RegistryCommand, RoomRegistry};
pub use signaling::{SignalingOutput, SignalingService, ws_handler};

use tokio::sync::mpsc;

/// Shared state handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
    pub registry_tx: mpsc::Sender<RegistryCommand>,
}
