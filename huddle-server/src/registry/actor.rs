use crate::registry::command::RegistryCommand;
use crate::registry::registry::RoomRegistry;
use crate::signaling::SignalingOutput;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Single-loop owner of the membership map. Every join, relay and disconnect
/// funnels through one mpsc queue, which is what preserves per-(from, to)
/// delivery order without any locking.
pub struct RegistryActor {
    registry: RoomRegistry,
    command_rx: mpsc::Receiver<RegistryCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl RegistryActor {
    pub fn new(
        command_rx: mpsc::Receiver<RegistryCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            registry: RoomRegistry::new(),
            command_rx,
            signaling,
        }
    }

    /// Run the registry loop until every command sender is gone. Spawn via
    /// `tokio::spawn`.
    pub async fn run(mut self) {
        info!("registry loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("registry loop finished");
    }

    async fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Join {
                peer_id,
                room,
                user_data,
            } => {
                let outcome = self.registry.join(&room, peer_id.clone(), user_data.clone());
                if outcome.is_first {
                    info!("created room '{room}'");
                }
                if outcome.rejoined {
                    debug!("{peer_id} re-joined '{room}', refreshing user data");
                }
                info!("{peer_id} joined '{room}' ({} already present)", outcome.existing.len());

                for (existing_id, existing_data) in outcome.existing {
                    // Snapshot to the joiner: it answers every pairing.
                    self.signaling
                        .add_peer(&peer_id, existing_id.clone(), false, existing_data)
                        .await;
                    // Members already in the room originate the offer.
                    self.signaling
                        .add_peer(&existing_id, peer_id.clone(), true, user_data.clone())
                        .await;
                }
            }

            RegistryCommand::RelayDescription {
                from,
                to,
                description,
            } => {
                if !self.registry.is_member(&to) {
                    warn!("dropping session description from {from}: {to} is not a member");
                    return;
                }
                self.signaling.session_description(&to, from, description).await;
            }

            RegistryCommand::RelayCandidate {
                from,
                to,
                candidate,
            } => {
                if !self.registry.is_member(&to) {
                    warn!("dropping candidate from {from}: {to} is not a member");
                    return;
                }
                self.signaling.ice_candidate(&to, from, candidate).await;
            }

            RegistryCommand::Disconnect { peer_id } => {
                for (room, remaining) in self.registry.disconnect(&peer_id) {
                    info!("{peer_id} left '{room}', {} member(s) remain", remaining.len());
                    for member in remaining {
                        self.signaling.remove_peer(&member, peer_id.clone()).await;
                    }
                }
            }
        }
    }
}
