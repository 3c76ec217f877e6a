use crate::{AppState, RegistryCommand};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{PeerId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    // Identity lives exactly as long as this socket.
    let peer_id = PeerId::new();
    info!("new signaling connection: {peer_id}");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.signaling.register(peer_id.clone(), tx);
    state.signaling.send_signal(
        &peer_id,
        SignalMessage::Welcome {
            peer_id: peer_id.clone(),
            ice_servers: state.signaling.ice_servers().to_vec(),
        },
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => match signal {
                            SignalMessage::Join { room, user_data } => {
                                let cmd = RegistryCommand::Join {
                                    peer_id: peer_id.clone(),
                                    room,
                                    user_data,
                                };
                                if let Err(e) = state.registry_tx.send(cmd).await {
                                    error!("registry died: {e}");
                                    break;
                                }
                            }
                            SignalMessage::SessionDescription {
                                peer_id: to,
                                session_description,
                            } => {
                                let cmd = RegistryCommand::RelayDescription {
                                    from: peer_id.clone(),
                                    to,
                                    description: session_description,
                                };
                                let _ = state.registry_tx.send(cmd).await;
                            }
                            SignalMessage::IceCandidate {
                                peer_id: to,
                                ice_candidate,
                            } => {
                                let cmd = RegistryCommand::RelayCandidate {
                                    from: peer_id.clone(),
                                    to,
                                    candidate: ice_candidate,
                                };
                                let _ = state.registry_tx.send(cmd).await;
                            }
                            // Server-originated shapes are not valid input.
                            _ => {}
                        },
                        Err(e) => warn!("invalid signal message from {peer_id}: {e}"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            let _ = state
                .registry_tx
                .send(RegistryCommand::Disconnect {
                    peer_id: peer_id.clone(),
                })
                .await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.signaling.unregister(&peer_id);
    info!("signaling connection closed: {peer_id}");
}
