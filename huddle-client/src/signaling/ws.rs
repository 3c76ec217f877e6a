use crate::error::SessionError;
use crate::signaling::SignalingLink;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::SignalMessage;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

/// WebSocket signaling client. Reading and writing run on their own tasks;
/// when the socket drops, the inbox closes and the session loop takes that as
/// the teardown signal.
pub struct WsSignaling {
    outbox: mpsc::Sender<Message>,
}

impl WsSignaling {
    /// Connect to the signaling server and return the link plus the inbox of
    /// decoded server messages.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::Receiver<SignalMessage>), SessionError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        info!("signaling connected: {url}");

        let (mut write, mut read) = stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);
        let (in_tx, in_rx) = mpsc::channel(64);

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if write.send(msg).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = read.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => {
                            if in_tx.send(signal).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("invalid signal message: {e}"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            // Dropping in_tx closes the session inbox.
            info!("signaling connection closed");
        });

        Ok((Self { outbox: out_tx }, in_rx))
    }
}

#[async_trait]
impl SignalingLink for WsSignaling {
    async fn send(&self, message: SignalMessage) -> Result<(), SessionError> {
        let json =
            serde_json::to_string(&message).map_err(|e| SessionError::Transport(e.to_string()))?;
        self.outbox
            .send(Message::Text(json))
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))
    }
}
