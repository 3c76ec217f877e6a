//! Data-only client: joins a room, announces itself, prints session events.
//!
//! Run against a local server:
//!   cargo run -p huddle-server
//!   cargo run -p huddle-client --example join_room ws://127.0.0.1:3000/ws lobby

use async_trait::async_trait;
use huddle_client::config::SessionConfig;
use huddle_client::error::SessionError;
use huddle_client::media::{LocalTrack, MediaSource, TrackKind};
use huddle_client::session::{RoomSession, SessionCommand};
use huddle_client::signaling::WsSignaling;
use huddle_client::transport::RtcTransportFactory;
use huddle_core::{RoomId, UserData};
use std::env;
use std::sync::Arc;
use std::time::Duration;

/// No capture devices here; the session runs side-channel only.
struct NoCapture;

#[async_trait]
impl MediaSource for NoCapture {
    async fn acquire(&self, kind: TrackKind) -> Result<LocalTrack, SessionError> {
        Err(SessionError::Media(format!(
            "no {kind} capture in this example"
        )))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("huddle_client=info")
        .init();

    let url = env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:3000/ws".to_owned());
    let room = env::args().nth(2).unwrap_or_else(|| "lobby".to_owned());

    let (link, signal_rx) = WsSignaling::connect(&url)
        .await
        .expect("signaling server unreachable");

    let config = SessionConfig::default();
    let factory = Arc::new(RtcTransportFactory::new(config.audio_window_size));
    let (session, mut handle) = RoomSession::new(
        config,
        RoomId::from(room),
        UserData::new("example", "huddle-example"),
        Arc::new(link),
        signal_rx,
        factory,
        Arc::new(NoCapture),
    );
    tokio::spawn(session.run());

    let commands = handle.commands.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let _ = commands
            .send(SessionCommand::SendChat(
                "hello from the example client".to_owned(),
            ))
            .await;
    });

    while let Some(event) = handle.events.recv().await {
        println!("{event:?}");
    }
}
