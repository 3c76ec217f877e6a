use anyhow::Context;
use axum::{Router, routing::get};
use clap::Parser;
use huddle_core::IceServerConfig;
use huddle_server::registry::RegistryActor;
use huddle_server::routes::{landing, room_page};
use huddle_server::signaling::{SignalingService, ws_handler};
use huddle_server::AppState;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "huddle-server", about = "Mesh signaling server")]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Directory of front-end assets served under /static.
    #[arg(long)]
    assets: Option<PathBuf>,
}

fn ice_servers() -> Vec<IceServerConfig> {
    let mut servers = vec![IceServerConfig {
        urls: vec!["stun:stun.l.google.com:19302".to_owned()],
        username: None,
        credential: None,
    }];

    if let Ok(turn_url) = env::var("TURN_URL") {
        servers.push(IceServerConfig {
            urls: vec![turn_url],
            username: env::var("TURN_USERNAME").ok(),
            credential: env::var("TURN_CREDENTIAL").ok(),
        });
    }

    servers
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huddle_server=info".into()),
        )
        .init();

    let args = Args::parse();

    let signaling = SignalingService::new(ice_servers());
    let (registry_tx, registry_rx) = mpsc::channel(256);
    tokio::spawn(RegistryActor::new(registry_rx, Arc::new(signaling.clone())).run());

    let state = AppState {
        signaling,
        registry_tx,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/", get(landing))
        .route("/ws", get(ws_handler))
        .route("/{room}", get(room_page));

    if let Some(assets) = args.assets {
        app = app.nest_service("/static", ServeDir::new(assets));
    }

    let app = app.layer(cors).with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("signaling server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server exited")?;

    Ok(())
}
