use std::sync::Arc;

use chrono::{Duration, Utc};
use planpoker::{router, start_cleanup_task, AppState, CleanupConfig};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planpoker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting planning poker server");

    // First CLI argument overrides the listen port
    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(8080);

    let state = AppState::new();

    // Self check: proves the create/bind path at boot. The seed room is
    // backdated so an untouched deployment sweeps it out ahead of schedule.
    let seed_room = state
        .registry
        .create(Utc::now() - Duration::hours(3))
        .expect("failed to create self-check room");
    info!(room_id = %seed_room, "Self-check room created");

    tokio::spawn(start_cleanup_task(
        Arc::clone(&state.registry),
        CleanupConfig::default(),
    ));

    let app = router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap();
    info!(port, "Server running");
    axum::serve(listener, app).await.unwrap();
}
