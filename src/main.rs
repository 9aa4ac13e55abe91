use anyhow::Context;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use cafe_api::{app, auth::spawn_sweeper, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up TWILIO_*, FIREBASE_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cafe_api=info,tower_http=info")),
        )
        .init();

    let config = config::config().clone();
    tracing::info!("Starting Cafe API in {:?} mode", config.environment);

    let port = config.server.port;
    let sweep_every = Duration::from_secs(config.otp.sweep_interval_secs.max(1));
    let state = AppState::from_config(config)?;
    spawn_sweeper(state.otp.clone(), state.sessions.clone(), sweep_every);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Cafe API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
