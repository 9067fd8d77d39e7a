use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::app::{build_router, QUERY_PATH};
use api::config::AppConfig;
use api::seed::{seed_sample_player, self_check};
use api::state::AppState;
use infra::repos::PlayerRepo;
use infra::DocumentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // No retry here: an unreachable store stops the process.
    let store = DocumentStore::connect(&config.store).await?;

    let players = PlayerRepo::new(store.clone());
    players.prepare().await?;

    let state = AppState::new(store.clone());

    for (ty, field, target) in state.executor().schema().dangling_references() {
        tracing::warn!("{ty}.{field} refers to undefined type `{target}`");
    }

    if config.seed_sample_player {
        let player = seed_sample_player(&players).await?;
        self_check(state.executor(), &player.id).await?;
    }

    let app = build_router(state, &config.allowed_origins);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    tracing::info!(
        "Test with: curl -g 'http://localhost:{}{}?query={{player(id:\"<id>\"){{id,number}}}}'",
        config.port,
        QUERY_PATH
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Store connection closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
