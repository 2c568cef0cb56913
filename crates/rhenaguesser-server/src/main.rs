//! Game server binary for RhenaGuesser.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `rhenaguesser.yaml` (or `RHENAGUESSER_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the picture source
//! 4. Create the session coordinator
//! 5. Spawn the finished-session reaper, if enabled
//! 6. Serve HTTP and `WebSocket` until `Ctrl-C`

use std::sync::Arc;

use anyhow::Context;
use chrono::TimeDelta;
use rhenaguesser_core::{AppConfig, Coordinator, GameConfig, LogFormat, LoggingConfig};
use rhenaguesser_pictures::PictureSource;
use rhenaguesser_server::{AppState, start_server};
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config = AppConfig::load().context("failed to load configuration")?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        host = %config.server.host,
        port = config.server.port,
        rounds = config.game.rounds,
        reveal_delay_ms = config.game.reveal_delay_ms,
        "Configuration loaded"
    );

    // 3. Build the picture source.
    let pictures =
        PictureSource::from_config(&config.pictures).context("failed to build picture source")?;
    info!(backend = pictures.name(), "Picture source ready");

    // 4. Create the coordinator.
    let coordinator = Coordinator::new(pictures, config.game.clone());

    // 5. Reaper.
    let _reaper = spawn_reaper(&coordinator, &config.game);

    // 6. Serve.
    let state = Arc::new(AppState::new(coordinator));
    start_server(&config.server, state).await?;

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Periodically remove finished sessions older than the configured TTL.
fn spawn_reaper(coordinator: &Coordinator, game: &GameConfig) -> Option<JoinHandle<()>> {
    let ttl = game.finished_session_ttl()?;
    let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
    let period = game.reap_interval();
    let coordinator = coordinator.clone();
    info!(ttl_secs = ttl.num_seconds(), interval_secs = period.as_secs(), "Session reaper enabled");

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            coordinator.reap_finished(ttl).await;
        }
    }))
}
