//! # humiventd, the humivent daemon
//!
//! Composition root that wires the adapters together and runs the
//! regulation loop until interrupted.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialize diagnostics logging
//! - Load (or bootstrap) the regulation settings
//! - Construct adapters and inject them into the application services
//! - Handle graceful shutdown (SIGINT): stop the loop, drive the relay off,
//!   drain the event log
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod stations;

use std::sync::Arc;

use anyhow::Context;
use humivent_adapter_file::{JsonlEventLog, TomlSettingsRepository};
use humivent_adapter_virtual::{VirtualRelay, VirtualSensor};
use humivent_app::actuator::ActuatorController;
use humivent_app::ports::ConfigProvider;
use humivent_app::regulation::RegulationService;
use humivent_app::services::settings_service::SettingsService;
use humivent_app::station_cache::CachingStationReader;
use humivent_app::status_board::StatusBoard;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::stations::StationSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load humiventd.toml")?;

    let filter = EnvFilter::try_new(&config.logging.filter).context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Event log
    let (event_log, writer) =
        JsonlEventLog::spawn(&config.paths.event_log, config.event_log.capacity);

    // Settings
    let settings_repo = TomlSettingsRepository::new(&config.paths.settings);
    let settings = Arc::new(
        SettingsService::load(settings_repo)
            .await
            .with_context(|| format!("failed to load {}", config.paths.settings.display()))?
            .with_event_sink(Arc::new(event_log.clone())),
    );
    let current = settings.get_config().await;

    // Devices
    let sensor = VirtualSensor::new(
        config.simulation.indoor_temperature,
        config.simulation.indoor_humidity,
    )
    .context("simulated indoor reading out of range")?;
    let stations = CachingStationReader::new(
        StationSource::from_config(&config, &current.api_station_id),
        current.station_cache_ttl(),
    );
    let actuator = ActuatorController::new(VirtualRelay::default(), current.relay_mode);

    // Regulation
    let board = Arc::new(StatusBoard::new());
    let regulation = RegulationService::new(
        Arc::clone(&settings),
        sensor,
        stations,
        event_log,
        actuator.clone(),
        Arc::clone(&board),
    )
    .spawn();

    tracing::info!(
        mode = %current.relay_mode,
        station = %current.api_station_id,
        event_log = %config.paths.event_log.display(),
        "humiventd started"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown requested");

    regulation
        .shutdown()
        .await
        .context("regulation loop panicked")?;
    actuator.shutdown();
    if let Some(status) = board.latest() {
        tracing::info!(
            state = %status.regulation_state,
            difference = ?status.difference,
            "last published status"
        );
    }

    // the writer drains and exits once the last sender is gone
    drop(settings);
    writer
        .await
        .context("event log writer panicked")?
        .context("event log writer failed")?;

    tracing::info!("humiventd stopped");
    Ok(())
}
