//! `seatadjuster` – runs the seat adjuster service.
//!
//! 1. Initialises tracing (see [`seatadjuster_app::telemetry`]).
//! 2. Loads `~/.seatadjuster/config.toml`, falling back to defaults, and
//!    applies `SEATADJUSTER_*` environment overrides either way.
//! 3. Connects to the MQTT broker and starts an in-process vehicle data
//!    broker seeded from the `[simulation]` section.
//! 4. Registers all subscriptions and serves until Ctrl-C.

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use seatadjuster_app::{SeatAdjusterApp, init_tracing};
use seatadjuster_hal::SimGateway;
use seatadjuster_middleware::MqttPubSub;
use tracing::{error, info, warn};

use crate::config::Config;

fn main() -> ExitCode {
    let _guard = init_tracing("seatadjuster");

    let file = match config::load() {
        Ok(Some(cfg)) => {
            info!(path = %config::config_path().display(), "config loaded");
            Some(cfg)
        }
        Ok(None) => {
            info!("no config file found; using defaults");
            None
        }
        Err(e) => {
            warn!(error = %e, "config error; using defaults");
            None
        }
    };
    let cfg = config::effective(file);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start the Tokio runtime");
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(run(cfg))
}

async fn run(cfg: Config) -> ExitCode {
    let bus = Arc::new(MqttPubSub::connect(&cfg.mqtt_config()));
    let gateway = Arc::new(
        SimGateway::builder()
            .with_speed(cfg.simulation.speed)
            .with_seat_position(cfg.simulation.seat_position)
            .build(),
    );

    let mut app = SeatAdjusterApp::new(gateway, bus, cfg.topics.clone());
    if let Err(e) = app.on_start().await {
        error!(error = %e, "failed to register subscriptions");
        return ExitCode::FAILURE;
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
    }
    info!("Ctrl-C received, shutting down");
    app.shutdown();
    ExitCode::SUCCESS
}
