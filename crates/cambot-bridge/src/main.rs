//! Cambot
//!
//! Drives an external game client over JSON lines: telemetry and server
//! feedback arrive on stdin, commands leave on stdout. Logs go to stderr.

use std::path::Path;

use anyhow::Context;
use cambot_core::{Controller, MovementController, Settings, runtime};
use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    bridge::Bridge,
    link::Link,
    protocol::OutboundMessage,
    telemetry::Telemetry,
};

mod bridge;
mod command;
mod error;
mod link;
mod protocol;
mod telemetry;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let seed = match std::env::var("CAMBOT_SEED") {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("CAMBOT_SEED is not an integer: {raw}"))?,
        Err(_) => rand::rng().random(),
    };
    tracing::info!(seed, view_mode = %settings.view_mode, verbose = settings.verbose, "Starting cambot");
    let view_distance = settings.view_distance;
    let settings = settings.into_shared();

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(link::write_lines(tokio::io::stdout(), out_rx));
    let link = Link::new(out_tx);

    let telemetry = Telemetry::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let username = bridge::wait_for_spawn(&mut lines, &telemetry)
        .await
        .context("client closed before spawning")?;
    tracing::info!(username = %username, "Spawned");
    link.send(OutboundMessage::Settings { view_distance })?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let inbound = Bridge::new(telemetry.clone(), settings.clone(), link.clone(), event_tx);
    let reader = tokio::spawn(bridge::read_lines(lines, inbound));

    let mut controller = Controller::new(settings, MovementController::from_seed(seed));
    let mut outbound = link.clone();
    let mut pathfinder = link;
    runtime::run(
        &mut controller,
        &telemetry,
        &mut outbound,
        &mut pathfinder,
        event_rx,
    )
    .await;

    drop(outbound);
    drop(pathfinder);
    reader.abort();
    match reader.await {
        Ok(Err(err)) => tracing::error!(error = %err, "Reading input failed"),
        Ok(Ok(())) | Err(_) => {}
    }
    if let Err(err) = writer.await? {
        tracing::error!(error = %err, "Writing output failed");
    }
    Ok(())
}

/// Defaults, then `CAMBOT_CONFIG`, then `CAMBOT_*` overrides.
fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = match std::env::var_os("CAMBOT_CONFIG") {
        Some(path) => {
            let path = Path::new(&path);
            Settings::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Settings::default(),
    };
    settings
        .apply_env(std::env::vars())
        .context("invalid environment override")?;
    Ok(settings)
}
