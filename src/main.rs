//! Entry point for the EWA Engine binary.
//!
//! Running this binary starts an HTTP server exposing the calculator.
//! Settings are read from the environment; see [`ewa_engine::settings`]
//! for the variables and their defaults.

use anyhow::Context;
use ewa_engine::{api, settings::Settings, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    telemetry::init(&settings.log_filter)?;

    let registry = settings
        .registry()
        .context("failed to load country configurations")?;
    info!(countries = ?registry.codes(), "country configurations ready");

    api::serve(settings.bind_addr, registry).await
}
