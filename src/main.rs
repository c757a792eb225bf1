// src/main.rs
use crate::config::AppConfig;
use crate::core::engine::{HandleOutcome, StrategyEngine};
use anyhow::Context;
use dotenvy::dotenv;
use tokio::io::AsyncReadExt;
use tracing::info;

mod analysis;
mod config;
mod connectors;
mod core;
mod errors;
mod logging;
mod strategies;
mod types;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 1. Load Configuration
    let config = AppConfig::new().context("loading configuration")?;
    let _guard = logging::init_tracing(&config.logging)?;

    // 2. Wire collaborators
    let engine = StrategyEngine::from_config(&config).context("building strategy engine")?;

    // 3. One queued event per invocation, read from stdin
    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("reading strategy event from stdin")?;

    match engine.handle_event(&raw).await? {
        HandleOutcome::Published {
            correlation_id,
            side,
            risk_flags,
        } => info!(%correlation_id, %side, ?risk_flags, "Strategy complete"),
        HandleOutcome::NothingToSell { correlation_id } => {
            info!(%correlation_id, "Strategy complete, nothing to sell")
        }
    }

    Ok(())
}
