/*
 * Copyright 2025 Carver Automation Corporation.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use fleet_rpc::{GeotabClient, TelemetryApi};
use fleet_sync::config::Config;
use fleet_sync::pipeline::{Pipeline, PipelineSettings};
use fleet_sync::telemetry;
use fleet_sync::transfer::LocalDirTransfer;
use tokio::time::MissedTickBehavior;

#[derive(Parser, Debug)]
#[command(name = "fleet-sync", version, about = "Hourly fleet reports and roster sync")]
struct Args {
    /// Path to the TOML or JSON configuration file.
    #[arg(short, long, env = "FLEET_SYNC_CONFIG", default_value = "/etc/fleet-sync/config.toml")]
    config: PathBuf,

    /// Run a single pass and exit.
    #[arg(long)]
    once: bool,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init_tracing(&args.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting fleet-sync");

    let config = Config::from_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;
    let settings = PipelineSettings::from_config(&config).context("invalid configuration")?;

    let client = GeotabClient::new(config.geotab.client_config())
        .context("failed to build telemetry API client")?;
    let api: Arc<dyn TelemetryApi> = Arc::new(client);
    let transfer = Arc::new(LocalDirTransfer::new(
        config.transfer.root.clone(),
        config.reports.remote_dir.clone(),
    ));
    let pipeline = Pipeline::new(api, transfer, settings);

    if args.once {
        let summary = pipeline.run_once(Utc::now()).await?;
        tracing::info!(uploaded = summary.uploaded(), "single run finished");
        return Ok(());
    }

    let mut ticker = tokio::time::interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(interval_secs = config.poll_interval_secs, "scheduler started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = pipeline.run_once(Utc::now()).await {
                    tracing::error!(error = %e, "run failed; waiting for next tick");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}
