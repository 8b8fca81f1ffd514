// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION HDO.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod config;
mod coordinator;
mod web;

use std::sync::Arc;

use anyhow::{Context, Result};
use hdo_adapters::{Distribuce24Client, FeedSource};
use hdo_core::{HdoError, TariffResolver};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::AppConfig;
use crate::coordinator::Coordinator;
use crate::web::WebState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Handle command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                println!("FluxION HDO - EG.D low/high tariff tracker");
                println!("Version: {VERSION}");
                println!();
                println!("Usage: hdo-tariff [OPTIONS]");
                println!();
                println!("Configuration is read from /data/options.json, config.toml or config.json,");
                println!("falling back to HDO_* environment variables.");
                println!();
                println!("Options:");
                println!("  -h, --help    Print this help message");
                println!("  -v, --version Print version");
                return Ok(());
            }
            "--version" | "-v" => {
                println!("{VERSION}");
                return Ok(());
            }
            _ => {}
        }
    }

    let config = AppConfig::load()?;
    init_tracing(&config.system.log_level)?;

    info!("🚀 Starting FluxION HDO {VERSION}");
    info!("📋 Configuration Summary:");
    info!("   Site: {} [{}]", config.site.title(), config.site.unique_id());
    info!(
        "   Prices: NT {} / VT {} CZK/kWh",
        config.pricing.price_nt, config.pricing.price_vt
    );
    info!(
        "   Poll interval: {} min, cycle timeout {}s",
        config.system.poll_interval_minutes, config.system.cycle_timeout_secs
    );
    info!("   Timezone: {}", config.system.timezone);

    let site = config.site_config()?;
    let client = Distribuce24Client::with_timeout(
        config.system.region_url.clone(),
        config.system.schedule_url.clone(),
        config.cycle_timeout(),
    )
    .context("Failed to create feed client")?;
    let source: Arc<dyn FeedSource> = Arc::new(client);

    check_postal_code(&config, source.as_ref()).await?;

    let resolver = TariffResolver::with_czech_holidays(site);
    let coordinator = Coordinator::new(
        resolver,
        Arc::clone(&source),
        config.poll_interval(),
        config.cycle_timeout(),
    );
    let web_state = WebState {
        state: coordinator.state(),
        display: config.display.clone(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = tokio::spawn(coordinator.run(wait_for(shutdown_rx.clone())));
    let server = tokio::spawn(web::start_web_server(
        web_state,
        config.system.web_port,
        wait_for(shutdown_rx),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    if let Err(e) = poller.await {
        error!("Poll coordinator task failed: {e}");
    }
    match server.await {
        Ok(Err(e)) => error!("Web server error: {e:#}"),
        Err(e) => error!("Web server task failed: {e}"),
        Ok(Ok(())) => {}
    }

    info!("Shutting down");
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

/// Rejects a postal code the distributor does not know
///
/// An unreachable feed is not fatal here; the poll loop keeps retrying.
async fn check_postal_code(config: &AppConfig, source: &dyn FeedSource) -> Result<()> {
    let Some(postal_code) = config.site.postal_code() else {
        return Ok(());
    };

    match source.fetch_regions().await {
        Ok(rows) => match hdo_core::selector::resolve_region(&rows, &postal_code) {
            Ok(region) => {
                info!("📍 Postal code {postal_code} belongs to region {region}");
                Ok(())
            }
            Err(HdoError::RegionNotFound { .. }) => {
                anyhow::bail!("Invalid postal code {postal_code}: not served by EG.D")
            }
            Err(e) => Err(e.into()),
        },
        Err(e) => {
            warn!("Could not verify postal code {postal_code}: {e}");
            Ok(())
        }
    }
}

async fn wait_for(mut shutdown: watch::Receiver<bool>) {
    // A dropped sender also ends the wait
    let _ = shutdown.wait_for(|stop| *stop).await;
}
