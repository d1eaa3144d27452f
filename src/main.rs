// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rancher_kubeconfig_updater::config::{Args, Config};
use rancher_kubeconfig_updater::kubeconfig::{load_kubeconfig, resolve_kubeconfig_path, save_kubeconfig};
use rancher_kubeconfig_updater::rancher::{login, RancherClient};
use rancher_kubeconfig_updater::sync::{SyncManager, SyncOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_args(Args::parse()).context("Invalid configuration")?;
    info!(
        "Configuration loaded: rancher_url={} auth_type={} threshold_days={} expiry_source={}",
        config.rancher_url, config.auth_type, config.threshold_days, config.expiry_source
    );

    let path = resolve_kubeconfig_path(config.kubeconfig_path.as_deref())
        .context("Failed to resolve kubeconfig path")?;
    let mut kubeconfig = load_kubeconfig(&path)
        .with_context(|| format!("Failed to load kubeconfig file {}", path.display()))?;
    if kubeconfig.is_empty() {
        info!("Creating new kubeconfig file at {}", path.display());
    } else {
        info!("Loaded kubeconfig from {}", path.display());
    }

    let client = RancherClient::connect(&config.transport())
        .context("Failed to create Rancher client")?;
    let client = login(client, &config.username, &config.password, config.auth_type)
        .await
        .context("Failed to authenticate with Rancher")?;

    let manager = SyncManager::new(client, SyncOptions::from(&config))
        .with_cluster_filter(config.cluster_filter.clone());
    let summary = manager
        .run(&mut kubeconfig)
        .await
        .context("Failed to retrieve cluster list from Rancher")?;

    if config.dry_run {
        return Ok(());
    }

    save_kubeconfig(&kubeconfig, &path).context("Failed to save kubeconfig file")?;

    if summary.failed.is_empty() {
        info!(
            "All cluster tokens have been updated successfully ({} updated, {} skipped)",
            summary.updated.len(),
            summary.skipped.len()
        );
    } else {
        warn!(
            "Kubeconfig saved, but {} clusters failed: {}",
            summary.failed.len(),
            summary.failed.join(", ")
        );
    }

    Ok(())
}
