// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Central coordinator for refreshing cluster tokens.
//!
//! Clusters are processed one at a time against a single in-memory kubeconfig.
//! A failure for one cluster is logged and recorded in the summary; it never
//! stops the others. Persisting the result is left to the caller, so the file
//! on disk is written at most once per run.

use crate::config::Config;
use crate::error::{Result, UpdaterError};
use crate::kubeconfig::{merge_kubeconfig, Kubeconfig};
use crate::rancher::CredentialProvider;
use crate::sync::filter::filter_clusters;
use crate::token::{
    parse_expiration, Expiry, ExpirySource, RegenerationDecision, RegenerationPolicy,
    RegenerationReason,
};
use crate::types::Cluster;
use chrono::Utc;
use tracing::{error, info, instrument, warn};

/// Options controlling a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub policy: RegenerationPolicy,
    pub dry_run: bool,
    /// Import `<cluster>-*` direct contexts along with the primary entry
    pub with_directly: bool,
    /// Create entries for clusters missing from the kubeconfig
    pub auto_create: bool,
}

impl From<&Config> for SyncOptions {
    fn from(config: &Config) -> Self {
        Self {
            policy: config.policy(),
            dry_run: config.dry_run,
            with_directly: config.with_directly,
            auto_create: config.auto_create,
        }
    }
}

/// Per-cluster results of a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub dry_run: bool,
    /// Clusters whose token was regenerated, or would be in a dry run
    pub updated: Vec<String>,
    /// Clusters whose token was left alone
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl SyncSummary {
    pub fn clusters_to_update(&self) -> usize {
        self.updated.len()
    }

    pub fn clusters_to_skip(&self) -> usize {
        self.skipped.len()
    }
}

enum Outcome {
    Updated,
    Skipped,
}

pub struct SyncManager<P> {
    provider: P,
    options: SyncOptions,
    cluster_filter: Option<String>,
}

impl<P: CredentialProvider> SyncManager<P> {
    pub fn new(provider: P, options: SyncOptions) -> Self {
        Self {
            provider,
            options,
            cluster_filter: None,
        }
    }

    /// Only process clusters matching a comma separated list of names or IDs
    pub fn with_cluster_filter(mut self, filter: Option<String>) -> Self {
        self.cluster_filter = filter;
        self
    }

    /// Refresh tokens for every (selected) cluster into `kubeconfig`.
    ///
    /// Only listing the clusters can fail the run as a whole.
    pub async fn run(&self, kubeconfig: &mut Kubeconfig) -> Result<SyncSummary> {
        if self.options.dry_run {
            info!("[DRY-RUN] Mode enabled - no changes will be made to kubeconfig");
        }
        if self.options.with_directly {
            info!("Downstream Directly mode enabled - will include direct cluster contexts");
        }

        let mut clusters = self.provider.list_clusters().await?;
        info!("Found {} clusters in Rancher", clusters.len());

        if let Some(filter) = &self.cluster_filter {
            clusters = filter_clusters(clusters, filter).clusters;
        }

        let mut summary = SyncSummary {
            dry_run: self.options.dry_run,
            ..Default::default()
        };

        for cluster in &clusters {
            let name = cluster.display_name().to_string();
            match self.sync_cluster(kubeconfig, cluster).await {
                Ok(Outcome::Updated) => summary.updated.push(name),
                Ok(Outcome::Skipped) => summary.skipped.push(name),
                Err(e) => {
                    error!("Failed to update kubeconfig for cluster {}: {}", name, e);
                    summary.failed.push(name);
                }
            }
        }

        if self.options.dry_run {
            info!(
                "[DRY-RUN] Summary: clustersToUpdate={} clustersToSkip={}",
                summary.clusters_to_update(),
                summary.clusters_to_skip()
            );
            info!("[DRY-RUN] No changes were made to kubeconfig");
        }

        Ok(summary)
    }

    /// Decide whether the cached token needs regenerating.
    pub async fn decide(&self, cached: Option<&str>) -> RegenerationDecision {
        let policy = &self.options.policy;
        if let Some(decision) = policy.precheck(cached) {
            return decision;
        }
        let token = cached.unwrap_or_default();

        let expiry = match policy.source() {
            ExpirySource::Claims => parse_expiration(token).map(Expiry::At),
            ExpirySource::Remote => self.provider.token_expiry(token).await,
        };
        policy.evaluate(expiry, Utc::now())
    }

    #[instrument(skip(self, kubeconfig, cluster), fields(cluster = %cluster.display_name()))]
    async fn sync_cluster(&self, kubeconfig: &mut Kubeconfig, cluster: &Cluster) -> Result<Outcome> {
        let name = cluster.display_name();

        let decision = self.decide(kubeconfig.token_for(name)).await;
        log_decision(&decision, name, self.options.dry_run);

        if !decision.should_regenerate {
            return Ok(Outcome::Skipped);
        }
        if self.options.dry_run {
            return Ok(Outcome::Updated);
        }

        let bundle = self.provider.fetch_bundle(&cluster.id).await?;

        if self.options.with_directly || self.options.auto_create {
            let report = merge_kubeconfig(kubeconfig, &bundle, name, self.options.with_directly);
            let direct = report.family_contexts(name);
            if direct > 0 {
                info!(
                    "Successfully updated kubeconfig with {} direct contexts for cluster: {}",
                    direct, name
                );
            } else {
                info!("Successfully updated kubeconfig token for cluster: {}", name);
            }
            return Ok(Outcome::Updated);
        }

        let Some(token) = bundle.any_token() else {
            warn!("Rancher returned no token for cluster: {}", name);
            return Ok(Outcome::Skipped);
        };
        match kubeconfig.update_token_by_name(
            &cluster.id,
            name,
            token,
            self.provider.server_url(),
            self.options.auto_create,
        ) {
            Ok(()) => {
                info!("Successfully updated kubeconfig token for cluster: {}", name);
                Ok(Outcome::Updated)
            }
            // Missing entries without auto-create are skipped, not failures
            Err(UpdaterError::UserNotFound(_)) => Ok(Outcome::Skipped),
            Err(e) => Err(e),
        }
    }
}

fn log_decision(decision: &RegenerationDecision, cluster: &str, dry_run: bool) {
    let days = decision.days_until_expiry.unwrap_or_default();
    let expires_at = decision
        .expires_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    if dry_run {
        let verb = if decision.should_regenerate {
            "Would regenerate token"
        } else {
            "Would skip token regeneration"
        };
        info!(
            "[DRY-RUN] {} for cluster {} (reason: {}, days until expiration: {:.2})",
            verb, cluster, decision.reason, days
        );
        return;
    }

    match decision.reason {
        RegenerationReason::NeverExpires => {
            info!("Token never expires, skipping regeneration: {}", cluster)
        }
        RegenerationReason::StillValid => info!(
            "Token is still valid, skipping regeneration: {} (expires at {}, {} days left)",
            cluster, expires_at, days as i64
        ),
        RegenerationReason::ForceRefreshEnabled => {
            info!("Force refresh enabled, regenerating token: {}", cluster)
        }
        RegenerationReason::NoExistingToken => {
            info!("No existing token, generating new token: {}", cluster)
        }
        RegenerationReason::ExpiresSoon => info!(
            "Token expires soon, regenerating: {} (expires at {}, {} days left)",
            cluster, expires_at, days as i64
        ),
        RegenerationReason::ExpirationCheckFailed => {
            info!("Regenerating token due to expiration check failure: {}", cluster)
        }
    }
}
