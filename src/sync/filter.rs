// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Narrowing the cluster list to the names or IDs given with `--cluster`.

use crate::types::Cluster;
use std::collections::HashSet;
use tracing::{info, warn};

/// Clusters kept by a filter, plus the filter entries nothing matched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredClusters {
    pub clusters: Vec<Cluster>,
    pub unmatched: Vec<String>,
}

/// Split a comma separated filter into lowercase, trimmed, unique entries
fn parse_filter(filter: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for entry in filter.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let entry = entry.to_lowercase();
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
    entries
}

/// Keep the clusters whose name or ID matches one of the comma separated
/// entries in `filter`, ignoring case.
///
/// A filter without any non-blank entry keeps every cluster. Each cluster is
/// kept at most once, in the order Rancher listed them.
pub fn filter_clusters(clusters: Vec<Cluster>, filter: &str) -> FilteredClusters {
    let allowed = parse_filter(filter);
    if allowed.is_empty() {
        warn!("--cluster specified but no valid cluster names provided, processing all clusters");
        return FilteredClusters {
            clusters,
            unmatched: Vec::new(),
        };
    }

    let total = clusters.len();
    let mut added: HashSet<String> = HashSet::new();
    let mut matched: HashSet<&str> = HashSet::new();
    let mut kept = Vec::new();

    for cluster in clusters {
        if added.contains(&cluster.id) {
            continue;
        }
        let hits: Vec<&str> = allowed
            .iter()
            .map(String::as_str)
            .filter(|entry| cluster.matches(entry))
            .collect();
        if hits.is_empty() {
            continue;
        }
        matched.extend(hits);
        added.insert(cluster.id.clone());
        kept.push(cluster);
    }

    let unmatched: Vec<String> = allowed
        .iter()
        .filter(|entry| !matched.contains(entry.as_str()))
        .cloned()
        .collect();
    for entry in &unmatched {
        warn!("Specified cluster not found in Rancher: {}", entry);
    }

    if kept.is_empty() {
        warn!("No clusters matched the specified filter, no clusters will be updated");
    } else {
        info!(
            "Filtering clusters based on --cluster: {} of {} matched",
            kept.len(),
            total
        );
    }

    FilteredClusters {
        clusters: kept,
        unmatched,
    }
}
