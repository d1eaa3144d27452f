// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Merging a Rancher-generated kubeconfig into the local one.
//!
//! The entry named after the cluster is always imported. With family import
//! enabled, every context named `<primary>-...` (Rancher's "Authorized Cluster
//! Endpoint" direct contexts) comes along with the clusters and users it
//! references. Entries with other names are never touched.

use crate::kubeconfig::model::{AuthInfo, Cluster, Context, Kubeconfig};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Names written into the target by one merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub clusters: Vec<String>,
    pub contexts: Vec<String>,
    pub users: Vec<String>,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.contexts.is_empty() && self.users.is_empty()
    }

    /// Number of imported family contexts, excluding the primary one
    pub fn family_contexts(&self, primary: &str) -> usize {
        self.contexts
            .iter()
            .filter(|name| is_family_member(name, primary))
            .count()
    }
}

/// Whether `name` belongs to the family of `primary`, i.e. starts with `<primary>-`.
pub fn is_family_member(name: &str, primary: &str) -> bool {
    name.strip_prefix(primary)
        .is_some_and(|rest| rest.starts_with('-'))
}

/// Import `primary` (and optionally its family) from `source` into `target`.
///
/// Existing entries with the same names are overwritten. A `primary` missing
/// from `source` is not an error; nothing is imported for it. A context whose
/// cluster or user can be found neither in `source` nor in `target` is skipped
/// so the merge never introduces a dangling reference.
pub fn merge_kubeconfig(
    target: &mut Kubeconfig,
    source: &Kubeconfig,
    primary: &str,
    include_family: bool,
) -> MergeReport {
    let mut clusters: BTreeMap<String, Cluster> = BTreeMap::new();
    let mut contexts: BTreeMap<String, Context> = BTreeMap::new();
    let mut users: BTreeMap<String, AuthInfo> = BTreeMap::new();

    if let Some(cluster) = source.clusters.get(primary) {
        clusters.insert(primary.to_string(), cluster.clone());
    }
    if let Some(user) = source.users.get(primary) {
        users.insert(primary.to_string(), user.clone());
    }

    let selected = source.contexts.iter().filter(|(name, _)| {
        name.as_str() == primary || (include_family && is_family_member(name, primary))
    });

    for (name, context) in selected {
        let cluster = resolve(&context.cluster, &source.clusters, &target.clusters);
        let user = resolve(&context.user, &source.users, &target.users);

        let (Some(cluster), Some(user)) = (cluster, user) else {
            warn!(
                "Skipping context {} from Rancher kubeconfig: cluster '{}' or user '{}' is missing",
                name, context.cluster, context.user
            );
            continue;
        };

        if let Resolved::Source(cluster) = cluster {
            clusters
                .entry(context.cluster.clone())
                .or_insert_with(|| cluster.clone());
        }
        if let Resolved::Source(user) = user {
            users
                .entry(context.user.clone())
                .or_insert_with(|| user.clone());
        }
        contexts.insert(name.clone(), context.clone());
    }

    let report = MergeReport {
        clusters: clusters.keys().cloned().collect(),
        contexts: contexts.keys().cloned().collect(),
        users: users.keys().cloned().collect(),
    };

    target.clusters.extend(clusters);
    target.contexts.extend(contexts);
    target.users.extend(users);

    debug!(
        "Merged {} clusters, {} contexts and {} users for {}",
        report.clusters.len(),
        report.contexts.len(),
        report.users.len(),
        primary
    );

    report
}

enum Resolved<'a, T> {
    Source(&'a T),
    Target,
    Unset,
}

/// Find a referenced descriptor, preferring the incoming copy
fn resolve<'a, T>(
    name: &str,
    source: &'a BTreeMap<String, T>,
    target: &BTreeMap<String, T>,
) -> Option<Resolved<'a, T>> {
    if name.is_empty() {
        return Some(Resolved::Unset);
    }
    if let Some(found) = source.get(name) {
        return Some(Resolved::Source(found));
    }
    target.contains_key(name).then_some(Resolved::Target)
}
