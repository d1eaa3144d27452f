// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The seam between the sync loop and whatever issues cluster credentials.

use crate::error::Result;
use crate::kubeconfig::Kubeconfig;
use crate::token::Expiry;
use crate::types::Cluster;
use std::future::Future;

/// Source of clusters and their credential bundles.
///
/// A bundle is a small kubeconfig whose primary entry is named after the
/// cluster's display name, optionally followed by `<name>-*` direct contexts.
pub trait CredentialProvider: Send + Sync {
    fn list_clusters(&self) -> impl Future<Output = Result<Vec<Cluster>>> + Send;

    /// Issue a new credential bundle for the cluster with the given ID
    fn fetch_bundle(&self, cluster_id: &str) -> impl Future<Output = Result<Kubeconfig>> + Send;

    /// Provider-side expiration of an existing credential
    fn token_expiry(&self, credential: &str) -> impl Future<Output = Result<Expiry>> + Send;

    /// Base URL used when creating proxied cluster entries
    fn server_url(&self) -> &str;
}
