// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Token refresh orchestration across all Rancher clusters.

pub mod filter;
pub mod manager;

pub use filter::{filter_clusters, FilteredClusters};
pub use manager::{SyncManager, SyncOptions, SyncSummary};
