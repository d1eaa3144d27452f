// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

pub mod backup;
pub mod merge;
pub mod model;
pub mod paths;
pub mod persist;

pub use backup::create_backup;
pub use merge::{is_family_member, merge_kubeconfig, MergeReport};
pub use model::{AuthInfo, Cluster, ConnectionKind, Context, DanglingRef, Kubeconfig};
pub use paths::{default_kubeconfig_path, expand_path, resolve_kubeconfig_path};
pub use persist::{load_kubeconfig, save_kubeconfig, SaveOutcome};
