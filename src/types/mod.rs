// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Rancher v3 API payloads.

pub mod cluster;
pub mod token;

pub use cluster::{Cluster, ClusterList, GenerateKubeconfigResponse};
pub use token::{LoginRequest, LoginResponse, TokenInfo};
