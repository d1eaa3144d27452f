// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// A downstream cluster as listed by `/v3/clusters`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Cluster {
    /// Name used for kubeconfig entries; falls back to the ID for unnamed clusters
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Case-insensitive match against either the name or the ID
    pub fn matches(&self, filter: &str) -> bool {
        self.name.eq_ignore_ascii_case(filter) || self.id.eq_ignore_ascii_case(filter)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ClusterList {
    #[serde(default)]
    pub data: Vec<Cluster>,
}

/// Response of `POST /v3/clusters/<id>?action=generateKubeconfig`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenerateKubeconfigResponse {
    #[serde(default)]
    pub config: String,
}
