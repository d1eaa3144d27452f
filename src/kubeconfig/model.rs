// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-memory kubeconfig: clusters, contexts and users keyed by name.
//!
//! On disk the usual kubeconfig layout (lists of named entries, kebab-case
//! keys) is used so the file stays compatible with kubectl. Keys this model
//! does not know about are kept in `extra` maps and written back unchanged.

use crate::constants::kubeconfig::{API_VERSION, KIND};
use crate::constants::rancher::CLUSTER_PROXY_SEGMENT;
use crate::error::{Result, UpdaterError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// How a cluster entry reaches its API server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Through the Rancher server's cluster proxy
    Proxied,
    /// Straight to a downstream API server endpoint
    Direct,
}

/// Connection descriptor (`clusters[].cluster`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cluster {
    #[serde(default)]
    pub server: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_data"
    )]
    pub certificate_authority_data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure_skip_tls_verify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_server_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Cluster {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Default::default()
        }
    }

    pub fn connection_kind(&self) -> ConnectionKind {
        if self.server.contains(CLUSTER_PROXY_SEGMENT) {
            ConnectionKind::Proxied
        } else {
            ConnectionKind::Direct
        }
    }
}

/// Context descriptor (`contexts[].context`), pairing a cluster with a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Context {
    pub fn new(cluster: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            user: user.into(),
            ..Default::default()
        }
    }
}

/// Credential descriptor (`users[].user`)
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AuthInfo {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }
}

impl fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthInfo")
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A context reference that does not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRef {
    pub context: String,
    pub kind: &'static str,
    pub name: String,
}

impl From<DanglingRef> for UpdaterError {
    fn from(dangling: DanglingRef) -> Self {
        UpdaterError::DanglingReference {
            context: dangling.context,
            kind: dangling.kind,
            name: dangling.name,
        }
    }
}

/// A multi-cluster kubeconfig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "KubeconfigFile", into = "KubeconfigFile")]
pub struct Kubeconfig {
    pub api_version: String,
    pub kind: String,
    pub clusters: BTreeMap<String, Cluster>,
    pub contexts: BTreeMap<String, Context>,
    pub users: BTreeMap<String, AuthInfo>,
    pub current_context: String,
    /// Top-level keys such as `preferences` or `extensions`
    pub extra: BTreeMap<String, Value>,
}

impl Default for Kubeconfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Kubeconfig {
    pub fn new() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            clusters: BTreeMap::new(),
            contexts: BTreeMap::new(),
            users: BTreeMap::new(),
            current_context: String::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::new());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.contexts.is_empty() && self.users.is_empty()
    }

    /// Context references to clusters or users that do not exist
    pub fn dangling_references(&self) -> Vec<DanglingRef> {
        let mut dangling = Vec::new();
        for (name, context) in &self.contexts {
            if !context.cluster.is_empty() && !self.clusters.contains_key(&context.cluster) {
                dangling.push(DanglingRef {
                    context: name.clone(),
                    kind: "cluster",
                    name: context.cluster.clone(),
                });
            }
            if !context.user.is_empty() && !self.users.contains_key(&context.user) {
                dangling.push(DanglingRef {
                    context: name.clone(),
                    kind: "user",
                    name: context.user.clone(),
                });
            }
        }
        dangling
    }

    /// Check that every context points at an existing cluster and user.
    pub fn validate(&self) -> Result<()> {
        match self.dangling_references().into_iter().next() {
            Some(dangling) => Err(dangling.into()),
            None => Ok(()),
        }
    }

    /// Like [`Kubeconfig::validate`], but dangling references that `baseline`
    /// already had are tolerated and only logged.
    pub fn validate_against(&self, baseline: &Kubeconfig) -> Result<()> {
        let known = baseline.dangling_references();
        for dangling in self.dangling_references() {
            if !known.contains(&dangling) {
                return Err(dangling.into());
            }
            warn!(
                "Context {} references missing {} {}, leaving it as found",
                dangling.context, dangling.kind, dangling.name
            );
        }
        Ok(())
    }

    /// Non-empty token of the user with the given name
    pub fn token_for(&self, user: &str) -> Option<&str> {
        self.users
            .get(user)
            .map(|u| u.token.as_str())
            .filter(|t| !t.is_empty())
    }

    /// Token of the user referenced by the current context
    pub fn active_token(&self) -> Option<&str> {
        if self.current_context.is_empty() {
            return None;
        }
        let context = self.contexts.get(&self.current_context)?;
        if context.user.is_empty() {
            return None;
        }
        self.token_for(&context.user)
    }

    /// The active token, or else the first non-empty token in the file
    pub fn any_token(&self) -> Option<&str> {
        self.active_token().or_else(|| {
            self.users
                .values()
                .map(|u| u.token.as_str())
                .find(|t| !t.is_empty())
        })
    }

    /// Replace the token of the user named `cluster_name`.
    ///
    /// With `auto_create` a missing entry is created, pointing at the cluster
    /// through the Rancher proxy; otherwise [`UpdaterError::UserNotFound`] is
    /// returned and nothing changes.
    pub fn update_token_by_name(
        &mut self,
        cluster_id: &str,
        cluster_name: &str,
        token: &str,
        rancher_url: &str,
        auto_create: bool,
    ) -> Result<()> {
        if let Some(user) = self.users.get_mut(cluster_name) {
            user.token = token.to_string();
            return Ok(());
        }

        if !auto_create {
            warn!("Cluster not found in kubeconfig, skipping: {}", cluster_name);
            return Err(UpdaterError::UserNotFound(cluster_name.to_string()));
        }

        let server = format!(
            "{}{}{}",
            rancher_url.trim_end_matches('/'),
            CLUSTER_PROXY_SEGMENT,
            cluster_id
        );
        self.clusters
            .insert(cluster_name.to_string(), Cluster::new(server));
        self.contexts.insert(
            cluster_name.to_string(),
            Context::new(cluster_name, cluster_name),
        );
        self.users
            .insert(cluster_name.to_string(), AuthInfo::with_token(token));

        info!("Created new kubeconfig entry for cluster: {}", cluster_name);
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct NamedCluster {
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    cluster: Cluster,
}

#[derive(Serialize, Deserialize)]
struct NamedContext {
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    context: Context,
}

#[derive(Serialize, Deserialize)]
struct NamedAuthInfo {
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    user: AuthInfo,
}

/// kubeconfig as laid out on disk
#[derive(Serialize, Deserialize)]
struct KubeconfigFile {
    #[serde(rename = "apiVersion", default, deserialize_with = "nullable")]
    api_version: String,
    #[serde(default, deserialize_with = "nullable")]
    kind: String,
    #[serde(default, deserialize_with = "nullable")]
    clusters: Vec<NamedCluster>,
    #[serde(default, deserialize_with = "nullable")]
    contexts: Vec<NamedContext>,
    #[serde(rename = "current-context", default, deserialize_with = "nullable")]
    current_context: String,
    #[serde(default, deserialize_with = "nullable")]
    users: Vec<NamedAuthInfo>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl From<KubeconfigFile> for Kubeconfig {
    fn from(file: KubeconfigFile) -> Self {
        let mut config = Kubeconfig::new();
        if !file.api_version.is_empty() {
            config.api_version = file.api_version;
        }
        if !file.kind.is_empty() {
            config.kind = file.kind;
        }
        // First occurrence wins, as with kubectl
        for named in file.clusters {
            config.clusters.entry(named.name).or_insert(named.cluster);
        }
        for named in file.contexts {
            config.contexts.entry(named.name).or_insert(named.context);
        }
        for named in file.users {
            config.users.entry(named.name).or_insert(named.user);
        }
        config.current_context = file.current_context;
        config.extra = file.extra;
        config
    }
}

impl From<Kubeconfig> for KubeconfigFile {
    fn from(config: Kubeconfig) -> Self {
        KubeconfigFile {
            api_version: config.api_version,
            kind: config.kind,
            clusters: config
                .clusters
                .into_iter()
                .map(|(name, cluster)| NamedCluster { name, cluster })
                .collect(),
            contexts: config
                .contexts
                .into_iter()
                .map(|(name, context)| NamedContext { name, context })
                .collect(),
            current_context: config.current_context,
            users: config
                .users
                .into_iter()
                .map(|(name, user)| NamedAuthInfo { name, user })
                .collect(),
            extra: config.extra,
        }
    }
}

/// Treat an explicit YAML `null` like a missing key
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `certificate-authority-data` is stored base64 encoded
mod base64_data {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let Some(encoded) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid certificate-authority-data: {}", e)))
    }
}
