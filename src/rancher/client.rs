// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the Rancher v3 API.
//!
//! Requests go through a `kube::Client` pointed at the Rancher server, so the
//! TLS stack, timeouts and error decoding are shared with the Kubernetes
//! client. The session token is sent as a bearer header on every request.

use crate::constants::rancher::{CLUSTERS_PATH, REQUEST_TIMEOUT_SECS, TOKENS_PATH};
use crate::error::{Result, UpdaterError};
use crate::kubeconfig::Kubeconfig;
use crate::rancher::provider::CredentialProvider;
use crate::token::Expiry;
use crate::types::{Cluster, ClusterList, GenerateKubeconfigResponse, TokenInfo};
use chrono::{DateTime, Utc};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request};
use kube::{Client, Config as KConfig};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Connection settings for the Rancher server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub base_url: String,
    pub insecure_skip_tls_verify: bool,
}

#[derive(Clone)]
pub struct RancherClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RancherClient {
    /// Build an unauthenticated client for the configured server.
    pub fn connect(transport: &TransportConfig) -> Result<Self> {
        let base_url = transport.base_url.trim_end_matches('/').to_string();
        let uri = base_url.parse::<http::Uri>().map_err(|e| {
            UpdaterError::InvalidConfig(format!("Invalid Rancher URL {}: {}", base_url, e))
        })?;

        let mut config = KConfig::new(uri);
        config.read_timeout = Some(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        config.write_timeout = Some(Duration::from_secs(REQUEST_TIMEOUT_SECS));
        if transport.insecure_skip_tls_verify {
            warn!("TLS certificate verification is disabled!");
            warn!("This is insecure and should only be used in development/test environments.");
            config.accept_invalid_certs = true;
        }

        let client = Client::try_from(config)?;
        Ok(Self::with_client(client, &base_url))
    }

    /// Wrap an existing client, e.g. one backed by a mock service
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Use `token` as bearer credential for subsequent requests
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Server URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Vec<u8>,
    ) -> Result<T> {
        let mut builder = Request::builder()
            .method(method.clone())
            .uri(path)
            .header(ACCEPT, "application/json");
        if !body.is_empty() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = builder.body(body).map_err(|e| {
            UpdaterError::ProviderQueryFailed(format!("Invalid request {} {}: {}", method, path, e))
        })?;

        debug!("{} {}", method, path);
        self.client
            .request::<T>(request)
            .await
            .map_err(|e| UpdaterError::ProviderQueryFailed(format!("{} {} failed: {}", method, path, e)))
    }

    /// All clusters visible to the logged in user
    #[instrument(skip(self))]
    pub async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        let list: ClusterList = self.send(Method::GET, CLUSTERS_PATH, Vec::new()).await?;
        debug!("Rancher returned {} clusters", list.data.len());
        Ok(list.data)
    }

    /// Ask Rancher to generate a fresh kubeconfig (and token) for a cluster
    #[instrument(skip(self))]
    pub async fn generate_kubeconfig(&self, cluster_id: &str) -> Result<Kubeconfig> {
        let path = format!("{}/{}?action=generateKubeconfig", CLUSTERS_PATH, cluster_id);
        let response: GenerateKubeconfigResponse = self.send(Method::POST, &path, Vec::new()).await?;
        if response.config.trim().is_empty() {
            return Err(UpdaterError::ProviderQueryFailed(format!(
                "Rancher returned an empty kubeconfig for cluster {}",
                cluster_id
            )));
        }
        Kubeconfig::from_yaml(&response.config).map_err(|e| {
            UpdaterError::ProviderQueryFailed(format!(
                "Invalid kubeconfig generated for cluster {}: {}",
                cluster_id, e
            ))
        })
    }

    /// Look up a token's metadata by the name part of `<name>:<secret>`
    #[instrument(skip(self, credential))]
    pub async fn token_info(&self, credential: &str) -> Result<TokenInfo> {
        let name = token_name(credential)?;
        self.send(Method::GET, &format!("{}/{}", TOKENS_PATH, name), Vec::new())
            .await
    }

    /// Expiration of a token according to Rancher. `ttl: 0` means never.
    pub async fn token_expiration(&self, credential: &str) -> Result<Expiry> {
        let info = self.token_info(credential).await?;
        if info.never_expires() {
            return Ok(Expiry::Never);
        }
        let expires_at = DateTime::parse_from_rfc3339(&info.expires_at).map_err(|e| {
            UpdaterError::ProviderQueryFailed(format!(
                "Invalid expiresAt '{}' for token {}: {}",
                info.expires_at, info.name, e
            ))
        })?;
        Ok(Expiry::At(expires_at.with_timezone(&Utc)))
    }
}

/// The name part of a `<name>:<secret>` token
fn token_name(credential: &str) -> Result<&str> {
    match credential.split_once(':') {
        Some((name, secret)) if !name.is_empty() && !secret.is_empty() && !secret.contains(':') => {
            Ok(name)
        }
        _ => Err(UpdaterError::MalformedCredential(
            "expected <token-name>:<secret-key>".to_string(),
        )),
    }
}

impl CredentialProvider for RancherClient {
    async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        RancherClient::list_clusters(self).await
    }

    async fn fetch_bundle(&self, cluster_id: &str) -> Result<Kubeconfig> {
        self.generate_kubeconfig(cluster_id).await
    }

    async fn token_expiry(&self, credential: &str) -> Result<Expiry> {
        self.token_expiration(credential).await
    }

    fn server_url(&self) -> &str {
        self.base_url()
    }
}
