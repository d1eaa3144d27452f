// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Username/password login against the Rancher public auth providers.

use crate::constants::rancher::{LDAP_LOGIN_PATH, LOCAL_LOGIN_PATH};
use crate::error::{Result, UpdaterError};
use crate::rancher::client::RancherClient;
use crate::types::{LoginRequest, LoginResponse};
use http::Method;
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthType {
    #[default]
    Local,
    Ldap,
}

impl AuthType {
    pub fn login_path(&self) -> &'static str {
        match self {
            AuthType::Local => LOCAL_LOGIN_PATH,
            AuthType::Ldap => LDAP_LOGIN_PATH,
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthType::Local => f.write_str("local"),
            AuthType::Ldap => f.write_str("ldap"),
        }
    }
}

impl FromStr for AuthType {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(AuthType::Local),
            "ldap" => Ok(AuthType::Ldap),
            other => Err(UpdaterError::InvalidConfig(format!(
                "invalid auth type '{}', expected 'local' or 'ldap'",
                other
            ))),
        }
    }
}

/// Log in and return a client authenticated with the session token.
#[instrument(skip(client, password))]
pub async fn login(
    client: RancherClient,
    username: &str,
    password: &str,
    auth_type: AuthType,
) -> Result<RancherClient> {
    let body = serde_json::to_vec(&LoginRequest {
        username,
        password,
        response_type: "json",
    })
    .map_err(|e| UpdaterError::ProviderQueryFailed(format!("Failed to encode login request: {}", e)))?;

    let response: LoginResponse = client
        .send(Method::POST, auth_type.login_path(), body)
        .await
        .map_err(|e| UpdaterError::ProviderQueryFailed(format!("Login failed: {}", e)))?;

    if response.token.is_empty() {
        return Err(UpdaterError::ProviderQueryFailed(
            "Login succeeded but no token was returned".to_string(),
        ));
    }

    info!("Logged in to {} as {} ({} auth)", client.base_url(), username, auth_type);
    Ok(client.with_token(response.token))
}
