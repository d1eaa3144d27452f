// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// Body of a `/v3-public/*Providers/*?action=login` request
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub response_type: &'a str,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: String,
}

/// Token metadata from `GET /v3/tokens/<name>`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    #[serde(default)]
    pub name: String,
    /// RFC 3339 timestamp, empty for tokens that never expire
    #[serde(default)]
    pub expires_at: String,
    /// Lifetime in milliseconds; `0` means the token never expires
    #[serde(default)]
    pub ttl: i64,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub created: String,
}

impl TokenInfo {
    pub fn never_expires(&self) -> bool {
        self.ttl == 0
    }
}
