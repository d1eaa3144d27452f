// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    #[error("Credential is missing its expiration claim")]
    MissingExpirationClaim,

    #[error("Credential provider query failed: {0}")]
    ProviderQueryFailed(String),

    #[error("Failed to back up {}: {source}", path.display())]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Expected a kubeconfig file but found a directory: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("User {0} not found in kubeconfig")]
    UserNotFound(String),

    #[error("Context {context} references missing {kind} {name}")]
    DanglingReference {
        context: String,
        kind: &'static str,
        name: String,
    },

    #[error("Could not determine the user's home directory")]
    HomeDirUnavailable,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse kubeconfig: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Kubernetes client error: {0}")]
    Kube(#[from] kube::Error),
}

pub type Result<T> = std::result::Result<T, UpdaterError>;
