// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubeconfig location resolution.
//!
//! Precedence, highest first:
//! 1. an explicit path (with `~` expansion)
//! 2. the `KUBECONFIG` list: the first entry that exists, else the first entry
//! 3. `~/.kube/config`

use crate::constants::kubeconfig::{DIR_NAME, FILE_NAME};
use crate::constants::KUBECONFIG_ENV;
use crate::error::{Result, UpdaterError};
use std::env;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(UpdaterError::HomeDirUnavailable)
}

/// `~/.kube/config` for the current user
pub fn default_kubeconfig_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(DIR_NAME).join(FILE_NAME))
}

/// Expand a leading `~` and normalize separators.
///
/// Both `~/` and `~\` are accepted so paths copied between platforms work. An
/// empty path resolves to the default location.
pub fn expand_path(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        return default_kubeconfig_path();
    }

    if let Some(rest) = path.strip_prefix('~') {
        let home = home_dir()?;
        let rest = rest.trim_start_matches(['/', '\\']);
        if rest.is_empty() {
            return Ok(home);
        }
        return Ok(rest
            .split(['/', '\\'])
            .filter(|part| !part.is_empty())
            .fold(home, |acc, part| acc.join(part)));
    }

    Ok(clean(Path::new(path)))
}

/// Drop `.` components and repeated separators
fn clean(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

/// Resolve the kubeconfig path from the process environment.
pub fn resolve_kubeconfig_path(explicit: Option<&str>) -> Result<PathBuf> {
    resolve_with_env(explicit, env::var_os(KUBECONFIG_ENV).as_deref())
}

/// Resolve the kubeconfig path given the value of `KUBECONFIG`.
pub fn resolve_with_env(explicit: Option<&str>, kubeconfig_env: Option<&OsStr>) -> Result<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        let resolved = expand_path(path)?;
        debug!("Using explicit kubeconfig path {}", resolved.display());
        return Ok(resolved);
    }

    if let Some(list) = kubeconfig_env {
        let candidates: Vec<PathBuf> = env::split_paths(list)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();

        if let Some(existing) = candidates.iter().find(|p| p.exists()) {
            debug!("Using kubeconfig from {}: {}", KUBECONFIG_ENV, existing.display());
            return Ok(existing.clone());
        }
        if let Some(first) = candidates.into_iter().next() {
            debug!(
                "No file in {} exists yet, will write to {}",
                KUBECONFIG_ENV,
                first.display()
            );
            return Ok(first);
        }
    }

    default_kubeconfig_path()
}
