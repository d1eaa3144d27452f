// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command line and environment configuration.
//!
//! Every option can be given as a flag or through its environment variable;
//! a flag wins over the environment, which wins over the default.

use crate::constants::token::DEFAULT_THRESHOLD_DAYS;
use crate::error::{Result, UpdaterError};
use crate::rancher::{AuthType, TransportConfig};
use crate::token::{ExpirySource, RegenerationPolicy};
use clap::builder::BoolishValueParser;
use clap::Parser;
use std::fmt;
use url::Url;

/// Refresh Rancher-issued kubeconfig tokens before they expire
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rancher-kubeconfig-updater", version, about, long_about = None)]
pub struct Args {
    /// Rancher server URL
    #[arg(long = "url", env = "RANCHER_URL")]
    pub rancher_url: Option<String>,

    /// Rancher username
    #[arg(short = 'u', long = "user", env = "RANCHER_USERNAME")]
    pub user: Option<String>,

    /// Rancher password
    #[arg(short = 'p', long, env = "RANCHER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Authentication provider: local or ldap
    #[arg(long, env = "RANCHER_AUTH_TYPE", default_value = "local")]
    pub auth_type: String,

    /// Skip TLS certificate verification of the Rancher server (insecure)
    #[arg(long, env = "RANCHER_INSECURE_SKIP_TLS_VERIFY", value_parser = BoolishValueParser::new())]
    pub insecure_skip_tls_verify: bool,

    /// Kubeconfig file to update; defaults to $KUBECONFIG or ~/.kube/config
    #[arg(short = 'c', long)]
    pub config: Option<String>,

    /// Regenerate tokens expiring within this many days
    #[arg(long, env = "TOKEN_THRESHOLD_DAYS", default_value_t = DEFAULT_THRESHOLD_DAYS)]
    pub threshold_days: i64,

    /// Regenerate every token regardless of expiration
    #[arg(long, env = "FORCE_REFRESH", value_parser = BoolishValueParser::new())]
    pub force_refresh: bool,

    /// Show what would change without touching the kubeconfig
    #[arg(long, env = "DRY_RUN", value_parser = BoolishValueParser::new())]
    pub dry_run: bool,

    /// Also import the direct (authorized cluster endpoint) contexts
    #[arg(long, env = "WITH_DIRECTLY", value_parser = BoolishValueParser::new())]
    pub with_directly: bool,

    /// Create kubeconfig entries for clusters that have none yet
    #[arg(short = 'a', long, env = "AUTO_CREATE", value_parser = BoolishValueParser::new())]
    pub auto_create: bool,

    /// Comma separated cluster names or IDs to update
    #[arg(long)]
    pub cluster: Option<String>,

    /// Where token expiration is read from: claims or remote
    #[arg(long, env = "TOKEN_EXPIRY_SOURCE", default_value = "claims")]
    pub expiry_source: String,
}

/// Validated runtime configuration
#[derive(Clone)]
pub struct Config {
    pub rancher_url: String,
    pub username: String,
    pub password: String,
    pub auth_type: AuthType,
    pub insecure_skip_tls_verify: bool,
    pub kubeconfig_path: Option<String>,
    pub threshold_days: i64,
    pub force_refresh: bool,
    pub dry_run: bool,
    pub with_directly: bool,
    pub auto_create: bool,
    pub cluster_filter: Option<String>,
    pub expiry_source: ExpirySource,
}

fn required(value: Option<String>, what: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| UpdaterError::InvalidConfig(format!("{} is required", what)))
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        let rancher_url = required(args.rancher_url, "Rancher URL (--url or RANCHER_URL)")?;
        let parsed = Url::parse(&rancher_url).map_err(|e| {
            UpdaterError::InvalidConfig(format!("invalid Rancher URL '{}': {}", rancher_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(UpdaterError::InvalidConfig(format!(
                "Rancher URL '{}' must be an http(s) URL with a host",
                rancher_url
            )));
        }

        let username = required(args.user, "username (--user or RANCHER_USERNAME)")?;
        let password = args
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                UpdaterError::InvalidConfig(
                    "password (--password or RANCHER_PASSWORD) is required".to_string(),
                )
            })?;

        if args.threshold_days < 0 {
            return Err(UpdaterError::InvalidConfig(format!(
                "threshold days must not be negative, got {}",
                args.threshold_days
            )));
        }

        Ok(Config {
            rancher_url: rancher_url.trim_end_matches('/').to_string(),
            username,
            password,
            auth_type: args.auth_type.parse()?,
            insecure_skip_tls_verify: args.insecure_skip_tls_verify,
            kubeconfig_path: args.config.filter(|p| !p.is_empty()),
            threshold_days: args.threshold_days,
            force_refresh: args.force_refresh,
            dry_run: args.dry_run,
            with_directly: args.with_directly,
            auto_create: args.auto_create,
            cluster_filter: args.cluster.filter(|c| !c.is_empty()),
            expiry_source: args.expiry_source.parse()?,
        })
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            base_url: self.rancher_url.clone(),
            insecure_skip_tls_verify: self.insecure_skip_tls_verify,
        }
    }

    pub fn policy(&self) -> RegenerationPolicy {
        RegenerationPolicy::new(self.expiry_source, self.force_refresh, self.threshold_days)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rancher_url", &self.rancher_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_type", &self.auth_type)
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .field("kubeconfig_path", &self.kubeconfig_path)
            .field("threshold_days", &self.threshold_days)
            .field("force_refresh", &self.force_refresh)
            .field("dry_run", &self.dry_run)
            .field("with_directly", &self.with_directly)
            .field("auto_create", &self.auto_create)
            .field("cluster_filter", &self.cluster_filter)
            .field("expiry_source", &self.expiry_source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            rancher_url: Some("https://rancher.example.com/".to_string()),
            user: Some("admin".to_string()),
            password: Some("secret".to_string()),
            auth_type: "local".to_string(),
            threshold_days: DEFAULT_THRESHOLD_DAYS,
            expiry_source: "claims".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_args_defaults() {
        let config = Config::from_args(make_args()).unwrap();

        assert_eq!(config.rancher_url, "https://rancher.example.com");
        assert_eq!(config.auth_type, AuthType::Local);
        assert_eq!(config.threshold_days, 30);
        assert_eq!(config.expiry_source, ExpirySource::Claims);
        assert!(!config.dry_run);
        assert_eq!(config.kubeconfig_path, None);
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "rancher-kubeconfig-updater",
            "--url",
            "https://rancher.example.com",
            "-u",
            "admin",
            "-p",
            "secret",
            "--auth-type",
            "ldap",
            "--threshold-days",
            "7",
            "--force-refresh",
            "--dry-run",
            "--with-directly",
            "-a",
            "-c",
            "/tmp/kubeconfig",
            "--cluster",
            "prod,staging",
            "--expiry-source",
            "remote",
        ])
        .unwrap();

        let config = Config::from_args(args).unwrap();

        assert_eq!(config.auth_type, AuthType::Ldap);
        assert_eq!(config.threshold_days, 7);
        assert!(config.force_refresh);
        assert!(config.dry_run);
        assert!(config.with_directly);
        assert!(config.auto_create);
        assert_eq!(config.kubeconfig_path.as_deref(), Some("/tmp/kubeconfig"));
        assert_eq!(config.cluster_filter.as_deref(), Some("prod,staging"));
        assert_eq!(config.expiry_source, ExpirySource::Remote);
    }

    #[test]
    fn test_missing_url() {
        let args = Args {
            rancher_url: None,
            ..make_args()
        };
        assert!(matches!(
            Config::from_args(args),
            Err(UpdaterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_url() {
        for url in ["not a url", "ftp://rancher.example.com", "rancher.example.com"] {
            let args = Args {
                rancher_url: Some(url.to_string()),
                ..make_args()
            };
            assert!(Config::from_args(args).is_err(), "url {}", url);
        }
    }

    #[test]
    fn test_missing_credentials() {
        let no_user = Args {
            user: Some("  ".to_string()),
            ..make_args()
        };
        let no_password = Args {
            password: None,
            ..make_args()
        };

        assert!(Config::from_args(no_user).is_err());
        assert!(Config::from_args(no_password).is_err());
    }

    #[test]
    fn test_invalid_auth_type() {
        let args = Args {
            auth_type: "saml".to_string(),
            ..make_args()
        };
        assert!(matches!(
            Config::from_args(args),
            Err(UpdaterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_negative_threshold() {
        let args = Args {
            threshold_days: -1,
            ..make_args()
        };
        assert!(Config::from_args(args).is_err());
    }

    #[test]
    fn test_transport_and_policy() {
        let config = Config::from_args(Args {
            insecure_skip_tls_verify: true,
            ..make_args()
        })
        .unwrap();

        let transport = config.transport();
        assert_eq!(transport.base_url, "https://rancher.example.com");
        assert!(transport.insecure_skip_tls_verify);
        assert_eq!(config.policy().source(), ExpirySource::Claims);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config::from_args(make_args()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
