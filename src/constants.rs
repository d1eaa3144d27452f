// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Environment variable holding a list of candidate kubeconfig files
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Kubeconfig location relative to the user's home directory
pub mod kubeconfig {
    pub const DIR_NAME: &str = ".kube";
    pub const FILE_NAME: &str = "config";
    /// Infix placed between the original file name and the backup timestamp
    pub const BACKUP_INFIX: &str = ".backup.";
    /// strftime pattern for backup names, microsecond precision
    pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S%.6f";
    pub const TEMP_FILE_PREFIX: &str = ".kubeconfig.tmp.";
    pub const API_VERSION: &str = "v1";
    pub const KIND: &str = "Config";
}

/// Rancher API endpoints
pub mod rancher {
    pub const LOCAL_LOGIN_PATH: &str = "/v3-public/localProviders/local?action=login";
    pub const LDAP_LOGIN_PATH: &str = "/v3-public/openLdapProviders/openldap?action=login";
    pub const CLUSTERS_PATH: &str = "/v3/clusters";
    pub const TOKENS_PATH: &str = "/v3/tokens";
    /// Path segment Rancher uses when proxying requests to a downstream cluster
    pub const CLUSTER_PROXY_SEGMENT: &str = "/k8s/clusters/";
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;
}

/// Defaults for token regeneration
pub mod token {
    pub const DEFAULT_THRESHOLD_DAYS: i64 = 30;
}
