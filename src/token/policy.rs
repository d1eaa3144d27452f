// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decides whether a cached kubeconfig token has to be regenerated.
//!
//! Checks run in a fixed order and the first match wins: force refresh, missing
//! token, unreadable expiration, then the threshold comparison.

use crate::error::{Result, UpdaterError};
use crate::token::claims::parse_expiration;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Expiration of a token as reported by an expiry source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    At(DateTime<Utc>),
    /// Rancher reports `ttl: 0` for tokens without expiration
    Never,
}

/// Where token expiration is read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpirySource {
    /// The `exp` claim embedded in the token's JWT
    #[default]
    Claims,
    /// The Rancher token API (`/v3/tokens/<name>`)
    Remote,
}

impl fmt::Display for ExpirySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpirySource::Claims => f.write_str("claims"),
            ExpirySource::Remote => f.write_str("remote"),
        }
    }
}

impl FromStr for ExpirySource {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claims" => Ok(ExpirySource::Claims),
            "remote" => Ok(ExpirySource::Remote),
            other => Err(UpdaterError::InvalidConfig(format!(
                "invalid expiry source '{}', expected 'claims' or 'remote'",
                other
            ))),
        }
    }
}

/// Why a regeneration decision was made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationReason {
    ForceRefreshEnabled,
    NoExistingToken,
    ExpiresSoon,
    StillValid,
    NeverExpires,
    ExpirationCheckFailed,
}

impl RegenerationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegenerationReason::ForceRefreshEnabled => "force_refresh_enabled",
            RegenerationReason::NoExistingToken => "no_existing_token",
            RegenerationReason::ExpiresSoon => "expires_soon",
            RegenerationReason::StillValid => "still_valid",
            RegenerationReason::NeverExpires => "never_expires",
            RegenerationReason::ExpirationCheckFailed => "expiration_check_failed",
        }
    }
}

impl fmt::Display for RegenerationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a regeneration check. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RegenerationDecision {
    pub should_regenerate: bool,
    pub reason: RegenerationReason,
    pub expires_at: Option<DateTime<Utc>>,
    /// Signed, negative once the token has expired
    pub days_until_expiry: Option<f64>,
}

impl RegenerationDecision {
    fn regenerate(reason: RegenerationReason) -> Self {
        Self {
            should_regenerate: true,
            reason,
            expires_at: None,
            days_until_expiry: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenerationPolicy {
    source: ExpirySource,
    force_refresh: bool,
    threshold_days: i64,
}

impl RegenerationPolicy {
    pub fn new(source: ExpirySource, force_refresh: bool, threshold_days: i64) -> Self {
        Self {
            source,
            force_refresh,
            threshold_days,
        }
    }

    pub fn source(&self) -> ExpirySource {
        self.source
    }

    pub fn threshold(&self) -> TimeDelta {
        TimeDelta::try_days(self.threshold_days).unwrap_or(if self.threshold_days < 0 {
            TimeDelta::MIN
        } else {
            TimeDelta::MAX
        })
    }

    /// Decisions that need no expiration lookup at all.
    pub fn precheck(&self, cached: Option<&str>) -> Option<RegenerationDecision> {
        if self.force_refresh {
            return Some(RegenerationDecision::regenerate(
                RegenerationReason::ForceRefreshEnabled,
            ));
        }

        match cached {
            Some(token) if !token.is_empty() => None,
            _ => Some(RegenerationDecision::regenerate(
                RegenerationReason::NoExistingToken,
            )),
        }
    }

    /// Decide from a looked-up expiration. Lookup failures regenerate.
    pub fn evaluate(&self, expiry: Result<Expiry>, now: DateTime<Utc>) -> RegenerationDecision {
        let expires_at = match expiry {
            Ok(Expiry::At(expires_at)) => expires_at,
            Ok(Expiry::Never) if self.source == ExpirySource::Remote => {
                return RegenerationDecision {
                    should_regenerate: false,
                    reason: RegenerationReason::NeverExpires,
                    expires_at: None,
                    days_until_expiry: None,
                };
            }
            Ok(Expiry::Never) => {
                warn!("Embedded token claims cannot express a non-expiring token, will regenerate for safety");
                return RegenerationDecision::regenerate(RegenerationReason::ExpirationCheckFailed);
            }
            Err(UpdaterError::MissingExpirationClaim) => {
                warn!("Token has no expiration claim, will regenerate for safety");
                return RegenerationDecision::regenerate(RegenerationReason::ExpirationCheckFailed);
            }
            Err(e) => {
                warn!(error = %e, "Failed to check token expiration, will regenerate for safety");
                return RegenerationDecision::regenerate(RegenerationReason::ExpirationCheckFailed);
            }
        };

        let time_until_expiry = expires_at - now;
        let days_until_expiry = time_until_expiry.num_seconds() as f64 / 86_400.0;
        let should_regenerate = time_until_expiry <= self.threshold();

        RegenerationDecision {
            should_regenerate,
            reason: if should_regenerate {
                RegenerationReason::ExpiresSoon
            } else {
                RegenerationReason::StillValid
            },
            expires_at: Some(expires_at),
            days_until_expiry: Some(days_until_expiry),
        }
    }

    /// Decide using the expiration embedded in the token itself.
    pub fn decide(&self, cached: Option<&str>) -> RegenerationDecision {
        self.decide_at(cached, Utc::now())
    }

    pub fn decide_at(&self, cached: Option<&str>, now: DateTime<Utc>) -> RegenerationDecision {
        if let Some(decision) = self.precheck(cached) {
            return decision;
        }
        let token = cached.unwrap_or_default();
        self.evaluate(parse_expiration(token).map(Expiry::At), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::claims::tests::{make_token, make_token_expiring_at};
    use chrono::TimeZone;

    const NOW: i64 = 1_800_000_000;
    const DAY: i64 = 86_400;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(NOW, 0).unwrap()
    }

    fn make_policy(force_refresh: bool, threshold_days: i64) -> RegenerationPolicy {
        RegenerationPolicy::new(ExpirySource::Claims, force_refresh, threshold_days)
    }

    #[test]
    fn test_force_refresh_wins_over_valid_token() {
        let token = make_token_expiring_at(NOW + 365 * DAY);

        let decision = make_policy(true, 30).decide_at(Some(&token), now());

        assert!(decision.should_regenerate);
        assert_eq!(decision.reason, RegenerationReason::ForceRefreshEnabled);
        assert_eq!(decision.expires_at, None);
    }

    #[test]
    fn test_force_refresh_skips_parsing_garbage() {
        let decision = make_policy(true, 30).decide_at(Some("garbage"), now());
        assert_eq!(decision.reason, RegenerationReason::ForceRefreshEnabled);
    }

    #[test]
    fn test_missing_token_regenerates_for_any_threshold() {
        for threshold in [-5, 0, 1, 30, 365] {
            for cached in [None, Some("")] {
                let decision = make_policy(false, threshold).decide_at(cached, now());
                assert!(decision.should_regenerate);
                assert_eq!(decision.reason, RegenerationReason::NoExistingToken);
            }
        }
    }

    #[test]
    fn test_unparseable_token_regenerates() {
        let decision = make_policy(false, 30).decide_at(Some("not-a-token"), now());

        assert!(decision.should_regenerate);
        assert_eq!(decision.reason, RegenerationReason::ExpirationCheckFailed);
    }

    #[test]
    fn test_token_without_exp_regenerates() {
        let token = make_token(&serde_json::json!({ "iat": NOW }));

        let decision = make_policy(false, 30).decide_at(Some(&token), now());

        assert!(decision.should_regenerate);
        assert_eq!(decision.reason, RegenerationReason::ExpirationCheckFailed);
    }

    #[test]
    fn test_expiry_exactly_at_threshold_regenerates() {
        let token = make_token_expiring_at(NOW + 30 * DAY);

        let decision = make_policy(false, 30).decide_at(Some(&token), now());

        assert!(decision.should_regenerate);
        assert_eq!(decision.reason, RegenerationReason::ExpiresSoon);
        assert_eq!(decision.days_until_expiry, Some(30.0));
    }

    #[test]
    fn test_expiry_just_beyond_threshold_is_still_valid() {
        let token = make_token_expiring_at(NOW + 30 * DAY + 1);

        let decision = make_policy(false, 30).decide_at(Some(&token), now());

        assert!(!decision.should_regenerate);
        assert_eq!(decision.reason, RegenerationReason::StillValid);
        assert_eq!(
            decision.expires_at,
            Some(Utc.timestamp_opt(NOW + 30 * DAY + 1, 0).unwrap())
        );
    }

    #[test]
    fn test_expired_token_reports_negative_days() {
        let token = make_token_expiring_at(NOW - 2 * DAY);

        let decision = make_policy(false, 30).decide_at(Some(&token), now());

        assert!(decision.should_regenerate);
        assert_eq!(decision.reason, RegenerationReason::ExpiresSoon);
        assert_eq!(decision.days_until_expiry, Some(-2.0));
    }

    #[test]
    fn test_zero_threshold_keeps_unexpired_token() {
        let token = make_token_expiring_at(NOW + 1);
        let decision = make_policy(false, 0).decide_at(Some(&token), now());
        assert_eq!(decision.reason, RegenerationReason::StillValid);
    }

    #[test]
    fn test_remote_never_expires_short_circuits() {
        let policy = RegenerationPolicy::new(ExpirySource::Remote, false, 30);

        let decision = policy.evaluate(Ok(Expiry::Never), now());

        assert!(!decision.should_regenerate);
        assert_eq!(decision.reason, RegenerationReason::NeverExpires);
        assert_eq!(decision.days_until_expiry, None);
    }

    #[test]
    fn test_claims_source_rejects_never_sentinel() {
        let decision = make_policy(false, 30).evaluate(Ok(Expiry::Never), now());

        assert!(decision.should_regenerate);
        assert_eq!(decision.reason, RegenerationReason::ExpirationCheckFailed);
    }

    #[test]
    fn test_remote_lookup_failure_regenerates() {
        let policy = RegenerationPolicy::new(ExpirySource::Remote, false, 30);

        let decision = policy.evaluate(
            Err(UpdaterError::ProviderQueryFailed("status 500".to_string())),
            now(),
        );

        assert_eq!(decision.reason, RegenerationReason::ExpirationCheckFailed);
    }

    #[test]
    fn test_huge_threshold_does_not_overflow() {
        let token = make_token_expiring_at(NOW + 365 * DAY);
        let decision = make_policy(false, i64::MAX).decide_at(Some(&token), now());
        assert_eq!(decision.reason, RegenerationReason::ExpiresSoon);
    }

    #[test]
    fn test_expiry_source_from_str() {
        assert_eq!("claims".parse::<ExpirySource>().unwrap(), ExpirySource::Claims);
        assert_eq!(" Remote ".parse::<ExpirySource>().unwrap(), ExpirySource::Remote);
        assert!("jwt".parse::<ExpirySource>().is_err());
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(RegenerationReason::ExpiresSoon.to_string(), "expires_soon");
        assert_eq!(
            RegenerationReason::ExpirationCheckFailed.to_string(),
            "expiration_check_failed"
        );
    }
}
