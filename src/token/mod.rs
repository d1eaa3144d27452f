// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Token expiration parsing and the regeneration policy built on top of it.

pub mod claims;
pub mod policy;

pub use claims::{parse_claims, parse_expiration, TokenClaims};
pub use policy::{
    Expiry, ExpirySource, RegenerationDecision, RegenerationPolicy, RegenerationReason,
};
