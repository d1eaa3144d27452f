// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

pub mod auth;
pub mod client;
pub mod provider;

pub use auth::{login, AuthType};
pub use client::{RancherClient, TransportConfig};
pub use provider::CredentialProvider;
