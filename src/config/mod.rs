// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Network a key bundle belongs to; bundles are stored separately per network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XmtpEnv {
    Local,
    Dev,
    Production,
}

impl XmtpEnv {
    /// Parse a network name, falling back to `Dev` for anything unknown
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "local" => XmtpEnv::Local,
            "production" | "prod" => XmtpEnv::Production,
            _ => XmtpEnv::Dev,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            XmtpEnv::Local => "local",
            XmtpEnv::Dev => "dev",
            XmtpEnv::Production => "production",
        }
    }
}

impl fmt::Display for XmtpEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where encrypted key bundles are stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreConfig {
    /// Network the bundles belong to
    pub env: XmtpEnv,

    /// Final path segment of every storage key
    pub key_bundle_name: String,
}

impl KeystoreConfig {
    /// Create configuration from environment variables
    ///
    /// - `XMTP_ENV`: `local`, `dev` or `production` (default `dev`)
    /// - `XMTP_KEY_BUNDLE_NAME`: default `key_bundle`
    pub fn from_env() -> Self {
        let env = env::var("XMTP_ENV")
            .map(|name| XmtpEnv::from_name(&name))
            .unwrap_or(XmtpEnv::Dev);

        let key_bundle_name = env::var("XMTP_KEY_BUNDLE_NAME")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "key_bundle".to_string());

        Self {
            env,
            key_bundle_name,
        }
    }

    /// `xmtp/<env>/<address>/<key_bundle_name>`
    pub fn storage_key(&self, wallet_address: &str) -> String {
        format!(
            "xmtp/{}/{}/{}",
            self.env, wallet_address, self.key_bundle_name
        )
    }
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            env: XmtpEnv::Dev,
            key_bundle_name: "key_bundle".to_string(),
        }
    }
}
