// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the key bundle core

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Private key bundle versions this build can decode
pub const KEY_BUNDLE_VERSIONS: &[u8] = &[1, 2];

/// Sealed invitation versions this build can open
pub const SEALED_INVITATION_VERSIONS: &[u8] = &[1];

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "secp256k1-recoverable-signatures",
    "wallet-linked-identity",
    "pre-key-rotation",
    "triple-dh",
    "hkdf-sha256",
    "aes-256-gcm",
    "sealed-invitations",
    "topic-key-manager",
    "encrypted-key-store",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("xmtp-core-crypto {}", VERSION_NUMBER)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "key_bundle_versions": KEY_BUNDLE_VERSIONS,
        "sealed_invitation_versions": SEALED_INVITATION_VERSIONS,
        "features": FEATURES,
    })
}
