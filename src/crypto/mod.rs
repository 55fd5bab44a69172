// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Identity Keys and Authenticated Encryption
//!
//! This module implements the cryptographic primitives a participant needs
//! to establish a channel with a peer without an interactive handshake:
//!
//! - **Keys**: secp256k1 private/public keys in legacy (V1) and signed (V2) form
//! - **Signature**: recoverable ECDSA, key-made or wallet-made
//! - **Key Bundles**: identity key plus rotating pre-keys
//! - **Shared Secret**: triple-DH between two bundles
//! - **Encryption**: HKDF-SHA256 derived keys with AES-256-GCM AEAD
//!
//! ## Security Considerations
//!
//! - Private bundles are persisted only through `keystore::EncryptedKeyStore`
//! - Every encryption draws a fresh salt and nonce
//! - A peer's pre-key signature is checked before any DH is performed
//! - Decryption failures never say why
//!
//! ## Protocol Flow
//!
//! 1. Each side generates a bundle; the identity key is signed by a wallet
//! 2. Each side publishes its public bundle (identity + current pre-key)
//! 3. The initiator computes `sender.shared_secret(peer, my_pre_key, false)`
//! 4. The recipient computes `shared_secret(sender, my_pre_key, true)`
//! 5. Both feed the identical 195-byte secret to `encrypt` / `decrypt`

pub mod ciphertext;
pub mod encryption;
pub mod error;
pub mod key_bundle;
pub mod private_key;
pub mod provider;
pub mod public_key;
pub mod secp256k1;
pub mod shared_secret;
pub mod signature;
pub mod signer;

pub use ciphertext::Ciphertext;
pub use encryption::{decrypt, encrypt, encrypt_with};
pub use error::{CryptoError, Result};
pub use key_bundle::{
    decode_private_key_bundle, PrivateKeyBundle, PrivateKeyBundleV1, PrivateKeyBundleV2,
    PublicKeyBundle, SignedPublicKeyBundle,
};
pub use private_key::{PrivateKey, PrivateKeyMaterial, SignedPrivateKey};
pub use provider::{install_provider, provider, CryptoProvider, OsRngProvider};
pub use public_key::{PublicKey, SignedKeyMaterial, SignedPublicKey, UnsignedPublicKey};
pub use secp256k1::{normalize_address, PublicPoint, SecretScalar};
pub use shared_secret::{BundleSecrets, PublicBundleMaterial};
pub use signature::{Signature, SignatureKind};
pub use signer::Signer;

/// Current time in nanoseconds since the Unix epoch
pub(crate) fn now_ns() -> u64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .and_then(|ns| u64::try_from(ns).ok())
        .unwrap_or_default()
}
