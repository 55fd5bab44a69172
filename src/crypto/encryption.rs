// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HKDF-SHA256 + AES-256-GCM Encryption/Decryption
//!
//! Every call to [`encrypt`] draws a fresh 32-byte HKDF salt and a fresh
//! 12-byte GCM nonce, derives a one-off AES-256 key from the caller's secret,
//! and seals the plaintext with optional additional authenticated data.
//!
//! The AAD is not stored in the [`Ciphertext`]: the same bytes must be handed
//! to [`decrypt`] again or the tag check fails. Sealed invitations use this
//! to bind their cleartext header to the encrypted body.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use sha2::Sha256;

use super::ciphertext::{Ciphertext, GCM_NONCE_LEN, HKDF_SALT_LEN};
use super::error::{CryptoError, Result};
use super::provider::{provider, CryptoProvider};

const AES_KEY_LEN: usize = 32;

/// Derive the per-message AES key: HKDF-SHA256(secret, salt, info = empty)
fn derive_key(secret: &[u8], salt: &[u8]) -> Result<[u8; AES_KEY_LEN]> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), secret);
    let mut key = [0u8; AES_KEY_LEN];
    hkdf.expand(&[], &mut key)
        .map_err(|e| CryptoError::EncryptionFailed {
            reason: format!("HKDF expansion failed: {}", e),
        })?;
    Ok(key)
}

fn cipher_for(secret: &[u8], salt: &[u8]) -> Result<Aes256Gcm> {
    let mut key = derive_key(secret, salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| CryptoError::EncryptionFailed {
        reason: format!("Failed to create AES-GCM cipher: {}", e),
    });
    key.fill(0);
    cipher
}

/// Encrypt with randomness from the process-wide provider
///
/// # Arguments
///
/// * `plaintext` - Data to encrypt
/// * `secret` - Input keying material (e.g. a triple-DH shared secret)
/// * `additional_data` - Bytes authenticated but not encrypted
pub fn encrypt(
    plaintext: &[u8],
    secret: &[u8],
    additional_data: Option<&[u8]>,
) -> Result<Ciphertext> {
    encrypt_with(provider(), plaintext, secret, additional_data)
}

/// Encrypt drawing salt and nonce from `provider`
pub fn encrypt_with(
    provider: &dyn CryptoProvider,
    plaintext: &[u8],
    secret: &[u8],
    additional_data: Option<&[u8]>,
) -> Result<Ciphertext> {
    let mut salt = [0u8; HKDF_SALT_LEN];
    let mut nonce = [0u8; GCM_NONCE_LEN];
    provider.fill_random(&mut salt)?;
    provider.fill_random(&mut nonce)?;

    let cipher = cipher_for(secret, &salt)?;
    let payload = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: additional_data.unwrap_or_default(),
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed {
            reason: format!("AES-GCM encryption failed: {}", e),
        })?;

    Ciphertext::new(&salt, &nonce, payload)
}

/// Decrypt and authenticate
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` for any authentication failure:
/// wrong secret, tampered payload/salt/nonce, or different additional data.
pub fn decrypt(
    ciphertext: &Ciphertext,
    secret: &[u8],
    additional_data: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let cipher = cipher_for(secret, ciphertext.hkdf_salt())?;
    cipher
        .decrypt(
            Nonce::from_slice(ciphertext.gcm_nonce()),
            Payload {
                msg: ciphertext.payload(),
                aad: additional_data.unwrap_or_default(),
            },
        )
        .map_err(|_| CryptoError::DecryptionFailed)
}
