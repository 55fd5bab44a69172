// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-256-GCM ciphertext with its HKDF salt
//!
//! **Layout**:
//! ```text
//! hkdf_salt (32 bytes) | gcm_nonce (12 bytes) | payload (ciphertext + 16-byte tag)
//! ```

use serde::{Deserialize, Serialize};

use super::error::{CryptoError, Result};

pub const HKDF_SALT_LEN: usize = 32;
pub const GCM_NONCE_LEN: usize = 12;
pub const GCM_TAG_LEN: usize = 16;

/// Output of [`encrypt`](super::encryption::encrypt)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CiphertextWire", into = "CiphertextWire")]
pub struct Ciphertext {
    hkdf_salt: [u8; HKDF_SALT_LEN],
    gcm_nonce: [u8; GCM_NONCE_LEN],
    payload: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct CiphertextWire {
    hkdf_salt: Vec<u8>,
    gcm_nonce: Vec<u8>,
    payload: Vec<u8>,
}

impl Ciphertext {
    /// Assemble from parts, enforcing exact salt/nonce lengths and a payload
    /// at least as long as the GCM tag
    pub fn new(hkdf_salt: &[u8], gcm_nonce: &[u8], payload: Vec<u8>) -> Result<Self> {
        let hkdf_salt: [u8; HKDF_SALT_LEN] = hkdf_salt.try_into().map_err(|_| {
            CryptoError::invalid_payload(
                "hkdf_salt",
                format!("expected {} bytes, got {}", HKDF_SALT_LEN, hkdf_salt.len()),
            )
        })?;
        let gcm_nonce: [u8; GCM_NONCE_LEN] = gcm_nonce.try_into().map_err(|_| {
            CryptoError::invalid_payload(
                "gcm_nonce",
                format!("expected {} bytes, got {}", GCM_NONCE_LEN, gcm_nonce.len()),
            )
        })?;
        if payload.len() < GCM_TAG_LEN {
            return Err(CryptoError::invalid_payload(
                "payload",
                format!(
                    "expected at least {} bytes, got {}",
                    GCM_TAG_LEN,
                    payload.len()
                ),
            ));
        }

        Ok(Self {
            hkdf_salt,
            gcm_nonce,
            payload,
        })
    }

    pub fn hkdf_salt(&self) -> &[u8; HKDF_SALT_LEN] {
        &self.hkdf_salt
    }

    pub fn gcm_nonce(&self) -> &[u8; GCM_NONCE_LEN] {
        &self.gcm_nonce
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("Ciphertext", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CryptoError::serialization("Ciphertext", e))
    }
}

impl TryFrom<CiphertextWire> for Ciphertext {
    type Error = CryptoError;

    fn try_from(wire: CiphertextWire) -> Result<Self> {
        Ciphertext::new(&wire.hkdf_salt, &wire.gcm_nonce, wire.payload)
    }
}

impl From<Ciphertext> for CiphertextWire {
    fn from(ciphertext: Ciphertext) -> Self {
        Self {
            hkdf_salt: ciphertext.hkdf_salt.to_vec(),
            gcm_nonce: ciphertext.gcm_nonce.to_vec(),
            payload: ciphertext.payload,
        }
    }
}
