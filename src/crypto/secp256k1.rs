// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! secp256k1 building blocks
//!
//! Validated point and scalar wrappers around `k256`, the full-point ECDH
//! used by the bundle triple-DH, and Ethereum address derivation (the same
//! Keccak-256 scheme wallets use).

use std::fmt;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey as K256PublicKey, SecretKey};
use tiny_keccak::{Hasher, Keccak};

use super::error::{CryptoError, Result};
use super::provider::CryptoProvider;

/// Length of an uncompressed SEC1 point: `0x04 || x || y`
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// Length of a secp256k1 secret scalar
pub const SECRET_KEY_LEN: usize = 32;

const UNCOMPRESSED_PREFIX: u8 = 0x04;
const MAX_KEYGEN_ATTEMPTS: usize = 8;

/// An uncompressed secp256k1 public point, checked to lie on the curve.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicPoint([u8; UNCOMPRESSED_POINT_LEN]);

impl PublicPoint {
    /// Parse 65 uncompressed bytes
    ///
    /// # Errors
    ///
    /// - length is not exactly 65
    /// - prefix byte is not `0x04`
    /// - bytes do not describe a point on the curve
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != UNCOMPRESSED_POINT_LEN {
            return Err(CryptoError::invalid_key(
                "secp256k1_uncompressed",
                format!(
                    "expected {} bytes, got {}",
                    UNCOMPRESSED_POINT_LEN,
                    bytes.len()
                ),
            ));
        }
        if bytes[0] != UNCOMPRESSED_PREFIX {
            return Err(CryptoError::invalid_key(
                "secp256k1_uncompressed",
                format!("expected prefix 0x04, got 0x{:02x}", bytes[0]),
            ));
        }
        K256PublicKey::from_sec1_bytes(bytes).map_err(|e| {
            CryptoError::invalid_key("secp256k1_uncompressed", format!("not on curve: {}", e))
        })?;

        let mut point = [0u8; UNCOMPRESSED_POINT_LEN];
        point.copy_from_slice(bytes);
        Ok(Self(point))
    }

    pub(crate) fn from_k256(key: &K256PublicKey) -> Result<Self> {
        Self::from_bytes(key.to_encoded_point(false).as_bytes())
    }

    pub(crate) fn to_k256(&self) -> Result<K256PublicKey> {
        K256PublicKey::from_sec1_bytes(&self.0).map_err(CryptoError::from)
    }

    /// Raw uncompressed bytes
    pub fn as_bytes(&self) -> &[u8; UNCOMPRESSED_POINT_LEN] {
        &self.0
    }

    /// EIP-55 checksummed Ethereum address of this point
    pub fn ethereum_address(&self) -> String {
        // Skip the 0x04 prefix, hash the remaining 64 bytes with Keccak-256
        let hash = keccak256(&self.0[1..]);
        checksum_address(&hash[12..])
    }
}

impl fmt::Display for PublicPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PublicPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicPoint({})", self)
    }
}

/// A secp256k1 secret scalar. `k256` zeroizes it on drop.
#[derive(Clone)]
pub struct SecretScalar {
    inner: SecretKey,
}

impl SecretScalar {
    /// Draw a fresh scalar from the given randomness source
    pub fn generate(provider: &dyn CryptoProvider) -> Result<Self> {
        let mut candidate = [0u8; SECRET_KEY_LEN];
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            provider.fill_random(&mut candidate)?;
            // Zero and values >= n are rejected by k256; draw again
            if let Ok(inner) = SecretKey::from_slice(&candidate) {
                candidate.fill(0);
                return Ok(Self { inner });
            }
        }
        candidate.fill(0);
        Err(CryptoError::invalid_key(
            "secp256k1_secret",
            "randomness source did not yield a valid scalar",
        ))
    }

    /// Parse a 32-byte big-endian scalar
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_LEN {
            return Err(CryptoError::invalid_key(
                "secp256k1_secret",
                format!("expected {} bytes, got {}", SECRET_KEY_LEN, bytes.len()),
            ));
        }
        let inner = SecretKey::from_slice(bytes)
            .map_err(|e| CryptoError::invalid_key("secp256k1_secret", e.to_string()))?;
        Ok(Self { inner })
    }

    /// Big-endian scalar bytes. Handle with care.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes().to_vec()
    }

    /// The matching public point
    pub fn public_point(&self) -> Result<PublicPoint> {
        PublicPoint::from_k256(&self.inner.public_key())
    }

    pub(crate) fn signing_key(&self) -> k256::ecdsa::SigningKey {
        k256::ecdsa::SigningKey::from(&self.inner)
    }
}

impl fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretScalar(<redacted>)")
    }
}

impl PartialEq for SecretScalar {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for SecretScalar {}

/// ECDH returning the full uncompressed shared point (65 bytes)
///
/// Both sides of an exchange land on the same point: `a·(b·G) == b·(a·G)`.
pub fn ecdh(secret: &SecretScalar, peer: &PublicPoint) -> Result<[u8; UNCOMPRESSED_POINT_LEN]> {
    let peer_key = peer.to_k256()?;
    let scalar = secret.inner.to_nonzero_scalar();
    let shared = (peer_key.to_projective() * *scalar).to_affine();
    let encoded = shared.to_encoded_point(false);

    <[u8; UNCOMPRESSED_POINT_LEN]>::try_from(encoded.as_bytes()).map_err(|_| {
        CryptoError::EncryptionFailed {
            reason: "ECDH produced the point at infinity".to_string(),
        }
    })
}

/// Keccak-256 digest
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut hash);
    hash
}

/// Normalise a hex wallet address (any case, with or without `0x`) to EIP-55
pub fn normalize_address(address: &str) -> Result<String> {
    let trimmed = address.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(hex_part)?;
    if bytes.len() != 20 {
        return Err(CryptoError::invalid_payload(
            "wallet_address",
            format!("expected 20 bytes, got {}", bytes.len()),
        ));
    }
    Ok(checksum_address(&bytes))
}

fn checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
