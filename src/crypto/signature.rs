// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDSA Recoverable Signatures
//!
//! A compact `r || s` signature plus one recovery bit. Two flavours share the
//! same layout:
//!
//! - **EcdsaCompact**: produced by a key in this core (identity key signing a
//!   pre-key, or a legacy wallet signature).
//! - **WalletEcdsaCompact**: produced by an external wallet over an EIP-191
//!   message.
//!
//! ## Wallet Format
//!
//! Wallets return 65 bytes: `r (32) || s (32) || v (1)` where `v` is 27/28
//! (Ethereum style) or 0/1. [`Signature::from_wallet_bytes`] normalises both.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use serde::{Deserialize, Serialize};

use super::error::{CryptoError, Result};
use super::secp256k1::PublicPoint;

/// Length of the compact `r || s` encoding
pub const SIGNATURE_BYTES_LEN: usize = 64;

/// Length of a wallet signature (`r || s || v`)
pub const WALLET_SIGNATURE_LEN: usize = 65;

/// Which party produced the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureKind {
    /// Signed by a key held in this core
    EcdsaCompact,
    /// Signed by an external wallet
    WalletEcdsaCompact,
}

/// Recoverable ECDSA signature over secp256k1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignatureWire", into = "SignatureWire")]
pub struct Signature {
    kind: SignatureKind,
    bytes: [u8; SIGNATURE_BYTES_LEN],
    recovery: u8,
}

#[derive(Serialize, Deserialize)]
struct SignatureWire {
    kind: SignatureKind,
    bytes: Vec<u8>,
    recovery: u32,
}

impl Signature {
    /// Build a signature, checking length and recovery range
    ///
    /// # Errors
    ///
    /// - `bytes` is not exactly 64 bytes
    /// - `recovery` is not 0 or 1
    pub fn new(kind: SignatureKind, bytes: &[u8], recovery: u32) -> Result<Self> {
        if bytes.len() != SIGNATURE_BYTES_LEN {
            return Err(CryptoError::InvalidSignature {
                operation: "signature_construction".to_string(),
                reason: format!(
                    "expected {} bytes, got {}",
                    SIGNATURE_BYTES_LEN,
                    bytes.len()
                ),
            });
        }
        if recovery > 1 {
            return Err(CryptoError::InvalidSignature {
                operation: "signature_construction".to_string(),
                reason: format!("recovery must be 0 or 1, got {}", recovery),
            });
        }

        let mut compact = [0u8; SIGNATURE_BYTES_LEN];
        compact.copy_from_slice(bytes);
        Ok(Self {
            kind,
            bytes: compact,
            recovery: recovery as u8,
        })
    }

    /// Signature made by a key held in this core
    pub fn ecdsa_compact(bytes: &[u8], recovery: u32) -> Result<Self> {
        Self::new(SignatureKind::EcdsaCompact, bytes, recovery)
    }

    /// Split a 65-byte wallet signature into `r || s` and the recovery bit
    pub fn from_wallet_bytes(signature: &[u8]) -> Result<Self> {
        if signature.len() != WALLET_SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignature {
                operation: "wallet_signature".to_string(),
                reason: format!(
                    "expected {} bytes, got {}",
                    WALLET_SIGNATURE_LEN,
                    signature.len()
                ),
            });
        }

        // Handle Ethereum-style recovery IDs (27/28) by normalizing to 0/1
        let mut v = signature[64];
        if v >= 27 {
            v -= 27;
        }
        Self::new(
            SignatureKind::WalletEcdsaCompact,
            &signature[..SIGNATURE_BYTES_LEN],
            u32::from(v),
        )
    }

    /// Ethereum-style 65 bytes with `v = 27 + recovery`
    pub fn to_wallet_bytes(&self) -> [u8; WALLET_SIGNATURE_LEN] {
        let mut out = [0u8; WALLET_SIGNATURE_LEN];
        out[..SIGNATURE_BYTES_LEN].copy_from_slice(&self.bytes);
        out[SIGNATURE_BYTES_LEN] = self.recovery + 27;
        out
    }

    /// Same signature bytes, relabelled
    pub fn with_kind(&self, kind: SignatureKind) -> Self {
        Self {
            kind,
            bytes: self.bytes,
            recovery: self.recovery,
        }
    }

    pub fn kind(&self) -> SignatureKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8; SIGNATURE_BYTES_LEN] {
        &self.bytes
    }

    pub fn recovery(&self) -> u8 {
        self.recovery
    }

    /// Recover the signer's public key from a digest
    ///
    /// Returns `None` when the signature does not yield a consistent point;
    /// callers treat that as a failed verification.
    pub fn get_public_key(&self, digest: &[u8]) -> Option<PublicPoint> {
        let mut signature = EcdsaSignature::from_slice(&self.bytes).ok()?;
        let mut recovery_id = RecoveryId::from_byte(self.recovery)?;

        // k256 only verifies low-S; flipping s also flips the parity of R.y
        if let Some(normalized) = signature.normalize_s() {
            signature = normalized;
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        }

        let verifying_key =
            VerifyingKey::recover_from_prehash(digest, &signature, recovery_id).ok()?;
        PublicPoint::from_k256(&k256::PublicKey::from(&verifying_key)).ok()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("Signature", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CryptoError::serialization("Signature", e))
    }
}

impl TryFrom<SignatureWire> for Signature {
    type Error = CryptoError;

    fn try_from(wire: SignatureWire) -> Result<Self> {
        Signature::new(wire.kind, &wire.bytes, wire.recovery)
    }
}

impl From<Signature> for SignatureWire {
    fn from(signature: Signature) -> Self {
        SignatureWire {
            kind: signature.kind,
            bytes: signature.bytes.to_vec(),
            recovery: u32::from(signature.recovery),
        }
    }
}
