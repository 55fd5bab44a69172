// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Public keys and their trust chain
//!
//! Two wire versions of the same thing, an uncompressed secp256k1 point with
//! a creation time and a signature vouching for it:
//!
//! - [`PublicKey`] (V1, legacy): the signature is optional and lives beside
//!   the unsigned fields.
//! - [`SignedPublicKey`] (V2): keeps the exact signed bytes (`key_bytes`)
//!   next to a mandatory signature.
//!
//! A V1 key converts to V2 by taking its `bytes_to_sign()` verbatim, so a
//! signature made over one form verifies over the other.
//!
//! Verification is shared through [`SignedKeyMaterial`]:
//! `verify_key` checks `sha256(key.bytes_to_sign())` against the key's
//! signature, exactly the digest `sign_key` signs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::error::{CryptoError, Result};
use super::secp256k1::{normalize_address, PublicPoint};
use super::signature::{Signature, SignatureKind};
use super::signer::{eip191_hash, identity_sig_request_text, Signer};

/// Anything carrying a public point and the signature over its signed bytes
pub trait SignedKeyMaterial {
    fn point(&self) -> &PublicPoint;

    /// Canonical bytes the signature covers
    fn bytes_to_sign(&self) -> Result<Vec<u8>>;

    fn key_signature(&self) -> Option<&Signature>;

    /// Does `signature` over `digest` come from this key?
    fn verify(&self, signature: &Signature, digest: &[u8]) -> bool {
        signature
            .get_public_key(digest)
            .map_or(false, |recovered| recovered == *self.point())
    }

    /// Did this key sign `key`?
    ///
    /// Only key-made (`EcdsaCompact`) signatures count; a wallet signature on
    /// `key` never makes this key its signer.
    fn verify_key<K: SignedKeyMaterial + ?Sized>(&self, key: &K) -> bool {
        let Some(signature) = key.key_signature() else {
            return false;
        };
        if signature.kind() != SignatureKind::EcdsaCompact {
            return false;
        }
        let Ok(bytes) = key.bytes_to_sign() else {
            return false;
        };
        let digest = Sha256::digest(&bytes);
        self.verify(signature, digest.as_slice())
    }

    /// Address of the wallet that signed this key's identity request text
    fn wallet_signature_address(&self) -> Result<String> {
        let signature = self.key_signature().ok_or_else(|| CryptoError::InvalidSignature {
            operation: "wallet_signature_address".to_string(),
            reason: "key is not signed".to_string(),
        })?;
        let text = identity_sig_request_text(&self.bytes_to_sign()?);
        let digest = eip191_hash(text.as_bytes());

        signature
            .get_public_key(&digest)
            .map(|signer| signer.ethereum_address())
            .ok_or_else(|| CryptoError::InvalidSignature {
                operation: "wallet_signature_address".to_string(),
                reason: "could not recover signer".to_string(),
            })
    }

    /// Address derived from this key's own point
    fn ethereum_address(&self) -> String {
        self.point().ethereum_address()
    }
}

/// The signed portion of a key: creation time and point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UnsignedPublicKeyWire", into = "UnsignedPublicKeyWire")]
pub struct UnsignedPublicKey {
    created_ns: u64,
    point: PublicPoint,
}

#[derive(Serialize, Deserialize)]
struct UnsignedPublicKeyWire {
    created_ns: u64,
    secp256k1_uncompressed: Vec<u8>,
}

impl UnsignedPublicKey {
    pub fn new(created_ns: u64, point: PublicPoint) -> Self {
        Self { created_ns, point }
    }

    pub fn created_ns(&self) -> u64 {
        self.created_ns
    }

    pub fn point(&self) -> &PublicPoint {
        &self.point
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("UnsignedPublicKey", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| CryptoError::serialization("UnsignedPublicKey", e))
    }
}

impl TryFrom<UnsignedPublicKeyWire> for UnsignedPublicKey {
    type Error = CryptoError;

    fn try_from(wire: UnsignedPublicKeyWire) -> Result<Self> {
        Ok(Self {
            created_ns: wire.created_ns,
            point: PublicPoint::from_bytes(&wire.secp256k1_uncompressed)?,
        })
    }
}

impl From<UnsignedPublicKey> for UnsignedPublicKeyWire {
    fn from(key: UnsignedPublicKey) -> Self {
        Self {
            created_ns: key.created_ns,
            secp256k1_uncompressed: key.point.as_bytes().to_vec(),
        }
    }
}

/// Legacy (V1) public key with an optional signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyWire", into = "PublicKeyWire")]
pub struct PublicKey {
    created_ns: u64,
    point: PublicPoint,
    signature: Option<Signature>,
}

#[derive(Serialize, Deserialize)]
struct PublicKeyWire {
    created_ns: u64,
    secp256k1_uncompressed: Vec<u8>,
    signature: Option<Signature>,
}

impl PublicKey {
    /// Unsigned key
    pub fn new(created_ns: u64, point: PublicPoint) -> Self {
        Self {
            created_ns,
            point,
            signature: None,
        }
    }

    pub fn created_ns(&self) -> u64 {
        self.created_ns
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub(crate) fn set_signature(&mut self, signature: Signature) {
        self.signature = Some(signature);
    }

    /// Have `wallet` vouch for this key as an identity
    ///
    /// The wallet signs the identity request text over `bytes_to_sign()`.
    /// The signature must recover to the wallet's own address.
    pub async fn sign_with_wallet(&mut self, wallet: &dyn Signer) -> Result<()> {
        let text = identity_sig_request_text(&self.bytes_to_sign()?);
        let raw = wallet.sign_message(&text).await?;

        // Legacy keys store wallet signatures in the compact slot
        let signature =
            Signature::from_wallet_bytes(&raw)?.with_kind(SignatureKind::EcdsaCompact);
        self.signature = Some(signature);

        let recovered = self.wallet_signature_address()?;
        let expected = normalize_address(&wallet.get_address().await?)?;
        if recovered != expected {
            self.signature = None;
            return Err(CryptoError::InvalidSignature {
                operation: "sign_with_wallet".to_string(),
                reason: format!("signature recovers to {}, wallet is {}", recovered, expected),
            });
        }

        debug!("Identity key signed by wallet {}", expected);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("PublicKey", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CryptoError::serialization("PublicKey", e))
    }
}

impl SignedKeyMaterial for PublicKey {
    fn point(&self) -> &PublicPoint {
        &self.point
    }

    fn bytes_to_sign(&self) -> Result<Vec<u8>> {
        UnsignedPublicKey::new(self.created_ns, self.point).to_bytes()
    }

    fn key_signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }
}

impl TryFrom<PublicKeyWire> for PublicKey {
    type Error = CryptoError;

    fn try_from(wire: PublicKeyWire) -> Result<Self> {
        Ok(Self {
            created_ns: wire.created_ns,
            point: PublicPoint::from_bytes(&wire.secp256k1_uncompressed)?,
            signature: wire.signature,
        })
    }
}

impl From<PublicKey> for PublicKeyWire {
    fn from(key: PublicKey) -> Self {
        Self {
            created_ns: key.created_ns,
            secp256k1_uncompressed: key.point.as_bytes().to_vec(),
            signature: key.signature,
        }
    }
}

/// V2 public key: the signed bytes kept verbatim, plus a mandatory signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignedPublicKeyWire", into = "SignedPublicKeyWire")]
pub struct SignedPublicKey {
    key_bytes: Vec<u8>,
    unsigned: UnsignedPublicKey,
    signature: Signature,
}

#[derive(Serialize, Deserialize)]
struct SignedPublicKeyWire {
    key_bytes: Vec<u8>,
    signature: Option<Signature>,
}

impl SignedPublicKey {
    /// Wrap already-signed key bytes
    pub fn new(key_bytes: Vec<u8>, signature: Signature) -> Result<Self> {
        let unsigned = UnsignedPublicKey::from_bytes(&key_bytes)?;
        Ok(Self {
            key_bytes,
            unsigned,
            signature,
        })
    }

    /// Convert a signed legacy key
    ///
    /// `signed_by_wallet` marks identity keys whose signature came from a
    /// wallet rather than another key.
    pub fn from_legacy(key: &PublicKey, signed_by_wallet: bool) -> Result<Self> {
        let signature = key.signature().ok_or_else(|| CryptoError::InvalidSignature {
            operation: "from_legacy".to_string(),
            reason: "legacy key is unsigned".to_string(),
        })?;
        let kind = if signed_by_wallet {
            SignatureKind::WalletEcdsaCompact
        } else {
            SignatureKind::EcdsaCompact
        };
        Self::new(key.bytes_to_sign()?, signature.with_kind(kind))
    }

    /// Back to the legacy shape; wallet signatures move to the compact slot
    pub fn to_legacy(&self) -> PublicKey {
        PublicKey {
            created_ns: self.unsigned.created_ns(),
            point: *self.unsigned.point(),
            signature: Some(self.signature.with_kind(SignatureKind::EcdsaCompact)),
        }
    }

    pub fn created_ns(&self) -> u64 {
        self.unsigned.created_ns()
    }

    pub fn key_bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("SignedPublicKey", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CryptoError::serialization("SignedPublicKey", e))
    }
}

impl SignedKeyMaterial for SignedPublicKey {
    fn point(&self) -> &PublicPoint {
        self.unsigned.point()
    }

    fn bytes_to_sign(&self) -> Result<Vec<u8>> {
        Ok(self.key_bytes.clone())
    }

    fn key_signature(&self) -> Option<&Signature> {
        Some(&self.signature)
    }
}

impl TryFrom<SignedPublicKeyWire> for SignedPublicKey {
    type Error = CryptoError;

    fn try_from(wire: SignedPublicKeyWire) -> Result<Self> {
        let signature = wire
            .signature
            .ok_or_else(|| CryptoError::invalid_payload("signature", "missing"))?;
        SignedPublicKey::new(wire.key_bytes, signature)
    }
}

impl From<SignedPublicKey> for SignedPublicKeyWire {
    fn from(key: SignedPublicKey) -> Self {
        Self {
            key_bytes: key.key_bytes,
            signature: Some(key.signature),
        }
    }
}
