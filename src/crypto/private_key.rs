// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Private Keys
//!
//! A secret scalar, its creation time, and the cached public half. The
//! public half is always present and always matches the scalar; decoding
//! rejects bytes where it does not.
//!
//! ## Security Considerations
//!
//! - Secret bytes are never logged; `Debug` prints only the public point
//! - Nothing in this core persists a private key in cleartext. Storage goes
//!   through `keystore::EncryptedKeyStore`.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{CryptoError, Result};
use super::provider::{provider, CryptoProvider};
use super::public_key::{PublicKey, SignedKeyMaterial, SignedPublicKey, UnsignedPublicKey};
use super::secp256k1::{ecdh, PublicPoint, SecretScalar, UNCOMPRESSED_POINT_LEN};
use super::signature::Signature;

/// A secret key paired with its public key
pub trait PrivateKeyMaterial {
    type Public: SignedKeyMaterial;

    fn secret(&self) -> &SecretScalar;

    fn public(&self) -> &Self::Public;

    /// Raw ECDH with `peer`: the full 65-byte shared point
    fn shared_secret<K: SignedKeyMaterial + ?Sized>(
        &self,
        peer: &K,
    ) -> Result<[u8; UNCOMPRESSED_POINT_LEN]> {
        ecdh(self.secret(), peer.point())
    }

    /// Is `key` the public half of this key?
    fn matches<K: SignedKeyMaterial + ?Sized>(&self, key: &K) -> bool {
        self.public().point() == key.point()
    }
}

/// Recoverable ECDSA over a prehashed digest
fn sign_digest(secret: &SecretScalar, digest: &[u8]) -> Result<Signature> {
    let (signature, recovery_id) = secret
        .signing_key()
        .sign_prehash_recoverable(digest)
        .map_err(|e| CryptoError::InvalidSignature {
            operation: "sign".to_string(),
            reason: format!("Signing failed: {}", e),
        })?;
    Signature::ecdsa_compact(&signature.to_bytes(), u32::from(recovery_id.to_byte()))
}

fn check_public_half(secret: &SecretScalar, point: &PublicPoint) -> Result<()> {
    if secret.public_point()? != *point {
        return Err(CryptoError::invalid_key(
            "public_key",
            "public key does not match secret",
        ));
    }
    Ok(())
}

/// Legacy (V1) private key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PrivateKeyWire", into = "PrivateKeyWire")]
pub struct PrivateKey {
    created_ns: u64,
    secret: SecretScalar,
    public_key: PublicKey,
}

#[derive(Serialize, Deserialize)]
struct PrivateKeyWire {
    created_ns: u64,
    secp256k1: Vec<u8>,
    public_key: Option<PublicKey>,
}

impl PrivateKey {
    /// Fresh random key, timestamped now
    pub fn generate() -> Result<Self> {
        Self::generate_with(provider())
    }

    pub fn generate_with(provider: &dyn CryptoProvider) -> Result<Self> {
        let secret = SecretScalar::generate(provider)?;
        let created_ns = super::now_ns();
        let public_key = PublicKey::new(created_ns, secret.public_point()?);
        Ok(Self {
            created_ns,
            secret,
            public_key,
        })
    }

    pub fn created_ns(&self) -> u64 {
        self.created_ns
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub(crate) fn public_key_mut(&mut self) -> &mut PublicKey {
        &mut self.public_key
    }

    /// Sign a 32-byte digest
    pub fn sign(&self, digest: &[u8]) -> Result<Signature> {
        sign_digest(&self.secret, digest)
    }

    /// Sign `sha256(key.bytes_to_sign())` and attach the signature to `key`
    pub fn sign_key(&self, mut key: PublicKey) -> Result<PublicKey> {
        let digest = Sha256::digest(key.bytes_to_sign()?);
        let signature = self.sign(digest.as_slice())?;
        key.set_signature(signature);
        Ok(key)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("PrivateKey", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CryptoError::serialization("PrivateKey", e))
    }
}

impl PrivateKeyMaterial for PrivateKey {
    type Public = PublicKey;

    fn secret(&self) -> &SecretScalar {
        &self.secret
    }

    fn public(&self) -> &PublicKey {
        &self.public_key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("created_ns", &self.created_ns)
            .field("public_key", self.public_key.point())
            .finish()
    }
}

impl TryFrom<PrivateKeyWire> for PrivateKey {
    type Error = CryptoError;

    fn try_from(wire: PrivateKeyWire) -> Result<Self> {
        let secret = SecretScalar::from_bytes(&wire.secp256k1)?;
        let public_key = wire
            .public_key
            .ok_or_else(|| CryptoError::invalid_payload("public_key", "missing"))?;
        check_public_half(&secret, public_key.point())?;
        Ok(Self {
            created_ns: wire.created_ns,
            secret,
            public_key,
        })
    }
}

impl From<PrivateKey> for PrivateKeyWire {
    fn from(key: PrivateKey) -> Self {
        Self {
            created_ns: key.created_ns,
            secp256k1: key.secret.to_bytes(),
            public_key: Some(key.public_key),
        }
    }
}

/// V2 private key whose public half is a [`SignedPublicKey`]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignedPrivateKeyWire", into = "SignedPrivateKeyWire")]
pub struct SignedPrivateKey {
    created_ns: u64,
    secret: SecretScalar,
    public_key: SignedPublicKey,
}

#[derive(Serialize, Deserialize)]
struct SignedPrivateKeyWire {
    created_ns: u64,
    secp256k1: Vec<u8>,
    public_key: Option<SignedPublicKey>,
}

impl SignedPrivateKey {
    /// Fresh key whose public half is signed by `signer`
    pub fn generate_signed_by(signer: &SignedPrivateKey) -> Result<Self> {
        let secret = SecretScalar::generate(provider())?;
        let created_ns = super::now_ns();
        let unsigned = UnsignedPublicKey::new(created_ns, secret.public_point()?);
        let public_key = signer.sign_key(&unsigned)?;
        Ok(Self {
            created_ns,
            secret,
            public_key,
        })
    }

    /// Convert a signed legacy key; the signed bytes carry over unchanged
    pub fn from_legacy(key: &PrivateKey, signed_by_wallet: bool) -> Result<Self> {
        Ok(Self {
            created_ns: key.created_ns,
            secret: key.secret.clone(),
            public_key: SignedPublicKey::from_legacy(key.public_key(), signed_by_wallet)?,
        })
    }

    pub fn created_ns(&self) -> u64 {
        self.created_ns
    }

    pub fn public_key(&self) -> &SignedPublicKey {
        &self.public_key
    }

    pub fn sign(&self, digest: &[u8]) -> Result<Signature> {
        sign_digest(&self.secret, digest)
    }

    /// Sign `sha256(key_bytes)` and wrap the result as a [`SignedPublicKey`]
    pub fn sign_key(&self, key: &UnsignedPublicKey) -> Result<SignedPublicKey> {
        let key_bytes = key.to_bytes()?;
        let digest = Sha256::digest(&key_bytes);
        let signature = self.sign(digest.as_slice())?;
        SignedPublicKey::new(key_bytes, signature)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("SignedPrivateKey", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| CryptoError::serialization("SignedPrivateKey", e))
    }
}

impl PrivateKeyMaterial for SignedPrivateKey {
    type Public = SignedPublicKey;

    fn secret(&self) -> &SecretScalar {
        &self.secret
    }

    fn public(&self) -> &SignedPublicKey {
        &self.public_key
    }
}

impl fmt::Debug for SignedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedPrivateKey")
            .field("created_ns", &self.created_ns)
            .field("public_key", self.public_key.point())
            .finish()
    }
}

impl TryFrom<SignedPrivateKeyWire> for SignedPrivateKey {
    type Error = CryptoError;

    fn try_from(wire: SignedPrivateKeyWire) -> Result<Self> {
        let secret = SecretScalar::from_bytes(&wire.secp256k1)?;
        let public_key = wire
            .public_key
            .ok_or_else(|| CryptoError::invalid_payload("public_key", "missing"))?;
        check_public_half(&secret, public_key.point())?;
        Ok(Self {
            created_ns: wire.created_ns,
            secret,
            public_key,
        })
    }
}

impl From<SignedPrivateKey> for SignedPrivateKeyWire {
    fn from(key: SignedPrivateKey) -> Self {
        Self {
            created_ns: key.created_ns,
            secp256k1: key.secret.to_bytes(),
            public_key: Some(key.public_key),
        }
    }
}
