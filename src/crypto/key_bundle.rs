// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key Bundles
//!
//! A participant's long-lived identity key plus rotating pre-keys.
//!
//! | Version | Private | Public | Identity signed by |
//! |---|---|---|---|
//! | V1 (legacy) | [`PrivateKeyBundleV1`] | [`PublicKeyBundle`] | wallet, optional |
//! | V2 | [`PrivateKeyBundleV2`] | [`SignedPublicKeyBundle`] | wallet, required |
//!
//! Pre-keys are kept newest first. Index 0 is the current pre-key and the
//! one advertised in the public bundle; older ones are retained so earlier
//! invitations stay decryptable.
//!
//! Public bundles are rebuilt on every [`get_public_key_bundle`] call rather
//! than cached. `add_pre_key` takes `&mut self`, so rotation cannot interleave
//! with a read of the same bundle.
//!
//! [`get_public_key_bundle`]: PrivateKeyBundleV2::get_public_key_bundle

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::{CryptoError, Result};
use super::private_key::{PrivateKey, SignedPrivateKey};
use super::public_key::{PublicKey, SignedKeyMaterial, SignedPublicKey};
use super::shared_secret::{derive_shared_secret, BundleSecrets, PublicBundleMaterial};
use super::signer::Signer;

/// Public half of a V1 bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyBundleWire", into = "PublicKeyBundleWire")]
pub struct PublicKeyBundle {
    identity_key: PublicKey,
    pre_key: PublicKey,
}

#[derive(Serialize, Deserialize)]
struct PublicKeyBundleWire {
    identity_key: Option<PublicKey>,
    pre_key: Option<PublicKey>,
}

impl PublicKeyBundle {
    pub fn new(identity_key: PublicKey, pre_key: PublicKey) -> Self {
        Self {
            identity_key,
            pre_key,
        }
    }

    pub fn identity_key(&self) -> &PublicKey {
        &self.identity_key
    }

    pub fn pre_key(&self) -> &PublicKey {
        &self.pre_key
    }

    /// Wallet that vouched for the identity key
    pub fn wallet_signature_address(&self) -> Result<String> {
        self.identity_key.wallet_signature_address()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("PublicKeyBundle", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CryptoError::serialization("PublicKeyBundle", e))
    }
}

impl PublicBundleMaterial for PublicKeyBundle {
    type Key = PublicKey;

    fn identity_key(&self) -> &PublicKey {
        &self.identity_key
    }

    fn pre_key(&self) -> &PublicKey {
        &self.pre_key
    }
}

impl TryFrom<PublicKeyBundleWire> for PublicKeyBundle {
    type Error = CryptoError;

    fn try_from(wire: PublicKeyBundleWire) -> Result<Self> {
        Ok(Self {
            identity_key: wire
                .identity_key
                .ok_or_else(|| CryptoError::invalid_payload("identity_key", "missing"))?,
            pre_key: wire
                .pre_key
                .ok_or_else(|| CryptoError::invalid_payload("pre_key", "missing"))?,
        })
    }
}

impl From<PublicKeyBundle> for PublicKeyBundleWire {
    fn from(bundle: PublicKeyBundle) -> Self {
        Self {
            identity_key: Some(bundle.identity_key),
            pre_key: Some(bundle.pre_key),
        }
    }
}

/// Public half of a V2 bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignedPublicKeyBundleWire", into = "SignedPublicKeyBundleWire")]
pub struct SignedPublicKeyBundle {
    identity_key: SignedPublicKey,
    pre_key: SignedPublicKey,
}

#[derive(Serialize, Deserialize)]
struct SignedPublicKeyBundleWire {
    identity_key: Option<SignedPublicKey>,
    pre_key: Option<SignedPublicKey>,
}

impl SignedPublicKeyBundle {
    pub fn new(identity_key: SignedPublicKey, pre_key: SignedPublicKey) -> Self {
        Self {
            identity_key,
            pre_key,
        }
    }

    /// Convert a legacy bundle. Its identity signature came from a wallet.
    pub fn from_legacy(bundle: &PublicKeyBundle) -> Result<Self> {
        Ok(Self {
            identity_key: SignedPublicKey::from_legacy(bundle.identity_key(), true)?,
            pre_key: SignedPublicKey::from_legacy(bundle.pre_key(), false)?,
        })
    }

    pub fn to_legacy(&self) -> PublicKeyBundle {
        PublicKeyBundle::new(self.identity_key.to_legacy(), self.pre_key.to_legacy())
    }

    pub fn identity_key(&self) -> &SignedPublicKey {
        &self.identity_key
    }

    pub fn pre_key(&self) -> &SignedPublicKey {
        &self.pre_key
    }

    pub fn wallet_signature_address(&self) -> Result<String> {
        self.identity_key.wallet_signature_address()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| CryptoError::serialization("SignedPublicKeyBundle", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| CryptoError::serialization("SignedPublicKeyBundle", e))
    }
}

impl PublicBundleMaterial for SignedPublicKeyBundle {
    type Key = SignedPublicKey;

    fn identity_key(&self) -> &SignedPublicKey {
        &self.identity_key
    }

    fn pre_key(&self) -> &SignedPublicKey {
        &self.pre_key
    }
}

impl TryFrom<SignedPublicKeyBundleWire> for SignedPublicKeyBundle {
    type Error = CryptoError;

    fn try_from(wire: SignedPublicKeyBundleWire) -> Result<Self> {
        Ok(Self {
            identity_key: wire
                .identity_key
                .ok_or_else(|| CryptoError::invalid_payload("identity_key", "missing"))?,
            pre_key: wire
                .pre_key
                .ok_or_else(|| CryptoError::invalid_payload("pre_key", "missing"))?,
        })
    }
}

impl From<SignedPublicKeyBundle> for SignedPublicKeyBundleWire {
    fn from(bundle: SignedPublicKeyBundle) -> Self {
        Self {
            identity_key: Some(bundle.identity_key),
            pre_key: Some(bundle.pre_key),
        }
    }
}

fn require_pre_keys<T>(pre_keys: &[T]) -> Result<()> {
    if pre_keys.is_empty() {
        return Err(CryptoError::invalid_payload(
            "pre_keys",
            "bundle must hold at least one pre-key",
        ));
    }
    Ok(())
}

/// Legacy private bundle: identity key plus pre-keys, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PrivateKeyBundleV1Wire", into = "PrivateKeyBundleV1Wire")]
pub struct PrivateKeyBundleV1 {
    identity_key: PrivateKey,
    pre_keys: Vec<PrivateKey>,
}

#[derive(Serialize, Deserialize)]
struct PrivateKeyBundleV1Wire {
    identity_key: Option<PrivateKey>,
    pre_keys: Vec<PrivateKey>,
}

impl PrivateKeyBundleV1 {
    /// New identity and one signed pre-key
    ///
    /// With a wallet, the identity key is wallet-signed first.
    pub async fn generate(wallet: Option<&dyn Signer>) -> Result<Self> {
        let mut identity_key = PrivateKey::generate()?;
        if let Some(wallet) = wallet {
            identity_key.public_key_mut().sign_with_wallet(wallet).await?;
        }

        let mut bundle = Self {
            identity_key,
            pre_keys: Vec::new(),
        };
        bundle.add_pre_key()?;

        info!(
            "🔑 Generated V1 key bundle (identity {}, wallet-signed: {})",
            bundle.identity_key.public_key().ethereum_address(),
            wallet.is_some()
        );
        Ok(bundle)
    }

    pub fn new(identity_key: PrivateKey, pre_keys: Vec<PrivateKey>) -> Result<Self> {
        require_pre_keys(&pre_keys)?;
        Ok(Self {
            identity_key,
            pre_keys,
        })
    }

    /// Rotate: generate a pre-key signed by the identity key and make it current
    pub fn add_pre_key(&mut self) -> Result<()> {
        let mut pre_key = PrivateKey::generate()?;
        let signed = self.identity_key.sign_key(pre_key.public_key().clone())?;
        *pre_key.public_key_mut() = signed;
        self.pre_keys.insert(0, pre_key);
        debug!("Pre-key rotated (retained: {})", self.pre_keys.len());
        Ok(())
    }

    pub fn identity_key(&self) -> &PrivateKey {
        &self.identity_key
    }

    pub fn pre_keys(&self) -> &[PrivateKey] {
        &self.pre_keys
    }

    pub fn current_pre_key(&self) -> &PrivateKey {
        // Non-empty by construction
        &self.pre_keys[0]
    }

    pub fn get_public_key_bundle(&self) -> PublicKeyBundle {
        PublicKeyBundle::new(
            self.identity_key.public_key().clone(),
            self.current_pre_key().public_key().clone(),
        )
    }

    /// Triple-DH with `peer`, using the retained pre-key matching `my_pre_key`
    pub fn shared_secret<P, K>(&self, peer: &P, my_pre_key: &K, is_recipient: bool) -> Result<Vec<u8>>
    where
        P: PublicBundleMaterial + ?Sized,
        K: SignedKeyMaterial + ?Sized,
    {
        derive_shared_secret(self, peer, my_pre_key, is_recipient)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("PrivateKeyBundleV1", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| CryptoError::serialization("PrivateKeyBundleV1", e))
    }
}

impl BundleSecrets for PrivateKeyBundleV1 {
    type Key = PrivateKey;

    fn identity(&self) -> &PrivateKey {
        &self.identity_key
    }

    fn pre_keys(&self) -> &[PrivateKey] {
        &self.pre_keys
    }
}

impl TryFrom<PrivateKeyBundleV1Wire> for PrivateKeyBundleV1 {
    type Error = CryptoError;

    fn try_from(wire: PrivateKeyBundleV1Wire) -> Result<Self> {
        let identity_key = wire
            .identity_key
            .ok_or_else(|| CryptoError::invalid_payload("identity_key", "missing"))?;
        PrivateKeyBundleV1::new(identity_key, wire.pre_keys)
    }
}

impl From<PrivateKeyBundleV1> for PrivateKeyBundleV1Wire {
    fn from(bundle: PrivateKeyBundleV1) -> Self {
        Self {
            identity_key: Some(bundle.identity_key),
            pre_keys: bundle.pre_keys,
        }
    }
}

/// Wallet-linked private bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PrivateKeyBundleV2Wire", into = "PrivateKeyBundleV2Wire")]
pub struct PrivateKeyBundleV2 {
    identity_key: SignedPrivateKey,
    pre_keys: Vec<SignedPrivateKey>,
}

#[derive(Serialize, Deserialize)]
struct PrivateKeyBundleV2Wire {
    identity_key: Option<SignedPrivateKey>,
    pre_keys: Vec<SignedPrivateKey>,
}

impl PrivateKeyBundleV2 {
    /// Generate a wallet-signed identity and one pre-key
    pub async fn generate(wallet: &dyn Signer) -> Result<Self> {
        let legacy = PrivateKeyBundleV1::generate(Some(wallet)).await?;
        Self::from_legacy_bundle(&legacy)
    }

    /// Upgrade a V1 bundle whose identity key is wallet-signed
    pub fn from_legacy_bundle(bundle: &PrivateKeyBundleV1) -> Result<Self> {
        let identity_key = SignedPrivateKey::from_legacy(bundle.identity_key(), true)?;
        let pre_keys = bundle
            .pre_keys()
            .iter()
            .map(|pre_key| SignedPrivateKey::from_legacy(pre_key, false))
            .collect::<Result<Vec<_>>>()?;
        Self::new(identity_key, pre_keys)
    }

    pub fn new(identity_key: SignedPrivateKey, pre_keys: Vec<SignedPrivateKey>) -> Result<Self> {
        require_pre_keys(&pre_keys)?;
        Ok(Self {
            identity_key,
            pre_keys,
        })
    }

    pub fn add_pre_key(&mut self) -> Result<()> {
        let pre_key = SignedPrivateKey::generate_signed_by(&self.identity_key)?;
        self.pre_keys.insert(0, pre_key);
        debug!("Pre-key rotated (retained: {})", self.pre_keys.len());
        Ok(())
    }

    pub fn identity_key(&self) -> &SignedPrivateKey {
        &self.identity_key
    }

    pub fn pre_keys(&self) -> &[SignedPrivateKey] {
        &self.pre_keys
    }

    pub fn current_pre_key(&self) -> &SignedPrivateKey {
        // Non-empty by construction
        &self.pre_keys[0]
    }

    pub fn get_public_key_bundle(&self) -> SignedPublicKeyBundle {
        SignedPublicKeyBundle::new(
            self.identity_key.public_key().clone(),
            self.current_pre_key().public_key().clone(),
        )
    }

    pub fn shared_secret<P, K>(&self, peer: &P, my_pre_key: &K, is_recipient: bool) -> Result<Vec<u8>>
    where
        P: PublicBundleMaterial + ?Sized,
        K: SignedKeyMaterial + ?Sized,
    {
        derive_shared_secret(self, peer, my_pre_key, is_recipient)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("PrivateKeyBundleV2", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| CryptoError::serialization("PrivateKeyBundleV2", e))
    }
}

impl BundleSecrets for PrivateKeyBundleV2 {
    type Key = SignedPrivateKey;

    fn identity(&self) -> &SignedPrivateKey {
        &self.identity_key
    }

    fn pre_keys(&self) -> &[SignedPrivateKey] {
        &self.pre_keys
    }
}

impl TryFrom<PrivateKeyBundleV2Wire> for PrivateKeyBundleV2 {
    type Error = CryptoError;

    fn try_from(wire: PrivateKeyBundleV2Wire) -> Result<Self> {
        let identity_key = wire
            .identity_key
            .ok_or_else(|| CryptoError::invalid_payload("identity_key", "missing"))?;
        PrivateKeyBundleV2::new(identity_key, wire.pre_keys)
    }
}

impl From<PrivateKeyBundleV2> for PrivateKeyBundleV2Wire {
    fn from(bundle: PrivateKeyBundleV2) -> Self {
        Self {
            identity_key: Some(bundle.identity_key),
            pre_keys: bundle.pre_keys,
        }
    }
}

/// Either private bundle version, as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivateKeyBundle {
    V1(PrivateKeyBundleV1),
    V2(PrivateKeyBundleV2),
}

impl PrivateKeyBundle {
    pub fn version(&self) -> u8 {
        match self {
            PrivateKeyBundle::V1(_) => 1,
            PrivateKeyBundle::V2(_) => 2,
        }
    }

    /// The V2 form; V1 bundles are upgraded
    pub fn to_v2(&self) -> Result<PrivateKeyBundleV2> {
        match self {
            PrivateKeyBundle::V1(bundle) => PrivateKeyBundleV2::from_legacy_bundle(bundle),
            PrivateKeyBundle::V2(bundle) => Ok(bundle.clone()),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("PrivateKeyBundle", e))
    }
}

impl From<PrivateKeyBundleV1> for PrivateKeyBundle {
    fn from(bundle: PrivateKeyBundleV1) -> Self {
        PrivateKeyBundle::V1(bundle)
    }
}

impl From<PrivateKeyBundleV2> for PrivateKeyBundle {
    fn from(bundle: PrivateKeyBundleV2) -> Self {
        PrivateKeyBundle::V2(bundle)
    }
}

/// Decode stored bundle bytes, dispatching on the version tag
pub fn decode_private_key_bundle(bytes: &[u8]) -> Result<PrivateKeyBundle> {
    bincode::deserialize(bytes).map_err(|e| CryptoError::serialization("PrivateKeyBundle", e))
}
