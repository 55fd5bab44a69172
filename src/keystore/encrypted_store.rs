// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Encrypted Private Key Bundle Storage
//!
//! A private key bundle is persisted only as an [`EncryptedPrivateKeyBundleV1`]:
//!
//! ```text
//! wallet_pre_key = 32 random bytes, stored in the clear
//! secret         = wallet.sign_message(storage_sig_request_text(wallet_pre_key))
//! ciphertext     = encrypt(bundle bytes, secret)
//! ```
//!
//! Loading asks the wallet to sign the same text again. Wallet signatures
//! are deterministic (RFC 6979), so the same secret comes back.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::KeystoreConfig;
use crate::crypto::ciphertext::Ciphertext;
use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::error::{CryptoError, Result};
use crate::crypto::key_bundle::{decode_private_key_bundle, PrivateKeyBundle};
use crate::crypto::provider::random_bytes;
use crate::crypto::signer::{storage_sig_request_text, Signer};

/// Length of the random value the wallet signs to derive the storage secret
pub const WALLET_PRE_KEY_LEN: usize = 32;

/// Key/value backend holding opaque encrypted blobs
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set_item(&self, key: &str, value: Vec<u8>) -> Result<()>;
}

/// Process-local backend
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    items: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Persistence for InMemoryPersistence {
    async fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let items = self.items.read().await;
        Ok(items.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut items = self.items.write().await;
        items.insert(key.to_string(), value);
        Ok(())
    }
}

/// One file per key under `root`; key segments become directories
#[derive(Debug, Clone)]
pub struct FilePersistence {
    root: PathBuf,
}

impl FilePersistence {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(CryptoError::Storage {
                    reason: format!("invalid storage key: {}", key),
                });
            }
            path.push(segment);
        }
        Ok(path)
    }
}

#[async_trait]
impl Persistence for FilePersistence {
    async fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CryptoError::Storage {
                reason: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }

    async fn set_item(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CryptoError::Storage {
                    reason: format!("failed to create {}: {}", parent.display(), e),
                })?;
        }
        tokio::fs::write(&path, value)
            .await
            .map_err(|e| CryptoError::Storage {
                reason: format!("failed to write {}: {}", path.display(), e),
            })
    }
}

/// Stored form of a private key bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "EncryptedPrivateKeyBundleV1Wire",
    into = "EncryptedPrivateKeyBundleV1Wire"
)]
pub struct EncryptedPrivateKeyBundleV1 {
    wallet_pre_key: [u8; WALLET_PRE_KEY_LEN],
    ciphertext: Ciphertext,
}

#[derive(Serialize, Deserialize)]
struct EncryptedPrivateKeyBundleV1Wire {
    wallet_pre_key: Vec<u8>,
    ciphertext: Option<Ciphertext>,
}

impl EncryptedPrivateKeyBundleV1 {
    pub fn wallet_pre_key(&self) -> &[u8; WALLET_PRE_KEY_LEN] {
        &self.wallet_pre_key
    }

    pub fn ciphertext(&self) -> &Ciphertext {
        &self.ciphertext
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| CryptoError::serialization("EncryptedPrivateKeyBundleV1", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| CryptoError::serialization("EncryptedPrivateKeyBundleV1", e))
    }
}

impl TryFrom<EncryptedPrivateKeyBundleV1Wire> for EncryptedPrivateKeyBundleV1 {
    type Error = CryptoError;

    fn try_from(wire: EncryptedPrivateKeyBundleV1Wire) -> Result<Self> {
        let wallet_pre_key = <[u8; WALLET_PRE_KEY_LEN]>::try_from(wire.wallet_pre_key.as_slice())
            .map_err(|_| {
                CryptoError::invalid_payload(
                    "wallet_pre_key",
                    format!(
                        "expected {} bytes, got {}",
                        WALLET_PRE_KEY_LEN,
                        wire.wallet_pre_key.len()
                    ),
                )
            })?;
        let ciphertext = wire
            .ciphertext
            .ok_or_else(|| CryptoError::invalid_payload("ciphertext", "missing"))?;
        Ok(Self {
            wallet_pre_key,
            ciphertext,
        })
    }
}

impl From<EncryptedPrivateKeyBundleV1> for EncryptedPrivateKeyBundleV1Wire {
    fn from(bundle: EncryptedPrivateKeyBundleV1) -> Self {
        Self {
            wallet_pre_key: bundle.wallet_pre_key.to_vec(),
            ciphertext: Some(bundle.ciphertext),
        }
    }
}

/// Loads and stores a wallet's private key bundle, encrypted under a wallet signature
#[derive(Clone)]
pub struct EncryptedKeyStore {
    wallet: Arc<dyn Signer>,
    persistence: Arc<dyn Persistence>,
    config: KeystoreConfig,
}

impl EncryptedKeyStore {
    pub fn new(
        wallet: Arc<dyn Signer>,
        persistence: Arc<dyn Persistence>,
        config: KeystoreConfig,
    ) -> Self {
        Self {
            wallet,
            persistence,
            config,
        }
    }

    async fn storage_key(&self) -> Result<String> {
        let address = self.wallet.get_address().await?;
        Ok(self.config.storage_key(&address))
    }

    async fn storage_secret(&self, wallet_pre_key: &[u8]) -> Result<Vec<u8>> {
        let text = storage_sig_request_text(wallet_pre_key);
        self.wallet.sign_message(&text).await
    }

    /// The stored bundle, or `None` if this wallet has none yet
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed` if the blob was not encrypted for this wallet
    pub async fn load_private_key_bundle(&self) -> Result<Option<PrivateKeyBundle>> {
        let key = self.storage_key().await?;
        let Some(bytes) = self.persistence.get_item(&key).await? else {
            debug!("No stored key bundle at {}", key);
            return Ok(None);
        };

        let encrypted = EncryptedPrivateKeyBundleV1::from_bytes(&bytes)?;
        let secret = self.storage_secret(encrypted.wallet_pre_key()).await?;
        let plaintext = decrypt(encrypted.ciphertext(), &secret, None)?;
        let bundle = decode_private_key_bundle(&plaintext)?;

        info!("🔓 Loaded V{} key bundle from {}", bundle.version(), key);
        Ok(Some(bundle))
    }

    /// Encrypt `bundle` under a fresh wallet pre-key and persist it
    pub async fn store_private_key_bundle(&self, bundle: &PrivateKeyBundle) -> Result<()> {
        let key = self.storage_key().await?;
        let wallet_pre_key = random_bytes::<WALLET_PRE_KEY_LEN>()?;
        let secret = self.storage_secret(&wallet_pre_key).await?;

        let ciphertext = encrypt(&bundle.to_bytes()?, &secret, None)?;
        let encrypted = EncryptedPrivateKeyBundleV1 {
            wallet_pre_key,
            ciphertext,
        };
        self.persistence.set_item(&key, encrypted.to_bytes()?).await?;

        info!("🔐 Stored V{} key bundle at {}", bundle.version(), key);
        Ok(())
    }
}
