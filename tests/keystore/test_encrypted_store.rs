// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for encrypted key bundle persistence

use std::sync::Arc;

use ethers::signers::LocalWallet;
use rand::rngs::OsRng;
use xmtp_core_crypto::config::{KeystoreConfig, XmtpEnv};
use xmtp_core_crypto::crypto::{PrivateKeyBundle, PrivateKeyBundleV1, PrivateKeyBundleV2, Signer};
use xmtp_core_crypto::keystore::{
    EncryptedKeyStore, EncryptedPrivateKeyBundleV1, FilePersistence, InMemoryPersistence,
    Persistence,
};

#[tokio::test]
async fn test_bundle_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = LocalWallet::new(&mut OsRng);
    let bundle: PrivateKeyBundle = PrivateKeyBundleV2::generate(&wallet).await.unwrap().into();

    let first = EncryptedKeyStore::new(
        Arc::new(wallet.clone()),
        Arc::new(FilePersistence::new(dir.path())),
        KeystoreConfig::default(),
    );
    first.store_private_key_bundle(&bundle).await.unwrap();
    drop(first);

    let second = EncryptedKeyStore::new(
        Arc::new(wallet),
        Arc::new(FilePersistence::new(dir.path())),
        KeystoreConfig::default(),
    );
    assert_eq!(second.load_private_key_bundle().await.unwrap(), Some(bundle));
}

#[tokio::test]
async fn test_blob_is_not_plaintext() {
    let wallet = LocalWallet::new(&mut OsRng);
    let address = Signer::get_address(&wallet).await.unwrap();
    let v2 = PrivateKeyBundleV2::generate(&wallet).await.unwrap();
    let bundle_bytes = PrivateKeyBundle::V2(v2.clone()).to_bytes().unwrap();

    let persistence = Arc::new(InMemoryPersistence::new());
    let store = EncryptedKeyStore::new(
        Arc::new(wallet),
        persistence.clone(),
        KeystoreConfig::default(),
    );
    store.store_private_key_bundle(&v2.into()).await.unwrap();

    let blob = persistence
        .get_item(&KeystoreConfig::default().storage_key(&address))
        .await
        .unwrap()
        .unwrap();
    let encrypted = EncryptedPrivateKeyBundleV1::from_bytes(&blob).unwrap();
    assert_eq!(encrypted.ciphertext().payload().len(), bundle_bytes.len() + 16);
    assert_ne!(encrypted.ciphertext().payload()[..bundle_bytes.len()], bundle_bytes[..]);
}

#[tokio::test]
async fn test_networks_are_isolated() {
    let wallet = LocalWallet::new(&mut OsRng);
    let bundle: PrivateKeyBundle = PrivateKeyBundleV2::generate(&wallet).await.unwrap().into();
    let persistence: Arc<dyn Persistence> = Arc::new(InMemoryPersistence::new());

    let dev = EncryptedKeyStore::new(
        Arc::new(wallet.clone()),
        persistence.clone(),
        KeystoreConfig::default(),
    );
    let production = EncryptedKeyStore::new(
        Arc::new(wallet),
        persistence,
        KeystoreConfig {
            env: XmtpEnv::Production,
            ..KeystoreConfig::default()
        },
    );

    dev.store_private_key_bundle(&bundle).await.unwrap();
    assert!(production.load_private_key_bundle().await.unwrap().is_none());
    assert_eq!(dev.load_private_key_bundle().await.unwrap(), Some(bundle));
}

#[tokio::test]
async fn test_v1_bundle_loads_and_upgrades() {
    let wallet = LocalWallet::new(&mut OsRng);
    let v1 = PrivateKeyBundleV1::generate(Some(&wallet)).await.unwrap();
    let store = EncryptedKeyStore::new(
        Arc::new(wallet),
        Arc::new(InMemoryPersistence::new()),
        KeystoreConfig::default(),
    );

    store
        .store_private_key_bundle(&PrivateKeyBundle::V1(v1.clone()))
        .await
        .unwrap();
    let loaded = store.load_private_key_bundle().await.unwrap().unwrap();

    assert_eq!(loaded.version(), 1);
    let upgraded = loaded.to_v2().unwrap();
    assert_eq!(
        upgraded.identity_key().public_key().to_legacy(),
        *v1.identity_key().public_key()
    );
}

#[tokio::test]
async fn test_restore_overwrites_previous_bundle() {
    let wallet = LocalWallet::new(&mut OsRng);
    let first: PrivateKeyBundle = PrivateKeyBundleV2::generate(&wallet).await.unwrap().into();
    let second: PrivateKeyBundle = PrivateKeyBundleV2::generate(&wallet).await.unwrap().into();
    let store = EncryptedKeyStore::new(
        Arc::new(wallet),
        Arc::new(InMemoryPersistence::new()),
        KeystoreConfig::default(),
    );

    store.store_private_key_bundle(&first).await.unwrap();
    store.store_private_key_bundle(&second).await.unwrap();
    assert_eq!(store.load_private_key_bundle().await.unwrap(), Some(second));
}
