// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for private and public key bundles

use ethers::signers::LocalWallet;
use rand::rngs::OsRng;
use xmtp_core_crypto::crypto::{
    decode_private_key_bundle, PrivateKeyBundle, PrivateKeyBundleV1, PrivateKeyBundleV2,
    PublicKeyBundle, SignedKeyMaterial, SignedPublicKeyBundle, Signer,
};

#[tokio::test]
async fn test_v1_bundle_roundtrip_after_rotation() {
    let mut bundle = PrivateKeyBundleV1::generate(None).await.unwrap();
    bundle.add_pre_key().unwrap();
    bundle.add_pre_key().unwrap();

    let decoded = PrivateKeyBundleV1::from_bytes(&bundle.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, bundle);
    assert_eq!(decoded.pre_keys().len(), 3);
    assert_eq!(decoded.current_pre_key(), bundle.current_pre_key());
}

#[tokio::test]
async fn test_v2_bundle_roundtrip() {
    let wallet = LocalWallet::new(&mut OsRng);
    let mut bundle = PrivateKeyBundleV2::generate(&wallet).await.unwrap();
    bundle.add_pre_key().unwrap();

    let decoded = PrivateKeyBundleV2::from_bytes(&bundle.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, bundle);
}

#[tokio::test]
async fn test_every_pre_key_signed_by_identity() {
    let wallet = LocalWallet::new(&mut OsRng);
    let mut bundle = PrivateKeyBundleV2::generate(&wallet).await.unwrap();
    bundle.add_pre_key().unwrap();

    let identity = bundle.identity_key().public_key();
    for pre_key in bundle.pre_keys() {
        assert!(identity.verify_key(pre_key.public_key()));
    }
}

#[tokio::test]
async fn test_public_bundle_tracks_current_pre_key() {
    let mut bundle = PrivateKeyBundleV1::generate(None).await.unwrap();
    let before = bundle.get_public_key_bundle();

    bundle.add_pre_key().unwrap();
    let after = bundle.get_public_key_bundle();

    assert_eq!(before.identity_key(), after.identity_key());
    assert_ne!(before.pre_key(), after.pre_key());
    assert_eq!(after.pre_key(), bundle.current_pre_key().public_key());
}

#[tokio::test]
async fn test_public_bundles_roundtrip() {
    let wallet = LocalWallet::new(&mut OsRng);
    let v1 = PrivateKeyBundleV1::generate(Some(&wallet)).await.unwrap();
    let v2 = PrivateKeyBundleV2::from_legacy_bundle(&v1).unwrap();

    let legacy = v1.get_public_key_bundle();
    assert_eq!(
        PublicKeyBundle::from_bytes(&legacy.to_bytes().unwrap()).unwrap(),
        legacy
    );

    let signed = v2.get_public_key_bundle();
    assert_eq!(
        SignedPublicKeyBundle::from_bytes(&signed.to_bytes().unwrap()).unwrap(),
        signed
    );
    assert_eq!(SignedPublicKeyBundle::from_legacy(&legacy).unwrap(), signed);
}

#[tokio::test]
async fn test_bundle_wallet_address_matches_wallet() {
    let wallet = LocalWallet::new(&mut OsRng);
    let expected = Signer::get_address(&wallet).await.unwrap();

    let v1 = PrivateKeyBundleV1::generate(Some(&wallet)).await.unwrap();
    assert_eq!(
        v1.get_public_key_bundle().wallet_signature_address().unwrap(),
        expected
    );

    let v2 = PrivateKeyBundleV2::from_legacy_bundle(&v1).unwrap();
    assert_eq!(
        v2.get_public_key_bundle().wallet_signature_address().unwrap(),
        expected
    );
}

#[tokio::test]
async fn test_v1_without_wallet_cannot_upgrade() {
    let v1 = PrivateKeyBundleV1::generate(None).await.unwrap();
    assert!(PrivateKeyBundleV2::from_legacy_bundle(&v1).is_err());
}

#[tokio::test]
async fn test_decode_private_key_bundle_both_versions() {
    let wallet = LocalWallet::new(&mut OsRng);
    let v2 = PrivateKeyBundleV2::generate(&wallet).await.unwrap();
    let v1 = PrivateKeyBundleV1::generate(None).await.unwrap();

    let bytes = PrivateKeyBundle::V2(v2.clone()).to_bytes().unwrap();
    match decode_private_key_bundle(&bytes).unwrap() {
        PrivateKeyBundle::V2(decoded) => assert_eq!(decoded, v2),
        other => panic!("expected V2, got version {}", other.version()),
    }

    let bytes = PrivateKeyBundle::V1(v1.clone()).to_bytes().unwrap();
    match decode_private_key_bundle(&bytes).unwrap() {
        PrivateKeyBundle::V1(decoded) => assert_eq!(decoded, v1),
        other => panic!("expected V1, got version {}", other.version()),
    }

    assert!(decode_private_key_bundle(&[9, 0, 0, 0]).is_err());
}
