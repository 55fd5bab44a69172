// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for the bundle-level triple-DH

use ethers::signers::LocalWallet;
use rand::rngs::OsRng;
use xmtp_core_crypto::crypto::{
    CryptoError, PrivateKey, PrivateKeyBundleV1, PrivateKeyBundleV2, PublicKeyBundle,
    SignedKeyMaterial,
};

async fn v2_bundle() -> PrivateKeyBundleV2 {
    PrivateKeyBundleV2::generate(&LocalWallet::new(&mut OsRng))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_v1_shared_secret_symmetry() {
    for _ in 0..3 {
        let alice = PrivateKeyBundleV1::generate(None).await.unwrap();
        let bob = PrivateKeyBundleV1::generate(None).await.unwrap();

        let alice_secret = alice
            .shared_secret(
                &bob.get_public_key_bundle(),
                alice.current_pre_key().public_key(),
                false,
            )
            .unwrap();
        let bob_secret = bob
            .shared_secret(
                &alice.get_public_key_bundle(),
                bob.current_pre_key().public_key(),
                true,
            )
            .unwrap();

        assert_eq!(alice_secret.len(), 195);
        assert_eq!(alice_secret, bob_secret);
    }
}

#[tokio::test]
async fn test_v2_shared_secret_symmetry() {
    let alice = v2_bundle().await;
    let bob = v2_bundle().await;

    let alice_secret = alice
        .shared_secret(
            &bob.get_public_key_bundle(),
            alice.current_pre_key().public_key(),
            false,
        )
        .unwrap();
    let bob_secret = bob
        .shared_secret(
            &alice.get_public_key_bundle(),
            bob.current_pre_key().public_key(),
            true,
        )
        .unwrap();

    assert_eq!(alice_secret, bob_secret);
}

#[tokio::test]
async fn test_roles_matter() {
    let alice = v2_bundle().await;
    let bob = v2_bundle().await;

    let alice_secret = alice
        .shared_secret(
            &bob.get_public_key_bundle(),
            alice.current_pre_key().public_key(),
            false,
        )
        .unwrap();
    // Both claiming to be initiator lands on a different concatenation
    let bob_as_initiator = bob
        .shared_secret(
            &alice.get_public_key_bundle(),
            bob.current_pre_key().public_key(),
            false,
        )
        .unwrap();

    assert_ne!(alice_secret, bob_as_initiator);
}

#[tokio::test]
async fn test_untrusted_pre_key_rejected() {
    let alice = PrivateKeyBundleV1::generate(None).await.unwrap();
    let bob = PrivateKeyBundleV1::generate(None).await.unwrap();

    // Bob's pre-key signed by someone other than Bob's identity
    let impostor = PrivateKey::generate().unwrap();
    let forged_pre_key = impostor
        .sign_key(bob.current_pre_key().public_key().clone())
        .unwrap();
    let forged = PublicKeyBundle::new(bob.identity_key().public_key().clone(), forged_pre_key);
    assert!(!forged.identity_key().verify_key(forged.pre_key()));

    let result = alice.shared_secret(&forged, alice.current_pre_key().public_key(), false);
    assert!(matches!(result, Err(CryptoError::UntrustedPreKey)));
}

#[tokio::test]
async fn test_unknown_local_pre_key_reports_key() {
    let alice = v2_bundle().await;
    let bob = v2_bundle().await;
    let stranger = v2_bundle().await;
    let missing = stranger.current_pre_key().public_key();

    let result = alice.shared_secret(&bob.get_public_key_bundle(), missing, false);
    match result {
        Err(CryptoError::NoMatchingPreKey { pre_key }) => assert_eq!(&pre_key, missing.point()),
        other => panic!("expected NoMatchingPreKey, got {:?}", other.map(|s| s.len())),
    }
}

#[tokio::test]
async fn test_retained_pre_key_still_derives_after_rotation() {
    let mut alice = v2_bundle().await;
    let bob = v2_bundle().await;

    let old_pre_key = alice.current_pre_key().public_key().clone();
    let before = alice
        .shared_secret(&bob.get_public_key_bundle(), &old_pre_key, false)
        .unwrap();

    alice.add_pre_key().unwrap();
    assert_ne!(alice.current_pre_key().public_key(), &old_pre_key);

    let after = alice
        .shared_secret(&bob.get_public_key_bundle(), &old_pre_key, false)
        .unwrap();
    assert_eq!(before, after);
}
