// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for topic key registration from sealed invitations

use ethers::signers::LocalWallet;
use rand::rngs::OsRng;
use xmtp_core_crypto::crypto::{CryptoError, PrivateKeyBundleV2};
use xmtp_core_crypto::invitation::{InvitationV1, SealedInvitation, SealedInvitationV1};
use xmtp_core_crypto::keystore::{
    EncryptionAlgorithm, TopicKeyManager, TopicKeyRecord, TopicKeyStore,
};

async fn bundle() -> PrivateKeyBundleV2 {
    PrivateKeyBundleV2::generate(&LocalWallet::new(&mut OsRng))
        .await
        .unwrap()
}

fn address_of(bundle: &PrivateKeyBundleV2) -> String {
    bundle
        .get_public_key_bundle()
        .wallet_signature_address()
        .unwrap()
}

#[tokio::test]
async fn test_both_sides_register_against_each_other() {
    let alice = bundle().await;
    let bob = bundle().await;
    let invitation = InvitationV1::create_random(None).unwrap();
    let sealed =
        SealedInvitation::create_v1(&alice, &bob.get_public_key_bundle(), &invitation).unwrap();

    let mut alice_keys = TopicKeyManager::new();
    let mut bob_keys = TopicKeyManager::new();
    alice_keys.add_sealed_invitation(&sealed, &alice).unwrap();
    bob_keys.add_sealed_invitation(&sealed, &bob).unwrap();

    // Each side files the topic under the other party's wallet
    let from_alice = alice_keys
        .get_latest_by_wallet_address(&address_of(&bob))
        .unwrap();
    let from_bob = bob_keys
        .get_latest_by_wallet_address(&address_of(&alice))
        .unwrap();
    assert_eq!(from_alice, from_bob);
    assert_eq!(from_bob.key_material, invitation.key_material());
    assert_eq!(from_bob.algorithm, EncryptionAlgorithm::Aes256GcmHkdfSha256);
    assert_eq!(from_bob.allowed_signers.len(), 2);

    assert!(alice_keys
        .get_latest_by_wallet_address(&address_of(&alice))
        .is_none());
}

#[tokio::test]
async fn test_redelivered_invitation_is_duplicate() {
    let alice = bundle().await;
    let bob = bundle().await;
    let invitation = InvitationV1::create_random(None).unwrap();
    let sealed =
        SealedInvitation::create_v1(&alice, &bob.get_public_key_bundle(), &invitation).unwrap();

    let mut keys = TopicKeyManager::new();
    keys.add_sealed_invitation(&sealed, &bob).unwrap();
    let again = keys.add_sealed_invitation(&sealed, &bob);

    assert!(matches!(again, Err(CryptoError::DuplicateTopic { .. })));
    assert_eq!(keys.len(), 1);
}

#[tokio::test]
async fn test_latest_follows_header_creation_time() {
    let alice = bundle().await;
    let bob = bundle().await;
    let recipient = bob.get_public_key_bundle();

    let older = InvitationV1::create_random(None).unwrap();
    let newer = InvitationV1::create_random(None).unwrap();
    let sealed_older = SealedInvitation::V1(
        SealedInvitationV1::create_v1_at(&alice, &recipient, &older, 1_000).unwrap(),
    );
    let sealed_newer = SealedInvitation::V1(
        SealedInvitationV1::create_v1_at(&alice, &recipient, &newer, 2_000).unwrap(),
    );

    // Delivery order does not matter, only created_ns
    let mut keys = TopicKeyManager::new();
    keys.add_sealed_invitation(&sealed_newer, &bob).unwrap();
    keys.add_sealed_invitation(&sealed_older, &bob).unwrap();

    let latest = keys
        .get_latest_by_wallet_address(&address_of(&alice))
        .unwrap();
    assert_eq!(latest.key_material, newer.key_material());
    assert_eq!(
        keys.get_all_by_wallet_address(&address_of(&alice)).len(),
        2
    );
}

#[tokio::test]
async fn test_unopenable_invitation_registers_nothing() {
    let alice = bundle().await;
    let bob = bundle().await;
    let charlie = bundle().await;
    let invitation = InvitationV1::create_random(None).unwrap();
    let sealed =
        SealedInvitation::create_v1(&alice, &bob.get_public_key_bundle(), &invitation).unwrap();

    let mut keys = TopicKeyManager::new();
    assert!(keys.add_sealed_invitation(&sealed, &charlie).is_err());
    assert!(keys.is_empty());
    assert!(keys.get_by_topic(invitation.topic()).is_none());
}

#[tokio::test]
async fn test_shared_store_serialises_concurrent_registration() {
    let alice = bundle().await;
    let bob = bundle().await;
    let invitation = InvitationV1::create_random(None).unwrap();
    let sealed =
        SealedInvitation::create_v1(&alice, &bob.get_public_key_bundle(), &invitation).unwrap();

    let store = TopicKeyStore::new();
    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        let sealed = sealed.clone();
        let bob = bob.clone();
        handles.push(tokio::spawn(async move {
            store.add_sealed_invitation(&sealed, &bob).await.is_ok()
        }));
    }

    let mut added = 0;
    for handle in handles {
        if handle.await.unwrap() {
            added += 1;
        }
    }
    assert_eq!(added, 1);
    assert_eq!(store.count().await, 1);
    assert_eq!(
        store.get_by_topic(invitation.topic()).await.unwrap(),
        TopicKeyRecord::new(
            invitation.key_material().to_vec(),
            vec![
                sealed.header().sender().clone(),
                sealed.header().recipient().clone()
            ],
        )
    );
}
