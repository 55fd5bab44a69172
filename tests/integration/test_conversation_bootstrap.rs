// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end: two wallets bootstrap a conversation through a sealed invitation

use std::sync::Arc;

use ethers::signers::LocalWallet;
use rand::{rngs::OsRng, RngCore};
use xmtp_core_crypto::config::KeystoreConfig;
use xmtp_core_crypto::crypto::{
    decrypt, encrypt, PrivateKeyBundle, PrivateKeyBundleV2, SignedPublicKeyBundle, Signer,
};
use xmtp_core_crypto::invitation::{
    build_user_invite_topic, Envelope, InvitationV1, SealedInvitation,
};
use xmtp_core_crypto::keystore::{EncryptedKeyStore, InMemoryPersistence, TopicKeyStore};

#[tokio::test]
async fn test_alice_invites_bob() {
    let alice_wallet = LocalWallet::new(&mut OsRng);
    let bob_wallet = LocalWallet::new(&mut OsRng);
    let alice_address = Signer::get_address(&alice_wallet).await.unwrap();
    let bob_address = Signer::get_address(&bob_wallet).await.unwrap();

    let alice = PrivateKeyBundleV2::generate(&alice_wallet).await.unwrap();
    let bob = PrivateKeyBundleV2::generate(&bob_wallet).await.unwrap();

    // Bob publishes his public bundle; Alice only ever sees its bytes
    let bob_public =
        SignedPublicKeyBundle::from_bytes(&bob.get_public_key_bundle().to_bytes().unwrap())
            .unwrap();
    assert_eq!(bob_public.wallet_signature_address().unwrap(), bob_address);

    let mut key_material = vec![0u8; 32];
    OsRng.fill_bytes(&mut key_material);
    let invitation = InvitationV1::new("t", key_material.clone(), None, None).unwrap();

    let sealed = SealedInvitation::create_v1(&alice, &bob_public, &invitation).unwrap();
    let envelope = sealed
        .to_envelope(&build_user_invite_topic(&bob_address))
        .unwrap();
    let wire = serde_json::to_vec(&envelope).unwrap();

    // Bob's side
    let received: Envelope = serde_json::from_slice(&wire).unwrap();
    let received = SealedInvitation::from_envelope(&received).unwrap();
    let bob_keys = TopicKeyStore::new();
    let opened = bob_keys
        .add_sealed_invitation(&received, &bob)
        .await
        .unwrap();
    assert_eq!(opened.topic(), "t");

    let record = bob_keys.get_by_topic("t").await.unwrap();
    assert_eq!(record.key_material, key_material);
    assert_eq!(
        bob_keys
            .get_latest_by_wallet_address(&alice_address)
            .await
            .unwrap(),
        record
    );

    // Alice's side, from her own copy
    let alice_keys = TopicKeyStore::new();
    alice_keys
        .add_sealed_invitation(&sealed, &alice)
        .await
        .unwrap();
    let alice_record = alice_keys
        .get_latest_by_wallet_address(&bob_address)
        .await
        .unwrap();

    // Both ends now share the conversation key
    let message = encrypt(b"hi bob", &alice_record.key_material, None).unwrap();
    assert_eq!(
        decrypt(&message, &record.key_material, None).unwrap(),
        b"hi bob"
    );
}

#[tokio::test]
async fn test_bundles_reload_from_keystore_before_opening() {
    let alice_wallet = LocalWallet::new(&mut OsRng);
    let bob_wallet = LocalWallet::new(&mut OsRng);
    let alice = PrivateKeyBundleV2::generate(&alice_wallet).await.unwrap();
    let bob = PrivateKeyBundleV2::generate(&bob_wallet).await.unwrap();

    let bob_store = EncryptedKeyStore::new(
        Arc::new(bob_wallet),
        Arc::new(InMemoryPersistence::new()),
        KeystoreConfig::default(),
    );
    bob_store
        .store_private_key_bundle(&PrivateKeyBundle::V2(bob.clone()))
        .await
        .unwrap();

    let invitation = InvitationV1::create_random(None).unwrap();
    let sealed =
        SealedInvitation::create_v1(&alice, &bob.get_public_key_bundle(), &invitation).unwrap();
    let bytes = sealed.to_bytes().unwrap();

    // A restarted Bob knows only his wallet and the stored blob
    let reloaded = bob_store
        .load_private_key_bundle()
        .await
        .unwrap()
        .unwrap()
        .to_v2()
        .unwrap();
    let opened = SealedInvitation::from_bytes(&bytes)
        .unwrap()
        .get_invitation(&reloaded)
        .unwrap();
    assert_eq!(opened, invitation);
}
