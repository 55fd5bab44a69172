// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for envelope framing of sealed invitations

use ethers::signers::LocalWallet;
use rand::rngs::OsRng;
use xmtp_core_crypto::crypto::{CryptoError, PrivateKeyBundleV2};
use xmtp_core_crypto::invitation::{
    build_user_invite_topic, Envelope, InvitationV1, SealedInvitation,
};

async fn sealed_for_bob() -> (PrivateKeyBundleV2, SealedInvitation) {
    let alice = PrivateKeyBundleV2::generate(&LocalWallet::new(&mut OsRng))
        .await
        .unwrap();
    let bob = PrivateKeyBundleV2::generate(&LocalWallet::new(&mut OsRng))
        .await
        .unwrap();
    let invitation = InvitationV1::create_random(None).unwrap();
    let sealed =
        SealedInvitation::create_v1(&alice, &bob.get_public_key_bundle(), &invitation).unwrap();
    (bob, sealed)
}

#[tokio::test]
async fn test_envelope_carries_header_timestamp() {
    let (bob, sealed) = sealed_for_bob().await;
    let bob_address = bob
        .get_public_key_bundle()
        .wallet_signature_address()
        .unwrap();
    let topic = build_user_invite_topic(&bob_address);

    let envelope = sealed.to_envelope(&topic).unwrap();
    assert_eq!(envelope.content_topic, topic);
    assert_eq!(
        envelope.timestamp_ns,
        sealed.header().created_ns().to_string()
    );

    let decoded = SealedInvitation::from_envelope(&envelope).unwrap();
    assert_eq!(decoded, sealed);
    assert!(decoded.get_invitation(&bob).is_ok());
}

#[tokio::test]
async fn test_mismatched_timestamp_rejected() {
    let (_, sealed) = sealed_for_bob().await;
    let mut envelope = sealed.to_envelope("/xmtp/0/invite-x/proto").unwrap();
    envelope.timestamp_ns = (sealed.header().created_ns() - 1).to_string();

    match SealedInvitation::from_envelope(&envelope) {
        Err(CryptoError::TimestampMismatch {
            header_ns,
            envelope_ns,
        }) => {
            assert_eq!(header_ns, sealed.header().created_ns());
            assert_eq!(envelope_ns, envelope.timestamp_ns);
        }
        other => panic!("expected TimestampMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unparseable_timestamp_rejected() {
    let (_, sealed) = sealed_for_bob().await;
    let mut envelope = sealed.to_envelope("/xmtp/0/invite-x/proto").unwrap();
    envelope.timestamp_ns = "not-a-number".to_string();

    assert!(matches!(
        SealedInvitation::from_envelope(&envelope),
        Err(CryptoError::TimestampMismatch { .. })
    ));
}

#[tokio::test]
async fn test_envelope_survives_json() {
    let (bob, sealed) = sealed_for_bob().await;
    let envelope = sealed.to_envelope("/xmtp/0/invite-x/proto").unwrap();

    let json = serde_json::to_string_pretty(&envelope).unwrap();
    assert!(json.contains("\"contentTopic\""));
    assert!(json.contains("\"timestampNs\""));

    let parsed: Envelope = serde_json::from_str(&json).unwrap();
    let decoded = SealedInvitation::from_envelope(&parsed).unwrap();
    assert!(decoded.get_invitation(&bob).is_ok());
}

#[test]
fn test_garbage_message_rejected() {
    let envelope = Envelope {
        content_topic: "/xmtp/0/invite-x/proto".to_string(),
        timestamp_ns: "1".to_string(),
        message: vec![0xff; 7],
    };
    assert!(SealedInvitation::from_envelope(&envelope).is_err());
}
