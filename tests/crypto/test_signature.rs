// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for recoverable ECDSA signatures

use rand::{rngs::OsRng, RngCore};
use xmtp_core_crypto::crypto::{PrivateKey, Signature, SignatureKind, SignedKeyMaterial};

#[test]
fn test_signature_recovers_signer_for_random_digests() {
    let key = PrivateKey::generate().unwrap();

    for _ in 0..32 {
        let mut digest = [0u8; 32];
        OsRng.fill_bytes(&mut digest);

        let signature = key.sign(&digest).unwrap();
        assert!(signature.recovery() <= 1);
        assert_eq!(
            signature.get_public_key(&digest),
            Some(*key.public_key().point())
        );
    }
}

#[test]
fn test_recovery_with_wrong_digest_gives_other_key() {
    let key = PrivateKey::generate().unwrap();
    let signature = key.sign(&[7u8; 32]).unwrap();

    let recovered = signature.get_public_key(&[8u8; 32]);
    assert_ne!(recovered, Some(*key.public_key().point()));
}

#[test]
fn test_flipped_recovery_bit_does_not_recover_signer() {
    let key = PrivateKey::generate().unwrap();
    let digest = [3u8; 32];
    let signature = key.sign(&digest).unwrap();

    let flipped = Signature::new(
        SignatureKind::EcdsaCompact,
        signature.bytes(),
        u32::from(1 - signature.recovery()),
    )
    .unwrap();
    assert_ne!(flipped.get_public_key(&digest), Some(*key.public_key().point()));
}

#[test]
fn test_construction_validates_eagerly() {
    assert!(Signature::new(SignatureKind::EcdsaCompact, &[1u8; 65], 0).is_err());
    assert!(Signature::new(SignatureKind::WalletEcdsaCompact, &[1u8; 64], 7).is_err());
    assert!(Signature::from_wallet_bytes(&[1u8; 64]).is_err());
}

#[test]
fn test_signature_bytes_roundtrip() {
    let key = PrivateKey::generate().unwrap();
    let signature = key.sign(&[9u8; 32]).unwrap();
    let decoded = Signature::from_bytes(&signature.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, signature);
}
