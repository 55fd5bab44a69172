// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod crypto;
pub mod invitation;
pub mod keystore;
pub mod version;

// Re-export main types
pub use config::{KeystoreConfig, XmtpEnv};
pub use crypto::{
    decode_private_key_bundle, decrypt, encrypt, install_provider, Ciphertext, CryptoError,
    CryptoProvider, PrivateKey, PrivateKeyBundle, PrivateKeyBundleV1, PrivateKeyBundleV2,
    PublicKey, PublicKeyBundle, Signature, SignedPrivateKey, SignedPublicKey,
    SignedPublicKeyBundle, Signer,
};
pub use invitation::{Envelope, InvitationV1, SealedInvitation, SealedInvitationV1};
pub use keystore::{EncryptedKeyStore, TopicKeyManager, TopicKeyRecord, TopicKeyStore};
