// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Keystore
//!
//! - **Topic keys**: which symmetric key and counterparty belong to each conversation
//! - **Encrypted store**: persistence of the private key bundle under a wallet signature

pub mod encrypted_store;
pub mod shared;
pub mod topic_keys;

pub use encrypted_store::{
    EncryptedKeyStore, EncryptedPrivateKeyBundleV1, FilePersistence, InMemoryPersistence,
    Persistence,
};
pub use shared::TopicKeyStore;
pub use topic_keys::{EncryptionAlgorithm, TopicKeyManager, TopicKeyRecord};
