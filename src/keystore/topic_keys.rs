// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Topic Key Manager
//!
//! Indexes conversation keys two ways: by topic, and by the counterparty's
//! wallet address. Entries are only ever added; re-adding a topic is an
//! error so re-delivered invitations can be recognised and skipped.
//!
//! The manager has no locking of its own. Share it through
//! [`TopicKeyStore`](super::shared::TopicKeyStore).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::crypto::error::{CryptoError, Result};
use crate::crypto::key_bundle::{PrivateKeyBundleV2, SignedPublicKeyBundle};
use crate::crypto::secp256k1::normalize_address;
use crate::invitation::{InvitationV1, SealedInvitation};

/// Symmetric scheme a topic's key material is used with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
    Aes256GcmHkdfSha256,
}

/// Key material for one topic and the bundles allowed to sign on it
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicKeyRecord {
    pub key_material: Vec<u8>,
    pub algorithm: EncryptionAlgorithm,
    pub allowed_signers: Vec<SignedPublicKeyBundle>,
}

impl TopicKeyRecord {
    pub fn new(key_material: Vec<u8>, allowed_signers: Vec<SignedPublicKeyBundle>) -> Self {
        Self {
            key_material,
            algorithm: EncryptionAlgorithm::Aes256GcmHkdfSha256,
            allowed_signers,
        }
    }
}

impl std::fmt::Debug for TopicKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicKeyRecord")
            .field("key_material", &format_args!("<{} bytes>", self.key_material.len()))
            .field("algorithm", &self.algorithm)
            .field("allowed_signers", &self.allowed_signers.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
struct TopicEntry {
    topic: String,
    created_at: u64,
}

/// Topic → key record, and wallet address → topics
#[derive(Debug, Default)]
pub struct TopicKeyManager {
    topic_keys: HashMap<String, TopicKeyRecord>,
    dm_topics: HashMap<String, Vec<TopicEntry>>,
}

impl TopicKeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `topic` for the wallet behind `counterparty`
    ///
    /// # Errors
    ///
    /// - `DuplicateTopic` if `topic` is already registered; the existing
    ///   record is left untouched
    /// - the counterparty's identity key carries no recoverable wallet signature
    pub fn add_direct_message_topic(
        &mut self,
        topic: &str,
        record: TopicKeyRecord,
        counterparty: &SignedPublicKeyBundle,
        created_at: u64,
    ) -> Result<()> {
        if self.topic_keys.contains_key(topic) {
            warn!("⚠️  Topic {} already registered, ignoring", topic);
            return Err(CryptoError::DuplicateTopic {
                topic: topic.to_string(),
            });
        }

        let address = counterparty.wallet_signature_address()?;
        self.topic_keys.insert(topic.to_string(), record);
        self.dm_topics
            .entry(address.clone())
            .or_default()
            .push(TopicEntry {
                topic: topic.to_string(),
                created_at,
            });

        info!(
            "🔑 Topic key registered: {} (peer {}, total topics: {})",
            topic,
            address,
            self.topic_keys.len()
        );
        Ok(())
    }

    /// Open `sealed` as `viewer` and register its topic against the other party
    ///
    /// The header's `created_ns` becomes the registration time.
    pub fn add_sealed_invitation(
        &mut self,
        sealed: &SealedInvitation,
        viewer: &PrivateKeyBundleV2,
    ) -> Result<InvitationV1> {
        let invitation = sealed.get_invitation(viewer)?;
        let header = sealed.header();
        let record = TopicKeyRecord::new(
            invitation.key_material().to_vec(),
            vec![header.sender().clone(), header.recipient().clone()],
        );

        self.add_direct_message_topic(
            invitation.topic(),
            record,
            header.counterparty(viewer),
            header.created_ns(),
        )?;
        Ok(invitation)
    }

    pub fn get_by_topic(&self, topic: &str) -> Option<&TopicKeyRecord> {
        self.topic_keys.get(topic)
    }

    /// Most recently created topic with `address`; the earliest registered wins a tie
    pub fn get_latest_by_wallet_address(&self, address: &str) -> Option<&TopicKeyRecord> {
        let entries = self.entries_for(address)?;

        let mut latest: Option<&TopicEntry> = None;
        for entry in entries {
            match latest {
                Some(current) if entry.created_at <= current.created_at => {}
                _ => latest = Some(entry),
            }
        }

        latest.and_then(|entry| self.get_by_topic(&entry.topic))
    }

    /// Every topic shared with `address`, in registration order
    pub fn get_all_by_wallet_address(&self, address: &str) -> Vec<&TopicKeyRecord> {
        self.entries_for(address)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| self.get_by_topic(&entry.topic))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of registered topics
    pub fn len(&self) -> usize {
        self.topic_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topic_keys.is_empty()
    }

    fn entries_for(&self, address: &str) -> Option<&Vec<TopicEntry>> {
        let address = normalize_address(address).ok()?;
        self.dm_topics.get(&address)
    }
}
