// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared Topic Key Storage
//!
//! A [`TopicKeyManager`] behind one async lock: registrations are serialized,
//! lookups run concurrently. Lookups hand back clones.

use std::sync::Arc;
use tokio::sync::RwLock;

use super::topic_keys::{TopicKeyManager, TopicKeyRecord};
use crate::crypto::error::Result;
use crate::crypto::key_bundle::{PrivateKeyBundleV2, SignedPublicKeyBundle};
use crate::invitation::{InvitationV1, SealedInvitation};

/// Cloneable handle to a shared topic key manager
///
/// # Example
///
/// ```ignore
/// let store = TopicKeyStore::new();
/// let invitation = store.add_sealed_invitation(&sealed, &my_bundle).await?;
/// let record = store.get_by_topic(invitation.topic()).await;
/// ```
#[derive(Clone, Default)]
pub struct TopicKeyStore {
    manager: Arc<RwLock<TopicKeyManager>>,
}

impl TopicKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_direct_message_topic(
        &self,
        topic: &str,
        record: TopicKeyRecord,
        counterparty: &SignedPublicKeyBundle,
        created_at: u64,
    ) -> Result<()> {
        let mut manager = self.manager.write().await;
        manager.add_direct_message_topic(topic, record, counterparty, created_at)
    }

    pub async fn add_sealed_invitation(
        &self,
        sealed: &SealedInvitation,
        viewer: &PrivateKeyBundleV2,
    ) -> Result<InvitationV1> {
        let mut manager = self.manager.write().await;
        manager.add_sealed_invitation(sealed, viewer)
    }

    pub async fn get_by_topic(&self, topic: &str) -> Option<TopicKeyRecord> {
        let manager = self.manager.read().await;
        manager.get_by_topic(topic).cloned()
    }

    pub async fn get_latest_by_wallet_address(&self, address: &str) -> Option<TopicKeyRecord> {
        let manager = self.manager.read().await;
        manager.get_latest_by_wallet_address(address).cloned()
    }

    pub async fn get_all_by_wallet_address(&self, address: &str) -> Vec<TopicKeyRecord> {
        let manager = self.manager.read().await;
        manager
            .get_all_by_wallet_address(address)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Number of registered topics
    pub async fn count(&self) -> usize {
        let manager = self.manager.read().await;
        manager.len()
    }
}
