// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Invitation V1
//!
//! The plaintext inside a sealed invitation: which topic a conversation uses
//! and the symmetric key material protecting it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::topic::build_direct_message_topic_v2;
use crate::crypto::error::{CryptoError, Result};
use crate::crypto::provider::random_bytes;

/// Application-defined conversation identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationContext {
    pub conversation_id: String,
    pub metadata: BTreeMap<String, String>,
}

/// Proof that the recipient previously consented to the sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentProofPayload {
    pub signature: String,
    pub timestamp_ns: u64,
    pub payload_version: u32,
}

/// Topic and AES-256-GCM/HKDF-SHA256 key material for one conversation
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "InvitationV1Wire", into = "InvitationV1Wire")]
pub struct InvitationV1 {
    topic: String,
    context: Option<InvitationContext>,
    key_material: Vec<u8>,
    consent_proof: Option<ConsentProofPayload>,
}

#[derive(Serialize, Deserialize)]
struct Aes256GcmHkdfSha256 {
    key_material: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct InvitationV1Wire {
    topic: String,
    context: Option<InvitationContext>,
    aes256_gcm_hkdf_sha256: Option<Aes256GcmHkdfSha256>,
    consent_proof: Option<ConsentProofPayload>,
}

impl InvitationV1 {
    /// # Errors
    ///
    /// - `topic` is empty
    /// - `key_material` is empty
    pub fn new(
        topic: impl Into<String>,
        key_material: Vec<u8>,
        context: Option<InvitationContext>,
        consent_proof: Option<ConsentProofPayload>,
    ) -> Result<Self> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(CryptoError::invalid_payload("topic", "must not be empty"));
        }
        if key_material.is_empty() {
            return Err(CryptoError::invalid_payload("key_material", "must not be empty"));
        }
        Ok(Self {
            topic,
            context,
            key_material,
            consent_proof,
        })
    }

    /// Fresh random topic and 32 bytes of key material
    pub fn create_random(context: Option<InvitationContext>) -> Result<Self> {
        let topic = build_direct_message_topic_v2(&hex::encode(random_bytes::<32>()?));
        let key_material = random_bytes::<32>()?.to_vec();
        Self::new(topic, key_material, context, None)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn context(&self) -> Option<&InvitationContext> {
        self.context.as_ref()
    }

    pub fn key_material(&self) -> &[u8] {
        &self.key_material
    }

    pub fn consent_proof(&self) -> Option<&ConsentProofPayload> {
        self.consent_proof.as_ref()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("InvitationV1", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CryptoError::serialization("InvitationV1", e))
    }
}

// Key material stays out of logs
impl std::fmt::Debug for InvitationV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvitationV1")
            .field("topic", &self.topic)
            .field("context", &self.context)
            .field("key_material", &format_args!("<{} bytes>", self.key_material.len()))
            .field("consent_proof", &self.consent_proof)
            .finish()
    }
}

impl TryFrom<InvitationV1Wire> for InvitationV1 {
    type Error = CryptoError;

    fn try_from(wire: InvitationV1Wire) -> Result<Self> {
        let key_material = wire
            .aes256_gcm_hkdf_sha256
            .map(|encryption| encryption.key_material)
            .unwrap_or_default();
        InvitationV1::new(wire.topic, key_material, wire.context, wire.consent_proof)
    }
}

impl From<InvitationV1> for InvitationV1Wire {
    fn from(invitation: InvitationV1) -> Self {
        Self {
            topic: invitation.topic,
            context: invitation.context,
            aes256_gcm_hkdf_sha256: Some(Aes256GcmHkdfSha256 {
                key_material: invitation.key_material,
            }),
            consent_proof: invitation.consent_proof,
        }
    }
}
