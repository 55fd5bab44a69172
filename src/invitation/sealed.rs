// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sealed Invitations
//!
//! An [`InvitationV1`] encrypted for exactly two parties.
//!
//! **Format**:
//! ```text
//! header_bytes = SealedInvitationHeaderV1 { sender, recipient, created_ns }
//! ciphertext   = encrypt(invitation, triple_dh(sender, recipient), aad = header_bytes)
//! ```
//!
//! The header travels in the clear but is authenticated: changing any byte
//! of it breaks the GCM tag. Either party can open the invitation; the
//! viewer's identity key decides which side of the triple-DH it plays.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::invitation_v1::InvitationV1;
use crate::crypto::ciphertext::Ciphertext;
use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::error::{CryptoError, Result};
use crate::crypto::key_bundle::{PrivateKeyBundleV2, SignedPublicKeyBundle};
use crate::crypto::private_key::PrivateKeyMaterial;
use crate::crypto::public_key::SignedKeyMaterial;
use crate::crypto::secp256k1::PublicPoint;

/// Cleartext, authenticated part of a sealed invitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SealedInvitationHeaderV1Wire", into = "SealedInvitationHeaderV1Wire")]
pub struct SealedInvitationHeaderV1 {
    sender: SignedPublicKeyBundle,
    recipient: SignedPublicKeyBundle,
    created_ns: u64,
}

#[derive(Serialize, Deserialize)]
struct SealedInvitationHeaderV1Wire {
    sender: Option<SignedPublicKeyBundle>,
    recipient: Option<SignedPublicKeyBundle>,
    created_ns: u64,
}

impl SealedInvitationHeaderV1 {
    pub fn new(
        sender: SignedPublicKeyBundle,
        recipient: SignedPublicKeyBundle,
        created_ns: u64,
    ) -> Self {
        Self {
            sender,
            recipient,
            created_ns,
        }
    }

    pub fn sender(&self) -> &SignedPublicKeyBundle {
        &self.sender
    }

    pub fn recipient(&self) -> &SignedPublicKeyBundle {
        &self.recipient
    }

    pub fn created_ns(&self) -> u64 {
        self.created_ns
    }

    /// Is `viewer` the sender of this invitation?
    pub fn is_sender(&self, viewer: &PrivateKeyBundleV2) -> bool {
        viewer.identity_key().matches(self.sender.identity_key())
    }

    /// The party on the other side from `viewer`
    pub fn counterparty(&self, viewer: &PrivateKeyBundleV2) -> &SignedPublicKeyBundle {
        if self.is_sender(viewer) {
            &self.recipient
        } else {
            &self.sender
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| CryptoError::serialization("SealedInvitationHeaderV1", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| CryptoError::serialization("SealedInvitationHeaderV1", e))
    }
}

impl TryFrom<SealedInvitationHeaderV1Wire> for SealedInvitationHeaderV1 {
    type Error = CryptoError;

    fn try_from(wire: SealedInvitationHeaderV1Wire) -> Result<Self> {
        Ok(Self {
            sender: wire
                .sender
                .ok_or_else(|| CryptoError::invalid_payload("sender", "missing"))?,
            recipient: wire
                .recipient
                .ok_or_else(|| CryptoError::invalid_payload("recipient", "missing"))?,
            created_ns: wire.created_ns,
        })
    }
}

impl From<SealedInvitationHeaderV1> for SealedInvitationHeaderV1Wire {
    fn from(header: SealedInvitationHeaderV1) -> Self {
        Self {
            sender: Some(header.sender),
            recipient: Some(header.recipient),
            created_ns: header.created_ns,
        }
    }
}

/// Header bytes plus the invitation encrypted under them
///
/// The header is parsed once at construction. The first successful
/// [`get_invitation`](Self::get_invitation) is memoized per viewer identity.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "SealedInvitationV1Wire", into = "SealedInvitationV1Wire")]
pub struct SealedInvitationV1 {
    header_bytes: Vec<u8>,
    ciphertext: Ciphertext,
    header: SealedInvitationHeaderV1,
    invitation: OnceLock<(PublicPoint, InvitationV1)>,
}

#[derive(Serialize, Deserialize)]
struct SealedInvitationV1Wire {
    header_bytes: Vec<u8>,
    ciphertext: Option<Ciphertext>,
}

impl SealedInvitationV1 {
    /// # Errors
    ///
    /// - `header_bytes` is empty or does not decode as a header
    pub fn new(header_bytes: Vec<u8>, ciphertext: Ciphertext) -> Result<Self> {
        if header_bytes.is_empty() {
            return Err(CryptoError::invalid_payload("header_bytes", "must not be empty"));
        }
        let header = SealedInvitationHeaderV1::from_bytes(&header_bytes)?;
        Ok(Self {
            header_bytes,
            ciphertext,
            header,
            invitation: OnceLock::new(),
        })
    }

    /// Seal `invitation` from `sender` to `recipient`, timestamped now
    pub fn create_v1(
        sender: &PrivateKeyBundleV2,
        recipient: &SignedPublicKeyBundle,
        invitation: &InvitationV1,
    ) -> Result<Self> {
        Self::create_v1_at(sender, recipient, invitation, crate::crypto::now_ns())
    }

    /// Seal with an explicit creation time
    pub fn create_v1_at(
        sender: &PrivateKeyBundleV2,
        recipient: &SignedPublicKeyBundle,
        invitation: &InvitationV1,
        created_ns: u64,
    ) -> Result<Self> {
        let header =
            SealedInvitationHeaderV1::new(sender.get_public_key_bundle(), recipient.clone(), created_ns);
        let header_bytes = header.to_bytes()?;

        let secret =
            sender.shared_secret(recipient, sender.current_pre_key().public_key(), false)?;
        let ciphertext = encrypt(&invitation.to_bytes()?, &secret, Some(&header_bytes))?;

        info!(
            "📨 Sealed invitation for topic {} (sender {}, recipient {})",
            invitation.topic(),
            header.sender().identity_key().ethereum_address(),
            recipient.identity_key().ethereum_address()
        );

        let sealed = Self {
            header_bytes,
            ciphertext,
            header,
            invitation: OnceLock::new(),
        };
        let _ = sealed
            .invitation
            .set((*sender.identity_key().public_key().point(), invitation.clone()));
        Ok(sealed)
    }

    pub fn header(&self) -> &SealedInvitationHeaderV1 {
        &self.header
    }

    pub fn header_bytes(&self) -> &[u8] {
        &self.header_bytes
    }

    pub fn ciphertext(&self) -> &Ciphertext {
        &self.ciphertext
    }

    /// Decrypt the invitation as `viewer`, who must be the sender or the recipient
    ///
    /// # Errors
    ///
    /// - `UntrustedPreKey` if the other party's pre-key is not signed by its identity
    /// - `NoMatchingPreKey` if the viewer does not hold the referenced pre-key,
    ///   which includes any third party
    /// - `DecryptionFailed` for a tampered invitation
    pub fn get_invitation(&self, viewer: &PrivateKeyBundleV2) -> Result<InvitationV1> {
        let viewer_point = *viewer.identity_key().public_key().point();
        if let Some((cached_for, invitation)) = self.invitation.get() {
            if *cached_for == viewer_point {
                return Ok(invitation.clone());
            }
        }

        let header = &self.header;
        let secret = if header.is_sender(viewer) {
            viewer.shared_secret(header.recipient(), header.sender().pre_key(), false)?
        } else {
            viewer.shared_secret(header.sender(), header.recipient().pre_key(), true)?
        };

        let plaintext = decrypt(&self.ciphertext, &secret, Some(&self.header_bytes))?;
        let invitation = InvitationV1::from_bytes(&plaintext)?;
        debug!("Opened sealed invitation for topic {}", invitation.topic());

        let _ = self.invitation.set((viewer_point, invitation.clone()));
        Ok(invitation)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("SealedInvitationV1", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| CryptoError::serialization("SealedInvitationV1", e))
    }
}

impl PartialEq for SealedInvitationV1 {
    fn eq(&self, other: &Self) -> bool {
        self.header_bytes == other.header_bytes && self.ciphertext == other.ciphertext
    }
}

impl Eq for SealedInvitationV1 {}

impl fmt::Debug for SealedInvitationV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedInvitationV1")
            .field("header", &self.header)
            .field("ciphertext_len", &self.ciphertext.payload().len())
            .finish()
    }
}

impl TryFrom<SealedInvitationV1Wire> for SealedInvitationV1 {
    type Error = CryptoError;

    fn try_from(wire: SealedInvitationV1Wire) -> Result<Self> {
        let ciphertext = wire
            .ciphertext
            .ok_or_else(|| CryptoError::invalid_payload("ciphertext", "missing"))?;
        SealedInvitationV1::new(wire.header_bytes, ciphertext)
    }
}

impl From<SealedInvitationV1> for SealedInvitationV1Wire {
    fn from(sealed: SealedInvitationV1) -> Self {
        Self {
            header_bytes: sealed.header_bytes,
            ciphertext: Some(sealed.ciphertext),
        }
    }
}

/// Transport framing around a published message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub content_topic: String,
    pub timestamp_ns: String,
    #[serde(with = "hex")]
    pub message: Vec<u8>,
}

/// Every sealed invitation version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SealedInvitation {
    V1(SealedInvitationV1),
}

impl SealedInvitation {
    pub fn create_v1(
        sender: &PrivateKeyBundleV2,
        recipient: &SignedPublicKeyBundle,
        invitation: &InvitationV1,
    ) -> Result<Self> {
        SealedInvitationV1::create_v1(sender, recipient, invitation).map(SealedInvitation::V1)
    }

    pub fn v1(&self) -> &SealedInvitationV1 {
        match self {
            SealedInvitation::V1(sealed) => sealed,
        }
    }

    pub fn header(&self) -> &SealedInvitationHeaderV1 {
        self.v1().header()
    }

    pub fn get_invitation(&self, viewer: &PrivateKeyBundleV2) -> Result<InvitationV1> {
        self.v1().get_invitation(viewer)
    }

    /// Decode from an envelope whose timestamp must equal the header's `created_ns`
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        let sealed = Self::from_bytes(&envelope.message)?;
        let header_ns = sealed.header().created_ns();
        if envelope.timestamp_ns.parse::<u64>().ok() != Some(header_ns) {
            return Err(CryptoError::TimestampMismatch {
                header_ns,
                envelope_ns: envelope.timestamp_ns.clone(),
            });
        }
        Ok(sealed)
    }

    /// Frame for publishing on `content_topic`
    pub fn to_envelope(&self, content_topic: &str) -> Result<Envelope> {
        Ok(Envelope {
            content_topic: content_topic.to_string(),
            timestamp_ns: self.header().created_ns().to_string(),
            message: self.to_bytes()?,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CryptoError::serialization("SealedInvitation", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| CryptoError::serialization("SealedInvitation", e))
    }
}
