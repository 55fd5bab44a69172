// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! One error type for every operation in the core, grouped the way callers
//! branch on them:
//!
//! - **Structural**: `InvalidKey`, `InvalidPayload`, `InvalidSignature`,
//!   `Serialization`. Raised while constructing or decoding a value.
//! - **Trust**: `UntrustedPreKey`. The peer's pre-key is not signed by its
//!   identity key.
//! - **Lookup**: `NoMatchingPreKey`. A peer referenced a pre-key this bundle
//!   no longer holds; carries the key so the caller can re-publish.
//! - **Authentication**: `DecryptionFailed`. Deliberately carries no detail.
//! - **Registry**: `DuplicateTopic`, `TimestampMismatch`.
//! - **Collaborators**: `Signer`, `Storage`, `ProviderAlreadyInstalled`.
//!
//! ## Usage Example
//!
//! ```rust
//! use xmtp_core_crypto::crypto::CryptoError;
//!
//! fn check_topic(topic: &str) -> Result<(), CryptoError> {
//!     if topic.is_empty() {
//!         return Err(CryptoError::InvalidPayload {
//!             field: "topic".to_string(),
//!             reason: "must not be empty".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use super::secp256k1::PublicPoint;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Comprehensive error type for all cryptographic operations
#[derive(Debug, Clone, Error)]
pub enum CryptoError {
    /// Key bytes failed validation (wrong length, bad prefix, point not on curve)
    #[error("Invalid key ({key_type}): {reason}")]
    InvalidKey {
        /// Type of key that failed (e.g., "secp256k1_uncompressed", "identity_key")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },

    /// A decoded or constructed value violates a structural invariant
    #[error("Invalid payload field '{field}': {reason}")]
    InvalidPayload {
        /// Which field failed validation
        field: String,
        /// Specific failure reason
        reason: String,
    },

    /// Signature malformed, unrecoverable, or missing where one is required
    #[error("Invalid signature during {operation}: {reason}")]
    InvalidSignature {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// The peer's pre-key does not carry a valid signature from its identity key
    #[error("Peer pre-key signature invalid")]
    UntrustedPreKey,

    /// None of the retained pre-keys matches the one the peer referenced
    #[error("No matching pre-key found for {pre_key}")]
    NoMatchingPreKey {
        /// The public pre-key that was looked up
        pre_key: PublicPoint,
    },

    /// AEAD authentication failed. Never says why.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// AEAD encryption or key derivation failed
    #[error("Encryption failed: {reason}")]
    EncryptionFailed {
        /// Specific failure reason
        reason: String,
    },

    /// The topic is already registered with the topic key manager
    #[error("Topic {topic} is already registered")]
    DuplicateTopic {
        /// Topic that was re-added
        topic: String,
    },

    /// Sealed header and transport envelope disagree on the creation time
    #[error("Envelope and header timestamp mismatch: header {header_ns}, envelope {envelope_ns}")]
    TimestampMismatch {
        /// `created_ns` from the sealed header
        header_ns: u64,
        /// `timestamp_ns` from the envelope, as received
        envelope_ns: String,
    },

    /// Wire encoding or decoding failed
    #[error("Serialization of {type_name} failed: {reason}")]
    Serialization {
        /// Type being encoded or decoded
        type_name: String,
        /// Specific failure reason
        reason: String,
    },

    /// The external wallet signer failed
    #[error("Wallet signer error: {reason}")]
    Signer {
        /// Specific failure reason
        reason: String,
    },

    /// The external persistence backend failed
    #[error("Key storage error: {reason}")]
    Storage {
        /// Specific failure reason
        reason: String,
    },

    /// `install_provider` was called after a provider was already in place
    #[error("A crypto provider is already installed for this process")]
    ProviderAlreadyInstalled,
}

impl CryptoError {
    /// Shorthand for an `InvalidPayload` error
    pub fn invalid_payload(field: &str, reason: impl Into<String>) -> Self {
        CryptoError::InvalidPayload {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an `InvalidKey` error
    pub fn invalid_key(key_type: &str, reason: impl Into<String>) -> Self {
        CryptoError::InvalidKey {
            key_type: key_type.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn serialization(type_name: &str, err: impl std::fmt::Display) -> Self {
        CryptoError::Serialization {
            type_name: type_name.to_string(),
            reason: err.to_string(),
        }
    }
}

// Conversion from bincode errors (wire decoding)
impl From<bincode::Error> for CryptoError {
    fn from(err: bincode::Error) -> Self {
        CryptoError::Serialization {
            type_name: "unknown".to_string(),
            reason: format!("bincode error: {}", err),
        }
    }
}

// Conversion from hex decode errors
impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::InvalidPayload {
            field: "hex_field".to_string(),
            reason: format!("hex decode error: {}", err),
        }
    }
}

// Conversion from k256 errors (elliptic curve operations)
impl From<k256::elliptic_curve::Error> for CryptoError {
    fn from(err: k256::elliptic_curve::Error) -> Self {
        CryptoError::InvalidKey {
            key_type: "unknown".to_string(),
            reason: format!("k256 error: {}", err),
        }
    }
}

// Conversion from ECDSA errors
impl From<k256::ecdsa::Error> for CryptoError {
    fn from(err: k256::ecdsa::Error) -> Self {
        CryptoError::InvalidSignature {
            operation: "ecdsa".to_string(),
            reason: format!("k256 error: {}", err),
        }
    }
}
