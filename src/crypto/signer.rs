// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Wallet signer capability
//!
//! Anything that can report an address and `personal_sign` a text message
//! can anchor an identity. The request texts below are part of the protocol:
//! changing either one orphans every key bundle stored under the old text.
//!
//! ## Signature Format
//! - 65 bytes: r (32) + s (32) + v (1)
//! - Digest is EIP-191: `keccak256("\x19Ethereum Signed Message:\n" + len + message)`

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer as EthersSigner};

use super::error::{CryptoError, Result};
use super::secp256k1::keccak256;

/// Capability set of an external wallet
#[async_trait]
pub trait Signer: Send + Sync {
    /// Checksummed `0x` address of the wallet
    async fn get_address(&self) -> Result<String>;

    /// EIP-191 sign `message`, returning 65 bytes `r || s || v`
    async fn sign_message(&self, message: &str) -> Result<Vec<u8>>;
}

/// Text a wallet signs to vouch for an identity key
pub fn identity_sig_request_text(key_bytes: &[u8]) -> String {
    format!(
        "XMTP : Create Identity\n{}\n\nFor more info: https://xmtp.org/signatures/",
        hex::encode(key_bytes)
    )
}

/// Text a wallet signs to derive the secret protecting a stored key bundle
pub fn storage_sig_request_text(pre_key: &[u8]) -> String {
    format!(
        "XMTP : Enable Identity\n{}\n\nFor more info: https://xmtp.org/signatures/",
        hex::encode(pre_key)
    )
}

/// Create EIP-191 message hash
/// prefix = "\x19Ethereum Signed Message:\n" + len(message)
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut data = Vec::with_capacity(prefix.len() + message.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

#[async_trait]
impl Signer for LocalWallet {
    async fn get_address(&self) -> Result<String> {
        Ok(ethers::utils::to_checksum(&self.address(), None))
    }

    async fn sign_message(&self, message: &str) -> Result<Vec<u8>> {
        let signature = EthersSigner::sign_message(self, message)
            .await
            .map_err(|e| CryptoError::Signer {
                reason: e.to_string(),
            })?;
        Ok(signature.to_vec())
    }
}
