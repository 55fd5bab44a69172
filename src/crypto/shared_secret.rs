// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Triple-DH shared secret
//!
//! Both bundle versions derive their shared secret here. The algorithm only
//! needs "an identity key and retained pre-keys" on our side and "an identity
//! key and a pre-key" on the peer's, so it is written once over
//! [`BundleSecrets`] and [`PublicBundleMaterial`].
//!
//! ## Protocol
//!
//! 1. The peer's pre-key must carry a valid signature from the peer's
//!    identity key, otherwise `UntrustedPreKey`.
//! 2. `my_pre_key` selects which retained pre-key to use, otherwise
//!    `NoMatchingPreKey`.
//! 3. Initiator: `dh1 = identity × peer_pre`, `dh2 = pre × peer_identity`.
//!    Recipient: `dh1 = pre × peer_identity`, `dh2 = identity × peer_pre`.
//!    Both: `dh3 = pre × peer_pre`.
//! 4. Output `dh1 || dh2 || dh3`, 195 bytes, unhashed. It is only ever used
//!    as HKDF input keying material.

use tracing::debug;

use super::error::{CryptoError, Result};
use super::private_key::PrivateKeyMaterial;
use super::public_key::SignedKeyMaterial;
use super::secp256k1::UNCOMPRESSED_POINT_LEN;

/// Length of the raw triple-DH output
pub const SHARED_SECRET_LEN: usize = 3 * UNCOMPRESSED_POINT_LEN;

/// Public half of a bundle: what a peer publishes
pub trait PublicBundleMaterial {
    type Key: SignedKeyMaterial;

    fn identity_key(&self) -> &Self::Key;

    fn pre_key(&self) -> &Self::Key;
}

/// Secret half of a bundle: identity plus retained pre-keys, newest first
pub trait BundleSecrets {
    type Key: PrivateKeyMaterial;

    fn identity(&self) -> &Self::Key;

    fn pre_keys(&self) -> &[Self::Key];

    /// The retained pre-key whose public half is `public`
    fn find_pre_key<K: SignedKeyMaterial + ?Sized>(&self, public: &K) -> Result<&Self::Key> {
        self.pre_keys()
            .iter()
            .find(|pre_key| pre_key.matches(public))
            .ok_or(CryptoError::NoMatchingPreKey {
                pre_key: *public.point(),
            })
    }
}

/// Derive the raw shared secret between `bundle` and `peer`
pub fn derive_shared_secret<B, P, K>(
    bundle: &B,
    peer: &P,
    my_pre_key: &K,
    is_recipient: bool,
) -> Result<Vec<u8>>
where
    B: BundleSecrets + ?Sized,
    P: PublicBundleMaterial + ?Sized,
    K: SignedKeyMaterial + ?Sized,
{
    if !peer.identity_key().verify_key(peer.pre_key()) {
        debug!(
            "Rejecting peer bundle: pre-key not signed by identity {}",
            peer.identity_key().point()
        );
        return Err(CryptoError::UntrustedPreKey);
    }

    let pre_key = bundle.find_pre_key(my_pre_key)?;
    let identity = bundle.identity();

    let (dh1, dh2) = if is_recipient {
        (
            pre_key.shared_secret(peer.identity_key())?,
            identity.shared_secret(peer.pre_key())?,
        )
    } else {
        (
            identity.shared_secret(peer.pre_key())?,
            pre_key.shared_secret(peer.identity_key())?,
        )
    };
    let dh3 = pre_key.shared_secret(peer.pre_key())?;

    let mut secret = Vec::with_capacity(SHARED_SECRET_LEN);
    secret.extend_from_slice(&dh1);
    secret.extend_from_slice(&dh2);
    secret.extend_from_slice(&dh3);
    Ok(secret)
}
