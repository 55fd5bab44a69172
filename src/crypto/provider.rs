// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Provider
//!
//! The randomness source behind salts, nonces, key material and key
//! generation. An embedding application picks one at startup with
//! [`install_provider`]; until then (or if it never does) the operating
//! system RNG is used. Tests can pass a provider explicitly to the `*_with`
//! variants of the primitives instead of touching process state.

use std::sync::OnceLock;

use rand::rngs::OsRng;
use rand::RngCore;

use super::error::{CryptoError, Result};

/// Source of cryptographically secure random bytes
pub trait CryptoProvider: Send + Sync {
    /// Fill `dest` entirely with random bytes
    fn fill_random(&self, dest: &mut [u8]) -> Result<()>;
}

/// Operating system RNG (`getrandom` under the hood)
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRngProvider;

impl CryptoProvider for OsRngProvider {
    fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| CryptoError::EncryptionFailed {
                reason: format!("OS RNG failure: {}", e),
            })
    }
}

static PROVIDER: OnceLock<Box<dyn CryptoProvider>> = OnceLock::new();

/// Install the process-wide provider. Only the first call succeeds.
pub fn install_provider(provider: Box<dyn CryptoProvider>) -> Result<()> {
    PROVIDER
        .set(provider)
        .map_err(|_| CryptoError::ProviderAlreadyInstalled)?;
    tracing::info!("Crypto provider installed");
    Ok(())
}

/// The process-wide provider
pub fn provider() -> &'static dyn CryptoProvider {
    PROVIDER.get_or_init(|| Box::new(OsRngProvider)).as_ref()
}

/// `N` random bytes from the process-wide provider
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut out = [0u8; N];
    provider().fill_random(&mut out)?;
    Ok(out)
}
