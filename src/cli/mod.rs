// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod bundle;
pub mod invite;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use ethers::signers::LocalWallet;

use crate::config::KeystoreConfig;
use crate::crypto::key_bundle::PrivateKeyBundleV2;
use crate::keystore::{EncryptedKeyStore, FilePersistence};
use crate::version;

/// XMTP key bundle and invitation tool
#[derive(Parser, Debug)]
#[command(name = "xmtp-keys")]
#[command(version)]
#[command(about = "Generate key bundles and seal/open conversation invitations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a wallet-linked key bundle and store it encrypted
    Generate(bundle::GenerateArgs),

    /// Print the public half of the stored bundle
    PublicBundle(bundle::PublicBundleArgs),

    /// Seal a fresh invitation to a peer's public bundle
    Invite(invite::InviteArgs),

    /// Open a sealed invitation envelope
    Open(invite::OpenArgs),

    /// Print supported bundle and invitation versions as JSON
    Version,
}

/// Wallet and key store shared by every command
#[derive(Args, Debug, Clone)]
pub struct WalletArgs {
    /// Wallet private key, hex (can also be set via XMTP_WALLET_KEY env var)
    #[arg(long, env = "XMTP_WALLET_KEY", hide_env_values = true)]
    pub wallet_key: Option<String>,

    /// Directory holding encrypted key bundles
    #[arg(long, env = "XMTP_STORE_DIR", default_value = ".xmtp")]
    pub store_dir: PathBuf,
}

impl WalletArgs {
    pub fn wallet(&self) -> Result<LocalWallet> {
        let key = self.wallet_key.as_deref().ok_or_else(|| {
            anyhow!("Wallet key required. Use --wallet-key or set XMTP_WALLET_KEY env var")
        })?;
        let key = key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        key.parse::<LocalWallet>()
            .map_err(|e| anyhow!("Invalid wallet key: {}", e))
    }

    pub fn keystore(&self, wallet: LocalWallet) -> EncryptedKeyStore {
        EncryptedKeyStore::new(
            Arc::new(wallet),
            Arc::new(FilePersistence::new(&self.store_dir)),
            KeystoreConfig::from_env(),
        )
    }

    /// The stored bundle in V2 form
    pub async fn load_bundle(&self) -> Result<PrivateKeyBundleV2> {
        let store = self.keystore(self.wallet()?);
        let bundle = store
            .load_private_key_bundle()
            .await?
            .ok_or_else(|| anyhow!("No key bundle stored for this wallet. Run `generate` first"))?;
        bundle.to_v2().context("Stored bundle cannot be used as V2")
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate(args) => bundle::generate(args).await,
        Commands::PublicBundle(args) => bundle::public_bundle(args).await,
        Commands::Invite(args) => invite::invite(args).await,
        Commands::Open(args) => invite::open(args).await,
        Commands::Version => {
            println!("{}", serde_json::to_string_pretty(&version::get_version_info())?);
            Ok(())
        }
    }
}
