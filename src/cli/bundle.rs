// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Args;
use tracing::info;

use super::WalletArgs;
use crate::crypto::key_bundle::{PrivateKeyBundle, PrivateKeyBundleV2};
use crate::crypto::signer::Signer;

/// Arguments for generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub wallet: WalletArgs,

    /// Replace a bundle already stored for this wallet
    #[arg(long)]
    pub force: bool,
}

/// Arguments for public-bundle command
#[derive(Args, Debug)]
pub struct PublicBundleArgs {
    #[command(flatten)]
    pub wallet: WalletArgs,

    /// Write the hex bundle here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Generate and store a new key bundle
pub async fn generate(args: GenerateArgs) -> Result<()> {
    let wallet = args.wallet.wallet()?;
    let address = Signer::get_address(&wallet).await?;
    let store = args.wallet.keystore(wallet.clone());

    if !args.force && store.load_private_key_bundle().await?.is_some() {
        return Err(anyhow!(
            "A key bundle is already stored for {}. Use --force to replace it",
            address
        ));
    }

    println!("🔑 Generating key bundle for {}...", address);
    let bundle = PrivateKeyBundleV2::generate(&wallet).await?;
    let public = bundle.get_public_key_bundle();
    store
        .store_private_key_bundle(&PrivateKeyBundle::V2(bundle))
        .await?;

    info!("Key bundle stored under {}", args.wallet.store_dir.display());
    println!("✅ Key bundle stored");
    println!("   Wallet:        {}", public.wallet_signature_address()?);
    println!("   Public bundle: {}", hex::encode(public.to_bytes()?));
    Ok(())
}

/// Print the public key bundle as hex
pub async fn public_bundle(args: PublicBundleArgs) -> Result<()> {
    let bundle = args.wallet.load_bundle().await?;
    let encoded = hex::encode(bundle.get_public_key_bundle().to_bytes()?);

    match args.out {
        Some(path) => {
            tokio::fs::write(&path, &encoded).await?;
            println!("✅ Public bundle written to {}", path.display());
        }
        None => println!("{}", encoded),
    }
    Ok(())
}
