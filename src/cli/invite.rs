// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use sha2::{Digest, Sha256};

use super::WalletArgs;
use crate::crypto::key_bundle::SignedPublicKeyBundle;
use crate::invitation::{
    build_user_invite_topic, Envelope, InvitationContext, InvitationV1, SealedInvitation,
};
use crate::keystore::TopicKeyManager;

/// Arguments for invite command
#[derive(Args, Debug)]
pub struct InviteArgs {
    #[command(flatten)]
    pub wallet: WalletArgs,

    /// File holding the recipient's hex public bundle
    #[arg(long)]
    pub recipient_bundle: PathBuf,

    /// Application conversation id to attach as context
    #[arg(long)]
    pub conversation_id: Option<String>,

    /// Write the envelope JSON here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for open command
#[derive(Args, Debug)]
pub struct OpenArgs {
    #[command(flatten)]
    pub wallet: WalletArgs,

    /// Envelope JSON produced by `invite`
    #[arg(long)]
    pub envelope: PathBuf,
}

async fn read_public_bundle(path: &Path) -> Result<SignedPublicKeyBundle> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let bytes = hex::decode(text.trim()).context("Public bundle is not valid hex")?;
    Ok(SignedPublicKeyBundle::from_bytes(&bytes)?)
}

/// Short fingerprint of key material, safe to print
fn fingerprint(key_material: &[u8]) -> String {
    hex::encode(&Sha256::digest(key_material)[..8])
}

/// Seal a random invitation to the recipient and emit its envelope
pub async fn invite(args: InviteArgs) -> Result<()> {
    let sender = args.wallet.load_bundle().await?;
    let recipient = read_public_bundle(&args.recipient_bundle).await?;
    let recipient_address = recipient.wallet_signature_address()?;

    let context = args.conversation_id.map(|conversation_id| InvitationContext {
        conversation_id,
        ..Default::default()
    });
    let invitation = InvitationV1::create_random(context)?;
    let sealed = SealedInvitation::create_v1(&sender, &recipient, &invitation)?;
    let envelope = sealed.to_envelope(&build_user_invite_topic(&recipient_address))?;
    let json = serde_json::to_string_pretty(&envelope)?;

    eprintln!("📨 Invitation sealed for {}", recipient_address);
    eprintln!("   Topic: {}", invitation.topic());
    eprintln!("   Key:   {}", fingerprint(invitation.key_material()));

    match args.out {
        Some(path) => {
            tokio::fs::write(&path, json).await?;
            eprintln!("✅ Envelope written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Open an invitation envelope addressed to (or sent by) this wallet
pub async fn open(args: OpenArgs) -> Result<()> {
    let viewer = args.wallet.load_bundle().await?;
    let text = tokio::fs::read_to_string(&args.envelope)
        .await
        .with_context(|| format!("Failed to read {}", args.envelope.display()))?;
    let envelope: Envelope = serde_json::from_str(&text).context("Invalid envelope JSON")?;

    let sealed = SealedInvitation::from_envelope(&envelope)?;
    let mut topics = TopicKeyManager::new();
    let invitation = topics.add_sealed_invitation(&sealed, &viewer)?;
    let header = sealed.header();

    println!("✅ Invitation opened");
    println!("   Topic:     {}", invitation.topic());
    println!(
        "   Peer:      {}",
        header.counterparty(&viewer).wallet_signature_address()?
    );
    println!("   Created:   {}", header.created_ns());
    println!("   Key:       {}", fingerprint(invitation.key_material()));
    if let Some(context) = invitation.context() {
        println!("   Conversation: {}", context.conversation_id);
    }
    Ok(())
}
