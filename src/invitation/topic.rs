// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Content topic names

/// `/xmtp/0/<name>/proto`
pub fn content_topic(name: &str) -> String {
    format!("/xmtp/0/{}/proto", name)
}

/// Topic of a V2 conversation, keyed by a random identifier
pub fn build_direct_message_topic_v2(random: &str) -> String {
    content_topic(&format!("m-{}", random))
}

/// Legacy V1 conversation topic; addresses sorted so both sides agree
pub fn build_direct_message_topic(sender: &str, recipient: &str) -> String {
    let mut members = [sender, recipient];
    members.sort_unstable();
    content_topic(&format!("dm-{}", members.join("-")))
}

/// Where sealed invitations addressed to `wallet_address` are published
pub fn build_user_invite_topic(wallet_address: &str) -> String {
    content_topic(&format!("invite-{}", wallet_address))
}

pub fn build_user_intro_topic(wallet_address: &str) -> String {
    content_topic(&format!("intro-{}", wallet_address))
}

/// Where a wallet publishes its public key bundle
pub fn build_user_contact_topic(wallet_address: &str) -> String {
    content_topic(&format!("contact-{}", wallet_address))
}
