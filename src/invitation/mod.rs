// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Conversation invitations: the plaintext payload, its sealed form, and
//! the topic names they are published under.

pub mod invitation_v1;
pub mod sealed;
pub mod topic;

pub use invitation_v1::{ConsentProofPayload, InvitationContext, InvitationV1};
pub use sealed::{Envelope, SealedInvitation, SealedInvitationHeaderV1, SealedInvitationV1};
pub use topic::{
    build_direct_message_topic, build_direct_message_topic_v2, build_user_contact_topic,
    build_user_intro_topic, build_user_invite_topic, content_topic,
};
