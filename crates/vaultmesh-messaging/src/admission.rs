//! The three-layer inbound message admission pipeline.

use std::sync::Arc;

use vaultmesh_crypto::keys::verify as verify_signature;
use vaultmesh_db::{ChannelRepo, InboxRepo};
use vaultmesh_pow::{PowController, SolvedChallenge};
use vaultmesh_types::{
    BindingMismatch, ChannelId, InboxMessageId, VaultId, VaultMeshError, VaultMeshResult,
};
use vaultmesh_verify::CrossDomainVerifier;

use crate::engagement_keys::EngagementKeyStore;

pub struct GetCounterpartyEngagementKeyInput {
    pub recipient_vault_id: VaultId,
    pub recipient_address: String,
    pub sender_address: String,
    pub sender_pub_key: [u8; 33],
    pub pow_challenge_id: vaultmesh_types::PowChallengeId,
    pub solved_header: Vec<u8>,
    pub solved_hash: [u8; 32],
    pub signature: [u8; 64],
}

pub struct SendMessageInput {
    pub recipient_vault_id: VaultId,
    pub recipient_address: String,
    pub sender_address: String,
    pub encrypted_content: Vec<u8>,
    pub sender_engagement_pub_key: [u8; 33],
    pub recipient_engagement_pub_key: [u8; 33],
    pub pow_challenge_id: vaultmesh_types::PowChallengeId,
}

pub struct SendMessageOutput {
    pub message_id: InboxMessageId,
    pub order_in_channel: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub struct MessageAdmission {
    pow: Arc<PowController>,
    engagement_keys: EngagementKeyStore,
    cross_domain: Arc<dyn CrossDomainVerifier>,
    channels: ChannelRepo,
    inbox: InboxRepo,
    local_domain: String,
}

impl MessageAdmission {
    pub fn new(
        pow: Arc<PowController>,
        engagement_keys: EngagementKeyStore,
        cross_domain: Arc<dyn CrossDomainVerifier>,
        channels: ChannelRepo,
        inbox: InboxRepo,
        local_domain: String,
    ) -> Self {
        Self {
            pow,
            engagement_keys,
            cross_domain,
            channels,
            inbox,
            local_domain,
        }
    }

    /// `getCounterpartyEngagementKey` — layers 1 (PoW), 2 (signature), 3
    /// (cross-domain identity), then lazily creates the receive key.
    pub async fn get_counterparty_engagement_key(
        &self,
        input: GetCounterpartyEngagementKeyInput,
    ) -> VaultMeshResult<[u8; 33]> {
        // Layer 1: proof of work, bound to this exact channel context.
        let consumed = self
            .pow
            .consume(
                SolvedChallenge {
                    id: input.pow_challenge_id,
                    solved_header: input.solved_header,
                    claimed_hash: input.solved_hash,
                },
                &input.sender_address,
                &input.recipient_address,
                &input.sender_pub_key,
            )
            .await?;

        // Layer 2: signature over the hash the controller itself derived and
        // stamped, never the raw request field — a client can't sign over an
        // arbitrary value while presenting someone else's solved header.
        let solved_hash = consumed
            .solved_hash
            .ok_or_else(|| VaultMeshError::Internal("consumed challenge missing solved_hash".to_string()))?;
        if !verify_signature(&input.signature, &solved_hash, &input.sender_pub_key) {
            return Err(VaultMeshError::SignatureInvalid);
        }

        // Layer 3: cross-domain identity.
        let sender_domain = input
            .sender_address
            .split_once('@')
            .map(|(_, d)| d)
            .ok_or_else(|| VaultMeshError::ValidationFailed("malformed sender address".into()))?;

        let is_send_key = if sender_domain == self.local_domain {
            self.engagement_keys
                .verify_ownership(&input.sender_address, &input.sender_pub_key)
                .await
        } else {
            self.cross_domain
                .verify_engagement_key_ownership(&input.sender_address, &input.sender_pub_key)
                .await?
        };

        if !is_send_key {
            return Err(VaultMeshError::IdentityVerificationFailed);
        }

        let receive_key = self
            .engagement_keys
            .get_or_create_receive_key(input.recipient_vault_id, &input.sender_address, input.sender_pub_key)
            .await?;

        Ok(receive_key.engagement_pub_key)
    }

    /// `sendMessage` — requires the PoW was already consumed and bound by
    /// the admission call above, reusing the exact same bindings.
    pub async fn send_message(&self, input: SendMessageInput) -> VaultMeshResult<SendMessageOutput> {
        let challenge = self
            .pow
            .find(input.pow_challenge_id)
            .await
            .ok_or_else(|| VaultMeshError::NotFound("pow challenge".to_string()))?;

        if !challenge.is_consumed() {
            return Err(VaultMeshError::from(vaultmesh_types::PowFailure::Consumed));
        }
        if challenge.bound_sender.as_deref() != Some(input.sender_address.as_str()) {
            return Err(VaultMeshError::from(BindingMismatch::Sender));
        }
        if challenge.bound_recipient.as_deref() != Some(input.recipient_address.as_str()) {
            return Err(VaultMeshError::from(BindingMismatch::Recipient));
        }
        if challenge.bound_sender_pub_key != Some(input.sender_engagement_pub_key) {
            return Err(VaultMeshError::from(BindingMismatch::SenderPubKey));
        }

        let receive_key = self
            .engagement_keys
            .find_receive_key(
                input.recipient_vault_id,
                &input.sender_address,
                &input.sender_engagement_pub_key,
            )
            .await
            .ok_or_else(|| VaultMeshError::NotFound("receive key".to_string()))?;
        if receive_key.engagement_pub_key != input.recipient_engagement_pub_key {
            return Err(VaultMeshError::ValidationFailed(
                "recipient engagement key does not match the receive key created for this sender".into(),
            ));
        }

        let channel = self
            .channels
            .get_or_create(input.recipient_vault_id, &input.sender_address)
            .await;

        let channel_id: ChannelId = channel.id;
        let recipient_vault_id = input.recipient_vault_id;
        let sender_address = input.sender_address.clone();
        let recipient_address = input.recipient_address.clone();
        let sender_engagement_pub_key = input.sender_engagement_pub_key;
        let recipient_engagement_pub_key = input.recipient_engagement_pub_key;
        let encrypted_content = input.encrypted_content.clone();
        let pow_challenge_id = input.pow_challenge_id;

        let message = self
            .inbox
            .insert_or_get_existing(channel_id, pow_challenge_id, move |order| {
                vaultmesh_db::models::InboxMessage {
                    id: InboxMessageId::new(),
                    vault_id: recipient_vault_id,
                    sender_address,
                    recipient_address,
                    channel_id,
                    order_in_channel: order,
                    encrypted_content,
                    sender_engagement_pub_key,
                    recipient_engagement_pub_key,
                    pow_challenge_id,
                    is_read: false,
                    created_at: chrono::Utc::now(),
                }
            })
            .await;

        self.channels.touch_last_message(channel_id).await;

        Ok(SendMessageOutput {
            message_id: message.id,
            order_in_channel: message.order_in_channel,
            created_at: message.created_at,
        })
    }
}
