//! Channel state machine and inbox↔vault handoff.

use vaultmesh_db::{ChannelRepo, InboxRepo};
use vaultmesh_types::{ChannelId, ChannelStatus, InboxMessageId, VaultId, VaultMeshError, VaultMeshResult};

pub const SERVER_MINIMUM_DIFFICULTY: u64 = 256;

pub struct ChannelManager {
    channels: ChannelRepo,
    inbox: InboxRepo,
}

impl ChannelManager {
    pub fn new(channels: ChannelRepo, inbox: InboxRepo) -> Self {
        Self { channels, inbox }
    }

    pub async fn get_or_create(&self, vault_id: VaultId, counterparty: &str) -> vaultmesh_db::models::ChannelView {
        self.channels.get_or_create(vault_id, counterparty).await
    }

    pub async fn list_for_vault(&self, vault_id: VaultId) -> Vec<vaultmesh_db::models::ChannelView> {
        self.channels.list_for_vault(vault_id).await
    }

    /// All named status transitions are allowed.
    pub async fn update_status(
        &self,
        vault_id: VaultId,
        channel_id: ChannelId,
        status: ChannelStatus,
    ) -> VaultMeshResult<vaultmesh_db::models::ChannelView> {
        let channel = self
            .channels
            .find(channel_id)
            .await
            .ok_or_else(|| VaultMeshError::NotFound("channel".to_string()))?;
        if channel.vault_id != vault_id {
            return Err(VaultMeshError::AuthInvalid);
        }
        self.channels
            .update_status(channel_id, status)
            .await
            .ok_or_else(|| VaultMeshError::NotFound("channel".to_string()))
    }

    pub async fn update_min_difficulty(
        &self,
        vault_id: VaultId,
        channel_id: ChannelId,
        min_difficulty: Option<u64>,
    ) -> VaultMeshResult<vaultmesh_db::models::ChannelView> {
        let channel = self
            .channels
            .find(channel_id)
            .await
            .ok_or_else(|| VaultMeshError::NotFound("channel".to_string()))?;
        if channel.vault_id != vault_id {
            return Err(VaultMeshError::AuthInvalid);
        }
        let clamped = min_difficulty.map(|d| d.max(SERVER_MINIMUM_DIFFICULTY));
        self.channels
            .update_min_difficulty(channel_id, clamped)
            .await
            .ok_or_else(|| VaultMeshError::NotFound("channel".to_string()))
    }

    /// Effective PoW difficulty for a `(recipient, sender)` pair, consulted
    /// at PoW issuance: `max(channel.minDifficulty, vault.defaultDifficulty,
    /// serverMinimum)`.
    pub async fn effective_difficulty(
        &self,
        vault_id: VaultId,
        counterparty: &str,
        vault_default_difficulty: u64,
    ) -> u64 {
        let channel = self.channels.get_or_create(vault_id, counterparty).await;
        let channel_min = channel.min_difficulty.unwrap_or(0);
        channel_min
            .max(vault_default_difficulty)
            .max(SERVER_MINIMUM_DIFFICULTY)
    }

    /// `getInboxMessagesForSync` — only channels in `saved` status.
    pub async fn get_inbox_messages_for_sync(&self, vault_id: VaultId) -> Vec<vaultmesh_db::models::InboxMessage> {
        let saved_channel_ids: Vec<ChannelId> = self
            .channels
            .list_for_vault(vault_id)
            .await
            .into_iter()
            .filter(|c| c.status == ChannelStatus::Saved)
            .map(|c| c.id)
            .collect();
        self.inbox.list_for_vault_in_status(vault_id, &saved_channel_ids).await
    }

    /// `deleteInboxMessages` — the only legitimate deletion path. Ids that
    /// do not belong to `vault_id` are silently dropped rather than
    /// deleted, so one vault can never delete another vault's inbox rows
    /// by guessing or reusing their ids.
    pub async fn delete_inbox_messages(&self, vault_id: VaultId, ids: &[InboxMessageId]) {
        self.inbox.delete_many_for_vault(vault_id, ids).await;
    }

    pub async fn get_channel_messages(
        &self,
        channel_id: ChannelId,
    ) -> Vec<vaultmesh_db::models::InboxMessage> {
        self.inbox.list_for_channel(channel_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vaultmesh_db::Store;

    fn manager() -> ChannelManager {
        let store = Arc::new(Store::new());
        ChannelManager::new(ChannelRepo::new(store.clone()), InboxRepo::new(store))
    }

    #[tokio::test]
    async fn min_difficulty_is_clamped_to_server_minimum() {
        let manager = manager();
        let vault_id = VaultId::new();
        let channel = manager.get_or_create(vault_id, "alice@d1").await;
        manager.update_min_difficulty(vault_id, channel.id, Some(1)).await.unwrap();

        let effective = manager.effective_difficulty(vault_id, "alice@d1", 256).await;
        assert_eq!(effective, SERVER_MINIMUM_DIFFICULTY);
    }

    #[tokio::test]
    async fn effective_difficulty_takes_the_max_of_all_floors() {
        let manager = manager();
        let vault_id = VaultId::new();
        let channel = manager.get_or_create(vault_id, "alice@d1").await;
        manager
            .update_min_difficulty(vault_id, channel.id, Some(10_000))
            .await
            .unwrap();

        let effective = manager.effective_difficulty(vault_id, "alice@d1", 512).await;
        assert_eq!(effective, 10_000);
    }

    #[tokio::test]
    async fn only_saved_channels_are_returned_for_sync() {
        let manager = manager();
        let vault_id = VaultId::new();
        let channel = manager.get_or_create(vault_id, "alice@d1").await;
        assert!(manager.get_inbox_messages_for_sync(vault_id).await.is_empty());

        manager.update_status(vault_id, channel.id, ChannelStatus::Saved).await.unwrap();
        assert!(manager.get_inbox_messages_for_sync(vault_id).await.is_empty());
    }

    #[tokio::test]
    async fn delete_inbox_messages_cannot_remove_another_vaults_rows() {
        let store = Arc::new(Store::new());
        let manager = ChannelManager::new(ChannelRepo::new(store.clone()), InboxRepo::new(store.clone()));
        let inbox = InboxRepo::new(store);

        let vault_id = VaultId::new();
        let other_vault_id = VaultId::new();
        let channel = manager.get_or_create(other_vault_id, "alice@d1").await;
        let theirs = inbox
            .insert_or_get_existing(channel.id, vaultmesh_types::PowChallengeId::new(), move |order| {
                vaultmesh_db::models::InboxMessage {
                    id: InboxMessageId::new(),
                    vault_id: other_vault_id,
                    sender_address: "alice@d1".into(),
                    recipient_address: "mallory@d2".into(),
                    channel_id: channel.id,
                    order_in_channel: order,
                    encrypted_content: vec![1],
                    sender_engagement_pub_key: [1u8; 33],
                    recipient_engagement_pub_key: [2u8; 33],
                    pow_challenge_id: vaultmesh_types::PowChallengeId::new(),
                    is_read: false,
                    created_at: chrono::Utc::now(),
                }
            })
            .await;

        manager.delete_inbox_messages(vault_id, &[theirs.id]).await;
        assert_eq!(manager.get_channel_messages(channel.id).await.len(), 1);
    }
}
