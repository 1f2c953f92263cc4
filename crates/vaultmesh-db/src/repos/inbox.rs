use std::sync::Arc;

use vaultmesh_types::{ChannelId, InboxMessageId, PowChallengeId, VaultId};

use crate::models::InboxMessage;
use crate::store::Store;

pub struct InboxRepo {
    store: Arc<Store>,
}

impl InboxRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Assigns `orderInChannel = max(existing)+1` and inserts, all under
    /// one write-lock acquisition keyed on `channelId`. If a row already
    /// exists for `(channelId, powChallengeId)` that row is returned
    /// unchanged instead, making repeated `sendMessage` calls idempotent.
    pub async fn insert_or_get_existing(
        &self,
        channel_id: ChannelId,
        pow_challenge_id: PowChallengeId,
        build: impl FnOnce(u64) -> InboxMessage,
    ) -> InboxMessage {
        let mut table = self.store.inbox.write().await;

        if let Some(existing_id) = table.idempotency.get(&(channel_id, pow_challenge_id)) {
            return table.by_id.get(existing_id).cloned().expect("index points at a live row");
        }

        let next_order = table.max_order_by_channel.get(&channel_id).copied().unwrap_or(0) + 1;
        let message = build(next_order);

        table.max_order_by_channel.insert(channel_id, next_order);
        table
            .idempotency
            .insert((channel_id, pow_challenge_id), message.id);
        table.by_channel.entry(channel_id).or_default().push(message.id);
        table.by_id.insert(message.id, message.clone());

        message
    }

    pub async fn list_for_channel(&self, channel_id: ChannelId) -> Vec<InboxMessage> {
        let table = self.store.inbox.read().await;
        table
            .by_channel
            .get(&channel_id)
            .into_iter()
            .flatten()
            .filter_map(|id| table.by_id.get(id).cloned())
            .collect()
    }

    pub async fn list_for_vault_in_status(
        &self,
        vault_id: VaultId,
        channel_ids_in_status: &[ChannelId],
    ) -> Vec<InboxMessage> {
        let table = self.store.inbox.read().await;
        table
            .by_id
            .values()
            .filter(|m| m.vault_id == vault_id && channel_ids_in_status.contains(&m.channel_id))
            .cloned()
            .collect()
    }

    /// Deletes only the ids among `ids` that are actually owned by
    /// `vault_id`; ids belonging to another vault (or not found at all) are
    /// silently skipped rather than deleted or erroring.
    pub async fn delete_many_for_vault(&self, vault_id: VaultId, ids: &[InboxMessageId]) {
        let mut table = self.store.inbox.write().await;
        for id in ids {
            let owned = table.by_id.get(id).is_some_and(|m| m.vault_id == vault_id);
            if !owned {
                continue;
            }
            if let Some(message) = table.by_id.remove(id) {
                if let Some(list) = table.by_channel.get_mut(&message.channel_id) {
                    list.retain(|existing| existing != id);
                }
                table
                    .idempotency
                    .retain(|_, existing| existing != id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn build_message(channel_id: ChannelId, vault_id: VaultId) -> impl FnOnce(u64) -> InboxMessage {
        move |order| InboxMessage {
            id: InboxMessageId::new(),
            vault_id,
            sender_address: "alice@d1".into(),
            recipient_address: "bob@d2".into(),
            channel_id,
            order_in_channel: order,
            encrypted_content: vec![1, 2, 3],
            sender_engagement_pub_key: [1u8; 33],
            recipient_engagement_pub_key: [2u8; 33],
            pow_challenge_id: PowChallengeId::new(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn order_in_channel_is_dense_and_increasing() {
        let repo = InboxRepo::new(Arc::new(Store::new()));
        let channel_id = ChannelId::new();
        let vault_id = VaultId::new();

        let m1 = repo
            .insert_or_get_existing(channel_id, PowChallengeId::new(), build_message(channel_id, vault_id))
            .await;
        let m2 = repo
            .insert_or_get_existing(channel_id, PowChallengeId::new(), build_message(channel_id, vault_id))
            .await;
        let m3 = repo
            .insert_or_get_existing(channel_id, PowChallengeId::new(), build_message(channel_id, vault_id))
            .await;

        assert_eq!([m1.order_in_channel, m2.order_in_channel, m3.order_in_channel], [1, 2, 3]);
    }

    #[tokio::test]
    async fn repeated_pow_id_does_not_duplicate() {
        let repo = InboxRepo::new(Arc::new(Store::new()));
        let channel_id = ChannelId::new();
        let vault_id = VaultId::new();
        let pow_id = PowChallengeId::new();

        let first = repo
            .insert_or_get_existing(channel_id, pow_id, build_message(channel_id, vault_id))
            .await;
        let second = repo
            .insert_or_get_existing(channel_id, pow_id, build_message(channel_id, vault_id))
            .await;

        assert_eq!(first.id, second.id);
        assert_eq!(repo.list_for_channel(channel_id).await.len(), 1);
    }

    #[tokio::test]
    async fn sequence_never_resets_after_deletion() {
        let repo = InboxRepo::new(Arc::new(Store::new()));
        let channel_id = ChannelId::new();
        let vault_id = VaultId::new();

        let m1 = repo
            .insert_or_get_existing(channel_id, PowChallengeId::new(), build_message(channel_id, vault_id))
            .await;
        let m2 = repo
            .insert_or_get_existing(channel_id, PowChallengeId::new(), build_message(channel_id, vault_id))
            .await;
        let m3 = repo
            .insert_or_get_existing(channel_id, PowChallengeId::new(), build_message(channel_id, vault_id))
            .await;

        repo.delete_many_for_vault(vault_id, &[m1.id, m2.id, m3.id]).await;
        assert_eq!(repo.list_for_channel(channel_id).await.len(), 0);

        let m4 = repo
            .insert_or_get_existing(channel_id, PowChallengeId::new(), build_message(channel_id, vault_id))
            .await;
        assert_eq!(m4.order_in_channel, 4);
    }

    #[tokio::test]
    async fn delete_ignores_ids_owned_by_another_vault() {
        let repo = InboxRepo::new(Arc::new(Store::new()));
        let channel_id = ChannelId::new();
        let vault_id = VaultId::new();
        let other_vault_id = VaultId::new();

        let mine = repo
            .insert_or_get_existing(channel_id, PowChallengeId::new(), build_message(channel_id, vault_id))
            .await;
        let theirs = repo
            .insert_or_get_existing(channel_id, PowChallengeId::new(), build_message(channel_id, other_vault_id))
            .await;

        repo.delete_many_for_vault(vault_id, &[mine.id, theirs.id]).await;

        let remaining = repo.list_for_channel(channel_id).await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, theirs.id);
    }
}
