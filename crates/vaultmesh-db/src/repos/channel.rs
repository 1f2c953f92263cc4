use std::sync::Arc;

use chrono::Utc;

use vaultmesh_types::{ChannelId, ChannelStatus, VaultId};

use crate::models::ChannelView;
use crate::store::Store;

pub struct ChannelRepo {
    store: Arc<Store>,
}

impl ChannelRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Creates the channel in `pending` status if absent; returns the
    /// existing row otherwise.
    pub async fn get_or_create(&self, vault_id: VaultId, counterparty: &str) -> ChannelView {
        let mut table = self.store.channels.write().await;
        let key = (vault_id, counterparty.to_string());
        if let Some(id) = table.by_vault_counterparty.get(&key) {
            return table.by_id.get(id).cloned().expect("index points at a live row");
        }
        let view = ChannelView {
            id: ChannelId::new(),
            vault_id,
            counterparty_address: counterparty.to_string(),
            status: ChannelStatus::Pending,
            secret_id: ChannelId::new().to_string(),
            min_difficulty: None,
            last_message_at: None,
        };
        table.by_vault_counterparty.insert(key, view.id);
        table.by_id.insert(view.id, view.clone());
        view
    }

    pub async fn find(&self, id: ChannelId) -> Option<ChannelView> {
        self.store.channels.read().await.by_id.get(&id).cloned()
    }

    pub async fn list_for_vault(&self, vault_id: VaultId) -> Vec<ChannelView> {
        self.store
            .channels
            .read()
            .await
            .by_id
            .values()
            .filter(|c| c.vault_id == vault_id)
            .cloned()
            .collect()
    }

    pub async fn update_status(&self, id: ChannelId, status: ChannelStatus) -> Option<ChannelView> {
        let mut table = self.store.channels.write().await;
        let view = table.by_id.get_mut(&id)?;
        view.status = status;
        Some(view.clone())
    }

    pub async fn update_min_difficulty(&self, id: ChannelId, min_difficulty: Option<u64>) -> Option<ChannelView> {
        let mut table = self.store.channels.write().await;
        let view = table.by_id.get_mut(&id)?;
        view.min_difficulty = min_difficulty;
        Some(view.clone())
    }

    pub async fn touch_last_message(&self, id: ChannelId) {
        let mut table = self.store.channels.write().await;
        if let Some(view) = table.by_id.get_mut(&id) {
            view.last_message_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_or_create_is_idempotent_and_starts_pending() {
        let repo = ChannelRepo::new(Arc::new(Store::new()));
        let vault_id = VaultId::new();
        let a = repo.get_or_create(vault_id, "alice@d1").await;
        assert_eq!(a.status, ChannelStatus::Pending);
        let b = repo.get_or_create(vault_id, "alice@d1").await;
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn all_status_transitions_are_writable() {
        let repo = ChannelRepo::new(Arc::new(Store::new()));
        let vault_id = VaultId::new();
        let channel = repo.get_or_create(vault_id, "bob@d2").await;

        for status in [ChannelStatus::Saved, ChannelStatus::Ignored, ChannelStatus::Pending] {
            let updated = repo.update_status(channel.id, status).await.unwrap();
            assert_eq!(updated.status, status);
        }
    }
}
