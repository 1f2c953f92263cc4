use std::sync::Arc;

use vaultmesh_types::{EngagementKeyId, EngagementKeyPurpose, VaultId};

use crate::models::EngagementKey;
use crate::store::Store;

pub struct EngagementKeyRepo {
    store: Arc<Store>,
}

impl EngagementKeyRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn find(&self, id: EngagementKeyId) -> Option<EngagementKey> {
        self.store.engagement_keys.read().await.by_id.get(&id).cloned()
    }

    /// Upsert on the `(vaultId, counterpartyAddress, purpose=send)`
    /// uniqueness invariant: if a row already exists, it is
    /// returned unchanged and `row` is discarded.
    pub async fn get_or_create_send(&self, vault_id: VaultId, counterparty: &str, row: EngagementKey) -> EngagementKey {
        let mut table = self.store.engagement_keys.write().await;
        let key = (vault_id, counterparty.to_string());
        if let Some(id) = table.send_index.get(&key) {
            return table.by_id.get(id).cloned().expect("index points at a live row");
        }
        table.send_index.insert(key, row.id);
        table.by_id.insert(row.id, row.clone());
        row
    }

    /// Upsert on `(vaultId, counterpartyAddress, senderPubKey, purpose=receive)`.
    pub async fn get_or_create_receive(
        &self,
        vault_id: VaultId,
        counterparty: &str,
        sender_pub_key: [u8; 33],
        row: EngagementKey,
    ) -> EngagementKey {
        let mut table = self.store.engagement_keys.write().await;
        let key = (vault_id, counterparty.to_string(), sender_pub_key);
        if let Some(id) = table.receive_index.get(&key) {
            return table.by_id.get(id).cloned().expect("index points at a live row");
        }
        table.receive_index.insert(key, row.id);
        table.by_id.insert(row.id, row.clone());
        row
    }

    /// `verifyOwnership`: true iff `vault_id` (the vault the caller has
    /// already resolved `address` to) owns a `purpose = send` row with this
    /// `engagementPubKey`. Deliberately ignores `counterparty_address` —
    /// that field only records who the key was minted *for*, not who holds
    /// it, so it says nothing about ownership.
    pub async fn verify_send_ownership(&self, vault_id: VaultId, engagement_pub_key: &[u8; 33]) -> bool {
        let table = self.store.engagement_keys.read().await;
        table.by_id.values().any(|k| {
            k.purpose == EngagementKeyPurpose::Send
                && k.vault_id == vault_id
                && &k.engagement_pub_key == engagement_pub_key
        })
    }

    pub async fn insert_manual(&self, row: EngagementKey) -> EngagementKey {
        self.store
            .engagement_keys
            .write()
            .await
            .by_id
            .insert(row.id, row.clone());
        row
    }

    /// Looks up an existing receive key without creating one — used by
    /// `sendMessage`'s binding check, which must fail rather than mint a
    /// key if the admission layer never ran.
    pub async fn find_receive(
        &self,
        vault_id: VaultId,
        counterparty: &str,
        sender_pub_key: [u8; 33],
    ) -> Option<EngagementKey> {
        let table = self.store.engagement_keys.read().await;
        let key = (vault_id, counterparty.to_string(), sender_pub_key);
        let id = table.receive_index.get(&key)?;
        table.by_id.get(id).cloned()
    }

    pub async fn find_by_pub_key(&self, vault_id: VaultId, pub_key: &[u8; 33]) -> Option<EngagementKey> {
        let table = self.store.engagement_keys.read().await;
        table
            .by_id
            .values()
            .find(|k| k.vault_id == vault_id && &k.engagement_pub_key == pub_key)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(vault_id: VaultId, purpose: EngagementKeyPurpose, counterparty: Option<&str>) -> EngagementKey {
        EngagementKey {
            id: EngagementKeyId::new(),
            vault_id,
            purpose,
            counterparty_address: counterparty.map(String::from),
            sender_pub_key: None,
            engagement_pub_key: [1u8; 33],
            derivation_priv_key: [2u8; 32],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn get_or_create_send_is_idempotent() {
        let repo = EngagementKeyRepo::new(Arc::new(Store::new()));
        let vault_id = VaultId::new();
        let first = repo
            .get_or_create_send(vault_id, "bob@d2", row(vault_id, EngagementKeyPurpose::Send, Some("bob@d2")))
            .await;
        let second = repo
            .get_or_create_send(vault_id, "bob@d2", row(vault_id, EngagementKeyPurpose::Send, Some("bob@d2")))
            .await;
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn verify_ownership_true_only_for_send_keys_owned_by_that_vault() {
        let repo = EngagementKeyRepo::new(Arc::new(Store::new()));
        let vault_id = VaultId::new();
        let other_vault_id = VaultId::new();
        let pub_key = [5u8; 33];
        let mut send_row = row(vault_id, EngagementKeyPurpose::Send, Some("bob@d2"));
        send_row.engagement_pub_key = pub_key;
        repo.get_or_create_send(vault_id, "bob@d2", send_row).await;

        assert!(repo.verify_send_ownership(vault_id, &pub_key).await);
        assert!(!repo.verify_send_ownership(vault_id, &[9u8; 33]).await);
        // A different vault minting a send key with `counterparty_address`
        // set to someone else's address must not make that vault appear to
        // own the address's identity.
        assert!(!repo.verify_send_ownership(other_vault_id, &pub_key).await);

        let mut receive_row = row(vault_id, EngagementKeyPurpose::Receive, Some("carol@d3"));
        receive_row.engagement_pub_key = [6u8; 33];
        repo.get_or_create_receive(vault_id, "carol@d3", [0u8; 33], receive_row)
            .await;
        assert!(!repo.verify_send_ownership(vault_id, &[6u8; 33]).await);
    }
}
