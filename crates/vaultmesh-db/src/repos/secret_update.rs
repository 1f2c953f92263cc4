use std::sync::Arc;

use vaultmesh_types::{SecretUpdateId, VaultId};

use crate::models::SecretUpdate;
use crate::store::Store;

pub struct SecretUpdateRepo {
    store: Arc<Store>,
}

impl SecretUpdateRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Assigns `globalOrder`/`localOrder` and appends, atomically under one
    /// write lock — the in-process equivalent of a serializable transaction.
    /// Both counters are dense and gap-free by construction:
    /// they are read and bumped under the same lock that performs the
    /// insert, the same idiom the teacher's ledger uses for its balance
    /// sequence numbers.
    pub async fn append(
        &self,
        vault_id: VaultId,
        secret_id: &str,
        encrypted_blob: Vec<u8>,
    ) -> SecretUpdate {
        let mut table = self.store.secret_updates.write().await;

        let global_order = table.max_global_order.get(&vault_id).copied().unwrap_or(0) + 1;
        let local_key = (vault_id, secret_id.to_string());
        let local_order = table.max_local_order.get(&local_key).copied().unwrap_or(0) + 1;

        let row = SecretUpdate {
            id: SecretUpdateId::new(),
            vault_id,
            secret_id: secret_id.to_string(),
            global_order,
            local_order,
            encrypted_blob,
            created_at: chrono::Utc::now(),
        };

        table.max_global_order.insert(vault_id, global_order);
        table.max_local_order.insert(local_key, local_order);
        table.rows.push(row.clone());

        row
    }

    /// Ordered by `globalOrder`, paginated from `since_global_order`
    /// (exclusive), capped at `limit` (`limit <= 100`).
    pub async fn list_since(
        &self,
        vault_id: VaultId,
        since_global_order: u64,
        limit: usize,
    ) -> (Vec<SecretUpdate>, bool) {
        let table = self.store.secret_updates.read().await;
        let mut matching: Vec<&SecretUpdate> = table
            .rows
            .iter()
            .filter(|r| r.vault_id == vault_id && r.global_order > since_global_order)
            .collect();
        matching.sort_by_key(|r| r.global_order);

        let has_more = matching.len() > limit;
        let page = matching.into_iter().take(limit).cloned().collect();
        (page, has_more)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn global_order_increments_per_vault_local_order_per_secret() {
        let repo = SecretUpdateRepo::new(Arc::new(Store::new()));
        let vault_id = VaultId::new();

        let u1 = repo.append(vault_id, "secret-a", vec![1]).await;
        let u2 = repo.append(vault_id, "secret-b", vec![2]).await;
        let u3 = repo.append(vault_id, "secret-a", vec![3]).await;

        assert_eq!(u1.global_order, 1);
        assert_eq!(u2.global_order, 2);
        assert_eq!(u3.global_order, 3);

        assert_eq!(u1.local_order, 1);
        assert_eq!(u2.local_order, 1);
        assert_eq!(u3.local_order, 2);
    }

    #[tokio::test]
    async fn pagination_respects_limit_and_since() {
        let repo = SecretUpdateRepo::new(Arc::new(Store::new()));
        let vault_id = VaultId::new();
        for i in 0..5 {
            repo.append(vault_id, "secret-a", vec![i]).await;
        }

        let (page, has_more) = repo.list_since(vault_id, 0, 3).await;
        assert_eq!(page.len(), 3);
        assert!(has_more);
        assert_eq!(page[0].global_order, 1);

        let (page2, has_more2) = repo.list_since(vault_id, 3, 10).await;
        assert_eq!(page2.len(), 2);
        assert!(!has_more2);
    }

    #[tokio::test]
    async fn vaults_have_independent_orders() {
        let repo = SecretUpdateRepo::new(Arc::new(Store::new()));
        let vault_a = VaultId::new();
        let vault_b = VaultId::new();
        repo.append(vault_a, "s", vec![1]).await;
        let first_b = repo.append(vault_b, "s", vec![1]).await;
        assert_eq!(first_b.global_order, 1);
    }
}
