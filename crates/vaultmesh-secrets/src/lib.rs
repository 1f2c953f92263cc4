//! Append-only, dual-ordered secret update log.

use vaultmesh_db::SecretUpdateRepo;
use vaultmesh_types::{VaultId, VaultMeshResult};

pub const MAX_PAGE_SIZE: usize = 100;

pub struct SecretUpdateLog {
    repo: SecretUpdateRepo,
}

pub struct SecretUpdatesPage {
    pub updates: Vec<vaultmesh_db::models::SecretUpdate>,
    pub has_more: bool,
}

impl SecretUpdateLog {
    pub fn new(repo: SecretUpdateRepo) -> Self {
        Self { repo }
    }

    /// `createSecretUpdate` (owner-authenticated by the caller).
    pub async fn create_secret_update(
        &self,
        vault_id: VaultId,
        secret_id: &str,
        encrypted_blob: Vec<u8>,
    ) -> VaultMeshResult<vaultmesh_db::models::SecretUpdate> {
        Ok(self.repo.append(vault_id, secret_id, encrypted_blob).await)
    }

    /// `getSecretUpdates` — paginated by `globalOrder`, capped at
    /// [`MAX_PAGE_SIZE`] regardless of what the caller asks for.
    pub async fn get_secret_updates(
        &self,
        vault_id: VaultId,
        since_global_order: u64,
        limit: usize,
    ) -> VaultMeshResult<SecretUpdatesPage> {
        let (updates, has_more) = self
            .repo
            .list_since(vault_id, since_global_order, limit.min(MAX_PAGE_SIZE))
            .await;
        Ok(SecretUpdatesPage { updates, has_more })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vaultmesh_db::Store;

    #[tokio::test]
    async fn page_size_is_capped_regardless_of_requested_limit() {
        let store = Arc::new(Store::new());
        let log = SecretUpdateLog::new(SecretUpdateRepo::new(store));
        let vault_id = VaultId::new();
        for i in 0..5u8 {
            log.create_secret_update(vault_id, "s", vec![i]).await.unwrap();
        }

        let page = log.get_secret_updates(vault_id, 0, 10_000).await.unwrap();
        assert_eq!(page.updates.len(), 5);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn orders_assigned_atomically_per_append() {
        let store = Arc::new(Store::new());
        let log = SecretUpdateLog::new(SecretUpdateRepo::new(store));
        let vault_id = VaultId::new();

        let a = log.create_secret_update(vault_id, "secret-1", vec![1]).await.unwrap();
        let b = log.create_secret_update(vault_id, "secret-1", vec![2]).await.unwrap();
        let c = log.create_secret_update(vault_id, "secret-2", vec![3]).await.unwrap();

        assert_eq!((a.global_order, a.local_order), (1, 1));
        assert_eq!((b.global_order, b.local_order), (2, 2));
        assert_eq!((c.global_order, c.local_order), (3, 1));
    }
}
