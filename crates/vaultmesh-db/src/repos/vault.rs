use std::sync::Arc;

use chrono::Utc;

use vaultmesh_types::VaultId;

use crate::error::{DbError, DbResult};
use crate::models::Vault;
use crate::store::Store;

#[derive(Clone)]
pub struct VaultRepo {
    store: Arc<Store>,
}

impl VaultRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Insert a new vault. Fails with `Duplicate` if `(name, domain)` is
    /// already taken.
    pub async fn create(&self, vault: Vault) -> DbResult<Vault> {
        let mut table = self.store.vaults.write().await;
        let key = (vault.name.clone(), vault.domain.clone());
        if table.by_name_domain.contains_key(&key) {
            return Err(DbError::Duplicate(format!(
                "{}@{} already registered",
                vault.name, vault.domain
            )));
        }
        table.by_name_domain.insert(key, vault.id);
        table.by_id.insert(vault.id, vault.clone());
        Ok(vault)
    }

    pub async fn find_by_id(&self, id: VaultId) -> Option<Vault> {
        self.store.vaults.read().await.by_id.get(&id).cloned()
    }

    pub async fn find_by_name_domain(&self, name: &str, domain: &str) -> Option<Vault> {
        let table = self.store.vaults.read().await;
        let id = table
            .by_name_domain
            .get(&(name.to_string(), domain.to_string()))?;
        table.by_id.get(id).cloned()
    }

    pub async fn name_available(&self, name: &str, domain: &str) -> bool {
        !self
            .store
            .vaults
            .read()
            .await
            .by_name_domain
            .contains_key(&(name.to_string(), domain.to_string()))
    }

    pub async fn touch_last_login(&self, _id: VaultId) {
        // No last-login field in the current data model; kept as
        // an explicit no-op hook rather than silently absent, in case
        // future audit requirements add one.
        let _ = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultmesh_types::VaultId;

    fn sample_vault() -> Vault {
        Vault {
            id: VaultId::new(),
            name: "alice".into(),
            domain: "keypears.com".into(),
            vault_pub_key: [1u8; 33],
            vault_pub_key_hash: [2u8; 32],
            hashed_login_key: [3u8; 32],
            encrypted_vault_key: vec![4, 5, 6],
            default_difficulty: 256,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_name_domain_is_rejected() {
        let repo = VaultRepo::new(Arc::new(Store::new()));
        repo.create(sample_vault()).await.unwrap();

        let mut dup = sample_vault();
        dup.id = VaultId::new();
        dup.vault_pub_key = [9u8; 33];
        let err = repo.create(dup).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[tokio::test]
    async fn name_availability_reflects_registrations() {
        let repo = VaultRepo::new(Arc::new(Store::new()));
        assert!(repo.name_available("alice", "keypears.com").await);
        repo.create(sample_vault()).await.unwrap();
        assert!(!repo.name_available("alice", "keypears.com").await);
        assert!(repo.name_available("alice", "passapples.com").await);
    }
}
