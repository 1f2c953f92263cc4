//! Per-counterparty engagement key derivation and lookup.

use vaultmesh_crypto::keys::{derive_engagement_pub_key, random_scalar};
use vaultmesh_db::{EngagementKeyRepo, VaultRepo};
use vaultmesh_types::{EngagementKeyId, EngagementKeyPurpose, VaultId, VaultMeshError, VaultMeshResult};

pub struct EngagementKeyStore {
    vaults: VaultRepo,
    keys: EngagementKeyRepo,
}

impl EngagementKeyStore {
    pub fn new(vaults: VaultRepo, keys: EngagementKeyRepo) -> Self {
        Self { vaults, keys }
    }

    async fn vault_pub_key(&self, vault_id: VaultId) -> VaultMeshResult<[u8; 33]> {
        self.vaults
            .find_by_id(vault_id)
            .await
            .map(|v| v.vault_pub_key)
            .ok_or_else(|| VaultMeshError::NotFound("vault".to_string()))
    }

    /// `getOrCreateSendKey` (owner-authenticated by the caller).
    pub async fn get_or_create_send_key(
        &self,
        vault_id: VaultId,
        counterparty_address: &str,
    ) -> VaultMeshResult<vaultmesh_db::models::EngagementKey> {
        let vault_pub_key = self.vault_pub_key(vault_id).await?;
        let derivation_priv_key = random_scalar();
        let engagement_pub_key = derive_engagement_pub_key(&vault_pub_key, &derivation_priv_key)
            .map_err(|e| VaultMeshError::Internal(e.to_string()))?;

        let row = vaultmesh_db::models::EngagementKey {
            id: EngagementKeyId::new(),
            vault_id,
            purpose: EngagementKeyPurpose::Send,
            counterparty_address: Some(counterparty_address.to_string()),
            sender_pub_key: None,
            engagement_pub_key,
            derivation_priv_key,
            created_at: chrono::Utc::now(),
        };

        Ok(self.keys.get_or_create_send(vault_id, counterparty_address, row).await)
    }

    /// `getOrCreateReceiveKey` (internal, called after layer 3 passes).
    // TODO: superseded receive-keys from a counterparty pubkey rotation are
    // never garbage-collected (deferred per DESIGN.md open question 3).
    pub async fn get_or_create_receive_key(
        &self,
        vault_id: VaultId,
        counterparty_address: &str,
        sender_pub_key: [u8; 33],
    ) -> VaultMeshResult<vaultmesh_db::models::EngagementKey> {
        let vault_pub_key = self.vault_pub_key(vault_id).await?;
        let derivation_priv_key = random_scalar();
        let engagement_pub_key = derive_engagement_pub_key(&vault_pub_key, &derivation_priv_key)
            .map_err(|e| VaultMeshError::Internal(e.to_string()))?;

        let row = vaultmesh_db::models::EngagementKey {
            id: EngagementKeyId::new(),
            vault_id,
            purpose: EngagementKeyPurpose::Receive,
            counterparty_address: Some(counterparty_address.to_string()),
            sender_pub_key: Some(sender_pub_key),
            engagement_pub_key,
            derivation_priv_key,
            created_at: chrono::Utc::now(),
        };

        Ok(self
            .keys
            .get_or_create_receive(vault_id, counterparty_address, sender_pub_key, row)
            .await)
    }

    /// `createEngagementKey(purpose=manual)` (owner-authenticated).
    pub async fn create_manual_key(&self, vault_id: VaultId) -> VaultMeshResult<vaultmesh_db::models::EngagementKey> {
        let vault_pub_key = self.vault_pub_key(vault_id).await?;
        let derivation_priv_key = random_scalar();
        let engagement_pub_key = derive_engagement_pub_key(&vault_pub_key, &derivation_priv_key)
            .map_err(|e| VaultMeshError::Internal(e.to_string()))?;

        Ok(self
            .keys
            .insert_manual(vaultmesh_db::models::EngagementKey {
                id: EngagementKeyId::new(),
                vault_id,
                purpose: EngagementKeyPurpose::Manual,
                counterparty_address: None,
                sender_pub_key: None,
                engagement_pub_key,
                derivation_priv_key,
                created_at: chrono::Utc::now(),
            })
            .await)
    }

    /// `getDerivationPrivKey` — caller must already have checked that
    /// `requesting_vault_id` owns `engagement_key_id`.
    pub async fn get_derivation_priv_key(
        &self,
        requesting_vault_id: VaultId,
        engagement_key_id: EngagementKeyId,
    ) -> VaultMeshResult<[u8; 32]> {
        let row = self
            .keys
            .find(engagement_key_id)
            .await
            .ok_or_else(|| VaultMeshError::NotFound("engagement key".to_string()))?;
        if row.vault_id != requesting_vault_id {
            return Err(VaultMeshError::AuthInvalid);
        }
        Ok(row.derivation_priv_key)
    }

    pub async fn get_by_pub_key(
        &self,
        vault_id: VaultId,
        pub_key: &[u8; 33],
    ) -> Option<vaultmesh_db::models::EngagementKey> {
        self.keys.find_by_pub_key(vault_id, pub_key).await
    }

    /// `verifyOwnership` — resolves `address` to the vault that owns it,
    /// then checks that vault holds a send-purpose key with this pub key.
    /// `address` not parsing, or not resolving to a registered vault, is
    /// `false`, not an error — an unregistered identity owns nothing.
    pub async fn verify_ownership(&self, address: &str, engagement_pub_key: &[u8; 33]) -> bool {
        let Some(parsed) = vaultmesh_types::Address::parse(address) else {
            return false;
        };
        let Some(vault) = self.vaults.find_by_name_domain(&parsed.name, &parsed.domain).await else {
            return false;
        };
        self.keys.verify_send_ownership(vault.id, engagement_pub_key).await
    }

    pub async fn find_receive_key(
        &self,
        vault_id: VaultId,
        counterparty_address: &str,
        sender_pub_key: &[u8; 33],
    ) -> Option<vaultmesh_db::models::EngagementKey> {
        self.keys.find_receive(vault_id, counterparty_address, *sender_pub_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vaultmesh_db::Store;

    async fn sample_vault(store: Arc<Store>) -> VaultId {
        named_vault(store, "bob", "keypears.com").await
    }

    async fn named_vault(store: Arc<Store>, name: &str, domain: &str) -> VaultId {
        let vault_repo = VaultRepo::new(store);
        let priv_key = random_scalar();
        let pub_key = vaultmesh_crypto::keys::public_key_create(&priv_key).unwrap();
        let vault_id = VaultId::new();
        vault_repo
            .create(vaultmesh_db::models::Vault {
                id: vault_id,
                name: name.into(),
                domain: domain.into(),
                vault_pub_key: pub_key,
                vault_pub_key_hash: vaultmesh_crypto::hash::sha256(&pub_key),
                hashed_login_key: [0u8; 32],
                encrypted_vault_key: vec![],
                default_difficulty: 256,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        vault_id
    }

    #[tokio::test]
    async fn send_key_is_idempotent_per_counterparty() {
        let store = Arc::new(Store::new());
        let vault_id = sample_vault(store.clone()).await;
        let keystore = EngagementKeyStore::new(VaultRepo::new(store.clone()), EngagementKeyRepo::new(store));

        let a = keystore.get_or_create_send_key(vault_id, "alice@d1").await.unwrap();
        let b = keystore.get_or_create_send_key(vault_id, "alice@d1").await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.engagement_pub_key, b.engagement_pub_key);
    }

    #[tokio::test]
    async fn receive_key_differs_by_sender_pub_key() {
        let store = Arc::new(Store::new());
        let vault_id = sample_vault(store.clone()).await;
        let keystore = EngagementKeyStore::new(VaultRepo::new(store.clone()), EngagementKeyRepo::new(store));

        let a = keystore
            .get_or_create_receive_key(vault_id, "alice@d1", [1u8; 33])
            .await
            .unwrap();
        let b = keystore
            .get_or_create_receive_key(vault_id, "alice@d1", [2u8; 33])
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn verify_ownership_only_true_for_send_keys_owned_by_the_resolved_vault() {
        let store = Arc::new(Store::new());
        let vault_id = named_vault(store.clone(), "alice", "d1").await;
        let keystore = EngagementKeyStore::new(VaultRepo::new(store.clone()), EngagementKeyRepo::new(store));

        let send = keystore.get_or_create_send_key(vault_id, "bob@d2").await.unwrap();
        assert!(keystore.verify_ownership("alice@d1", &send.engagement_pub_key).await);

        let receive = keystore
            .get_or_create_receive_key(vault_id, "carol@d3", [9u8; 33])
            .await
            .unwrap();
        assert!(!keystore.verify_ownership("alice@d1", &receive.engagement_pub_key).await);
    }

    #[tokio::test]
    async fn verify_ownership_rejects_counterparty_address_impersonation() {
        // mallory mints a send key whose counterparty_address claims to be
        // victim@otherdomain, deriving the engagement pub key from her own
        // vault key. That must not make her pass as victim@otherdomain's
        // identity.
        let store = Arc::new(Store::new());
        let mallory_id = named_vault(store.clone(), "mallory", "d9").await;
        let keystore = EngagementKeyStore::new(VaultRepo::new(store.clone()), EngagementKeyRepo::new(store));

        let minted = keystore
            .get_or_create_send_key(mallory_id, "victim@otherdomain")
            .await
            .unwrap();

        assert!(!keystore.verify_ownership("victim@otherdomain", &minted.engagement_pub_key).await);
        // Still correctly attributed to mallory's own identity, since she
        // does own it.
        assert!(keystore.verify_ownership("mallory@d9", &minted.engagement_pub_key).await);
    }
}
