//! Vault registration, login, and logout.

use std::collections::HashSet;
use std::sync::Arc;

use rand::RngCore;

use vaultmesh_crypto::hash::{constant_time_eq, sha256};
use vaultmesh_crypto::kdf::derive_hashed_login_key;
use vaultmesh_db::{DbError, SessionRepo, VaultRepo};
use vaultmesh_pow::{PowController, SolvedChallenge};
use vaultmesh_types::{domain::is_valid_vault_name, PowPurpose, VaultId, VaultMeshError, VaultMeshResult};

use crate::config::SessionConfig;
use crate::rate_limit::LoginRateLimiter;

pub struct RegisterVaultInput {
    pub name: String,
    pub domain: String,
    pub vault_pub_key: [u8; 33],
    pub vault_pub_key_hash: [u8; 32],
    pub login_key: [u8; 32],
    pub encrypted_vault_key: Vec<u8>,
    pub default_difficulty: u64,
    pub pow: SolvedChallenge,
}

pub struct LoginOutput {
    pub token: vaultmesh_types::SessionToken,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

pub struct VaultRegistry {
    vaults: VaultRepo,
    sessions: SessionRepo,
    pow: Arc<PowController>,
    accepted_domains: HashSet<String>,
    rate_limiter: LoginRateLimiter,
    session_config: SessionConfig,
}

impl VaultRegistry {
    pub fn new(
        vaults: VaultRepo,
        sessions: SessionRepo,
        pow: Arc<PowController>,
        accepted_domains: HashSet<String>,
        rate_limiter: LoginRateLimiter,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            vaults,
            sessions,
            pow,
            accepted_domains,
            rate_limiter,
            session_config,
        }
    }

    pub async fn check_name_availability(&self, name: &str, domain: &str) -> bool {
        self.vaults.name_available(name, domain).await
    }

    pub async fn register_vault(&self, input: RegisterVaultInput) -> VaultMeshResult<VaultId> {
        if !is_valid_vault_name(&input.name) {
            return Err(VaultMeshError::ValidationFailed("invalid vault name".into()));
        }
        if !self.accepted_domains.contains(&input.domain) {
            return Err(VaultMeshError::ValidationFailed("domain not accepted".into()));
        }
        if sha256(&input.vault_pub_key) != input.vault_pub_key_hash {
            return Err(VaultMeshError::ValidationFailed(
                "vaultPubKeyHash does not match vaultPubKey".into(),
            ));
        }

        let challenge = self
            .pow
            .find(input.pow.id)
            .await
            .ok_or_else(|| VaultMeshError::NotFound("pow challenge".to_string()))?;
        if challenge.purpose != PowPurpose::Registration {
            return Err(VaultMeshError::ValidationFailed(
                "pow challenge was not issued for registration".into(),
            ));
        }

        let address = format!("{}@{}", input.name, input.domain);
        self.pow.consume(input.pow, &address, &address, &input.vault_pub_key).await?;

        let vault_id = VaultId::new();
        let hashed_login_key = derive_hashed_login_key(&input.login_key, &vault_id.as_ulid().to_bytes());

        let vault = vaultmesh_db::models::Vault {
            id: vault_id,
            name: input.name,
            domain: input.domain,
            vault_pub_key: input.vault_pub_key,
            vault_pub_key_hash: input.vault_pub_key_hash,
            hashed_login_key,
            encrypted_vault_key: input.encrypted_vault_key,
            default_difficulty: input.default_difficulty.max(256),
            created_at: chrono::Utc::now(),
        };

        match self.vaults.create(vault).await {
            Ok(created) => Ok(created.id),
            Err(DbError::Duplicate(msg)) => Err(VaultMeshError::Conflict(msg)),
            Err(other) => Err(VaultMeshError::Internal(other.to_string())),
        }
    }

    pub async fn login(
        &self,
        vault_id: VaultId,
        login_key: &[u8; 32],
        device_id: &str,
        device_description: &str,
    ) -> VaultMeshResult<LoginOutput> {
        let identifier = vault_id.to_string();
        self.rate_limiter.check(&identifier).await?;

        let vault = self
            .vaults
            .find_by_id(vault_id)
            .await
            .ok_or_else(|| VaultMeshError::NotFound("vault".to_string()))?;

        let recomputed = derive_hashed_login_key(login_key, &vault_id.as_ulid().to_bytes());
        if !constant_time_eq(&recomputed, &vault.hashed_login_key) {
            self.rate_limiter.record_failure(&identifier).await;
            return Err(VaultMeshError::AuthInvalid);
        }
        self.rate_limiter.record_success(&identifier).await;

        let mut token_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut token_bytes);
        let token = vaultmesh_types::SessionToken(hex::encode(token_bytes));

        let now = chrono::Utc::now();
        let expires_at = now
            + chrono::Duration::from_std(self.session_config.lifetime)
                .map_err(|e| VaultMeshError::Internal(e.to_string()))?;

        self.sessions
            .create(vaultmesh_db::models::DeviceSession {
                token: token.clone(),
                vault_id,
                device_id: device_id.to_string(),
                device_description: device_description.to_string(),
                created_at: now,
                expires_at,
            })
            .await;

        Ok(LoginOutput { token, expires_at })
    }

    pub async fn logout(&self, token: &vaultmesh_types::SessionToken) {
        self.sessions.delete(token).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultmesh_db::Store;
    use vaultmesh_pow::{PowConfig, PowController};
    use vaultmesh_types::PowAlgorithm;

    fn registry() -> VaultRegistry {
        let store = Arc::new(Store::new());
        let pow = Arc::new(PowController::new(
            vaultmesh_db::PowRepo::new(store.clone()),
            PowConfig::default(),
        ));
        let mut domains = HashSet::new();
        domains.insert("keypears.com".to_string());
        VaultRegistry::new(
            VaultRepo::new(store.clone()),
            SessionRepo::new(store),
            pow,
            domains,
            LoginRateLimiter::new(crate::config::RateLimitConfig::default()),
            SessionConfig::default(),
        )
    }

    async fn solved_registration_pow(registry: &VaultRegistry, address: &str, pub_key: &[u8; 33]) -> SolvedChallenge {
        let challenge = registry
            .pow
            .issue(PowAlgorithm::Pow564b, PowPurpose::Registration, 256)
            .await;
        let counter_region = challenge.algorithm.counter_region();
        for counter in 0u32..200_000 {
            let mut header = challenge.header.clone();
            header[counter_region.clone()].copy_from_slice(&counter.to_be_bytes());
            let hash = vaultmesh_pow::target::derive_hash(&header);
            if vaultmesh_pow::target::hash_meets_target(&hash, &challenge.target) {
                return SolvedChallenge {
                    id: challenge.id,
                    solved_header: header,
                    claimed_hash: hash,
                };
            }
        }
        let _ = address;
        let _ = pub_key;
        panic!("failed to find a solution at test difficulty");
    }

    #[tokio::test]
    async fn duplicate_name_domain_registration_conflicts() {
        let registry = registry();
        let address = "alice@keypears.com";
        let pow1 = solved_registration_pow(&registry, address, &[1u8; 33]).await;

        registry
            .register_vault(RegisterVaultInput {
                name: "alice".into(),
                domain: "keypears.com".into(),
                vault_pub_key: [1u8; 33],
                vault_pub_key_hash: sha256(&[1u8; 33]),
                login_key: [2u8; 32],
                encrypted_vault_key: vec![1, 2, 3],
                default_difficulty: 256,
                pow: pow1,
            })
            .await
            .unwrap();

        assert!(!registry.check_name_availability("alice", "keypears.com").await);
        assert!(registry.check_name_availability("alice", "other.com").await);

        let pow2 = solved_registration_pow(&registry, address, &[9u8; 33]).await;
        let err = registry
            .register_vault(RegisterVaultInput {
                name: "alice".into(),
                domain: "keypears.com".into(),
                vault_pub_key: [9u8; 33],
                vault_pub_key_hash: sha256(&[9u8; 33]),
                login_key: [2u8; 32],
                encrypted_vault_key: vec![1, 2, 3],
                default_difficulty: 256,
                pow: pow2,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, VaultMeshError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_succeeds_only_with_matching_login_key() {
        let registry = registry();
        let pow = solved_registration_pow(&registry, "bob@keypears.com", &[4u8; 33]).await;
        let login_key = [7u8; 32];

        let vault_id = registry
            .register_vault(RegisterVaultInput {
                name: "bob".into(),
                domain: "keypears.com".into(),
                vault_pub_key: [4u8; 33],
                vault_pub_key_hash: sha256(&[4u8; 33]),
                login_key,
                encrypted_vault_key: vec![9],
                default_difficulty: 256,
                pow,
            })
            .await
            .unwrap();

        let wrong = registry.login(vault_id, &[0u8; 32], "dev1", "laptop").await;
        assert!(matches!(wrong, Err(VaultMeshError::AuthInvalid)));

        let ok = registry.login(vault_id, &login_key, "dev1", "laptop").await;
        assert!(ok.is_ok());
    }
}
