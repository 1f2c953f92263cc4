//! Application state shared across handlers.

use std::sync::Arc;

use vaultmesh_auth::VaultRegistry;
use vaultmesh_db::{SessionRepo, Store, VaultRepo};
use vaultmesh_messaging::{ChannelManager, EngagementKeyStore, MessageAdmission};
use vaultmesh_pow::PowController;
use vaultmesh_secrets::SecretUpdateLog;

#[derive(Clone)]
pub struct AppState {
    pub vaults: VaultRepo,
    pub sessions: SessionRepo,
    pub registry: Arc<VaultRegistry>,
    pub pow: Arc<PowController>,
    pub engagement_keys: Arc<EngagementKeyStore>,
    pub channels: Arc<ChannelManager>,
    pub admission: Arc<MessageAdmission>,
    pub secrets: Arc<SecretUpdateLog>,
    pub local_domain: String,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<Store>,
        registry: Arc<VaultRegistry>,
        pow: Arc<PowController>,
        engagement_keys: Arc<EngagementKeyStore>,
        channels: Arc<ChannelManager>,
        admission: Arc<MessageAdmission>,
        secrets: Arc<SecretUpdateLog>,
        local_domain: String,
    ) -> Self {
        Self {
            vaults: VaultRepo::new(store.clone()),
            sessions: SessionRepo::new(store),
            registry,
            pow,
            engagement_keys,
            channels,
            admission,
            secrets,
            local_domain,
        }
    }
}
