//! The in-process store. Each table family lives behind its own
//! `tokio::sync::RwLock`, taken for the duration of its critical
//! serializable section — e.g. the engagement-key table's lock spans both
//! the uniqueness-index lookup and the insert, so a concurrent
//! get-or-create race can never produce two rows for the same key (the
//! in-process equivalent of a unique-index-based upsert that returns the
//! existing row on conflict).

use std::collections::HashMap;

use tokio::sync::RwLock;

use vaultmesh_types::{
    ChannelId, EngagementKeyId, InboxMessageId, PowChallengeId, SecretUpdateId, SessionToken,
    VaultId,
};

use crate::models::{ChannelView, DeviceSession, EngagementKey, InboxMessage, PowChallenge, SecretUpdate, Vault};

#[derive(Default)]
pub(crate) struct VaultTable {
    pub by_id: HashMap<VaultId, Vault>,
    pub by_name_domain: HashMap<(String, String), VaultId>,
}

#[derive(Default)]
pub(crate) struct EngagementKeyTable {
    pub by_id: HashMap<EngagementKeyId, EngagementKey>,
    pub send_index: HashMap<(VaultId, String), EngagementKeyId>,
    pub receive_index: HashMap<(VaultId, String, [u8; 33]), EngagementKeyId>,
}

#[derive(Default)]
pub(crate) struct ChannelTable {
    pub by_id: HashMap<ChannelId, ChannelView>,
    pub by_vault_counterparty: HashMap<(VaultId, String), ChannelId>,
}

#[derive(Default)]
pub(crate) struct InboxTable {
    pub by_id: HashMap<InboxMessageId, InboxMessage>,
    pub by_channel: HashMap<ChannelId, Vec<InboxMessageId>>,
    pub max_order_by_channel: HashMap<ChannelId, u64>,
    /// `(channelId, powChallengeId) -> messageId`, the idempotency key for
    /// repeated `sendMessage` calls.
    pub idempotency: HashMap<(ChannelId, PowChallengeId), InboxMessageId>,
}

#[derive(Default)]
pub(crate) struct SecretUpdateTable {
    pub rows: Vec<SecretUpdate>,
    pub max_global_order: HashMap<VaultId, u64>,
    pub max_local_order: HashMap<(VaultId, String), u64>,
}

pub struct Store {
    pub(crate) vaults: RwLock<VaultTable>,
    pub(crate) sessions: RwLock<HashMap<SessionToken, DeviceSession>>,
    pub(crate) pow_challenges: RwLock<HashMap<PowChallengeId, PowChallenge>>,
    pub(crate) engagement_keys: RwLock<EngagementKeyTable>,
    pub(crate) channels: RwLock<ChannelTable>,
    pub(crate) inbox: RwLock<InboxTable>,
    pub(crate) secret_updates: RwLock<SecretUpdateTable>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            vaults: RwLock::new(VaultTable::default()),
            sessions: RwLock::new(HashMap::new()),
            pow_challenges: RwLock::new(HashMap::new()),
            engagement_keys: RwLock::new(EngagementKeyTable::default()),
            channels: RwLock::new(ChannelTable::default()),
            inbox: RwLock::new(InboxTable::default()),
            secret_updates: RwLock::new(SecretUpdateTable::default()),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
