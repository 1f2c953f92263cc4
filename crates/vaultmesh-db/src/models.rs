//! Row types for each table family: `vault`, `device_session`,
//! `pow_challenge`, `engagement_key`, `channel_view`, `inbox_message`,
//! `secret_update`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use vaultmesh_types::{
    ChannelId, ChannelStatus, EngagementKeyId, EngagementKeyPurpose, InboxMessageId,
    PowAlgorithm, PowChallengeId, PowPurpose, SecretUpdateId, SessionToken, VaultId,
};

/// `serde(with = ...)` shim for `Option<[u8; 33]>`: `BigArray` only covers
/// the bare array case, so wrap it to cover the `Option` this codebase uses
/// for fields that are absent until a later binding step.
mod opt_big_array_33 {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_big_array::BigArray;

    #[derive(Serialize, Deserialize)]
    struct Wrapper(#[serde(with = "BigArray")] [u8; 33]);

    pub fn serialize<S>(value: &Option<[u8; 33]>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(Wrapper).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<[u8; 33]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vault {
    pub id: VaultId,
    pub name: String,
    pub domain: String,
    #[serde(with = "BigArray")]
    pub vault_pub_key: [u8; 33],
    pub vault_pub_key_hash: [u8; 32],
    pub hashed_login_key: [u8; 32],
    pub encrypted_vault_key: Vec<u8>,
    pub default_difficulty: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSession {
    pub token: SessionToken,
    pub vault_id: VaultId,
    pub device_id: String,
    pub device_description: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowChallenge {
    pub id: PowChallengeId,
    pub algorithm: PowAlgorithm,
    pub header: Vec<u8>,
    pub target: [u8; 32],
    pub difficulty: u64,
    pub purpose: PowPurpose,
    pub bound_sender: Option<String>,
    pub bound_recipient: Option<String>,
    #[serde(with = "opt_big_array_33")]
    pub bound_sender_pub_key: Option<[u8; 33]>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub solved_hash: Option<[u8; 32]>,
    pub solved_header: Option<Vec<u8>>,
}

impl PowChallenge {
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementKey {
    pub id: EngagementKeyId,
    pub vault_id: VaultId,
    pub purpose: EngagementKeyPurpose,
    pub counterparty_address: Option<String>,
    /// Set only for `purpose = Receive`, distinguishing distinct senders to
    /// the same counterparty address from one another.
    #[serde(with = "opt_big_array_33")]
    pub sender_pub_key: Option<[u8; 33]>,
    #[serde(with = "BigArray")]
    pub engagement_pub_key: [u8; 33],
    pub derivation_priv_key: [u8; 32],
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelView {
    pub id: ChannelId,
    pub vault_id: VaultId,
    pub counterparty_address: String,
    pub status: ChannelStatus,
    pub secret_id: String,
    pub min_difficulty: Option<u64>,
    pub last_message_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: InboxMessageId,
    pub vault_id: VaultId,
    pub sender_address: String,
    pub recipient_address: String,
    pub channel_id: ChannelId,
    pub order_in_channel: u64,
    pub encrypted_content: Vec<u8>,
    #[serde(with = "BigArray")]
    pub sender_engagement_pub_key: [u8; 33],
    #[serde(with = "BigArray")]
    pub recipient_engagement_pub_key: [u8; 33],
    pub pow_challenge_id: PowChallengeId,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretUpdate {
    pub id: SecretUpdateId,
    pub vault_id: VaultId,
    pub secret_id: String,
    pub global_order: u64,
    pub local_order: u64,
    pub encrypted_blob: Vec<u8>,
    pub created_at: DateTime<Utc>,
}
