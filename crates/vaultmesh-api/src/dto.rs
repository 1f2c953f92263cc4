//! Wire DTOs for the JSON RPC surface. Every fixed-width binary field is
//! hex-encoded on the wire and validated against its declared width here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vaultmesh_db::models;
use vaultmesh_types::ChannelStatus;

use crate::error::ApiError;

pub fn hex_to_fixed<const N: usize>(field: &str, s: &str) -> Result<[u8; N], ApiError> {
    let bytes = hex::decode(s).map_err(|_| ApiError::bad_request(format!("{field} is not valid hex")))?;
    bytes
        .try_into()
        .map_err(|_| ApiError::bad_request(format!("{field} must be {N} bytes")))
}

pub fn hex_to_vec(field: &str, s: &str) -> Result<Vec<u8>, ApiError> {
    hex::decode(s).map_err(|_| ApiError::bad_request(format!("{field} is not valid hex")))
}

pub fn parse_id<T: std::str::FromStr>(field: &str, s: &str) -> Result<T, ApiError> {
    s.parse().map_err(|_| ApiError::bad_request(format!("{field} is not a valid id")))
}

fn millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

// ---------------------------------------------------------------- vault --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckNameAvailabilityQuery {
    pub name: String,
    pub domain: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckNameAvailabilityResponse {
    pub available: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVaultRequest {
    pub name: String,
    pub domain: String,
    pub vault_pub_key: String,
    pub vault_pub_key_hash: String,
    pub login_key: String,
    pub encrypted_vault_key: String,
    pub default_difficulty: u64,
    pub pow_challenge_id: String,
    pub solved_header: String,
    pub solved_hash: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVaultResponse {
    pub vault_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub vault_id: String,
    pub login_key: String,
    pub device_id: String,
    pub device_description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_token: String,
    pub expires_at: i64,
}

// ----------------------------------------------------------------- pow --

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetPowChallengeQuery {
    pub purpose: Option<String>,
    pub recipient_address: Option<String>,
    pub sender_address: Option<String>,
    pub difficulty: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPowChallengeResponse {
    pub id: String,
    pub algorithm: String,
    pub header: String,
    pub target: String,
    pub difficulty: u64,
    pub expires_at: i64,
}

impl From<models::PowChallenge> for GetPowChallengeResponse {
    fn from(c: models::PowChallenge) -> Self {
        Self {
            id: c.id.to_string(),
            algorithm: c.algorithm.wire_name().to_string(),
            header: hex::encode(&c.header),
            target: hex::encode(c.target),
            difficulty: c.difficulty,
            expires_at: millis(c.expires_at),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPowProofRequest {
    pub id: String,
    pub solved_header: String,
    pub hash: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPowProofResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ------------------------------------------------------------- identity --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEngagementKeyOwnershipRequest {
    pub address: String,
    pub engagement_pub_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEngagementKeyOwnershipResponse {
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCounterpartyEngagementKeyRequest {
    pub recipient_address: String,
    pub sender_address: String,
    pub sender_pub_key: String,
    pub pow_challenge_id: String,
    pub solved_header: String,
    pub solved_hash: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCounterpartyEngagementKeyResponse {
    pub engagement_pub_key: String,
}

// ------------------------------------------------------------- messaging --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub recipient_address: String,
    pub sender_address: String,
    pub encrypted_content: String,
    pub sender_engagement_pub_key: String,
    pub recipient_engagement_pub_key: String,
    pub pow_challenge_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub message_id: String,
    pub order_in_channel: u64,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxMessageDto {
    pub id: String,
    pub sender_address: String,
    pub recipient_address: String,
    pub channel_id: String,
    pub order_in_channel: u64,
    pub encrypted_content: String,
    pub sender_engagement_pub_key: String,
    pub recipient_engagement_pub_key: String,
    pub pow_challenge_id: String,
    pub is_read: bool,
    pub created_at: i64,
}

impl From<models::InboxMessage> for InboxMessageDto {
    fn from(m: models::InboxMessage) -> Self {
        Self {
            id: m.id.to_string(),
            sender_address: m.sender_address,
            recipient_address: m.recipient_address,
            channel_id: m.channel_id.to_string(),
            order_in_channel: m.order_in_channel,
            encrypted_content: hex::encode(m.encrypted_content),
            sender_engagement_pub_key: hex::encode(m.sender_engagement_pub_key),
            recipient_engagement_pub_key: hex::encode(m.recipient_engagement_pub_key),
            pow_challenge_id: m.pow_challenge_id.to_string(),
            is_read: m.is_read,
            created_at: millis(m.created_at),
        }
    }
}

// --------------------------------------------------------------- channel --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDto {
    pub id: String,
    pub counterparty_address: String,
    pub status: ChannelStatus,
    pub secret_id: String,
    pub min_difficulty: Option<u64>,
    pub last_message_at: Option<i64>,
}

impl From<models::ChannelView> for ChannelDto {
    fn from(c: models::ChannelView) -> Self {
        Self {
            id: c.id.to_string(),
            counterparty_address: c.counterparty_address,
            status: c.status,
            secret_id: c.secret_id,
            min_difficulty: c.min_difficulty,
            last_message_at: c.last_message_at.map(millis),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChannelsQuery {
    pub vault_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChannelsResponse {
    pub channels: Vec<ChannelDto>,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChannelMessagesQuery {
    pub vault_id: String,
    pub channel_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChannelMessagesResponse {
    pub messages: Vec<InboxMessageDto>,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannelStatusRequest {
    pub vault_id: String,
    pub channel_id: String,
    pub status: ChannelStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannelMinDifficultyRequest {
    pub vault_id: String,
    pub channel_id: String,
    pub min_difficulty: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultScopedQuery {
    pub vault_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInboxMessagesForSyncResponse {
    pub messages: Vec<InboxMessageDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteInboxMessagesRequest {
    pub vault_id: String,
    pub message_ids: Vec<String>,
}

// -------------------------------------------------------- engagement keys --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEngagementKeyForSendingRequest {
    pub vault_id: String,
    pub counterparty_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementKeyResponse {
    pub engagement_key_id: String,
    pub engagement_pub_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDerivationPrivKeyRequest {
    pub vault_id: String,
    pub engagement_key_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDerivationPrivKeyResponse {
    pub derivation_priv_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEngagementKeyByPubKeyRequest {
    pub vault_id: String,
    pub pub_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEngagementKeyByPubKeyResponse {
    pub engagement_key_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEngagementKeyRequest {
    pub vault_id: String,
}

// ---------------------------------------------------------------- secrets --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretUpdateDto {
    pub id: String,
    pub secret_id: String,
    pub global_order: u64,
    pub local_order: u64,
    pub encrypted_blob: String,
    pub created_at: i64,
}

impl From<models::SecretUpdate> for SecretUpdateDto {
    fn from(u: models::SecretUpdate) -> Self {
        Self {
            id: u.id.to_string(),
            secret_id: u.secret_id,
            global_order: u.global_order,
            local_order: u.local_order,
            encrypted_blob: hex::encode(u.encrypted_blob),
            created_at: millis(u.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecretUpdateRequest {
    pub vault_id: String,
    pub secret_id: String,
    pub encrypted_blob: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSecretUpdatesQuery {
    pub vault_id: String,
    #[serde(default)]
    pub since_global_order: u64,
    #[serde(default = "default_secret_page_limit")]
    pub limit: usize,
}

fn default_secret_page_limit() -> usize {
    vaultmesh_secrets::MAX_PAGE_SIZE
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSecretUpdatesResponse {
    pub updates: Vec<SecretUpdateDto>,
    pub has_more: bool,
}
