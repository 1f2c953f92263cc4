//! Engagement-key ownership checks, local and cross-domain.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use vaultmesh_messaging::GetCounterpartyEngagementKeyInput;

use crate::dto::{
    hex_to_fixed, hex_to_vec, parse_id, GetCounterpartyEngagementKeyRequest,
    GetCounterpartyEngagementKeyResponse, VerifyEngagementKeyOwnershipRequest,
    VerifyEngagementKeyOwnershipResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn verify_engagement_key_ownership(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyEngagementKeyOwnershipRequest>,
) -> ApiResult<Json<VerifyEngagementKeyOwnershipResponse>> {
    let engagement_pub_key = hex_to_fixed::<33>("engagementPubKey", &request.engagement_pub_key)?;
    let valid = state
        .engagement_keys
        .verify_ownership(&request.address, &engagement_pub_key)
        .await;
    Ok(Json(VerifyEngagementKeyOwnershipResponse { valid }))
}

pub async fn get_counterparty_engagement_key(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GetCounterpartyEngagementKeyRequest>,
) -> ApiResult<Json<GetCounterpartyEngagementKeyResponse>> {
    let (name, domain) = request
        .recipient_address
        .split_once('@')
        .ok_or_else(|| ApiError::bad_request("recipientAddress must be name@domain"))?;
    let recipient_vault = state
        .vaults
        .find_by_name_domain(name, domain)
        .await
        .ok_or_else(|| ApiError::bad_request("unknown recipientAddress"))?;

    let sender_pub_key = hex_to_fixed::<33>("senderPubKey", &request.sender_pub_key)?;
    let pow_challenge_id = parse_id("powChallengeId", &request.pow_challenge_id)?;
    let solved_header = hex_to_vec("solvedHeader", &request.solved_header)?;
    let solved_hash = hex_to_fixed::<32>("solvedHash", &request.solved_hash)?;
    let signature = hex_to_fixed::<64>("signature", &request.signature)?;

    let engagement_pub_key = state
        .admission
        .get_counterparty_engagement_key(GetCounterpartyEngagementKeyInput {
            recipient_vault_id: recipient_vault.id,
            recipient_address: request.recipient_address,
            sender_address: request.sender_address,
            sender_pub_key,
            pow_challenge_id,
            solved_header,
            solved_hash,
            signature,
        })
        .await?;

    Ok(Json(GetCounterpartyEngagementKeyResponse {
        engagement_pub_key: hex::encode(engagement_pub_key),
    }))
}
