//! Message send, admitted against an already-consumed PoW proof.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use vaultmesh_messaging::SendMessageInput;

use crate::dto::{hex_to_fixed, hex_to_vec, parse_id, SendMessageRequest, SendMessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let (name, domain) = request
        .recipient_address
        .split_once('@')
        .ok_or_else(|| ApiError::bad_request("recipientAddress must be name@domain"))?;
    let recipient_vault = state
        .vaults
        .find_by_name_domain(name, domain)
        .await
        .ok_or_else(|| ApiError::bad_request("unknown recipientAddress"))?;

    let encrypted_content = hex_to_vec("encryptedContent", &request.encrypted_content)?;
    let sender_engagement_pub_key = hex_to_fixed::<33>("senderEngagementPubKey", &request.sender_engagement_pub_key)?;
    let recipient_engagement_pub_key =
        hex_to_fixed::<33>("recipientEngagementPubKey", &request.recipient_engagement_pub_key)?;
    let pow_challenge_id = parse_id("powChallengeId", &request.pow_challenge_id)?;

    let output = state
        .admission
        .send_message(SendMessageInput {
            recipient_vault_id: recipient_vault.id,
            recipient_address: request.recipient_address,
            sender_address: request.sender_address,
            encrypted_content,
            sender_engagement_pub_key,
            recipient_engagement_pub_key,
            pow_challenge_id,
        })
        .await?;

    Ok(Json(SendMessageResponse {
        message_id: output.message_id.to_string(),
        order_in_channel: output.order_in_channel,
        created_at: output.created_at.timestamp_millis(),
    }))
}
