//! Owner-authenticated engagement key management.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::dto::{
    hex_to_fixed, parse_id, CreateEngagementKeyRequest, EngagementKeyResponse,
    GetDerivationPrivKeyRequest, GetDerivationPrivKeyResponse, GetEngagementKeyByPubKeyRequest,
    GetEngagementKeyByPubKeyResponse, GetEngagementKeyForSendingRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::extractor::AuthenticatedVault;
use crate::state::AppState;
use vaultmesh_types::VaultMeshError;

pub async fn get_engagement_key_for_sending(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Json(request): Json<GetEngagementKeyForSendingRequest>,
) -> ApiResult<Json<EngagementKeyResponse>> {
    let vault_id = parse_id("vaultId", &request.vault_id)?;
    auth.require(vault_id)?;

    let key = state
        .engagement_keys
        .get_or_create_send_key(vault_id, &request.counterparty_address)
        .await?;

    Ok(Json(EngagementKeyResponse {
        engagement_key_id: key.id.to_string(),
        engagement_pub_key: hex::encode(key.engagement_pub_key),
    }))
}

pub async fn get_derivation_priv_key(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Json(request): Json<GetDerivationPrivKeyRequest>,
) -> ApiResult<Json<GetDerivationPrivKeyResponse>> {
    let vault_id = parse_id("vaultId", &request.vault_id)?;
    auth.require(vault_id)?;
    let engagement_key_id = parse_id("engagementKeyId", &request.engagement_key_id)?;

    let derivation_priv_key = state
        .engagement_keys
        .get_derivation_priv_key(vault_id, engagement_key_id)
        .await?;

    Ok(Json(GetDerivationPrivKeyResponse {
        derivation_priv_key: hex::encode(derivation_priv_key),
    }))
}

pub async fn get_engagement_key_by_pub_key(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Json(request): Json<GetEngagementKeyByPubKeyRequest>,
) -> ApiResult<Json<GetEngagementKeyByPubKeyResponse>> {
    let vault_id = parse_id("vaultId", &request.vault_id)?;
    auth.require(vault_id)?;
    let pub_key = hex_to_fixed::<33>("pubKey", &request.pub_key)?;

    let key = state
        .engagement_keys
        .get_by_pub_key(vault_id, &pub_key)
        .await
        .ok_or_else(|| ApiError::from(VaultMeshError::NotFound("engagement key".to_string())))?;

    Ok(Json(GetEngagementKeyByPubKeyResponse {
        engagement_key_id: key.id.to_string(),
    }))
}

pub async fn create_engagement_key(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Json(request): Json<CreateEngagementKeyRequest>,
) -> ApiResult<Json<EngagementKeyResponse>> {
    let vault_id = parse_id("vaultId", &request.vault_id)?;
    auth.require(vault_id)?;

    let key = state.engagement_keys.create_manual_key(vault_id).await?;
    Ok(Json(EngagementKeyResponse {
        engagement_key_id: key.id.to_string(),
        engagement_pub_key: hex::encode(key.engagement_pub_key),
    }))
}
