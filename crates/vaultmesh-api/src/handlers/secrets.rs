//! Owner-authenticated secret update log access.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use crate::dto::{
    hex_to_vec, parse_id, CreateSecretUpdateRequest, GetSecretUpdatesQuery, GetSecretUpdatesResponse,
    SecretUpdateDto,
};
use crate::error::ApiResult;
use crate::extractor::AuthenticatedVault;
use crate::state::AppState;

pub async fn create_secret_update(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Json(request): Json<CreateSecretUpdateRequest>,
) -> ApiResult<Json<SecretUpdateDto>> {
    let vault_id = parse_id("vaultId", &request.vault_id)?;
    auth.require(vault_id)?;
    let encrypted_blob = hex_to_vec("encryptedBlob", &request.encrypted_blob)?;

    let update = state
        .secrets
        .create_secret_update(vault_id, &request.secret_id, encrypted_blob)
        .await?;

    Ok(Json(SecretUpdateDto::from(update)))
}

pub async fn get_secret_updates(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedVault,
    Query(query): Query<GetSecretUpdatesQuery>,
) -> ApiResult<Json<GetSecretUpdatesResponse>> {
    let vault_id = parse_id("vaultId", &query.vault_id)?;
    auth.require(vault_id)?;

    let page = state
        .secrets
        .get_secret_updates(vault_id, query.since_global_order, query.limit)
        .await?;

    Ok(Json(GetSecretUpdatesResponse {
        updates: page.updates.into_iter().map(SecretUpdateDto::from).collect(),
        has_more: page.has_more,
    }))
}
