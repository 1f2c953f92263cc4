//! Vault registration, login, and logout.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;

use vaultmesh_auth::RegisterVaultInput;
use vaultmesh_pow::SolvedChallenge;
use vaultmesh_types::SessionToken;

use crate::dto::{
    hex_to_fixed, hex_to_vec, parse_id, CheckNameAvailabilityQuery, CheckNameAvailabilityResponse,
    LoginRequest, LoginResponse, RegisterVaultRequest, RegisterVaultResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn check_name_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CheckNameAvailabilityQuery>,
) -> ApiResult<Json<CheckNameAvailabilityResponse>> {
    let available = state.registry.check_name_availability(&query.name, &query.domain).await;
    Ok(Json(CheckNameAvailabilityResponse { available }))
}

pub async fn register_vault(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterVaultRequest>,
) -> ApiResult<Json<RegisterVaultResponse>> {
    let vault_pub_key = hex_to_fixed::<33>("vaultPubKey", &request.vault_pub_key)?;
    let vault_pub_key_hash = hex_to_fixed::<32>("vaultPubKeyHash", &request.vault_pub_key_hash)?;
    let login_key = hex_to_fixed::<32>("loginKey", &request.login_key)?;
    let encrypted_vault_key = hex_to_vec("encryptedVaultKey", &request.encrypted_vault_key)?;
    let pow_challenge_id = parse_id("powChallengeId", &request.pow_challenge_id)?;
    let solved_header = hex_to_vec("solvedHeader", &request.solved_header)?;
    let solved_hash = hex_to_fixed::<32>("solvedHash", &request.solved_hash)?;

    let vault_id = state
        .registry
        .register_vault(RegisterVaultInput {
            name: request.name,
            domain: request.domain,
            vault_pub_key,
            vault_pub_key_hash,
            login_key,
            encrypted_vault_key,
            default_difficulty: request.default_difficulty,
            pow: SolvedChallenge {
                id: pow_challenge_id,
                solved_header,
                claimed_hash: solved_hash,
            },
        })
        .await?;

    tracing::info!(vault_id = %vault_id, "vault registered");
    Ok(Json(RegisterVaultResponse {
        vault_id: vault_id.to_string(),
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let vault_id = parse_id("vaultId", &request.vault_id)?;
    let login_key = hex_to_fixed::<32>("loginKey", &request.login_key)?;

    let output = state
        .registry
        .login(vault_id, &login_key, &request.device_id, &request.device_description)
        .await?;

    Ok(Json(LoginResponse {
        session_token: output.token.0,
        expires_at: output.expires_at.timestamp_millis(),
    }))
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Json<()>> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(ApiError::unauthorized)?;

    state.registry.logout(&SessionToken(token.to_string())).await;
    Ok(Json(()))
}
