//! Challenge issuance and non-consuming proof verification.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use vaultmesh_pow::target::{derive_hash, hash_meets_target};
use vaultmesh_types::{PowAlgorithm, PowPurpose};

use crate::dto::{
    hex_to_fixed, hex_to_vec, parse_id, GetPowChallengeQuery, GetPowChallengeResponse,
    VerifyPowProofRequest, VerifyPowProofResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

fn parse_purpose(raw: Option<&str>) -> PowPurpose {
    match raw {
        Some("registration") => PowPurpose::Registration,
        Some("messaging") => PowPurpose::Messaging,
        _ => PowPurpose::Generic,
    }
}

pub async fn get_pow_challenge(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GetPowChallengeQuery>,
) -> ApiResult<Json<GetPowChallengeResponse>> {
    let purpose = parse_purpose(query.purpose.as_deref());
    let requested = query.difficulty.unwrap_or(0);

    let difficulty = match (&query.recipient_address, &query.sender_address) {
        (Some(recipient_address), Some(sender_address)) => {
            if let Some((name, domain)) = recipient_address.split_once('@') {
                if domain == state.local_domain {
                    if let Some(vault) = state.vaults.find_by_name_domain(name, domain).await {
                        state
                            .channels
                            .effective_difficulty(vault.id, sender_address, vault.default_difficulty)
                            .await
                    } else {
                        requested
                    }
                } else {
                    requested
                }
            } else {
                requested
            }
        }
        _ => requested,
    };

    let challenge = state.pow.issue(PowAlgorithm::Pow564b, purpose, difficulty).await;
    Ok(Json(GetPowChallengeResponse::from(challenge)))
}

pub async fn verify_pow_proof(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyPowProofRequest>,
) -> ApiResult<Json<VerifyPowProofResponse>> {
    let id = parse_id("id", &request.id)?;
    let solved_header = hex_to_vec("solvedHeader", &request.solved_header)?;
    let claimed_hash = hex_to_fixed::<32>("hash", &request.hash)?;

    let challenge = match state.pow.find(id).await {
        Some(c) => c,
        None => {
            return Ok(Json(VerifyPowProofResponse {
                valid: false,
                message: Some("no such challenge".to_string()),
            }))
        }
    };

    let computed_hash = derive_hash(&solved_header);
    if computed_hash != claimed_hash {
        return Ok(Json(VerifyPowProofResponse {
            valid: false,
            message: Some("hash does not match solved header".to_string()),
        }));
    }

    let valid = hash_meets_target(&computed_hash, &challenge.target);
    Ok(Json(VerifyPowProofResponse {
        valid,
        message: if valid {
            None
        } else {
            Some("hash does not meet target".to_string())
        },
    }))
}
