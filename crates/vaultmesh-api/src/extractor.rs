//! Bearer session-token extractor for owner-authenticated endpoints.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use vaultmesh_types::{SessionToken, VaultId};

use crate::error::ApiError;
use crate::state::AppState;

/// The vault that owns the session presented in `Authorization: Bearer ...`.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedVault {
    pub vault_id: VaultId,
}

impl AuthenticatedVault {
    /// Rejects unless `claimed` (a vault id carried in the request body)
    /// matches the session's own vault.
    pub fn require(&self, claimed: VaultId) -> Result<(), ApiError> {
        if self.vault_id == claimed {
            Ok(())
        } else {
            Err(ApiError::unauthorized())
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedVault {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(ApiError::unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(ApiError::unauthorized)?;

        let session = state
            .sessions
            .find_valid(&SessionToken(token.to_string()))
            .await
            .ok_or_else(ApiError::unauthorized)?;

        Ok(AuthenticatedVault { vault_id: session.vault_id })
    }
}
