//! Workspace-wide error taxonomy.
//!
//! Every crate below `vaultmesh-api` returns `Result<T, VaultMeshError>` (or
//! a local error that converts into it). Variant names double as the wire
//! error codes, not Rust type names.

use thiserror::Error;

/// PoW-specific failure refinements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PowFailure {
    #[error("challenge expired")]
    Expired,
    #[error("challenge already consumed")]
    Consumed,
    #[error("solved hash does not meet target")]
    BadSolution,
    #[error("claimed hash does not match the hash derived from the solved header")]
    HashMismatch,
    #[error("solved header does not match issued header outside the nonce region")]
    HeaderMismatch,
    #[error("solved hash was derived under a different algorithm")]
    AlgorithmMismatch,
    #[error("challenge reused with different channel binding")]
    ReusedWithDifferentBinding,
}

/// Channel-binding mismatch refinements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindingMismatch {
    #[error("sender address does not match")]
    Sender,
    #[error("recipient address does not match")]
    Recipient,
    #[error("sender public key does not match")]
    SenderPubKey,
}

#[derive(Debug, Error)]
pub enum VaultMeshError {
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("invalid session")]
    AuthInvalid,

    #[error("proof of work invalid: {0}")]
    PowInvalid(#[from] PowFailure),

    #[error("signature does not verify")]
    SignatureInvalid,

    #[error("cross-domain identity verification failed")]
    IdentityVerificationFailed,

    #[error("channel binding mismatch: {0}")]
    ChannelBindingMismatch(#[from] BindingMismatch),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("internal error")]
    Internal(String),
}

impl VaultMeshError {
    /// Stable machine-readable code, independent of the `Display` message.
    pub fn error_code(&self) -> &'static str {
        match self {
            VaultMeshError::ValidationFailed(_) => "VALIDATION_FAILED",
            VaultMeshError::AuthRequired => "AUTH_REQUIRED",
            VaultMeshError::AuthInvalid => "AUTH_INVALID",
            VaultMeshError::PowInvalid(PowFailure::Expired) => "POW_EXPIRED",
            VaultMeshError::PowInvalid(PowFailure::Consumed) => "POW_CONSUMED",
            VaultMeshError::PowInvalid(PowFailure::BadSolution) => "POW_BAD_SOLUTION",
            VaultMeshError::PowInvalid(PowFailure::HashMismatch) => "POW_HASH_MISMATCH",
            VaultMeshError::PowInvalid(PowFailure::HeaderMismatch) => "POW_HEADER_MISMATCH",
            VaultMeshError::PowInvalid(PowFailure::AlgorithmMismatch) => "POW_ALGORITHM_MISMATCH",
            VaultMeshError::PowInvalid(PowFailure::ReusedWithDifferentBinding) => {
                "POW_REUSED_WITH_DIFFERENT_BINDING"
            }
            VaultMeshError::SignatureInvalid => "SIGNATURE_INVALID",
            VaultMeshError::IdentityVerificationFailed => "IDENTITY_VERIFICATION_FAILED",
            VaultMeshError::ChannelBindingMismatch(BindingMismatch::Sender) => {
                "CHANNEL_BINDING_SENDER_MISMATCH"
            }
            VaultMeshError::ChannelBindingMismatch(BindingMismatch::Recipient) => {
                "CHANNEL_BINDING_RECIPIENT_MISMATCH"
            }
            VaultMeshError::ChannelBindingMismatch(BindingMismatch::SenderPubKey) => {
                "CHANNEL_BINDING_SENDER_PUBKEY_MISMATCH"
            }
            VaultMeshError::Conflict(_) => "CONFLICT",
            VaultMeshError::NotFound(_) => "NOT_FOUND",
            VaultMeshError::RateLimited { .. } => "RATE_LIMITED",
            VaultMeshError::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status code for the `ApiSurface` layer.
    pub fn status_code(&self) -> u16 {
        match self {
            VaultMeshError::ValidationFailed(_) => 400,
            VaultMeshError::AuthRequired => 401,
            VaultMeshError::AuthInvalid => 401,
            VaultMeshError::PowInvalid(_) => 400,
            VaultMeshError::SignatureInvalid => 400,
            VaultMeshError::IdentityVerificationFailed => 403,
            VaultMeshError::ChannelBindingMismatch(_) => 400,
            VaultMeshError::Conflict(_) => 409,
            VaultMeshError::NotFound(_) => 404,
            VaultMeshError::RateLimited { .. } => 429,
            VaultMeshError::Internal(_) => 500,
        }
    }

    /// Client-facing message. Never leaks internals for `Internal`, and
    /// never distinguishes PoW sub-reasons beyond the declared taxonomy —
    /// the sub-reason is still carried in `error_code()` for client logic,
    /// just not narrated in prose.
    pub fn client_message(&self) -> String {
        match self {
            VaultMeshError::Internal(_) => "an internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

pub type VaultMeshResult<T> = Result<T, VaultMeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_never_leak_their_detail() {
        let err = VaultMeshError::Internal("leaked db password in connection string".to_string());
        assert_eq!(err.client_message(), "an internal error occurred");
    }

    #[test]
    fn pow_failures_map_to_distinct_codes() {
        let consumed = VaultMeshError::from(PowFailure::Consumed);
        let expired = VaultMeshError::from(PowFailure::Expired);
        assert_ne!(consumed.error_code(), expired.error_code());
        assert_eq!(consumed.status_code(), 400);
    }

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(VaultMeshError::NotFound("x".into()).status_code(), 404);
        assert_eq!(VaultMeshError::Conflict("x".into()).status_code(), 409);
        assert_eq!(
            VaultMeshError::RateLimited { retry_after_secs: 5 }.status_code(),
            429
        );
    }
}
