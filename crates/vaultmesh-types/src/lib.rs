//! Shared identifiers, domain enums, and the error taxonomy used across
//! every crate in the VaultMesh trust and messaging core.

pub mod domain;
pub mod error;
pub mod identity;

pub use domain::{Address, ChannelStatus, EngagementKeyPurpose, PowAlgorithm, PowPurpose};
pub use error::{BindingMismatch, PowFailure, VaultMeshError, VaultMeshResult};
pub use identity::{
    is_valid_entity_id, ChannelId, EngagementKeyId, InboxMessageId, PowChallengeId,
    SecretUpdateId, SessionToken, VaultId,
};
