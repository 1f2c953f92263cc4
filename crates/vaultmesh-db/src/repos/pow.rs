use std::sync::Arc;

use chrono::Utc;

use vaultmesh_types::{BindingMismatch, PowChallengeId, PowFailure, VaultMeshError};

use crate::models::PowChallenge;
use crate::store::Store;

/// The exact bindings stamped onto a consumed challenge at channel-binding
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeBindings {
    pub sender: String,
    pub recipient: String,
    pub sender_pub_key: [u8; 33],
}

pub struct PowRepo {
    store: Arc<Store>,
}

impl PowRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, challenge: PowChallenge) -> PowChallenge {
        self.store
            .pow_challenges
            .write()
            .await
            .insert(challenge.id, challenge.clone());
        challenge
    }

    pub async fn find(&self, id: PowChallengeId) -> Option<PowChallenge> {
        self.store.pow_challenges.read().await.get(&id).cloned()
    }

    /// Atomically consumes a challenge under the exact ordering: exists →
    /// not expired → not consumed. On success, stamps
    /// `consumedAt`/`solvedHash`/`solvedHeader`/bindings together. Re-entry
    /// with the same id after a prior success returns the bound proof only
    /// if `bindings` matches byte-for-byte; otherwise
    /// `ReusedWithDifferentBinding`.
    ///
    /// The hash/target/header verification itself lives in `vaultmesh-pow`
    /// (this repo only owns the single-use state transition); the caller
    /// passes in the already-verified `solved_hash`/`solved_header`.
    pub async fn consume(
        &self,
        id: PowChallengeId,
        solved_header: Vec<u8>,
        solved_hash: [u8; 32],
        bindings: ConsumeBindings,
    ) -> Result<PowChallenge, VaultMeshError> {
        let mut table = self.store.pow_challenges.write().await;
        let challenge = table
            .get_mut(&id)
            .ok_or_else(|| VaultMeshError::NotFound("pow challenge".to_string()))?;

        if Utc::now() >= challenge.expires_at {
            return Err(VaultMeshError::from(PowFailure::Expired));
        }

        if let Some(consumed_at) = challenge.consumed_at {
            let _ = consumed_at;
            let existing_matches = challenge.bound_sender.as_deref() == Some(bindings.sender.as_str())
                && challenge.bound_recipient.as_deref() == Some(bindings.recipient.as_str())
                && challenge.bound_sender_pub_key == Some(bindings.sender_pub_key);
            return if existing_matches {
                Ok(challenge.clone())
            } else {
                Err(VaultMeshError::from(PowFailure::ReusedWithDifferentBinding))
            };
        }

        challenge.consumed_at = Some(Utc::now());
        challenge.solved_hash = Some(solved_hash);
        challenge.solved_header = Some(solved_header);
        challenge.bound_sender = Some(bindings.sender);
        challenge.bound_recipient = Some(bindings.recipient);
        challenge.bound_sender_pub_key = Some(bindings.sender_pub_key);

        Ok(challenge.clone())
    }

    /// Verifies a previously consumed challenge's bindings match exactly,
    /// returning the refinement error named for the first mismatching
    /// field. Used by `sendMessage`'s binding checks.
    pub fn check_bindings(
        challenge: &PowChallenge,
        sender: &str,
        recipient: &str,
        sender_pub_key: &[u8; 33],
    ) -> Result<(), VaultMeshError> {
        if !challenge.is_consumed() {
            return Err(VaultMeshError::from(PowFailure::Consumed));
        }
        if challenge.bound_sender.as_deref() != Some(sender) {
            return Err(VaultMeshError::from(BindingMismatch::Sender));
        }
        if challenge.bound_recipient.as_deref() != Some(recipient) {
            return Err(VaultMeshError::from(BindingMismatch::Recipient));
        }
        if challenge.bound_sender_pub_key.as_ref() != Some(sender_pub_key) {
            return Err(VaultMeshError::from(BindingMismatch::SenderPubKey));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultmesh_types::{PowAlgorithm, PowPurpose};

    fn sample(expires_in: chrono::Duration) -> PowChallenge {
        PowChallenge {
            id: PowChallengeId::new(),
            algorithm: PowAlgorithm::Pow564b,
            header: vec![0u8; 64],
            target: [0xFFu8; 32],
            difficulty: 256,
            purpose: PowPurpose::Messaging,
            bound_sender: None,
            bound_recipient: None,
            bound_sender_pub_key: None,
            created_at: Utc::now(),
            expires_at: Utc::now() + expires_in,
            consumed_at: None,
            solved_hash: None,
            solved_header: None,
        }
    }

    fn bindings() -> ConsumeBindings {
        ConsumeBindings {
            sender: "alice@d1".into(),
            recipient: "bob@d2".into(),
            sender_pub_key: [7u8; 33],
        }
    }

    #[tokio::test]
    async fn second_consume_with_same_bindings_returns_same_row() {
        let repo = PowRepo::new(Arc::new(Store::new()));
        let challenge = repo.create(sample(chrono::Duration::minutes(10))).await;

        let first = repo
            .consume(challenge.id, vec![1], [1u8; 32], bindings())
            .await
            .unwrap();
        let second = repo
            .consume(challenge.id, vec![2], [2u8; 32], bindings())
            .await
            .unwrap();

        assert_eq!(first.solved_hash, second.solved_hash);
    }

    #[tokio::test]
    async fn second_consume_with_different_bindings_fails() {
        let repo = PowRepo::new(Arc::new(Store::new()));
        let challenge = repo.create(sample(chrono::Duration::minutes(10))).await;

        repo.consume(challenge.id, vec![1], [1u8; 32], bindings())
            .await
            .unwrap();

        let mut other = bindings();
        other.sender_pub_key = [9u8; 33];
        let err = repo
            .consume(challenge.id, vec![1], [1u8; 32], other)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VaultMeshError::PowInvalid(PowFailure::ReusedWithDifferentBinding)
        ));
    }

    #[tokio::test]
    async fn expired_challenge_cannot_be_consumed() {
        let repo = PowRepo::new(Arc::new(Store::new()));
        let challenge = repo.create(sample(chrono::Duration::seconds(-1))).await;

        let err = repo
            .consume(challenge.id, vec![1], [1u8; 32], bindings())
            .await
            .unwrap_err();
        assert!(matches!(err, VaultMeshError::PowInvalid(PowFailure::Expired)));
    }
}
