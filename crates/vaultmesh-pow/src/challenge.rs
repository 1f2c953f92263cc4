//! Issuance and consumption of PoW challenges.

use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;

use vaultmesh_db::{ConsumeBindings, PowRepo};
use vaultmesh_types::{PowAlgorithm, PowChallengeId, PowFailure, PowPurpose, VaultMeshError, VaultMeshResult};

use crate::config::PowConfig;
use crate::target::{derive_hash, difficulty_to_target, hash_meets_target};

pub struct PowController {
    repo: PowRepo,
    config: PowConfig,
}

/// What the caller solved and wants admitted. `claimed_hash` is whatever
/// the RPC request said the hash was — `consume` never trusts it for
/// anything beyond this one equality check; every caller downstream must
/// use the hash `consume` returns on the stamped challenge, not this field.
pub struct SolvedChallenge {
    pub id: PowChallengeId,
    pub solved_header: Vec<u8>,
    pub claimed_hash: [u8; 32],
}

impl PowController {
    pub fn new(repo: PowRepo, config: PowConfig) -> Self {
        Self { repo, config }
    }

    pub fn with_defaults(repo: PowRepo) -> Self {
        Self::new(repo, PowConfig::from_env())
    }

    pub async fn find(&self, id: PowChallengeId) -> Option<vaultmesh_db::models::PowChallenge> {
        self.repo.find(id).await
    }

    /// Issues a new challenge. `requested_difficulty` is clamped up to the
    /// server floor; callers that need the messaging-specific "max of
    /// channel/vault/server floor" rule compute that difficulty
    /// before calling this.
    pub async fn issue(
        &self,
        algorithm: PowAlgorithm,
        purpose: PowPurpose,
        requested_difficulty: u64,
    ) -> vaultmesh_db::models::PowChallenge {
        let difficulty = requested_difficulty.max(self.config.minimum_difficulty);
        let target = difficulty_to_target(difficulty);

        let mut header = vec![0u8; algorithm.header_len()];
        rand::thread_rng().fill_bytes(&mut header);
        // Zero the counter region so the solver has a known starting point.
        for b in &mut header[algorithm.counter_region()] {
            *b = 0;
        }

        let now = Utc::now();
        let challenge = vaultmesh_db::models::PowChallenge {
            id: PowChallengeId::new(),
            algorithm,
            header,
            target,
            difficulty,
            purpose,
            bound_sender: None,
            bound_recipient: None,
            bound_sender_pub_key: None,
            created_at: now,
            expires_at: now + chrono::Duration::from_std(self.config.challenge_ttl).unwrap(),
            consumed_at: None,
            solved_hash: None,
            solved_header: None,
        };

        self.repo.create(challenge).await
    }

    /// Verifies and atomically consumes a solved challenge, binding it to
    /// `(sender, recipient, sender_pub_key)` before the atomic consume.
    pub async fn consume(
        &self,
        solved: SolvedChallenge,
        sender: &str,
        recipient: &str,
        sender_pub_key: &[u8; 33],
    ) -> VaultMeshResult<vaultmesh_db::models::PowChallenge> {
        let challenge = self
            .repo
            .find(solved.id)
            .await
            .ok_or_else(|| VaultMeshError::NotFound("pow challenge".to_string()))?;

        if solved.solved_header.len() != challenge.algorithm.header_len() {
            return Err(VaultMeshError::from(PowFailure::HeaderMismatch));
        }

        let nonce_region = challenge.algorithm.nonce_region();
        if challenge.header[..nonce_region.start] != solved.solved_header[..nonce_region.start]
            || challenge.header[nonce_region.end..] != solved.solved_header[nonce_region.end..]
        {
            return Err(VaultMeshError::from(PowFailure::HeaderMismatch));
        }

        let hash = derive_hash(&solved.solved_header);
        if hash != solved.claimed_hash {
            return Err(VaultMeshError::from(PowFailure::HashMismatch));
        }
        if !hash_meets_target(&hash, &challenge.target) {
            return Err(VaultMeshError::from(PowFailure::BadSolution));
        }

        let bindings = ConsumeBindings {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            sender_pub_key: *sender_pub_key,
        };

        self.repo
            .consume(solved.id, solved.solved_header, hash, bindings)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultmesh_db::Store;

    fn controller() -> PowController {
        PowController::new(PowRepo::new(Arc::new(Store::new())), PowConfig::default())
    }

    fn solve(mut challenge: vaultmesh_db::models::PowChallenge) -> SolvedChallenge {
        let counter_region = challenge.algorithm.counter_region();
        for counter in 0u32..200_000 {
            let bytes = counter.to_be_bytes();
            challenge.header[counter_region.clone()].copy_from_slice(&bytes);
            let hash = derive_hash(&challenge.header);
            if hash_meets_target(&hash, &challenge.target) {
                return SolvedChallenge {
                    id: challenge.id,
                    solved_header: challenge.header.clone(),
                    claimed_hash: hash,
                };
            }
        }
        panic!("failed to find a solution at test difficulty");
    }

    #[tokio::test]
    async fn issued_challenge_can_be_solved_and_consumed() {
        let controller = controller();
        let challenge = controller
            .issue(PowAlgorithm::Pow564b, PowPurpose::Messaging, 256)
            .await;
        let solved = solve(challenge.clone());

        let consumed = controller
            .consume(solved, "alice@d1", "bob@d2", &[7u8; 33])
            .await
            .unwrap();
        assert!(consumed.is_consumed());
    }

    #[tokio::test]
    async fn tampering_outside_nonce_region_is_rejected() {
        let controller = controller();
        let challenge = controller
            .issue(PowAlgorithm::Pow564b, PowPurpose::Messaging, 256)
            .await;
        let mut solved = solve(challenge.clone());
        solved.solved_header[60] ^= 0xFF;

        let err = controller
            .consume(solved, "alice@d1", "bob@d2", &[7u8; 33])
            .await
            .unwrap_err();
        assert!(matches!(err, VaultMeshError::PowInvalid(PowFailure::HeaderMismatch)));
    }

    #[tokio::test]
    async fn unsolved_header_fails_target_check() {
        let controller = controller();
        let challenge = controller
            .issue(PowAlgorithm::Pow564b, PowPurpose::Messaging, 256)
            .await;
        let unsolved = SolvedChallenge {
            id: challenge.id,
            solved_header: challenge.header.clone(),
            claimed_hash: derive_hash(&challenge.header),
        };

        let err = controller
            .consume(unsolved, "alice@d1", "bob@d2", &[7u8; 33])
            .await
            .unwrap_err();
        assert!(matches!(err, VaultMeshError::PowInvalid(PowFailure::BadSolution)) || matches!(err, VaultMeshError::PowInvalid(PowFailure::HeaderMismatch)));
    }

    #[tokio::test]
    async fn claimed_hash_must_match_the_rederived_hash() {
        let controller = controller();
        let challenge = controller
            .issue(PowAlgorithm::Pow564b, PowPurpose::Messaging, 256)
            .await;
        let mut solved = solve(challenge);
        solved.claimed_hash = [0xAB; 32];

        let err = controller
            .consume(solved, "alice@d1", "bob@d2", &[7u8; 33])
            .await
            .unwrap_err();
        assert!(matches!(err, VaultMeshError::PowInvalid(PowFailure::HashMismatch)));
    }

    #[tokio::test]
    async fn requested_difficulty_is_floored_at_server_minimum() {
        let controller = controller();
        let challenge = controller.issue(PowAlgorithm::Pow564b, PowPurpose::Generic, 1).await;
        assert_eq!(challenge.difficulty, crate::config::MINIMUM_DIFFICULTY);
    }
}
