//! Cross-domain engagement-key ownership verification.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use vaultmesh_types::{VaultMeshError, VaultMeshResult};

use crate::cache::VerificationCache;
use crate::domain_resolver::DomainResolver;

const TOTAL_BUDGET: Duration = Duration::from_secs(15);

/// Sizing knobs for [`HttpCrossDomainVerifier`]; defaults match the values
/// assumed elsewhere (5s timeout, 2 retries, 60s/10s cache TTLs).
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub cache_capacity: usize,
    pub positive_cache_ttl: Duration,
    pub negative_cache_ttl: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            max_retries: 2,
            cache_capacity: crate::cache::MAX_ENTRIES,
            positive_cache_ttl: crate::cache::POSITIVE_TTL,
            negative_cache_ttl: crate::cache::NEGATIVE_TTL,
        }
    }
}

/// Port interface so the admission pipeline can inject a fake verifier in
/// tests instead of making a real network call.
#[async_trait]
pub trait CrossDomainVerifier: Send + Sync {
    async fn verify_engagement_key_ownership(
        &self,
        address: &str,
        engagement_pub_key: &[u8; 33],
    ) -> VaultMeshResult<bool>;
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    address: &'a str,
    #[serde(rename = "engagementPubKey")]
    engagement_pub_key_hex: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    valid: bool,
}

pub struct HttpCrossDomainVerifier {
    client: reqwest::Client,
    resolver: DomainResolver,
    cache: VerificationCache,
    config: VerifierConfig,
}

impl HttpCrossDomainVerifier {
    pub fn new(resolver: DomainResolver) -> Self {
        Self::with_config(resolver, VerifierConfig::default())
    }

    pub fn with_config(resolver: DomainResolver, config: VerifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            resolver,
            cache: VerificationCache::with_config(
                config.cache_capacity,
                config.positive_cache_ttl,
                config.negative_cache_ttl,
            ),
            config,
        }
    }

    pub fn invalidate(&self, address: &str, engagement_pub_key: &[u8; 33]) {
        self.cache.invalidate(address, engagement_pub_key);
    }

    async fn call_once(&self, base_url: &str, address: &str, engagement_pub_key: &[u8; 33]) -> VaultMeshResult<bool> {
        let url = format!("{}/rpc/verifyEngagementKeyOwnership", base_url);
        let body = VerifyRequest {
            address,
            engagement_pub_key_hex: hex::encode(engagement_pub_key),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|_| VaultMeshError::IdentityVerificationFailed)?;

        if !response.status().is_success() {
            return Err(VaultMeshError::IdentityVerificationFailed);
        }

        let parsed: VerifyResponse = response
            .json()
            .await
            .map_err(|_| VaultMeshError::IdentityVerificationFailed)?;
        Ok(parsed.valid)
    }
}

#[async_trait]
impl CrossDomainVerifier for HttpCrossDomainVerifier {
    async fn verify_engagement_key_ownership(
        &self,
        address: &str,
        engagement_pub_key: &[u8; 33],
    ) -> VaultMeshResult<bool> {
        if let Some(cached) = self.cache.get(address, engagement_pub_key) {
            return Ok(cached);
        }

        let domain = address
            .split_once('@')
            .map(|(_, domain)| domain)
            .ok_or(VaultMeshError::IdentityVerificationFailed)?;
        let base_url = self
            .resolver
            .resolve(domain)
            .ok_or(VaultMeshError::IdentityVerificationFailed)?
            .to_string();

        let deadline = tokio::time::Instant::now() + TOTAL_BUDGET;
        let mut last_err = VaultMeshError::IdentityVerificationFailed;

        for attempt in 0..=self.config.max_retries {
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            match self.call_once(&base_url, address, engagement_pub_key).await {
                Ok(valid) => {
                    self.cache.put(address, engagement_pub_key, valid);
                    return Ok(valid);
                }
                Err(err) => {
                    last_err = err;
                    if attempt < self.config.max_retries {
                        let jitter_ms = rand::thread_rng().gen_range(0..50);
                        let jitter = Duration::from_millis(100 * 2u64.pow(attempt) + jitter_ms);
                        tokio::time::sleep(jitter.min(deadline.saturating_duration_since(tokio::time::Instant::now()))).await;
                    }
                }
            }
        }

        Err(last_err)
    }
}

/// A verifier that always answers from a fixed table, for injecting into
/// MessageAdmission tests deterministically.
pub struct FakeCrossDomainVerifier {
    pub answers: dashmap::DashMap<(String, [u8; 33]), bool>,
}

impl FakeCrossDomainVerifier {
    pub fn new() -> Self {
        Self {
            answers: dashmap::DashMap::new(),
        }
    }

    pub fn set(&self, address: &str, engagement_pub_key: [u8; 33], valid: bool) {
        self.answers.insert((address.to_string(), engagement_pub_key), valid);
    }
}

impl Default for FakeCrossDomainVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrossDomainVerifier for FakeCrossDomainVerifier {
    async fn verify_engagement_key_ownership(
        &self,
        address: &str,
        engagement_pub_key: &[u8; 33],
    ) -> VaultMeshResult<bool> {
        Ok(self
            .answers
            .get(&(address.to_string(), *engagement_pub_key))
            .map(|v| *v)
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_verifier_returns_false_for_unknown_pairs() {
        let verifier = FakeCrossDomainVerifier::new();
        verifier.set("bob@d1", [1u8; 33], true);

        assert!(verifier
            .verify_engagement_key_ownership("bob@d1", &[1u8; 33])
            .await
            .unwrap());
        assert!(!verifier
            .verify_engagement_key_ownership("bob@d1", &[2u8; 33])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unresolvable_domain_fails_identity_verification() {
        let verifier = HttpCrossDomainVerifier::new(DomainResolver::new(Default::default()));
        let err = verifier
            .verify_engagement_key_ownership("eve@unknown.example", &[3u8; 33])
            .await
            .unwrap_err();
        assert!(matches!(err, VaultMeshError::IdentityVerificationFailed));
    }
}
