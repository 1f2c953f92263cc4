//! Login attempt tracking with progressive lockout, adapted from the
//! teacher's `RateLimiter` login-attempt path, kept in-process.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use vaultmesh_types::VaultMeshError;

use crate::config::RateLimitConfig;

struct LoginAttempts {
    failed_count: u32,
    lockout_duration: Duration,
    locked_until: Option<Instant>,
}

pub struct LoginRateLimiter {
    config: RateLimitConfig,
    attempts: RwLock<HashMap<String, LoginAttempts>>,
}

impl LoginRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Fails with `RateLimited` if `identifier` is currently locked out.
    pub async fn check(&self, identifier: &str) -> Result<(), VaultMeshError> {
        let attempts = self.attempts.read().await;
        if let Some(entry) = attempts.get(identifier) {
            if let Some(locked_until) = entry.locked_until {
                let now = Instant::now();
                if now < locked_until {
                    return Err(VaultMeshError::RateLimited {
                        retry_after_secs: locked_until.duration_since(now).as_secs(),
                    });
                }
            }
        }
        Ok(())
    }

    pub async fn record_failure(&self, identifier: &str) {
        let mut attempts = self.attempts.write().await;
        let entry = attempts
            .entry(identifier.to_string())
            .or_insert_with(|| LoginAttempts {
                failed_count: 0,
                lockout_duration: self.config.lockout_duration,
                locked_until: None,
            });

        entry.failed_count += 1;
        if entry.failed_count >= self.config.login_attempts {
            let lockout = entry.lockout_duration.min(self.config.max_lockout_duration);
            entry.locked_until = Some(Instant::now() + lockout);
            entry.lockout_duration = Duration::from_secs_f64(
                (entry.lockout_duration.as_secs_f64() * self.config.lockout_multiplier)
                    .min(self.config.max_lockout_duration.as_secs_f64()),
            );
            tracing::warn!(identifier, lockout_secs = lockout.as_secs(), "login locked out");
        }
    }

    pub async fn record_success(&self, identifier: &str) {
        self.attempts.write().await.remove(identifier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lockout_engages_after_configured_attempts() {
        let limiter = LoginRateLimiter::new(RateLimitConfig {
            login_attempts: 2,
            ..RateLimitConfig::default()
        });
        limiter.check("alice@d1").await.unwrap();
        limiter.record_failure("alice@d1").await;
        limiter.check("alice@d1").await.unwrap();
        limiter.record_failure("alice@d1").await;

        assert!(limiter.check("alice@d1").await.is_err());
    }

    #[tokio::test]
    async fn success_clears_attempt_counter() {
        let limiter = LoginRateLimiter::new(RateLimitConfig::default());
        limiter.record_failure("bob@d1").await;
        limiter.record_success("bob@d1").await;
        limiter.check("bob@d1").await.unwrap();
    }
}
