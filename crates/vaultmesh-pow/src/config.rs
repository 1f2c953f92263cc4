//! PoW sizing knobs. Mirrors the config-via-env idiom used throughout the
//! server (see `services/vaultmesh-server`'s `ServerConfig`), kept local to
//! this crate since nothing outside it needs these numbers.

use std::time::Duration;

/// Server-enforced floor below which no challenge is ever issued.
pub const MINIMUM_DIFFICULTY: u64 = 256;

#[derive(Debug, Clone)]
pub struct PowConfig {
    pub challenge_ttl: Duration,
    pub minimum_difficulty: u64,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            challenge_ttl: Duration::from_secs(10 * 60),
            minimum_difficulty: MINIMUM_DIFFICULTY,
        }
    }
}

impl PowConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("VAULTMESH_POW_TTL_SECS") {
            if let Ok(secs) = raw.parse::<u64>() {
                config.challenge_ttl = Duration::from_secs(secs);
            }
        }
        if let Ok(raw) = std::env::var("VAULTMESH_POW_MIN_DIFFICULTY") {
            if let Ok(difficulty) = raw.parse::<u64>() {
                config.minimum_difficulty = difficulty.max(MINIMUM_DIFFICULTY);
            }
        }
        config
    }
}
