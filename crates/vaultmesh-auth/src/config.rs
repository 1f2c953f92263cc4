//! Session and rate-limit sizing knobs.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub lifetime: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window: Duration,
    pub lockout_duration: Duration,
    pub lockout_multiplier: f64,
    pub max_lockout_duration: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_attempts: 5,
            login_window: Duration::from_secs(60),
            lockout_duration: Duration::from_secs(30),
            lockout_multiplier: 2.0,
            max_lockout_duration: Duration::from_secs(60 * 60),
        }
    }
}
