//! Server configuration.
//!
//! Supports environment variables, config files, and CLI arguments.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub domain: DomainSettings,

    #[serde(default)]
    pub pow: PowSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub cross_domain: CrossDomainSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("invalid socket address")
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Which domains this deployment accepts registrations for, which one it
/// *is*, and where to reach every other domain's server for cross-domain
/// verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSettings {
    #[serde(default = "default_accepted_domains")]
    pub accepted_domains: Vec<String>,

    #[serde(default = "default_local_domain")]
    pub local_domain: String,

    #[serde(default = "default_domain_server_map")]
    pub domain_server_map: HashMap<String, String>,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            accepted_domains: default_accepted_domains(),
            local_domain: default_local_domain(),
            domain_server_map: default_domain_server_map(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowSettings {
    #[serde(default = "default_minimum_difficulty")]
    pub server_minimum_difficulty: u64,

    #[serde(default = "default_challenge_ttl")]
    pub challenge_ttl_secs: u64,

    #[serde(default = "default_minimum_difficulty")]
    pub default_difficulty: u64,
}

impl Default for PowSettings {
    fn default() -> Self {
        Self {
            server_minimum_difficulty: default_minimum_difficulty(),
            challenge_ttl_secs: default_challenge_ttl(),
            default_difficulty: default_minimum_difficulty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_session_ttl_hours")]
    pub ttl_hours: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_hours: default_session_ttl_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_max_failed_logins")]
    pub max_failed_logins: u32,

    #[serde(default = "default_base_backoff_secs")]
    pub base_backoff_secs: u64,

    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_failed_logins: default_max_failed_logins(),
            base_backoff_secs: default_base_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossDomainSettings {
    #[serde(default = "default_cross_domain_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_cross_domain_retries")]
    pub retries: u32,

    #[serde(default = "default_positive_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_negative_cache_ttl_secs")]
    pub negative_cache_ttl_secs: u64,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for CrossDomainSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_cross_domain_timeout_secs(),
            retries: default_cross_domain_retries(),
            cache_ttl_secs: default_positive_cache_ttl_secs(),
            negative_cache_ttl_secs: default_negative_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// =============================================================================
// Default functions
// =============================================================================

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_accepted_domains() -> Vec<String> {
    vec!["keypears.com".to_string(), "passapples.com".to_string()]
}

fn default_local_domain() -> String {
    "keypears.com".to_string()
}

fn default_domain_server_map() -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("keypears.com".to_string(), "https://keypears.com".to_string());
    map.insert("passapples.com".to_string(), "https://passapples.com".to_string());
    map.insert("localhost".to_string(), "http://127.0.0.1:8787".to_string());
    map
}

fn default_minimum_difficulty() -> u64 {
    vaultmesh_pow::config::MINIMUM_DIFFICULTY
}

fn default_challenge_ttl() -> u64 {
    600
}

fn default_session_ttl_hours() -> u64 {
    24
}

fn default_max_failed_logins() -> u32 {
    5
}

fn default_base_backoff_secs() -> u64 {
    30
}

fn default_max_backoff_secs() -> u64 {
    3600
}

fn default_cross_domain_timeout_secs() -> u64 {
    5
}

fn default_cross_domain_retries() -> u32 {
    2
}

fn default_positive_cache_ttl_secs() -> u64 {
    60
}

fn default_negative_cache_ttl_secs() -> u64 {
    10
}

fn default_cache_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// =============================================================================
// Loading
// =============================================================================

impl ServerConfig {
    /// Loads from `config/default.toml`/`config/local.toml` and
    /// `VAULTMESH__`-prefixed environment variables, in that order.
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("VAULTMESH")
                    .separator("__")
                    .try_parsing(true),
            );

        let built = builder.build()?;

        let server_config: ServerConfig = built.try_deserialize().unwrap_or_else(|_| {
            tracing::warn!("using default configuration - some settings may need adjustment");
            ServerConfig::default()
        });

        Ok(server_config)
    }

    pub fn development() -> Self {
        Self::default()
    }

    pub fn production() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8787,
                shutdown_timeout_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            domain: DomainSettings::default(),
            pow: PowSettings::default(),
            session: SessionSettings::default(),
            rate_limit: RateLimitSettings::default(),
            cross_domain: CrossDomainSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_bind_to_8787() {
        let config = ServerConfig::development();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn production_forces_json_logging() {
        let config = ServerConfig::production();
        assert_eq!(config.logging.format, "json");
    }
}
