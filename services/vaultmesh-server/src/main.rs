//! VaultMesh trust and messaging server.
//!
//! # Usage
//!
//! ```bash
//! vaultmesh-server
//! vaultmesh-server --config /path/to/config.toml
//! VAULTMESH__SERVER__PORT=9000 vaultmesh-server
//! ```

mod config;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vaultmesh_api::state::AppState;
use vaultmesh_auth::{RateLimitConfig, SessionConfig, VaultRegistry};
use vaultmesh_db::{ChannelRepo, EngagementKeyRepo, InboxRepo, PowRepo, SecretUpdateRepo, SessionRepo, Store, VaultRepo};
use vaultmesh_messaging::{ChannelManager, EngagementKeyStore, MessageAdmission};
use vaultmesh_pow::{PowConfig, PowController};
use vaultmesh_secrets::SecretUpdateLog;
use vaultmesh_verify::{CrossDomainVerifier, DomainResolver, HttpCrossDomainVerifier, VerifierConfig};

use crate::config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "vaultmesh-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "VAULTMESH_CONFIG")]
    config: Option<String>,

    #[arg(long, env = "VAULTMESH_HOST")]
    host: Option<String>,

    #[arg(short, long, env = "VAULTMESH_PORT")]
    port: Option<u16>,

    #[arg(long, env = "VAULTMESH_LOG_LEVEL")]
    log_level: Option<String>,

    #[arg(long, env = "VAULTMESH_LOG_FORMAT")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;

    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    if let Some(level) = args.log_level {
        server_config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        server_config.logging.format = format;
    }

    init_logging(&server_config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting vaultmesh-server");

    let state = build_state(&server_config);
    let app = vaultmesh_api::create_router(state);

    let addr = server_config.server.socket_addr();
    tracing::info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => subscriber.with(fmt::layer().json().with_target(true)).init(),
        _ => subscriber.with(fmt::layer().pretty().with_target(true)).init(),
    }

    Ok(())
}

/// Wires the full repo/service graph behind `AppState`. All storage is
/// in-process (see `vaultmesh_db::Store`); swapping in a real database only
/// touches this function and the repo constructors it calls.
fn build_state(config: &ServerConfig) -> Arc<AppState> {
    let store = Arc::new(Store::new());

    let pow = Arc::new(PowController::new(
        PowRepo::new(store.clone()),
        PowConfig {
            challenge_ttl: Duration::from_secs(config.pow.challenge_ttl_secs),
            minimum_difficulty: config.pow.server_minimum_difficulty,
        },
    ));

    let accepted_domains: HashSet<String> = config.domain.accepted_domains.iter().cloned().collect();
    let registry = Arc::new(VaultRegistry::new(
        VaultRepo::new(store.clone()),
        SessionRepo::new(store.clone()),
        pow.clone(),
        accepted_domains,
        vaultmesh_auth::LoginRateLimiter::new(RateLimitConfig {
            login_attempts: config.rate_limit.max_failed_logins,
            lockout_duration: Duration::from_secs(config.rate_limit.base_backoff_secs),
            max_lockout_duration: Duration::from_secs(config.rate_limit.max_backoff_secs),
            ..RateLimitConfig::default()
        }),
        SessionConfig {
            lifetime: Duration::from_secs(config.session.ttl_hours * 3600),
        },
    ));

    let engagement_keys = EngagementKeyStore::new(VaultRepo::new(store.clone()), EngagementKeyRepo::new(store.clone()));

    let mut resolver = DomainResolver::new(Default::default());
    for (domain, base_url) in &config.domain.domain_server_map {
        resolver.insert(domain.clone(), base_url.clone());
    }
    let cross_domain: Arc<dyn CrossDomainVerifier> = Arc::new(HttpCrossDomainVerifier::with_config(
        resolver,
        VerifierConfig {
            request_timeout: Duration::from_secs(config.cross_domain.request_timeout_secs),
            max_retries: config.cross_domain.retries,
            cache_capacity: config.cross_domain.cache_capacity,
            positive_cache_ttl: Duration::from_secs(config.cross_domain.cache_ttl_secs),
            negative_cache_ttl: Duration::from_secs(config.cross_domain.negative_cache_ttl_secs),
        },
    ));

    let admission = Arc::new(MessageAdmission::new(
        pow.clone(),
        EngagementKeyStore::new(VaultRepo::new(store.clone()), EngagementKeyRepo::new(store.clone())),
        cross_domain,
        ChannelRepo::new(store.clone()),
        InboxRepo::new(store.clone()),
        config.domain.local_domain.clone(),
    ));

    let channels = Arc::new(ChannelManager::new(ChannelRepo::new(store.clone()), InboxRepo::new(store.clone())));
    let secrets = Arc::new(SecretUpdateLog::new(SecretUpdateRepo::new(store.clone())));

    Arc::new(AppState::new(
        store,
        registry,
        pow,
        Arc::new(engagement_keys),
        channels,
        admission,
        secrets,
        config.domain.local_domain.clone(),
    ))
}

async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }

    tracing::info!(timeout_secs = timeout.as_secs(), "draining in-flight requests");
    tokio::time::sleep(timeout).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_port_override() {
        let args = Args::parse_from(["vaultmesh-server", "--port", "9000"]);
        assert_eq!(args.port, Some(9000));
    }
}
