//! Route definitions for the `/api/v1` RPC surface.

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/vaults", vault_routes())
        .nest("/pow", pow_routes())
        .nest("/identity", identity_routes())
        .route("/sendMessage", post(handlers::messaging::send_message))
        .nest("/channels", channel_routes())
        .nest("/engagementKeys", engagement_routes())
        .nest("/secrets", secrets_routes())
}

fn vault_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/checkNameAvailability", get(handlers::vault::check_name_availability))
        .route("/register", post(handlers::vault::register_vault))
        .route("/login", post(handlers::vault::login))
        .route("/logout", post(handlers::vault::logout))
}

fn pow_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/challenge", get(handlers::pow::get_pow_challenge))
        .route("/verify", post(handlers::pow::verify_pow_proof))
}

fn identity_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/verifyEngagementKeyOwnership",
            post(handlers::identity::verify_engagement_key_ownership),
        )
        .route(
            "/getCounterpartyEngagementKey",
            post(handlers::identity::get_counterparty_engagement_key),
        )
}

fn channel_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::channel::get_channels))
        .route("/messages", get(handlers::channel::get_channel_messages))
        .route("/status", put(handlers::channel::update_channel_status))
        .route("/minDifficulty", put(handlers::channel::update_channel_min_difficulty))
        .route("/inbox/sync", get(handlers::channel::get_inbox_messages_for_sync))
        .route("/inbox", delete(handlers::channel::delete_inbox_messages))
}

fn engagement_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/forSending", post(handlers::engagement::get_engagement_key_for_sending))
        .route("/derivationPrivKey", post(handlers::engagement::get_derivation_priv_key))
        .route("/byPubKey", post(handlers::engagement::get_engagement_key_by_pub_key))
        .route("/", post(handlers::engagement::create_engagement_key))
}

fn secrets_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::secrets::create_secret_update))
        .route("/", get(handlers::secrets::get_secret_updates))
}

#[cfg(test)]
mod tests {
    #[test]
    fn routes_module_compiles() {
        assert!(true);
    }
}
