//! HTTP/JSON binding of the vault, PoW, messaging, and trust RPC surface.
//!
//! - REST API at `/api/v1/*`
//! - Liveness at `/health`

pub mod dto;
pub mod error;
pub mod extractor;
pub mod handlers;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full router. CORS is permissive by default; callers that
/// need a locked-down policy should layer their own `CorsLayer` on top
/// after construction.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", routes::api_v1_routes())
        .layer(
            TraceLayer::new_for_http().on_response(
                |response: &axum::response::Response, latency: Duration, _span: &tracing::Span| {
                    if latency > SLOW_REQUEST_THRESHOLD {
                        tracing::warn!(status = %response.status(), ?latency, "slow request");
                    } else {
                        tracing::debug!(status = %response.status(), ?latency, "request completed");
                    }
                },
            ),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Logs a `warn` for requests slower than this, `debug` otherwise.
pub const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_secs(1);
