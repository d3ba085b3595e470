//! HTTP adapters - REST and SSE endpoints.
//!
//! - `drafting` - Sessions, reply streaming, cancel, approve
//! - `conversations` - Direct saves, listing, clearing
//! - `health` - Liveness

pub mod conversations;
pub mod drafting;
pub mod error;
pub mod health;
pub mod state;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use conversations::conversation_routes;
pub use drafting::drafting_routes;
pub use error::{DraftingApiError, ErrorResponse};
pub use state::AppState;

/// Builds the full application router.
///
/// The timeout bounds time to response headers only; an open SSE stream
/// is not cut by it.
pub fn app_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .nest("/api/drafting", drafting_routes())
        .nest("/api/conversations", conversation_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(cors_layer(server))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
