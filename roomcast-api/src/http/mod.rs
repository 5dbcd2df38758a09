// Module: http
// WebSocket relay surface plus a small monitoring API

pub mod error;
pub mod health;
pub mod room;
pub mod websocket;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use roomcast_core::config::RelayConfig;
use roomcast_core::service::RouterHandle;
use roomcast_core::Config;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub router: RouterHandle,
    pub relay: RelayConfig,
}

/// Create the HTTP router with all routes
pub fn create_router(router: RouterHandle, config: &Config) -> Router {
    let state = AppState {
        router,
        relay: config.relay.clone(),
    };

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Room WebSocket endpoint and introspection
        .route("/rooms/:room_id", get(websocket::websocket_handler))
        .route("/rooms/:room_id/peers", get(room::list_room_peers))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
