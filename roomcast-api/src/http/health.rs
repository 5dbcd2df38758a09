//! Health check endpoint
//!
//! Provides a simple health check for monitoring probes, with relay-level
//! counters.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::http::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub rooms: usize,
    pub peers: usize,
}

/// Basic health check (always returns OK if the server is running)
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let counts = state.router.counts().await;
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: roomcast_core::SERVER_START_TIME.elapsed().as_secs(),
        rooms: counts.rooms,
        peers: counts.peers,
    })
}
