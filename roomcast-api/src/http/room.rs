//! Room introspection endpoints
//!
//! Read-only monitoring surface; presence is already visible to every room
//! member through join/leave events, so nothing here widens what a client
//! can learn.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::http::{AppError, AppResult, AppState};
use roomcast_core::models::RoomId;

/// Peers currently present in a room
#[derive(Debug, Serialize)]
pub struct RoomPeersResponse {
    pub room_id: String,
    pub peers: Vec<String>,
}

/// List the peers of a room
///
/// GET /rooms/:room_id/peers
pub async fn list_room_peers(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> AppResult<Json<RoomPeersResponse>> {
    let room_id = RoomId::from_string(room_id);
    let peers = state
        .router
        .room_peers(room_id.clone())
        .await
        .ok_or_else(|| AppError::resource_not_found("Room"))?;

    Ok(Json(RoomPeersResponse {
        room_id: room_id.as_str().to_string(),
        peers: peers.iter().map(ToString::to_string).collect(),
    }))
}
