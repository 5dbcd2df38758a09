//! WebSocket handler for room connections
//!
//! One handler per live socket. The handler decodes inbound frames before
//! anything reaches the router, so the router only ever processes validated
//! requests and cannot be stalled by malformed traffic. Events delivered to
//! the connection's sink are encoded and written by a spawned writer task.
//!
//! Lifecycle: on upgrade the handler generates a fresh peer id, registers it
//! with `AddPeer`, and on any exit path sends `RemovePeer` exactly once.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use roomcast_core::models::{PeerId, RawContent, RoomId};
use roomcast_core::protocol;
use roomcast_core::service::PeerSink;

use crate::http::AppState;

/// WebSocket upgrade handler for rooms
///
/// GET /rooms/:room_id
///
/// The room id is whatever the path carries, taken verbatim: the relay
/// neither validates nor normalizes it.
pub async fn websocket_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let room_id = RoomId::from_string(room_id);
    ws.max_message_size(state.relay.max_frame_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state, room_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, room_id: RoomId) {
    let peer_id = PeerId::new();
    info!(
        room_id = %room_id,
        peer_id = %peer_id,
        "WebSocket connection established"
    );

    let (sink, mut events) = PeerSink::channel(state.relay.sink_capacity);
    state.router.add_peer(room_id.clone(), peer_id.clone(), sink);

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer task: sink events -> outbound frames. Forwarded payloads keep
    // their original frame type; relay events are always text.
    let writer_peer_id = peer_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let frame = match protocol::encode_socket_message(&event) {
                RawContent::Text(text) => Message::Text(text),
                RawContent::Binary(bytes) => Message::Binary(bytes),
            };
            if let Err(e) = ws_tx.send(frame).await {
                error!(peer_id = %writer_peer_id, "failed to write frame: {e}");
                break;
            }
        }
    });

    // Reader loop: inbound frames -> router requests. A frame that fails to
    // decode is logged and dropped; the connection stays open.
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                relay_frame(&state, &room_id, &peer_id, RawContent::Text(text));
            }
            Ok(Message::Binary(bytes)) => {
                relay_frame(&state, &room_id, &peer_id, RawContent::Binary(bytes));
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Keepalive is answered by axum itself.
            }
            Ok(Message::Close(_)) => {
                debug!(peer_id = %peer_id, "client closed connection");
                break;
            }
            Err(e) => {
                warn!(peer_id = %peer_id, "WebSocket transport error: {e}");
                break;
            }
        }
    }

    // Exactly one RemovePeer per connection, however the loop ended.
    state.router.remove_peer(room_id.clone(), peer_id.clone());
    writer.abort();

    info!(
        room_id = %room_id,
        peer_id = %peer_id,
        "WebSocket connection closed"
    );
}

fn relay_frame(state: &AppState, room_id: &RoomId, peer_id: &PeerId, content: RawContent) {
    match protocol::decode_sent(&content) {
        Ok(message) => state.router.relay(
            room_id.clone(),
            peer_id.clone(),
            message.to,
            message.content,
        ),
        Err(e) => warn!(
            room_id = %room_id,
            peer_id = %peer_id,
            kind = content.kind(),
            len = content.len(),
            "dropping undecodable frame: {e}"
        ),
    }
}
