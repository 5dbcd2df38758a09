//! Integration tests for the wire codec and room router together.
//!
//! Each scenario feeds literal client frames through the codec the way a
//! connection handler would, submits the result to a live router task, and
//! asserts on what every peer's sink receives.
//!
//! Run with: cargo test --test integration_tests

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use roomcast_core::models::{
    PeerId, PeerSocketMessage, RawContent, ReceivedPeerMessage, RoomEvent, RoomId,
};
use roomcast_core::protocol;
use roomcast_core::service::{PeerSink, Router, RouterHandle};

const SINK_CAPACITY: usize = 16;

struct TestPeer {
    id: PeerId,
    rx: mpsc::Receiver<PeerSocketMessage>,
}

impl TestPeer {
    /// Connect a peer to a room, as the connection handler would on attach.
    fn join(handle: &RouterHandle, room: &RoomId) -> Self {
        let id = PeerId::new();
        let (sink, rx) = PeerSink::channel(SINK_CAPACITY);
        handle.add_peer(room.clone(), id.clone(), sink);
        Self { id, rx }
    }

    /// Decode and submit one raw client frame, as the handler does for each
    /// inbound WebSocket frame. Undecodable frames are dropped.
    fn send_frame(&self, handle: &RouterHandle, room: &RoomId, frame: RawContent) {
        if let Ok(message) = protocol::decode_sent(&frame) {
            handle.relay(room.clone(), self.id.clone(), message.to, message.content);
        }
    }

    fn drain(&mut self) -> Vec<PeerSocketMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }

    async fn expect_nothing(&mut self) {
        let received = timeout(Duration::from_millis(100), self.rx.recv()).await;
        assert!(received.is_err(), "expected no delivery, got {received:?}");
    }
}

fn room(id: &str) -> RoomId {
    RoomId::from_string(id.to_string())
}

fn text_frame(s: &str) -> RawContent {
    RawContent::Text(s.to_string())
}

/// Wait until every previously submitted request has been processed.
async fn flush(handle: &RouterHandle) {
    let _ = handle.counts().await;
}

#[tokio::test]
async fn test_broadcast_text_between_two_peers() {
    let handle = Router::spawn();
    let foo = room("foo");

    let mut alice = TestPeer::join(&handle, &foo);
    let mut bob = TestPeer::join(&handle, &foo);
    flush(&handle).await;

    // Bob observed alice's presence on arrival.
    assert_eq!(
        bob.drain(),
        vec![PeerSocketMessage::FromRelay(RoomEvent::PeerJoined(
            alice.id.clone()
        ))]
    );
    alice.drain();

    alice.send_frame(&handle, &foo, text_frame("broadcast:\n\nhello"));
    flush(&handle).await;

    assert_eq!(
        bob.drain(),
        vec![PeerSocketMessage::FromPeer(ReceivedPeerMessage {
            from: alice.id.clone(),
            content: RawContent::Text("hello".to_string()),
        })]
    );
    alice.expect_nothing().await;
}

#[tokio::test]
async fn test_targeted_binary_reaches_only_its_recipient() {
    let handle = Router::spawn();
    let foo = room("foo");

    let mut alice = TestPeer::join(&handle, &foo);
    let mut bob = TestPeer::join(&handle, &foo);
    let mut carol = TestPeer::join(&handle, &foo);
    flush(&handle).await;
    alice.drain();
    bob.drain();
    carol.drain();

    let mut frame = format!("to: {}\n\n", bob.id).into_bytes();
    frame.extend_from_slice(&[0x00, 0x01, 0x02, 0x03]);
    alice.send_frame(&handle, &foo, RawContent::Binary(frame));
    flush(&handle).await;

    assert_eq!(
        bob.drain(),
        vec![PeerSocketMessage::FromPeer(ReceivedPeerMessage {
            from: alice.id.clone(),
            content: RawContent::Binary(vec![0x00, 0x01, 0x02, 0x03]),
        })]
    );
    alice.expect_nothing().await;
    carol.expect_nothing().await;
}

#[tokio::test]
async fn test_unknown_recipient_is_silently_dropped() {
    let handle = Router::spawn();
    let foo = room("foo");

    let mut alice = TestPeer::join(&handle, &foo);
    flush(&handle).await;

    alice.send_frame(&handle, &foo, text_frame("to: nonexistent\n\nhi"));
    flush(&handle).await;

    alice.expect_nothing().await;
}

#[tokio::test]
async fn test_leave_notification_is_delivered_exactly_once() {
    let handle = Router::spawn();
    let foo = room("foo");

    let mut alice = TestPeer::join(&handle, &foo);
    let bob = TestPeer::join(&handle, &foo);
    flush(&handle).await;
    alice.drain();

    // Bob disconnects.
    handle.remove_peer(foo.clone(), bob.id.clone());
    flush(&handle).await;

    assert_eq!(
        alice.drain(),
        vec![PeerSocketMessage::FromRelay(RoomEvent::PeerLeft(
            bob.id.clone()
        ))]
    );
    alice.expect_nothing().await;
}

#[tokio::test]
async fn test_cross_room_isolation() {
    let handle = Router::spawn();

    let alice = TestPeer::join(&handle, &room("foo"));
    let mut bob = TestPeer::join(&handle, &room("bar"));
    flush(&handle).await;

    alice.send_frame(&handle, &room("foo"), text_frame("broadcast:\n\nhello"));
    flush(&handle).await;

    bob.expect_nothing().await;
}

#[tokio::test]
async fn test_malformed_frame_is_tolerated() {
    let handle = Router::spawn();
    let foo = room("foo");

    let mut alice = TestPeer::join(&handle, &foo);
    let mut bob = TestPeer::join(&handle, &foo);
    flush(&handle).await;
    alice.drain();
    bob.drain();

    // Garbage is dropped at decode time; nothing reaches the router and the
    // connection stays usable.
    assert!(protocol::decode_sent(&text_frame("garbage-without-colon")).is_err());
    alice.send_frame(&handle, &foo, text_frame("garbage-without-colon"));
    flush(&handle).await;
    bob.expect_nothing().await;

    // A subsequent well-formed frame from the same peer delivers normally.
    alice.send_frame(&handle, &foo, text_frame("broadcast:\n\nok"));
    flush(&handle).await;
    assert_eq!(
        bob.drain(),
        vec![PeerSocketMessage::FromPeer(ReceivedPeerMessage {
            from: alice.id.clone(),
            content: RawContent::Text("ok".to_string()),
        })]
    );
}

#[tokio::test]
async fn test_relayed_events_encode_back_onto_the_wire() {
    let handle = Router::spawn();
    let foo = room("foo");

    let alice = TestPeer::join(&handle, &foo);
    let mut bob = TestPeer::join(&handle, &foo);
    flush(&handle).await;

    // Bob's handler would write alice's join as a text frame.
    let joined = bob.drain().remove(0);
    assert_eq!(
        protocol::encode_socket_message(&joined),
        RawContent::Text(format!("peer_joined:{}", alice.id))
    );

    alice.send_frame(&handle, &foo, text_frame("broadcast:\n\nhello"));
    flush(&handle).await;

    // The forwarded payload carries the router-assigned sender id.
    let forwarded = bob.drain().remove(0);
    assert_eq!(
        protocol::encode_socket_message(&forwarded),
        RawContent::Text(format!("message_from:{}\n\nhello", alice.id))
    );
}
