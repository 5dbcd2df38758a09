//! Room registry and message router.
//!
//! A single task owns all room state: `room_id -> (peer_id -> sink)`.
//! Connection handlers talk to it through a mailbox of [`RouterRequest`]s;
//! the router pushes [`PeerSocketMessage`]s into per-connection sinks and
//! never blocks on a slow consumer. Because one request is processed to
//! completion before the next is looked at, every peer in a room observes
//! the same sequence of membership events, and the join fan-out of a single
//! `AddPeer` can never interleave with another request.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::models::{
    Destination, PeerId, PeerSocketMessage, RawContent, ReceivedPeerMessage, RoomEvent, RoomId,
};

/// Delivery endpoint for one live connection.
///
/// The router holds a clone for routing; the connection handler owns the
/// receiving half and with it the sink's lifetime. Pushes never block: a
/// saturated queue drops the message, a closed queue marks the peer dead.
#[derive(Debug, Clone)]
pub struct PeerSink {
    tx: mpsc::Sender<PeerSocketMessage>,
}

/// What became of a single non-blocking push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Push {
    Delivered,
    /// Queue full; the message is gone.
    Dropped,
    /// Receiver gone; the connection is dead.
    Closed,
}

impl PeerSink {
    /// Create a sink together with the receiving half its handler reads.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PeerSocketMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    fn push(&self, message: PeerSocketMessage) -> Push {
        match self.tx.try_send(message) {
            Ok(()) => Push::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => Push::Dropped,
            Err(mpsc::error::TrySendError::Closed(_)) => Push::Closed,
        }
    }
}

/// Requests accepted by the router task.
#[derive(Debug)]
pub enum RouterRequest {
    /// Register a peer in a room, creating the room if absent. Every
    /// existing peer is told about the newcomer and the newcomer is told
    /// about every existing peer.
    AddPeer {
        room_id: RoomId,
        peer_id: PeerId,
        sink: PeerSink,
    },
    /// Remove a peer; the remaining peers are notified. Unknown rooms and
    /// unknown peers are no-ops.
    RemovePeer { room_id: RoomId, peer_id: PeerId },
    /// Forward a payload to the destination peers of a room.
    Relay {
        room_id: RoomId,
        from: PeerId,
        to: Destination,
        content: RawContent,
    },
    /// Aggregate counters, for monitoring.
    Counts { reply: oneshot::Sender<RouterCounts> },
    /// Current peer ids of one room, `None` if the room is absent.
    RoomPeers {
        room_id: RoomId,
        reply: oneshot::Sender<Option<Vec<PeerId>>>,
    },
}

/// Aggregate registry counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterCounts {
    pub rooms: usize,
    pub peers: usize,
}

/// Cloneable capability to submit requests to the router task.
///
/// Sends are non-blocking; if the router is gone the request is dropped
/// with a warning, which only happens during process shutdown.
#[derive(Debug, Clone)]
pub struct RouterHandle {
    tx: mpsc::UnboundedSender<RouterRequest>,
}

impl RouterHandle {
    pub fn add_peer(&self, room_id: RoomId, peer_id: PeerId, sink: PeerSink) {
        self.send(RouterRequest::AddPeer {
            room_id,
            peer_id,
            sink,
        });
    }

    pub fn remove_peer(&self, room_id: RoomId, peer_id: PeerId) {
        self.send(RouterRequest::RemovePeer { room_id, peer_id });
    }

    pub fn relay(&self, room_id: RoomId, from: PeerId, to: Destination, content: RawContent) {
        self.send(RouterRequest::Relay {
            room_id,
            from,
            to,
            content,
        });
    }

    /// Room and peer totals. Because the mailbox is FIFO, the answer
    /// reflects every request this handle sent before asking.
    pub async fn counts(&self) -> RouterCounts {
        let (reply, rx) = oneshot::channel();
        self.send(RouterRequest::Counts { reply });
        rx.await.unwrap_or_default()
    }

    /// Peer ids currently in `room_id`, or `None` if the room is absent.
    pub async fn room_peers(&self, room_id: RoomId) -> Option<Vec<PeerId>> {
        let (reply, rx) = oneshot::channel();
        self.send(RouterRequest::RoomPeers { room_id, reply });
        rx.await.unwrap_or_default()
    }

    fn send(&self, request: RouterRequest) {
        if self.tx.send(request).is_err() {
            warn!("router is gone, dropping request");
        }
    }
}

/// One room: its live peers and their sinks.
#[derive(Debug, Default)]
struct Room {
    peers: HashMap<PeerId, PeerSink>,
}

/// The router task. Sole owner and sole mutator of room state.
#[derive(Debug)]
pub struct Router {
    rooms: HashMap<RoomId, Room>,
    rx: mpsc::UnboundedReceiver<RouterRequest>,
}

impl Router {
    /// Create a router and the handle its clients use.
    #[must_use]
    pub fn new() -> (Self, RouterHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rooms: HashMap::new(),
                rx,
            },
            RouterHandle { tx },
        )
    }

    /// Spawn the router on the current runtime and return its handle.
    #[must_use]
    pub fn spawn() -> RouterHandle {
        let (router, handle) = Self::new();
        tokio::spawn(router.run());
        handle
    }

    /// Drain the mailbox until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            self.handle(request);
        }
        info!("router mailbox closed, shutting down");
    }

    // Synchronous on purpose: no suspension point between the first and
    // last sink push of a request.
    fn handle(&mut self, request: RouterRequest) {
        match request {
            RouterRequest::AddPeer {
                room_id,
                peer_id,
                sink,
            } => self.add_peer(room_id, peer_id, sink),
            RouterRequest::RemovePeer { room_id, peer_id } => {
                self.remove_peer(&room_id, &peer_id);
            }
            RouterRequest::Relay {
                room_id,
                from,
                to,
                content,
            } => self.relay(&room_id, &from, &to, content),
            RouterRequest::Counts { reply } => {
                let _ = reply.send(self.counts());
            }
            RouterRequest::RoomPeers { room_id, reply } => {
                let peers = self
                    .rooms
                    .get(&room_id)
                    .map(|room| room.peers.keys().cloned().collect());
                let _ = reply.send(peers);
            }
        }
    }

    fn add_peer(&mut self, room_id: RoomId, peer_id: PeerId, sink: PeerSink) {
        let room = self.rooms.entry(room_id.clone()).or_default();
        let mut dead = Vec::new();

        for (existing_id, existing_sink) in &room.peers {
            push_to(
                &room_id,
                existing_id,
                existing_sink,
                PeerSocketMessage::FromRelay(RoomEvent::PeerJoined(peer_id.clone())),
                &mut dead,
            );
            push_to(
                &room_id,
                &peer_id,
                &sink,
                PeerSocketMessage::FromRelay(RoomEvent::PeerJoined(existing_id.clone())),
                &mut dead,
            );
        }

        // The newcomer cannot be reaped before it is inserted.
        dead.retain(|id| id != &peer_id);

        room.peers.insert(peer_id.clone(), sink);
        info!(
            room_id = %room_id,
            peer_id = %peer_id,
            peers = room.peers.len(),
            "peer joined room"
        );

        self.reap(&room_id, dead);
    }

    fn remove_peer(&mut self, room_id: &RoomId, peer_id: &PeerId) {
        let mut dead = Vec::new();
        self.detach(room_id, peer_id, &mut dead);
        self.reap(room_id, dead);
    }

    fn relay(&mut self, room_id: &RoomId, from: &PeerId, to: &Destination, content: RawContent) {
        let Some(room) = self.rooms.get(room_id) else {
            debug!(room_id = %room_id, "relay to unknown room, ignoring");
            return;
        };

        let mut dead = Vec::new();
        match to {
            Destination::Broadcast => {
                for (peer_id, sink) in &room.peers {
                    if peer_id == from {
                        continue;
                    }
                    push_to(
                        room_id,
                        peer_id,
                        sink,
                        PeerSocketMessage::FromPeer(ReceivedPeerMessage {
                            from: from.clone(),
                            content: content.clone(),
                        }),
                        &mut dead,
                    );
                }
            }
            Destination::Peers(ids) => {
                // Unknown recipients are silently skipped; order and
                // duplicates in `ids` are preserved.
                for peer_id in ids {
                    let Some(sink) = room.peers.get(peer_id) else {
                        debug!(
                            room_id = %room_id,
                            peer_id = %peer_id,
                            "recipient not in room, skipping"
                        );
                        continue;
                    };
                    push_to(
                        room_id,
                        peer_id,
                        sink,
                        PeerSocketMessage::FromPeer(ReceivedPeerMessage {
                            from: from.clone(),
                            content: content.clone(),
                        }),
                        &mut dead,
                    );
                }
            }
        }

        self.reap(room_id, dead);
    }

    /// Remove one peer and notify the remainder; sinks found closed while
    /// notifying are appended to `dead`. Unknown rooms and peers are no-ops,
    /// and a room is deleted the moment its peer map empties.
    fn detach(&mut self, room_id: &RoomId, peer_id: &PeerId, dead: &mut Vec<PeerId>) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        if room.peers.remove(peer_id).is_none() {
            return;
        }

        for (remaining_id, sink) in &room.peers {
            push_to(
                room_id,
                remaining_id,
                sink,
                PeerSocketMessage::FromRelay(RoomEvent::PeerLeft(peer_id.clone())),
                dead,
            );
        }
        info!(
            room_id = %room_id,
            peer_id = %peer_id,
            remaining = room.peers.len(),
            "peer left room"
        );

        if room.peers.is_empty() {
            self.rooms.remove(room_id);
            debug!(room_id = %room_id, "room empty, removed");
        }
    }

    /// Detach peers whose sinks turned out closed during a fan-out. Runs
    /// after the triggering request so its own pushes stay atomic.
    fn reap(&mut self, room_id: &RoomId, mut dead: Vec<PeerId>) {
        while let Some(peer_id) = dead.pop() {
            debug!(room_id = %room_id, peer_id = %peer_id, "reaping peer with closed sink");
            self.detach(room_id, &peer_id, &mut dead);
        }
    }

    fn counts(&self) -> RouterCounts {
        RouterCounts {
            rooms: self.rooms.len(),
            peers: self.rooms.values().map(|room| room.peers.len()).sum(),
        }
    }
}

fn push_to(
    room_id: &RoomId,
    peer_id: &PeerId,
    sink: &PeerSink,
    message: PeerSocketMessage,
    dead: &mut Vec<PeerId>,
) {
    match sink.push(message) {
        Push::Delivered => {}
        Push::Dropped => warn!(
            room_id = %room_id,
            peer_id = %peer_id,
            "sink saturated, dropping message"
        ),
        Push::Closed => dead.push(peer_id.clone()),
    }
}
