use super::id::PeerId;

/// Opaque payload carried by one WebSocket frame.
///
/// The tag matches the frame type used to carry it on the wire: `Text`
/// travels in text frames, `Binary` in binary frames. The relay never
/// inspects the payload itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawContent {
    Text(String),
    Binary(Vec<u8>),
}

impl RawContent {
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Short label for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Binary(b) => b.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Routing instruction on an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Every peer in the room except the sender.
    Broadcast,
    /// An explicit recipient list. Never empty when decoded from the wire;
    /// order and duplicates are preserved through routing.
    Peers(Vec<PeerId>),
}

/// A message as submitted by a client: routing metadata plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPeerMessage {
    pub to: Destination,
    pub content: RawContent,
}

/// A forwarded payload as delivered to a recipient.
///
/// `from` is injected by the router and never taken from the wire, so a
/// client cannot forge its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPeerMessage {
    pub from: PeerId,
    pub content: RawContent,
}

/// Presence notification. Always text-framed on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    PeerJoined(PeerId),
    PeerLeft(PeerId),
}

impl RoomEvent {
    /// The peer this event is about.
    #[must_use]
    pub const fn peer_id(&self) -> &PeerId {
        match self {
            Self::PeerJoined(id) | Self::PeerLeft(id) => id,
        }
    }

    /// Wire header key for this event.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::PeerJoined(_) => "peer_joined",
            Self::PeerLeft(_) => "peer_left",
        }
    }
}

/// Everything the router can deliver to a connection's sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerSocketMessage {
    /// A payload forwarded from another peer in the room.
    FromPeer(ReceivedPeerMessage),
    /// A presence notification from the relay itself.
    FromRelay(RoomEvent),
}
