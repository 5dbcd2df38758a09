pub mod id;
pub mod message;

pub use id::{PeerId, RoomId};
pub use message::{
    Destination, PeerSocketMessage, RawContent, ReceivedPeerMessage, RoomEvent, SentPeerMessage,
};
