pub mod router;

pub use router::{PeerSink, Router, RouterCounts, RouterHandle, RouterRequest};
