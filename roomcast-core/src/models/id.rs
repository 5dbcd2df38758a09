use base64::Engine;
use serde::{Deserialize, Serialize};

/// Bytes of entropy behind a peer id.
const PEER_ID_BYTES: usize = 16;

/// Room identifier.
///
/// Taken verbatim from the connection URL and treated as an uninterpreted
/// key; equality is byte-equality. The relay neither validates nor
/// normalizes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    #[must_use]
    pub const fn from_string(id: String) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Peer identifier, assigned by the relay at connect time.
///
/// `new()` draws 16 bytes from a cryptographically strong source and encodes
/// them as URL-safe base64, yielding a 22-character string. Ids are unique
/// per live connection within a process and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    /// Generate a fresh peer id.
    #[must_use]
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; PEER_ID_BYTES];
        rand::RngCore::fill_bytes(&mut rng, &mut bytes);
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    #[must_use]
    pub const fn from_string(id: String) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
