//! Wire codec for the relay protocol.
//!
//! A message is a sequence of `key:value` header lines, an empty line, then
//! an optional body:
//!
//! ```text
//! to: wXyPYmHdT1m0GQh0WP9c8g
//! to: aGVsbG8gd29ybGQhISEhIQ
//!
//! <body>
//! ```
//!
//! The header section is always UTF-8; the body is UTF-8 in text frames and
//! arbitrary bytes in binary frames. Header lines are separated by `0x0A`,
//! the header/body separator is the byte pair `0x0A 0x0A`. The codec is
//! pure: no I/O, no clocks, no randomness. Its contract is byte-exact so
//! independent implementations interoperate.

use crate::error::{Error, Result};
use crate::models::{
    Destination, PeerId, PeerSocketMessage, RawContent, ReceivedPeerMessage, RoomEvent,
    SentPeerMessage,
};

/// Header/body separator.
const SEPARATOR: &[u8] = b"\n\n";

/// Client marks a message for every other peer in the room. Value ignored.
const HEADER_BROADCAST: &str = "broadcast";
/// Client names one recipient peer id. May repeat.
const HEADER_TO: &str = "to";
/// Relay names the source peer of a forwarded payload.
const HEADER_MESSAGE_FROM: &str = "message_from";
/// Relay announces a peer joining the room.
const HEADER_PEER_JOINED: &str = "peer_joined";
/// Relay announces a peer leaving the room.
const HEADER_PEER_LEFT: &str = "peer_left";

/// Encode a client-side message onto a frame of its content's type.
#[must_use]
pub fn encode_sent(msg: &SentPeerMessage) -> RawContent {
    let header = match &msg.to {
        Destination::Broadcast => format!("{HEADER_BROADCAST}:"),
        Destination::Peers(ids) => ids
            .iter()
            .map(|id| format!("{HEADER_TO}: {id}"))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    attach_body(header, &msg.content)
}

/// Decode a client-side message from a frame.
///
/// Any `broadcast` header wins; otherwise every `to` header contributes a
/// recipient, in order, duplicates preserved. Unrecognized headers are
/// ignored.
pub fn decode_sent(frame: &RawContent) -> Result<SentPeerMessage> {
    let (headers, content) = split_frame(frame)?;

    if headers.iter().any(|(key, _)| key == HEADER_BROADCAST) {
        return Ok(SentPeerMessage {
            to: Destination::Broadcast,
            content,
        });
    }

    let recipients: Vec<PeerId> = headers
        .iter()
        .filter(|(key, _)| key == HEADER_TO)
        .map(|(_, value)| PeerId::from_string(value.clone()))
        .collect();
    if recipients.is_empty() {
        return Err(Error::NoRecipients);
    }

    Ok(SentPeerMessage {
        to: Destination::Peers(recipients),
        content,
    })
}

/// Encode a relay-side message onto a frame.
///
/// Forwarded payloads keep their content's frame type; room events are
/// always text, carry no body and no trailing separator.
#[must_use]
pub fn encode_socket_message(msg: &PeerSocketMessage) -> RawContent {
    match msg {
        PeerSocketMessage::FromPeer(received) => attach_body(
            format!("{HEADER_MESSAGE_FROM}:{}", received.from),
            &received.content,
        ),
        PeerSocketMessage::FromRelay(event) => {
            RawContent::Text(format!("{}:{}", event.event_type(), event.peer_id()))
        }
    }
}

/// Decode a relay-side message from a frame.
///
/// The first header among `peer_joined`, `peer_left` and `message_from`
/// decides the message type; events ignore any body.
pub fn decode_socket_message(frame: &RawContent) -> Result<PeerSocketMessage> {
    let (headers, content) = split_frame(frame)?;

    for (key, value) in &headers {
        let peer = || PeerId::from_string(value.clone());
        match key.as_str() {
            HEADER_PEER_JOINED => {
                return Ok(PeerSocketMessage::FromRelay(RoomEvent::PeerJoined(peer())))
            }
            HEADER_PEER_LEFT => {
                return Ok(PeerSocketMessage::FromRelay(RoomEvent::PeerLeft(peer())))
            }
            HEADER_MESSAGE_FROM => {
                return Ok(PeerSocketMessage::FromPeer(ReceivedPeerMessage {
                    from: peer(),
                    content,
                }))
            }
            _ => {}
        }
    }

    Err(Error::UnknownHeader)
}

/// Join a header section and a body with the separator, keeping the body's
/// frame type.
fn attach_body(header: String, body: &RawContent) -> RawContent {
    match body {
        RawContent::Text(text) => RawContent::Text(format!("{header}\n\n{text}")),
        RawContent::Binary(bytes) => {
            let mut out = header.into_bytes();
            out.extend_from_slice(SEPARATOR);
            out.extend_from_slice(bytes);
            RawContent::Binary(out)
        }
    }
}

/// Split a frame once on the first `\n\n` and parse the header section.
///
/// A frame without the separator is all headers with an empty body of the
/// frame's own type.
fn split_frame(frame: &RawContent) -> Result<(Vec<(String, String)>, RawContent)> {
    match frame {
        RawContent::Text(text) => {
            let (header, body) = match text.split_once("\n\n") {
                Some((header, body)) => (header, body),
                None => (text.as_str(), ""),
            };
            Ok((parse_headers(header)?, RawContent::Text(body.to_string())))
        }
        RawContent::Binary(bytes) => {
            let (header, body) = match find_separator(bytes) {
                Some(at) => (&bytes[..at], bytes[at + SEPARATOR.len()..].to_vec()),
                None => (&bytes[..], Vec::new()),
            };
            let header = std::str::from_utf8(header).map_err(|_| Error::InvalidHeaderEncoding)?;
            Ok((parse_headers(header)?, RawContent::Binary(body)))
        }
    }
}

fn find_separator(bytes: &[u8]) -> Option<usize> {
    bytes.windows(SEPARATOR.len()).position(|w| w == SEPARATOR)
}

/// Parse header lines: split each non-empty line on the first `:` and trim
/// surrounding ASCII whitespace from both sides. A colon without a value is
/// legal and yields an empty value; a line without a colon is an error.
fn parse_headers(section: &str) -> Result<Vec<(String, String)>> {
    let mut headers = Vec::new();
    for line in section.split('\n') {
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(Error::InvalidDelimiter(line.to_string()));
        };
        headers.push((trim_ascii(key).to_string(), trim_ascii(value).to_string()));
    }
    Ok(headers)
}

fn trim_ascii(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii_whitespace())
}
