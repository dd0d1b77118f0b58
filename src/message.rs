//! Self-describing request/reply records and their length-prefixed JSON framing.
//!
//! A [`Message`] is a JSON object with string keys and arbitrary JSON-compatible
//! values; unknown fields round-trip untouched. On the wire a message is a
//! fixed-width decimal length header followed by that many bytes of UTF-8 JSON.

use std::io::{Read, Write};

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Width of the decimal ASCII length header prefixing every frame.
const HEADER_WIDTH: usize = 10;

/// A self-describing, string-keyed message. The sole unit exchanged on the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message(Map<String, Value>);

impl Message {
    /// An empty message with no fields set.
    pub fn new() -> Self {
        Message(Map::new())
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn u64_field(&self, name: &str) -> Option<u64> {
        self.0.get(name).and_then(Value::as_u64)
    }

    pub fn msg_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    pub fn key(&self) -> Option<&str> {
        self.str_field("key")
    }

    pub fn value(&self) -> Option<&str> {
        self.str_field("value")
    }

    pub fn version(&self) -> Option<u64> {
        self.u64_field("version")
    }

    pub fn status(&self) -> Option<&str> {
        self.str_field("status")
    }

    pub fn is_ok(&self) -> bool {
        self.status() == Some("OK")
    }

    pub fn reason(&self) -> Option<&str> {
        self.str_field("reason")
    }

    /// Set an arbitrary field, overwriting any previous value. Returns `self`
    /// for chained construction.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    // -- well-known request constructors --------------------------------

    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Message::new()
            .with("type", "SET")
            .with("key", key.into())
            .with("value", value.into())
    }

    pub fn set_versioned(key: impl Into<String>, value: impl Into<String>, version: u64) -> Self {
        Message::set(key, value).with("version", version)
    }

    pub fn get(key: impl Into<String>) -> Self {
        Message::new().with("type", "GET").with("key", key.into())
    }

    pub fn version_query(key: impl Into<String>) -> Self {
        Message::new()
            .with("type", "VERSION")
            .with("key", key.into())
    }

    // -- well-known reply constructors ----------------------------------

    pub fn ok() -> Self {
        Message::new().with("status", "OK")
    }

    pub fn ok_value(value: impl Into<String>) -> Self {
        Message::ok().with("value", value.into())
    }

    pub fn ok_version(version: u64) -> Self {
        Message::ok().with("version", version)
    }

    pub fn err(reason: impl Into<String>) -> Self {
        Message::new()
            .with("status", "ERR")
            .with("reason", reason.into())
    }
}

impl From<Map<String, Value>> for Message {
    fn from(map: Map<String, Value>) -> Self {
        Message(map)
    }
}

/// Write one framed message: a `HEADER_WIDTH`-byte decimal length header
/// followed by the JSON payload. `peer` is used only to label errors.
pub fn write_message<W: Write>(writer: &mut W, msg: &Message, peer: &str) -> Result<()> {
    let payload = serde_json::to_vec(&msg.0).map_err(|source| Error::Decode {
        peer: peer.to_string(),
        source,
    })?;
    let header = format!("{:0width$}", payload.len(), width = HEADER_WIDTH);
    writer
        .write_all(header.as_bytes())
        .and_then(|_| writer.write_all(&payload))
        .and_then(|_| writer.flush())
        .map_err(|source| Error::Transport {
            peer: peer.to_string(),
            source,
        })
}

/// Read one framed message, blocking until the header and the full payload it
/// announces have both arrived. Tolerates partial reads from the kernel by
/// looping `read` until each piece is fully buffered.
pub fn read_message<R: Read>(reader: &mut R, peer: &str) -> Result<Message> {
    let mut header = [0u8; HEADER_WIDTH];
    read_exact(reader, &mut header, peer)?;
    let header_str = std::str::from_utf8(&header).map_err(|_| Error::Transport {
        peer: peer.to_string(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "length header is not valid UTF-8",
        ),
    })?;
    let len: usize = header_str.trim().parse().map_err(|_| Error::Transport {
        peer: peer.to_string(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "length header is not a decimal integer",
        ),
    })?;

    let mut payload = vec![0u8; len];
    read_exact(reader, &mut payload, peer)?;

    let map: Map<String, Value> =
        serde_json::from_slice(&payload).map_err(|source| Error::Decode {
            peer: peer.to_string(),
            source,
        })?;
    Ok(Message(map))
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], peer: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|source| Error::Transport {
        peer: peer.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_set_message() {
        let msg = Message::set("k", "v");
        let mut buf = Vec::new();
        write_message(&mut buf, &msg, "peer").unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_message(&mut cursor, "peer").unwrap();
        assert_eq!(decoded.msg_type(), Some("SET"));
        assert_eq!(decoded.key(), Some("k"));
        assert_eq!(decoded.value(), Some("v"));
    }

    #[test]
    fn preserves_unknown_fields() {
        let msg = Message::get("k").with("trace_id", "abc123");
        let mut buf = Vec::new();
        write_message(&mut buf, &msg, "peer").unwrap();
        let mut cursor = Cursor::new(buf);
        let decoded = read_message(&mut cursor, "peer").unwrap();
        assert_eq!(decoded.str_field("trace_id"), Some("abc123"));
    }

    #[test]
    fn concatenates_two_frames_from_one_buffer() {
        let a = Message::set("x", "1");
        let b = Message::get("x");
        let mut buf = Vec::new();
        write_message(&mut buf, &a, "peer").unwrap();
        write_message(&mut buf, &b, "peer").unwrap();

        let mut cursor = Cursor::new(buf);
        let first = read_message(&mut cursor, "peer").unwrap();
        let second = read_message(&mut cursor, "peer").unwrap();
        assert_eq!(first.msg_type(), Some("SET"));
        assert_eq!(second.msg_type(), Some("GET"));
    }

    #[test]
    fn short_read_surfaces_transport_error() {
        let mut cursor = Cursor::new(vec![0u8; 3]);
        let err = read_message(&mut cursor, "peer").unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
