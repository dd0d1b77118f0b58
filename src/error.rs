//! Typed errors for the transport, framing and replication layers.
//!
//! Binaries wrap these behind `anyhow::Result` at their `main` boundary and
//! attach operation context (which peer, which key) with `.context(..)`.

use std::io;

/// Errors that can occur while sending, framing or processing a [`Message`](crate::message::Message).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying socket failed: connect, write, short read, or was closed by the peer.
    #[error("transport error talking to {peer}: {source}")]
    Transport {
        peer: String,
        #[source]
        source: io::Error,
    },

    /// A frame's length header or payload could not be decoded as a `Message`.
    #[error("failed to decode frame from {peer}: {source}")]
    Decode {
        peer: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request violated the protocol for the replica that received it
    /// (e.g. `SET` sent to a non-head replica, `GET` sent to a non-tail CR replica).
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// `ConnectionStub::send` was asked to address a peer name it has no transport for.
    #[error("no connection to peer named {0:?}")]
    UnknownPeer(String),
}

pub type Result<T> = std::result::Result<T, Error>;
