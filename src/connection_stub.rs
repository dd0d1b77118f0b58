//! A name-indexed collection of per-peer [`Transport`]s.
//!
//! Each replica is injected with a `ConnectionStub` restricted to exactly the
//! peers its chain position may address (`prev`, `next`, or the tail for
//! CRAQ version queries). Addressing an unlisted name is a programming error.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::message::Message;
use crate::transport::Transport;

pub struct ConnectionStub {
    transports: HashMap<String, Transport>,
}

impl ConnectionStub {
    /// Build a stub from `(peer_name, address)` pairs, each given its own
    /// transport with the shared `pool_capacity`.
    pub fn new(peers: impl IntoIterator<Item = (String, String)>, pool_capacity: usize) -> Self {
        let transports = peers
            .into_iter()
            .map(|(name, addr)| {
                let transport = Transport::new(name.clone(), addr, pool_capacity);
                (name, transport)
            })
            .collect();
        ConnectionStub { transports }
    }

    /// Open at least one socket to every configured peer. Called once at
    /// replica startup so the first protocol message isn't charged the
    /// handshake.
    pub fn initiate_connections(&self) -> Result<()> {
        for transport in self.transports.values() {
            transport.prewarm()?;
        }
        Ok(())
    }

    /// Dispatch `msg` to the named peer and block for its reply.
    ///
    /// Sending to a name the stub was not given at construction is a
    /// programming error and fails fast with [`Error::UnknownPeer`].
    pub fn send(&self, peer_name: &str, msg: &Message) -> Result<Message> {
        let transport = self
            .transports
            .get(peer_name)
            .ok_or_else(|| Error::UnknownPeer(peer_name.to_string()))?;
        transport.send(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_peer_fails_fast() {
        let stub = ConnectionStub::new(Vec::new(), 1);
        let err = stub.send("nobody", &Message::get("k"));
        assert!(matches!(err, Err(Error::UnknownPeer(name)) if name == "nobody"));
    }
}
