//! Point-to-point blocking transport: a bounded pool of long-lived TCP
//! connections to a single peer, with one request/reply in flight per socket.

use std::collections::VecDeque;
use std::net::TcpStream;
use std::sync::{Condvar, Mutex};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::message::{read_message, write_message, Message};

struct PoolState {
    idle: VecDeque<TcpStream>,
    /// Sockets either idle or currently checked out. Bounded by `capacity`.
    total: usize,
}

/// A bounded pool of sockets to one peer. `send` acquires a socket (opening a
/// fresh one if the pool has not yet reached capacity, else blocking until a
/// caller returns one), performs one request/reply, and returns the socket to
/// the pool. A socket that errors is discarded rather than returned, so the
/// pool refills lazily on the next `send`.
pub struct Transport {
    peer_name: String,
    addr: String,
    capacity: usize,
    state: Mutex<PoolState>,
    slot_freed: Condvar,
}

impl Transport {
    pub fn new(peer_name: impl Into<String>, addr: impl Into<String>, capacity: usize) -> Self {
        assert!(capacity > 0, "pool capacity must be at least 1");
        Transport {
            peer_name: peer_name.into(),
            addr: addr.into(),
            capacity,
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                total: 0,
            }),
            slot_freed: Condvar::new(),
        }
    }

    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }

    /// Open one connection eagerly and return it to the pool, so the first
    /// real `send` is not charged the TCP handshake.
    pub fn prewarm(&self) -> Result<()> {
        let stream = self.acquire()?;
        self.release(stream);
        Ok(())
    }

    /// Send one request and block for its reply on the same socket.
    pub fn send(&self, msg: &Message) -> Result<Message> {
        let mut stream = self.acquire()?;
        let outcome = write_message(&mut stream, msg, &self.peer_name)
            .and_then(|_| read_message(&mut stream, &self.peer_name));
        match outcome {
            Ok(reply) => {
                self.release(stream);
                Ok(reply)
            }
            Err(err) => {
                warn!("discarding socket to {}: {}", self.peer_name, err);
                self.discard();
                Err(err)
            }
        }
    }

    fn acquire(&self) -> Result<TcpStream> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(stream) = state.idle.pop_front() {
                return Ok(stream);
            }
            if state.total < self.capacity {
                state.total += 1;
                drop(state);
                return TcpStream::connect(&self.addr).map_err(|source| {
                    // Connection attempt failed: give the slot back.
                    let mut state = self.state.lock().unwrap();
                    state.total -= 1;
                    Error::Transport {
                        peer: self.peer_name.clone(),
                        source,
                    }
                });
            }
            debug!(
                "pool to {} at capacity ({}), blocking for a slot",
                self.peer_name, self.capacity
            );
            state = self.slot_freed.wait(state).unwrap();
        }
    }

    fn release(&self, stream: TcpStream) {
        let mut state = self.state.lock().unwrap();
        state.idle.push_back(stream);
        self.slot_freed.notify_one();
    }

    fn discard(&self) {
        let mut state = self.state.lock().unwrap();
        state.total -= 1;
        self.slot_freed.notify_one();
    }
}
