//! Thin client façade: directs `SET` to the head and `GET` to a read target
//! (the tail for CR, or any replica for CRAQ), emitting the line-oriented
//! linearizability log around each call.
//!
//! This log is a wire-format contract consumed by an external checker, not a
//! diagnostic stream — it is written straight to stdout, independent of the
//! `log`-crate diagnostics the rest of the crate emits.

use chrono::Local;

use crate::connection_stub::ConnectionStub;
use crate::error::{Error, Result};
use crate::message::Message;

pub struct Client {
    worker_id: u64,
    stub: ConnectionStub,
    head_name: String,
    default_read_name: String,
}

impl Client {
    pub fn new(
        worker_id: u64,
        stub: ConnectionStub,
        head_name: impl Into<String>,
        default_read_name: impl Into<String>,
    ) -> Self {
        Client {
            worker_id,
            stub,
            head_name: head_name.into(),
            default_read_name: default_read_name.into(),
        }
    }

    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    /// `SET key = value` against the head, blocking for the acknowledgement
    /// that has folded all the way back from the tail.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.log_event(&format!("Setting {} = {}", key, value));
        let reply = self.stub.send(&self.head_name, &Message::set(key, value))?;
        if !reply.is_ok() {
            return Err(Error::Protocol(
                reply.reason().unwrap_or("SET rejected").to_string(),
            ));
        }
        self.log_event(&format!("Set {} = {}", key, value));
        Ok(())
    }

    /// `GET key` against this client's default read replica (the tail for
    /// CR, any replica — often the tail too — for CRAQ).
    pub fn get(&self, key: &str) -> Result<String> {
        self.get_from(&self.default_read_name, key)
    }

    /// `GET key` against an explicitly named replica. CRAQ callers use this
    /// to demonstrate that any replica, not just the tail, answers reads.
    pub fn get_from(&self, replica_name: &str, key: &str) -> Result<String> {
        self.log_event(&format!("Getting {}", key));
        let reply = self.stub.send(replica_name, &Message::get(key))?;
        if !reply.is_ok() {
            return Err(Error::Protocol(
                reply.reason().unwrap_or("GET rejected").to_string(),
            ));
        }
        let value = reply.value().unwrap_or("0").to_string();
        self.log_event(&format!("Get {} = {}", key, value));
        Ok(value)
    }

    fn log_event(&self, event: &str) {
        println!(
            "{} INFO worker_{} {}",
            Local::now().format("%H:%M:%S"),
            self.worker_id,
            event
        );
    }
}
