//! Chain Replication with Apportioned Queries (CRAQ): writes follow the same
//! head→tail chain as CR with a per-key clean/dirty discipline; reads may be
//! served by any replica, falling back to a version check against the tail
//! when the local copy is dirty.

use log::{debug, warn};

use super::store::{ReadOutcome, VersionedStore};
use crate::connection_stub::ConnectionStub;
use crate::message::Message;
use crate::server::RequestHandler;
use crate::store::DEFAULT_VALUE;

pub struct CraqReplica {
    name: String,
    store: VersionedStore,
    next: Option<String>,
    /// Name of the chain tail, used to address `VERSION` queries. `None`
    /// exactly when this replica is itself the tail.
    tail_name: Option<String>,
    stub: ConnectionStub,
}

impl CraqReplica {
    pub fn new(
        name: impl Into<String>,
        next: Option<String>,
        tail_name: Option<String>,
        stub: ConnectionStub,
    ) -> Self {
        CraqReplica {
            name: name.into(),
            store: VersionedStore::new(),
            next,
            tail_name,
            stub,
        }
    }

    pub fn is_tail(&self) -> bool {
        self.next.is_none()
    }

    fn handle_set(&self, msg: &Message) -> Message {
        let (Some(key), Some(value)) = (msg.key(), msg.value()) else {
            return Message::err("SET requires key and value fields");
        };
        // A version field means this SET was forwarded from upstream with an
        // already-assigned version; its absence means we are the entry point
        // for this write (ordinarily the head) and must assign a fresh one.
        let version = msg.version().unwrap_or_else(|| 1 + self.store.max_version(key));

        match &self.next {
            None => {
                self.store.append_clean(key, version, value.to_string());
                debug!("{}: committed SET {}@{}={} at tail", self.name, key, version, value);
                Message::ok()
            }
            Some(next) => {
                self.store.append_dirty(key, version, value.to_string());
                let forward = Message::set_versioned(key, value, version);
                match self.stub.send(next, &forward) {
                    Ok(reply) if reply.is_ok() => {
                        self.store.mark_clean_and_evict(key, version);
                        Message::ok()
                    }
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!("{}: forwarding SET to {} failed: {}", self.name, next, e);
                        Message::err(e.to_string())
                    }
                }
            }
        }
    }

    fn handle_get(&self, msg: &Message) -> Message {
        let Some(key) = msg.key() else {
            return Message::err("GET requires a key field");
        };
        match self.store.read(key) {
            ReadOutcome::Absent => Message::ok_value(DEFAULT_VALUE),
            ReadOutcome::Clean(value) => Message::ok_value(value),
            ReadOutcome::NeedsVersionQuery => self.resolve_via_tail(key),
        }
    }

    fn resolve_via_tail(&self, key: &str) -> Message {
        // Only a non-tail replica with dirty-only data reaches here; it must
        // have a route to the tail.
        let Some(tail_name) = &self.tail_name else {
            return Message::err("dirty read with no tail to query");
        };
        match self.stub.send(tail_name, &Message::version_query(key)) {
            Ok(reply) if reply.is_ok() => {
                let version = reply.version().unwrap_or(0);
                let value = self
                    .store
                    .value_at_or_lowest(key, version)
                    .unwrap_or_else(|| DEFAULT_VALUE.to_string());
                Message::ok_value(value)
            }
            Ok(reply) => reply,
            Err(e) => Message::err(e.to_string()),
        }
    }

    fn handle_version(&self, msg: &Message) -> Message {
        if !self.is_tail() {
            return Message::err("VERSION must be served by the tail");
        }
        let Some(key) = msg.key() else {
            return Message::err("VERSION requires a key field");
        };
        Message::ok_version(self.store.clean_version(key).unwrap_or(0))
    }
}

impl RequestHandler for CraqReplica {
    fn process_req(&self, msg: Message) -> Message {
        match msg.msg_type() {
            Some("SET") => self.handle_set(&msg),
            Some("GET") => self.handle_get(&msg),
            Some("VERSION") => self.handle_version(&msg),
            other => Message::err(format!("unsupported message type: {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tail() -> CraqReplica {
        CraqReplica::new("d", None, None, ConnectionStub::new(Vec::new(), 1))
    }

    #[test]
    fn tail_get_on_unset_key_returns_default() {
        let replica = tail();
        let reply = replica.process_req(Message::get("y"));
        assert_eq!(reply.value(), Some("0"));
    }

    #[test]
    fn tail_set_then_get_round_trips() {
        let replica = tail();
        let set_reply = replica.process_req(Message::set("x", "1"));
        assert!(set_reply.is_ok());
        let get_reply = replica.process_req(Message::get("x"));
        assert_eq!(get_reply.value(), Some("1"));
    }

    #[test]
    fn tail_rejects_version_query_when_not_tail() {
        let replica = CraqReplica::new(
            "a",
            Some("b".into()),
            Some("d".into()),
            ConnectionStub::new(Vec::new(), 1),
        );
        let reply = replica.process_req(Message::version_query("x"));
        assert!(!reply.is_ok());
    }

    #[test]
    fn tail_answers_version_query_with_zero_for_unset_key() {
        let replica = tail();
        let reply = replica.process_req(Message::version_query("never-set"));
        assert_eq!(reply.version(), Some(0));
    }
}
