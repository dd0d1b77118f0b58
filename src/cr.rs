//! Chain Replication (CR) replica: writes flow head→tail, acknowledgements
//! fold back tail→head; reads are served exclusively by the tail.

use log::{debug, warn};

use crate::connection_stub::ConnectionStub;
use crate::message::Message;
use crate::server::RequestHandler;
use crate::store::KVStore;

/// One link of a CR chain. `next` is `None` exactly at the tail; whether a
/// given replica is "the head" is not tracked as a flag — the client is
/// responsible for addressing SET to the head (see the note on
/// `handle_set`), and every link applies the same local-then-forward rule.
pub struct CrReplica {
    name: String,
    store: KVStore,
    next: Option<String>,
    stub: ConnectionStub,
}

impl CrReplica {
    pub fn new(name: impl Into<String>, next: Option<String>, stub: ConnectionStub) -> Self {
        CrReplica {
            name: name.into(),
            store: KVStore::new(),
            next,
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
        // Install locally before forwarding: a crash downstream still leaves
        // this replica with the write, matching the spec's acknowledged
        // inconsistency window (SPEC_FULL §9, open question a).
        self.store.put(key.to_string(), value.to_string());

        match &self.next {
            None => {
                // We are the tail: the write is committed. Ack immediately.
                debug!("{}: committed SET {}={} at tail", self.name, key, value);
                Message::ok()
            }
            Some(next) => {
                let forward = Message::set(key, value);
                match self.stub.send(next, &forward) {
                    Ok(reply) if reply.is_ok() => Message::ok(),
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
        if !self.is_tail() {
            return Message::err("GET must be served by the tail");
        }
        let Some(key) = msg.key() else {
            return Message::err("GET requires a key field");
        };
        Message::ok_value(self.store.get_or_default(key))
    }
}

impl RequestHandler for CrReplica {
    fn process_req(&self, msg: Message) -> Message {
        match msg.msg_type() {
            Some("SET") => self.handle_set(&msg),
            Some("GET") => self.handle_get(&msg),
            other => Message::err(format!("unsupported message type: {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection_stub::ConnectionStub;

    fn tail() -> CrReplica {
        CrReplica::new("d", None, ConnectionStub::new(Vec::new(), 1))
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
    fn non_tail_rejects_get() {
        let replica = CrReplica::new("a", Some("b".into()), ConnectionStub::new(Vec::new(), 1));
        let reply = replica.process_req(Message::get("x"));
        assert!(!reply.is_ok());
    }
}
