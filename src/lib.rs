//! # Chain-Replicated Key-Value Store
//!
//! A strongly-consistent, chain-replicated key-value store. Two replication
//! variants are implemented on top of a shared transport and server
//! framework:
//!
//! - **CR (Chain Replication):** writes flow head→tail, acknowledgements
//!   fold back tail→head; reads are served exclusively by the tail.
//! - **CRAQ (Chain Replication with Apportioned Queries):** writes follow the
//!   same path with a per-key clean/dirty discipline; reads may be served by
//!   any replica, falling back to a version check against the tail when the
//!   local copy is dirty.
//!
//! ## Module map
//!
//! - [`message`] — the wire message type and its length-prefixed JSON framing.
//! - [`transport`] — a bounded pool of blocking TCP connections to one peer.
//! - [`connection_stub`] — a name-indexed collection of transports.
//! - [`server`] — the accept-loop-plus-handler-thread TCP server framework.
//! - [`topology`] — the chain's total order and derived send-permission graph.
//! - [`store`] — the plain key-value store backing CR.
//! - [`cr`] — the CR replica state machine.
//! - [`craq`] — the versioned store and CRAQ replica state machine.
//! - [`cluster`] — bootstraps a topology into a running chain.
//! - [`client`] — the SET/GET façade and linearizability log.
//! - [`error`] — the library's typed error.
//!
//! ## Running a cluster
//!
//! ```no_run
//! use chain_kv::cluster::{self, Mode};
//! use chain_kv::topology::{ReplicaInfo, Topology};
//!
//! let order = vec![
//!     ReplicaInfo::new("a", "127.0.0.1:7001"),
//!     ReplicaInfo::new("b", "127.0.0.1:7002"),
//!     ReplicaInfo::new("c", "127.0.0.1:7003"),
//!     ReplicaInfo::new("d", "127.0.0.1:7004"),
//! ];
//! let topology = Topology::chain(order);
//! let handle = cluster::launch(&topology, Mode::Cr, 4).unwrap();
//! let client = handle.client(0).unwrap();
//! client.set("x", "1").unwrap();
//! assert_eq!(client.get("x").unwrap(), "1");
//! ```

pub mod client;
pub mod cluster;
pub mod connection_stub;
pub mod cr;
pub mod craq;
pub mod error;
pub mod message;
pub mod server;
pub mod store;
pub mod topology;
pub mod transport;
