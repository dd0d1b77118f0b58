//! Cluster bootstrap: turns a [`Topology`] into a running chain of replica
//! servers and a handle for minting clients against it.

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::info;

use crate::client::Client;
use crate::connection_stub::ConnectionStub;
use crate::cr::CrReplica;
use crate::craq::CraqReplica;
use crate::error::{Error, Result};
use crate::server;
use crate::topology::Topology;

/// Which replication protocol the spawned replicas run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Cr,
    Craq,
}

/// A running cluster: the background server threads are kept alive for as
/// long as this handle is. Use [`ClusterHandle::client`] to mint one
/// [`Client`] per worker thread — clients are not meant to be shared, since
/// a single worker must never have two requests in flight at once.
pub struct ClusterHandle {
    addrs: HashMap<String, String>,
    head_name: String,
    tail_name: String,
    pool_capacity: usize,
    _servers: Vec<JoinHandle<()>>,
}

impl ClusterHandle {
    /// Addresses of every replica in the chain, by name. Exposed mainly for
    /// tests that want to talk to an interior replica directly.
    pub fn addrs(&self) -> &HashMap<String, String> {
        &self.addrs
    }

    pub fn head_name(&self) -> &str {
        &self.head_name
    }

    pub fn tail_name(&self) -> &str {
        &self.tail_name
    }

    /// Mint a fresh client for one worker. Each client owns its own
    /// connection stub (and therefore its own sockets), so workers never
    /// contend with each other's in-flight requests.
    pub fn client(&self, worker_id: u64) -> Result<Client> {
        let stub = ConnectionStub::new(
            self.addrs.iter().map(|(n, a)| (n.clone(), a.clone())),
            self.pool_capacity,
        );
        stub.initiate_connections()?;
        Ok(Client::new(
            worker_id,
            stub,
            self.head_name.clone(),
            self.tail_name.clone(),
        ))
    }
}

/// Spawn one server thread per replica named in `topology`, wire each one's
/// connection stub to exactly the peers its chain position may address, and
/// block until every replica has completed `initiate_connections`.
///
/// Replica "processes" here are OS threads inside this process, each
/// bound to its own loopback TCP port — see SPEC_FULL §4.8 for why this
/// stands in for true multi-process deployment in this implementation.
pub fn launch(topology: &Topology, mode: Mode, pool_capacity: usize) -> Result<ClusterHandle> {
    if topology.is_empty() {
        return Err(Error::Protocol("topology has no replicas".to_string()));
    }

    let mut listeners = HashMap::new();
    let mut resolved_addrs = HashMap::new();
    for info in topology.replicas() {
        let listener = TcpListener::bind(&info.addr).map_err(|source| Error::Transport {
            peer: info.name.clone(),
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| Error::Transport {
            peer: info.name.clone(),
            source,
        })?;
        resolved_addrs.insert(info.name.clone(), local_addr.to_string());
        listeners.insert(info.name.clone(), listener);
    }
    let topology = topology.with_resolved_addrs(&resolved_addrs);

    let head_name = topology.head().expect("checked non-empty above").name.clone();
    let tail_name = topology.tail().expect("checked non-empty above").name.clone();

    let mut stubs = HashMap::new();
    for info in topology.replicas() {
        let peers = topology
            .outgoing(&info.name)
            .into_iter()
            .map(|r| (r.name, r.addr));
        let stub = ConnectionStub::new(peers, pool_capacity);
        stub.initiate_connections()?;
        stubs.insert(info.name.clone(), stub);
    }

    let mut servers = Vec::with_capacity(topology.len());
    for info in topology.replicas() {
        let listener = listeners.remove(&info.name).expect("listener bound above");
        let stub = stubs.remove(&info.name).expect("stub built above");
        let next_name = topology.next(&info.name).map(|r| r.name.clone());

        info!("{}: starting as {:?} at {}", info.name, mode, info.addr);
        let join = match mode {
            Mode::Cr => {
                let replica = Arc::new(CrReplica::new(info.name.clone(), next_name, stub));
                thread::spawn(move || server::serve(listener, replica))
            }
            Mode::Craq => {
                let tail_for_queries = if topology.is_tail(&info.name) {
                    None
                } else {
                    Some(tail_name.clone())
                };
                let replica = Arc::new(CraqReplica::new(
                    info.name.clone(),
                    next_name,
                    tail_for_queries,
                    stub,
                ));
                thread::spawn(move || server::serve(listener, replica))
            }
        };
        servers.push(join);
    }

    Ok(ClusterHandle {
        addrs: resolved_addrs,
        head_name,
        tail_name,
        pool_capacity,
        _servers: servers,
    })
}
