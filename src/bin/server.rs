//! Standalone replica process.
//!
//! Boots a single CR or CRAQ replica bound to a real TCP port, wired to its
//! chain neighbors by address. This is the true separate-process form of a
//! replica; the in-process [`chain_kv::cluster`] bootstrap used by tests and
//! the demo CLI shares the same replica and transport code, only the
//! bootstrap differs (SPEC_FULL §4.8).
//!
//! # Example
//!
//! A 4-replica CR chain `a -> b -> c -> d` run as four processes:
//!
//! ```bash
//! chain-kv-server --name a --addr 127.0.0.1:7001 --mode cr --next b=127.0.0.1:7002
//! chain-kv-server --name b --addr 127.0.0.1:7002 --mode cr --next c=127.0.0.1:7003
//! chain-kv-server --name c --addr 127.0.0.1:7003 --mode cr --next d=127.0.0.1:7004
//! chain-kv-server --name d --addr 127.0.0.1:7004 --mode cr
//! ```
//!
//! For CRAQ, non-tail replicas additionally need `--tail` so they can route
//! `VERSION` queries straight to it:
//!
//! ```bash
//! chain-kv-server --name a --addr 127.0.0.1:7001 --mode craq --next b=127.0.0.1:7002 --tail d=127.0.0.1:7004
//! ```

use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use chain_kv::connection_stub::ConnectionStub;
use chain_kv::cr::CrReplica;
use chain_kv::craq::CraqReplica;
use chain_kv::server;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReplicationMode {
    Cr,
    Craq,
}

/// Run one replica of a chain-replicated key-value store.
#[derive(Parser, Debug)]
#[command(name = "chain-kv-server")]
struct Cli {
    /// This replica's stable name (e.g. "a").
    #[arg(long)]
    name: String,

    /// Address to bind and listen on (e.g. "127.0.0.1:7001").
    #[arg(long)]
    addr: String,

    /// Which replication protocol this process runs.
    #[arg(long, value_enum, default_value_t = ReplicationMode::Cr)]
    mode: ReplicationMode,

    /// The next replica downstream, as "name=host:port". Omit at the tail.
    #[arg(long, value_parser = parse_named_addr)]
    next: Option<(String, String)>,

    /// The chain tail, as "name=host:port". Required for CRAQ non-tail
    /// replicas so they can route `VERSION` queries; ignored for CR and for
    /// the tail replica itself.
    #[arg(long, value_parser = parse_named_addr)]
    tail: Option<(String, String)>,

    /// Maximum concurrent in-flight requests per outgoing peer connection.
    #[arg(long, default_value_t = 8)]
    pool_capacity: usize,
}

fn parse_named_addr(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, addr)| (name.to_string(), addr.to_string()))
        .ok_or_else(|| format!("expected NAME=HOST:PORT, got {:?}", s))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut peers = Vec::new();
    if let Some((name, addr)) = &cli.next {
        peers.push((name.clone(), addr.clone()));
    }
    if let (ReplicationMode::Craq, Some((name, addr))) = (cli.mode, &cli.tail) {
        if cli.next.as_ref().map(|(n, _)| n) != Some(name) {
            peers.push((name.clone(), addr.clone()));
        }
    }

    let stub = ConnectionStub::new(peers, cli.pool_capacity);
    stub.initiate_connections()
        .context("connecting to chain neighbors")?;

    let listener = TcpListener::bind(&cli.addr)
        .with_context(|| format!("binding {}", cli.addr))?;
    log::info!("{}: listening on {} as {:?}", cli.name, cli.addr, cli.mode);

    let next_name = cli.next.as_ref().map(|(n, _)| n.clone());
    match cli.mode {
        ReplicationMode::Cr => {
            let replica = Arc::new(CrReplica::new(cli.name, next_name, stub));
            server::serve(listener, replica);
        }
        ReplicationMode::Craq => {
            let tail_name = cli.tail.as_ref().map(|(n, _)| n.clone());
            let replica = Arc::new(CraqReplica::new(cli.name, next_name, tail_name, stub));
            server::serve(listener, replica);
        }
    }
    Ok(())
}
