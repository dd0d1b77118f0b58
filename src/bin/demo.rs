//! Interactive demo CLI.
//!
//! Boots an in-process chain over real loopback TCP sockets (the same
//! cluster bootstrap integration tests use) and drives it with a readline
//! session, in the spirit of a database shell.
//!
//! ```bash
//! chain-kv-demo --mode craq --length 4
//! demo> SET hello world
//! OK hello = world
//! demo> GET hello
//! hello -> world
//! demo> EXIT
//! Goodbye!
//! ```

use clap::{Parser, ValueEnum};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use chain_kv::cluster::{self, Mode};
use chain_kv::topology::{ReplicaInfo, Topology};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReplicationMode {
    Cr,
    Craq,
}

/// Run an in-process chain-replicated cluster and drive it interactively.
#[derive(Parser, Debug)]
#[command(name = "chain-kv-demo")]
struct Cli {
    /// Which replication protocol to run.
    #[arg(long, value_enum, default_value_t = ReplicationMode::Cr)]
    mode: ReplicationMode,

    /// Number of replicas in the chain, named a, b, c, ... in order.
    #[arg(long, default_value_t = 4)]
    length: usize,

    /// Per-peer connection pool capacity.
    #[arg(long, default_value_t = 8)]
    pool_capacity: usize,
}

fn replica_name(i: usize) -> String {
    // a, b, c, ... z, then aa, ab, ... — plenty for a demo chain.
    let mut n = i;
    let mut name = String::new();
    loop {
        name.insert(0, (b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    name
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    anyhow::ensure!(cli.length > 0, "chain length must be at least 1");

    let order: Vec<ReplicaInfo> = (0..cli.length)
        .map(|i| ReplicaInfo::new(replica_name(i), "127.0.0.1:0"))
        .collect();
    let mode = match cli.mode {
        ReplicationMode::Cr => Mode::Cr,
        ReplicationMode::Craq => Mode::Craq,
    };
    let topology = match mode {
        Mode::Cr => Topology::chain(order),
        Mode::Craq => Topology::chain_with_tail_shortcuts(order),
    };

    let cluster = cluster::launch(&topology, mode, cli.pool_capacity)?;
    println!(
        "Chain ready: {} replicas ({:?}), head={}, tail={}",
        cli.length,
        cli.mode,
        cluster.head_name(),
        cluster.tail_name()
    );
    println!("Commands:");
    println!("  - SET <key> <value>");
    println!("  - GET <key> [replica]");
    println!("  - EXIT");

    let client = cluster.client(0)?;
    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("demo> ") {
            Ok(line) => {
                let parts: Vec<&str> = line.trim().split_whitespace().collect();
                match parts.as_slice() {
                    ["SET", key, value] => match client.set(key, value) {
                        Ok(()) => println!("OK {} = {}", key, value),
                        Err(e) => println!("ERR {}", e),
                    },
                    ["GET", key] => match client.get(key) {
                        Ok(value) => println!("{} -> {}", key, value),
                        Err(e) => println!("ERR {}", e),
                    },
                    ["GET", key, replica] => match client.get_from(replica, key) {
                        Ok(value) => println!("{} -> {} (from {})", key, value, replica),
                        Err(e) => println!("ERR {}", e),
                    },
                    ["EXIT"] => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {
                        println!("Invalid command. Use: SET <key> <value>, GET <key> [replica], or EXIT");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("EOF");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
