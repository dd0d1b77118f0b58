//! Integration tests for Chain Replication (CR) over real loopback TCP.

use chain_kv::cluster::{self, Mode};
use chain_kv::topology::{ReplicaInfo, Topology};

fn chain_of(names: &[&str]) -> Topology {
    let order = names
        .iter()
        .map(|n| ReplicaInfo::new(*n, "127.0.0.1:0"))
        .collect();
    Topology::chain(order)
}

#[test]
fn single_write_visible_at_tail() {
    let topology = chain_of(&["a", "b", "c", "d"]);
    let cluster = cluster::launch(&topology, Mode::Cr, 8).unwrap();
    let client = cluster.client(0).unwrap();

    client.set("x", "1").unwrap();
    assert_eq!(client.get("x").unwrap(), "1");
}

#[test]
fn unset_key_reads_as_default() {
    let topology = chain_of(&["a", "b", "c", "d"]);
    let cluster = cluster::launch(&topology, Mode::Cr, 8).unwrap();
    let client = cluster.client(0).unwrap();

    assert_eq!(client.get("y").unwrap(), "0");
}

#[test]
fn chain_of_one_head_and_tail_coincide() {
    let topology = chain_of(&["a"]);
    let cluster = cluster::launch(&topology, Mode::Cr, 4).unwrap();
    let client = cluster.client(0).unwrap();

    client.set("z", "9").unwrap();
    assert_eq!(client.get("z").unwrap(), "9");
}

#[test]
fn pool_capacity_one_still_completes_ten_sequential_writes() {
    let topology = chain_of(&["a", "b", "c", "d"]);
    let cluster = cluster::launch(&topology, Mode::Cr, 1).unwrap();
    let client = cluster.client(0).unwrap();

    for i in 0..10 {
        client
            .set(&format!("k{}", i), &format!("v{}", i))
            .unwrap();
    }
    for i in 0..10 {
        assert_eq!(
            client.get(&format!("k{}", i)).unwrap(),
            format!("v{}", i)
        );
    }
}

#[test]
fn concurrent_writers_to_the_same_key_converge_on_one_value() {
    let topology = chain_of(&["a", "b", "c", "d"]);
    let cluster = cluster::launch(&topology, Mode::Cr, 8).unwrap();

    let c0 = cluster.client(0).unwrap();
    let c1 = cluster.client(1).unwrap();
    let h0 = std::thread::spawn(move || c0.set("k", "A"));
    let h1 = std::thread::spawn(move || c1.set("k", "B"));
    h0.join().unwrap().unwrap();
    h1.join().unwrap().unwrap();

    let readers: Vec<_> = (2..5)
        .map(|id| cluster.client(id).unwrap())
        .collect();
    let values: Vec<String> = readers.iter().map(|c| c.get("k").unwrap()).collect();
    assert!(values.iter().all(|v| v == "A" || v == "B"));
    assert!(values.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn repeated_reads_with_no_writers_are_stable() {
    let topology = chain_of(&["a", "b", "c", "d"]);
    let cluster = cluster::launch(&topology, Mode::Cr, 8).unwrap();
    let client = cluster.client(0).unwrap();

    client.set("k", "v").unwrap();
    for _ in 0..5 {
        assert_eq!(client.get("k").unwrap(), "v");
    }
}
