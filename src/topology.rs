//! Chain topology: the total order over replica names, and the directed
//! who-may-send-to-whom graph derived from it.
//!
//! The cluster manager does not verify acyclicity or linearity of a
//! hand-built graph — callers are expected to go through [`Topology::chain`]
//! or [`Topology::chain_with_tail_shortcuts`], which can only produce a
//! linear chain by construction.

use std::collections::{HashMap, HashSet};

/// A replica's stable name and network address, fixed at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplicaInfo {
    pub name: String,
    pub addr: String,
}

impl ReplicaInfo {
    pub fn new(name: impl Into<String>, addr: impl Into<String>) -> Self {
        ReplicaInfo {
            name: name.into(),
            addr: addr.into(),
        }
    }
}

/// The total order over replica names plus the directed send-permission graph
/// derived from it. `order[0]` is the head, `order[last]` is the tail.
pub struct Topology {
    order: Vec<ReplicaInfo>,
    edges: HashMap<String, HashSet<String>>,
}

impl Topology {
    /// A plain chain: replica `i` may send only to replica `i + 1`. Matches
    /// what CR needs (each link only ever forwards to `next`).
    pub fn chain(order: Vec<ReplicaInfo>) -> Self {
        let mut edges: HashMap<String, HashSet<String>> = HashMap::new();
        for w in order.windows(2) {
            edges
                .entry(w[0].name.clone())
                .or_default()
                .insert(w[1].name.clone());
        }
        Topology { order, edges }
    }

    /// A chain where, additionally, every non-tail replica may send directly
    /// to the tail. CRAQ needs this for `VERSION` queries, which bypass the
    /// chain and go straight to the tail regardless of the querying
    /// replica's position.
    pub fn chain_with_tail_shortcuts(order: Vec<ReplicaInfo>) -> Self {
        let mut topology = Topology::chain(order);
        if let Some(tail) = topology.order.last().cloned() {
            for info in &topology.order {
                if info.name != tail.name {
                    topology
                        .edges
                        .entry(info.name.clone())
                        .or_default()
                        .insert(tail.name.clone());
                }
            }
        }
        topology
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn replicas(&self) -> &[ReplicaInfo] {
        &self.order
    }

    pub fn head(&self) -> Option<&ReplicaInfo> {
        self.order.first()
    }

    pub fn tail(&self) -> Option<&ReplicaInfo> {
        self.order.last()
    }

    pub fn info(&self, name: &str) -> Option<&ReplicaInfo> {
        self.order.iter().find(|r| r.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|r| r.name == name)
    }

    pub fn is_head(&self, name: &str) -> bool {
        self.position(name) == Some(0)
    }

    pub fn is_tail(&self, name: &str) -> bool {
        !self.order.is_empty() && self.position(name) == Some(self.order.len() - 1)
    }

    pub fn prev(&self, name: &str) -> Option<&ReplicaInfo> {
        let i = self.position(name)?;
        i.checked_sub(1).map(|i| &self.order[i])
    }

    pub fn next(&self, name: &str) -> Option<&ReplicaInfo> {
        let i = self.position(name)?;
        self.order.get(i + 1)
    }

    /// The replica infos `name` is permitted to address, resolved from the
    /// adjacency graph.
    pub fn outgoing(&self, name: &str) -> Vec<ReplicaInfo> {
        self.edges
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|n| self.info(n).cloned())
            .collect()
    }

    /// Rebuild this topology with each replica's address replaced by the one
    /// in `addrs` (falling back to the original if a name is missing). Used
    /// by the cluster manager after binding ephemeral ("`:0`") ports, so the
    /// adjacency graph can be reused unchanged with resolved addresses.
    pub fn with_resolved_addrs(&self, addrs: &HashMap<String, String>) -> Topology {
        let order = self
            .order
            .iter()
            .map(|info| {
                let addr = addrs.get(&info.name).cloned().unwrap_or_else(|| info.addr.clone());
                ReplicaInfo::new(info.name.clone(), addr)
            })
            .collect();
        Topology {
            order,
            edges: self.edges.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> ReplicaInfo {
        ReplicaInfo::new(name, format!("127.0.0.1:0{}", name))
    }

    #[test]
    fn chain_of_four_has_correct_prev_next() {
        let order = vec![info("a"), info("b"), info("c"), info("d")];
        let topo = Topology::chain(order);
        assert!(topo.is_head("a"));
        assert!(topo.is_tail("d"));
        assert_eq!(topo.prev("b").unwrap().name, "a");
        assert_eq!(topo.next("b").unwrap().name, "c");
        assert!(topo.prev("a").is_none());
        assert!(topo.next("d").is_none());
    }

    #[test]
    fn chain_of_one_is_both_head_and_tail() {
        let topo = Topology::chain(vec![info("a")]);
        assert!(topo.is_head("a"));
        assert!(topo.is_tail("a"));
        assert!(topo.prev("a").is_none());
        assert!(topo.next("a").is_none());
    }

    #[test]
    fn tail_shortcuts_reach_every_non_tail_replica() {
        let order = vec![info("a"), info("b"), info("c"), info("d")];
        let topo = Topology::chain_with_tail_shortcuts(order);
        let a_targets: HashSet<_> = topo.outgoing("a").into_iter().map(|r| r.name).collect();
        assert!(a_targets.contains("b"));
        assert!(a_targets.contains("d"));
        let c_targets: HashSet<_> = topo.outgoing("c").into_iter().map(|r| r.name).collect();
        assert!(c_targets.contains("d"));
    }
}
