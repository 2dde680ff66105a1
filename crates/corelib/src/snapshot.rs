//! Membership snapshots.
//!
//! A snapshot is the complete set of live nodes at one instant. It is keyed
//! by [`NodeId`], so the same membership always iterates in the same order no
//! matter how it was assembled.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::node::{Node, NodeId};

/// Full set of currently registered nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MembershipSnapshot {
    nodes: BTreeMap<NodeId, Node>,
}

impl MembershipSnapshot {
    /// An empty snapshot (no nodes registered).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of registry instance strings.
    ///
    /// Fails on the first address that is not a valid node.
    pub fn from_addresses<I, S>(addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        addresses
            .into_iter()
            .map(|a| Node::parse(a.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Self::from_nodes)
    }

    /// Build a snapshot from already-parsed nodes. Duplicates collapse.
    pub fn from_nodes<I: IntoIterator<Item = Node>>(nodes: I) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id().clone(), n)).collect(),
        }
    }

    /// Add or replace a node. Returns `true` if membership changed.
    pub fn insert(&mut self, node: Node) -> bool {
        match self.nodes.get(node.id()) {
            Some(existing) if *existing == node => false,
            _ => {
                self.nodes.insert(node.id().clone(), node);
                true
            }
        }
    }

    /// Remove a node. Returns `true` if it was present.
    pub fn remove(&mut self, id: &NodeId) -> bool {
        self.nodes.remove(id).is_some()
    }

    /// Whether the node is a member.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no nodes are registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Members in `NodeId` order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Member ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }
}

impl FromIterator<Node> for MembershipSnapshot {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Self::from_nodes(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_addresses_dedups_and_orders() {
        let snapshot =
            MembershipSnapshot::from_addresses(["c:80", "a:80", "http://a:80/", "b:80"]).unwrap();
        let ids: Vec<&str> = snapshot.ids().map(NodeId::as_str).collect();
        assert_eq!(ids, ["http://a:80", "http://b:80", "http://c:80"]);
    }

    #[test]
    fn test_from_addresses_rejects_invalid() {
        assert!(MembershipSnapshot::from_addresses(["a:80", ""]).is_err());
    }

    #[test]
    fn test_insert_and_remove_report_changes() {
        let mut snapshot = MembershipSnapshot::new();
        let a = Node::parse("a:80").unwrap();

        assert!(snapshot.insert(a.clone()));
        assert!(!snapshot.insert(a.clone()), "re-adding is a no-op");
        assert!(snapshot.contains(a.id()));

        assert!(snapshot.remove(a.id()));
        assert!(!snapshot.remove(a.id()));
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_order_independent_equality() {
        let x = MembershipSnapshot::from_addresses(["a:1", "b:1"]).unwrap();
        let y = MembershipSnapshot::from_addresses(["b:1", "a:1"]).unwrap();
        assert_eq!(x, y);
    }
}
