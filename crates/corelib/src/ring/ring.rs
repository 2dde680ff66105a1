//! Hash ring data structure.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::node::{Node, NodeId};
use crate::partitioner::{Partitioner, Xxh3Partitioner};
use crate::ring::builder::RingConfig;
use crate::snapshot::MembershipSnapshot;
use crate::token::Token;
use crate::vnode::VirtualNode;

/// Immutable consistent hash ring.
///
/// # Invariants
///
/// - `nodes` is sorted by [`NodeId`] with no duplicates
/// - `vnodes` is sorted by token and every token appears once; when two
///   nodes hash to the same position the one with the lower id keeps it
/// - every `VirtualNode::owner` indexes into `nodes`
#[derive(Clone)]
pub struct HashRing {
    vnodes: Vec<VirtualNode>,
    nodes: Vec<Node>,
    vnodes_per_node: usize,
    partitioner: Arc<dyn Partitioner>,
}

impl HashRing {
    /// An empty ring using the default partitioner. Every lookup fails with
    /// [`Error::EmptyRing`].
    pub fn new() -> Self {
        Self::empty(Arc::new(Xxh3Partitioner))
    }

    /// An empty ring using `partitioner`.
    pub fn empty(partitioner: Arc<dyn Partitioner>) -> Self {
        Self {
            vnodes: Vec::new(),
            nodes: Vec::new(),
            vnodes_per_node: 0,
            partitioner,
        }
    }

    /// Build the ring for `snapshot`.
    ///
    /// The same snapshot and config always produce the same ring.
    pub fn from_snapshot(snapshot: &MembershipSnapshot, config: &RingConfig) -> Self {
        Self::build(
            snapshot.iter().cloned().collect(),
            config.vnodes.get(),
            config.hash.build(),
        )
    }

    /// `nodes` must already be sorted by id and free of duplicates.
    pub(crate) fn build(
        nodes: Vec<Node>,
        vnodes_per_node: usize,
        partitioner: Arc<dyn Partitioner>,
    ) -> Self {
        debug_assert!(nodes.windows(2).all(|w| w[0].id() < w[1].id()));

        let mut vnodes = Vec::with_capacity(nodes.len() * vnodes_per_node);
        for (owner, node) in nodes.iter().enumerate() {
            for index in 0..vnodes_per_node {
                vnodes.push(VirtualNode::from_index(
                    partitioner.as_ref(),
                    node.id(),
                    owner as u32,
                    index,
                ));
            }
        }

        // (token, owner) order; owner index order is NodeId order.
        vnodes.sort_unstable();
        let before = vnodes.len();
        vnodes.dedup_by_key(|v| v.token);
        if vnodes.len() != before {
            tracing::debug!(collisions = before - vnodes.len(), "dropped colliding vnode positions");
        }

        Self {
            vnodes,
            nodes,
            vnodes_per_node,
            partitioner,
        }
    }

    /// Hash an identifier with this ring's partitioner.
    #[inline]
    pub fn token_for(&self, key: &[u8]) -> Token {
        self.partitioner.partition(key)
    }

    /// Find the node owning `token`.
    ///
    /// Binary search for the first vnode at or after `token`, wrapping to the
    /// first vnode past the end of the ring.
    pub fn owner(&self, token: Token) -> Result<&Node> {
        let idx = self.vnodes.partition_point(|v| v.token < token);
        let vnode = self
            .vnodes
            .get(idx)
            .or_else(|| self.vnodes.first())
            .ok_or(Error::EmptyRing)?;
        Ok(&self.nodes[vnode.owner()])
    }

    /// Find the node owning `key`.
    pub fn lookup(&self, key: &[u8]) -> Result<&Node> {
        self.owner(self.token_for(key))
    }

    /// True when no node is registered.
    pub fn is_empty(&self) -> bool {
        self.vnodes.is_empty()
    }

    /// Number of physical nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of vnode positions on the ring.
    pub fn token_count(&self) -> usize {
        self.vnodes.len()
    }

    /// Configured vnodes per node (0 for an empty ring).
    pub fn vnodes_per_node(&self) -> usize {
        self.vnodes_per_node
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a member by id.
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes
            .binary_search_by(|n| n.id().cmp(id))
            .ok()
            .map(|idx| &self.nodes[idx])
    }

    /// Whether `id` is a member of this ring.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.get_node(id).is_some()
    }

    /// All positions with their owners, in ring order.
    pub fn tokens(&self) -> impl Iterator<Item = (Token, &NodeId)> + '_ {
        self.vnodes
            .iter()
            .map(move |v| (v.token, self.nodes[v.owner()].id()))
    }

    /// The partitioner used for vnodes and identifiers.
    pub fn partitioner(&self) -> &dyn Partitioner {
        self.partitioner.as_ref()
    }

    /// Name of the partitioner.
    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }

    /// Fraction of the token space owned by each node, in id order.
    ///
    /// A vnode owns the arc from its predecessor (exclusive) up to its own
    /// token (inclusive). Fractions sum to 1 for a non-empty ring.
    pub fn ownership(&self) -> Vec<(NodeId, f64)> {
        let mut arcs = vec![0u128; self.nodes.len()];
        match self.vnodes.as_slice() {
            [] => {}
            [only] => arcs[only.owner()] = 1u128 << 64,
            vnodes => {
                let mut prev = vnodes[vnodes.len() - 1].token;
                for vnode in vnodes {
                    arcs[vnode.owner()] += u128::from(prev.distance_to(&vnode.token));
                    prev = vnode.token;
                }
            }
        }

        let space = (1u128 << 64) as f64;
        self.nodes
            .iter()
            .zip(arcs)
            .map(|(node, arc)| (node.id().clone(), arc as f64 / space))
            .collect()
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("nodes", &self.nodes.len())
            .field("tokens", &self.vnodes.len())
            .field("vnodes_per_node", &self.vnodes_per_node)
            .field("partitioner", &self.partitioner.name())
            .finish()
    }
}
