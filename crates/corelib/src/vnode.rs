//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Each physical node is placed on the ring many times instead of once. This
//! provides:
//!
//! 1. **Better Load Distribution**: more positions, smoother share per node
//! 2. **Gradual Rebalancing**: when a node joins or leaves, only its own arcs move
//!
//! # Performance Characteristics
//!
//! - **Memory**: O(v·n), 16 bytes per vnode
//! - **Lookup**: O(log(v·n)) binary search
//! - **Churn**: removing one of n nodes remaps about 1/n of identifiers
//!
//! Every router sharing a registry must use the same vnode count, or they
//! will disagree on ownership.

use crate::node::NodeId;
use crate::partitioner::Partitioner;
use crate::token::Token;

/// Default number of vnodes per physical node.
pub const DEFAULT_VNODES: usize = 211;

/// A virtual node on the hash ring.
///
/// Represents a single token position owned by a physical node. The owner is
/// stored as an index into the ring's node table, which is sorted by
/// [`NodeId`], so ordering vnodes by `(token, owner)` is the same as ordering
/// them by `(token, node id)`.
///
/// # Memory Layout
///
/// ```text
/// VirtualNode {
///     token: Token(u64),  // 8 bytes
///     owner: u32,         // 4 bytes (+ padding)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Token position on the ring.
    ///
    /// This is the hash of `"node_id:vnode_index"`.
    pub token: Token,

    /// Index of the owning node in the ring's node table.
    pub owner: u32,
}

impl VirtualNode {
    /// Create a new virtual node.
    #[inline]
    pub fn new(token: Token, owner: u32) -> Self {
        Self { token, owner }
    }

    /// Create a virtual node from a node ID and vnode index.
    ///
    /// # Algorithm
    ///
    /// 1. Format string: `"node_id:vnode_index"`
    /// 2. Hash the string with the ring's partitioner
    /// 3. Pair the token with the owner's table index
    pub fn from_index(
        partitioner: &dyn Partitioner,
        node_id: &NodeId,
        owner: u32,
        vnode_index: usize,
    ) -> Self {
        let vnode_key = vnode_key(node_id, vnode_index);
        Self::new(partitioner.partition(vnode_key.as_bytes()), owner)
    }

    /// Get the token position.
    #[inline]
    pub fn token(&self) -> Token {
        self.token
    }

    /// Get the owner's index in the node table.
    #[inline]
    pub fn owner(&self) -> usize {
        self.owner as usize
    }
}

/// Key hashed to place vnode `vnode_index` of `node_id`.
pub fn vnode_key(node_id: &NodeId, vnode_index: usize) -> String {
    format!("{}:{}", node_id, vnode_index)
}

impl std::fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VNode(token={}, owner={})", self.token, self.owner)
    }
}
