//! Ring configuration and builder.

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::Node;
use crate::partitioner::{Partitioner, PartitionerKind};
use crate::ring::ring::HashRing;
use crate::snapshot::MembershipSnapshot;
use crate::vnode::DEFAULT_VNODES;

const DEFAULT_VNODES_NONZERO: NonZeroUsize = match NonZeroUsize::new(DEFAULT_VNODES) {
    Some(n) => n,
    None => panic!("DEFAULT_VNODES must be non-zero"),
};

/// Parameters every router sharing a registry must agree on.
///
/// Deserializes from the `[ring]` config section:
///
/// ```toml
/// [ring]
/// vnodes = 211
/// hash = "xxh3"
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingConfig {
    /// Vnodes per physical node.
    pub vnodes: NonZeroUsize,
    /// Identifier and vnode hash.
    pub hash: PartitionerKind,
}

impl RingConfig {
    /// Validate and build a config.
    pub fn new(vnodes: usize, hash: PartitionerKind) -> Result<Self> {
        let vnodes = NonZeroUsize::new(vnodes)
            .ok_or_else(|| Error::InvalidConfig("vnode count must be at least 1".to_string()))?;
        Ok(Self { vnodes, hash })
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            vnodes: DEFAULT_VNODES_NONZERO,
            hash: PartitionerKind::default(),
        }
    }
}

/// Fluent construction of a [`HashRing`].
///
/// # Example
///
/// ```rust
/// use corelib::{Node, RingBuilder};
///
/// let ring = RingBuilder::new()
///     .with_vnodes(64)
///     .add_node(Node::parse("http://node1:8080").unwrap())
///     .add_node(Node::parse("http://node2:8080").unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(ring.token_count(), 128);
/// ```
#[derive(Debug)]
pub struct RingBuilder {
    vnodes: usize,
    partitioner: Arc<dyn Partitioner>,
    snapshot: MembershipSnapshot,
}

impl RingBuilder {
    /// Builder with 211 vnodes per node and the XXH3 partitioner.
    pub fn new() -> Self {
        Self {
            vnodes: DEFAULT_VNODES,
            partitioner: PartitionerKind::default().build(),
            snapshot: MembershipSnapshot::new(),
        }
    }

    /// Builder seeded from a config.
    pub fn from_config(config: &RingConfig) -> Self {
        Self::new()
            .with_vnodes(config.vnodes.get())
            .with_partitioner(config.hash)
    }

    /// Set the vnode count per node.
    pub fn with_vnodes(mut self, vnodes: usize) -> Self {
        self.vnodes = vnodes;
        self
    }

    /// Select a built-in partitioner.
    pub fn with_partitioner(mut self, kind: PartitionerKind) -> Self {
        self.partitioner = kind.build();
        self
    }

    /// Use a custom partitioner.
    pub fn with_custom_partitioner(mut self, partitioner: Arc<dyn Partitioner>) -> Self {
        self.partitioner = partitioner;
        self
    }

    /// Add a node. Adding the same node twice has no further effect.
    pub fn add_node(mut self, node: Node) -> Self {
        self.snapshot.insert(node);
        self
    }

    /// Add every node of a snapshot.
    pub fn add_snapshot(mut self, snapshot: &MembershipSnapshot) -> Self {
        for node in snapshot.iter() {
            self.snapshot.insert(node.clone());
        }
        self
    }

    /// Build the ring. Fails if the vnode count is zero.
    pub fn build(self) -> Result<HashRing> {
        if self.vnodes == 0 {
            return Err(Error::InvalidConfig(
                "vnode count must be at least 1".to_string(),
            ));
        }
        Ok(HashRing::build(
            self.snapshot.iter().cloned().collect(),
            self.vnodes,
            self.partitioner,
        ))
    }
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RingConfig::default();
        assert_eq!(config.vnodes.get(), 211);
        assert_eq!(config.hash, PartitionerKind::Xxh3);
    }

    #[test]
    fn test_config_rejects_zero_vnodes() {
        assert!(matches!(
            RingConfig::new(0, PartitionerKind::Xxh3),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            RingBuilder::new().with_vnodes(0).build(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_builder_default_vnodes() {
        let ring = RingBuilder::new()
            .add_node(Node::parse("node1:80").unwrap())
            .add_node(Node::parse("node2:80").unwrap())
            .build()
            .unwrap();
        assert_eq!(ring.node_count(), 2);
        assert_eq!(ring.vnodes_per_node(), 211);
        assert_eq!(ring.partitioner_name(), "Xxh3Partitioner");
    }

    #[test]
    fn test_builder_matches_from_snapshot() {
        let snapshot = MembershipSnapshot::from_addresses(["a:1", "b:1", "c:1"]).unwrap();
        let config = RingConfig::new(32, PartitionerKind::Siphash).unwrap();

        let built = RingBuilder::from_config(&config)
            .add_snapshot(&snapshot)
            .build()
            .unwrap();
        let direct = HashRing::from_snapshot(&snapshot, &config);

        assert!(built.tokens().eq(direct.tokens()));
        assert_eq!(built.partitioner_name(), "SipPartitioner");
    }
}
