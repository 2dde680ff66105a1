//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners are responsible for converting identifiers into tokens
//! that can be placed on the hash ring.

pub mod sip;
pub mod traits;
pub mod xxh3;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use sip::SipPartitioner;
pub use traits::Partitioner;
pub use xxh3::Xxh3Partitioner;

/// Partitioner selection, as written in configuration.
///
/// Every router sharing a registry must use the same kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionerKind {
    /// XXH3-64.
    #[default]
    Xxh3,
    /// SipHash-1-3, zero keys.
    #[serde(alias = "sip")]
    Siphash,
}

impl PartitionerKind {
    /// Instantiate the selected partitioner.
    pub fn build(self) -> Arc<dyn Partitioner> {
        match self {
            PartitionerKind::Xxh3 => Arc::new(Xxh3Partitioner),
            PartitionerKind::Siphash => Arc::new(SipPartitioner),
        }
    }
}

impl fmt::Display for PartitionerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionerKind::Xxh3 => f.write_str("xxh3"),
            PartitionerKind::Siphash => f.write_str("siphash"),
        }
    }
}
