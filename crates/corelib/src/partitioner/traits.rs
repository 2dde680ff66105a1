//! Core partitioner trait definitions.

use crate::token::Token;
use std::fmt::Debug;

/// A partitioner converts identifiers into tokens for placement on the hash ring.
///
/// Partitioners must be deterministic across processes and restarts:
/// independent routers sharing a registry have to agree on every token.
/// No per-process seeds, no `RandomState`.
pub trait Partitioner: Send + Sync + Debug + 'static {
    /// Converts a key into a token.
    ///
    /// # Arguments
    ///
    /// * `key` - The identifier bytes to hash
    ///
    /// # Returns
    ///
    /// A token representing the key's position on the ring
    fn partition(&self, key: &[u8]) -> Token;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}
