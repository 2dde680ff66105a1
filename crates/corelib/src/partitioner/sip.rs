//! SipHash partitioner implementation.

use crate::partitioner::traits::Partitioner;
use crate::token::Token;
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// SipHash-1-3 partitioner with fixed zero keys.
///
/// Feeds the raw bytes through `Hasher::write` rather than `Hash::hash`, which
/// would mix in a platform-width length prefix.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipPartitioner;

impl Partitioner for SipPartitioner {
    fn partition(&self, key: &[u8]) -> Token {
        let mut hasher = SipHasher13::new();
        hasher.write(key);
        Token(hasher.finish())
    }

    fn name(&self) -> &'static str {
        "SipPartitioner"
    }
}
