//! Consistent hash ring implementation.
//!
//! The ring is an immutable, sorted table of vnode positions. A new ring is
//! built for every membership change and swapped in whole by the
//! [`RingAccessor`](crate::accessor::RingAccessor); nothing here is mutated
//! after construction.

pub mod builder;
pub mod ring;

pub use builder::{RingBuilder, RingConfig};
pub use ring::HashRing;
