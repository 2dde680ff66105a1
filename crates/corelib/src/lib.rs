//! Core library for device routing by consistent hashing.
//!
//! This crate provides the fundamental abstractions:
//! - Tokens and partitioners (deterministic identifier hashing)
//! - Node and virtual node abstractions
//! - Membership snapshots
//! - The immutable hash ring and its builder
//! - The ring accessor, which swaps whole rings under concurrent readers

pub mod accessor;
pub mod error;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod snapshot;
pub mod token;
pub mod vnode;

pub use accessor::RingAccessor;
pub use error::{Error, Result};
pub use node::{Node, NodeId};
pub use partitioner::{Partitioner, PartitionerKind};
pub use ring::{HashRing, RingBuilder, RingConfig};
pub use snapshot::MembershipSnapshot;
pub use token::Token;
pub use vnode::{VirtualNode, DEFAULT_VNODES};
