//! The registry boundary.
//!
//! A registry hands out [`Watch`] streams of [`MembershipEvent`]s. The first
//! event of every watch is a full [`MembershipEvent::Snapshot`]; after that a
//! registry may send incremental changes or further full resyncs.

use async_trait::async_trait;
use corelib::{MembershipSnapshot, Node, NodeId};

use crate::error::RegistryError;

/// A membership change reported by the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MembershipEvent {
    /// Full resync: this is the complete live set.
    Snapshot(MembershipSnapshot),
    /// One instance registered.
    Added(Node),
    /// One instance went away.
    Removed(NodeId),
}

impl MembershipEvent {
    /// Fold this event into `membership`. Returns `true` if it changed.
    pub fn apply(self, membership: &mut MembershipSnapshot) -> bool {
        match self {
            MembershipEvent::Snapshot(snapshot) => {
                if *membership == snapshot {
                    false
                } else {
                    *membership = snapshot;
                    true
                }
            }
            MembershipEvent::Added(node) => membership.insert(node),
            MembershipEvent::Removed(id) => membership.remove(&id),
        }
    }
}

/// Source of live membership.
#[async_trait]
pub trait Registry: Send + Sync + 'static {
    /// Open a new watch. Called again after every transient failure.
    async fn watch(&self) -> Result<Box<dyn Watch>, RegistryError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// One open watch on a registry.
#[async_trait]
pub trait Watch: Send {
    /// Wait for the next event.
    ///
    /// `Ok(None)` means the registry closed the stream; the subscription
    /// treats that like a transient error and reconnects.
    async fn next_event(&mut self) -> Result<Option<MembershipEvent>, RegistryError>;
}
