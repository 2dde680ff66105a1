//! Fixed membership from configuration.

use async_trait::async_trait;
use corelib::MembershipSnapshot;

use crate::error::RegistryError;
use crate::registry::{MembershipEvent, Registry, Watch};

/// A registry whose membership never changes.
///
/// Each watch yields the configured snapshot once and then stays open until
/// the subscription shuts down.
#[derive(Clone, Debug)]
pub struct StaticRegistry {
    snapshot: MembershipSnapshot,
}

impl StaticRegistry {
    /// Registry serving `snapshot`.
    pub fn new(snapshot: MembershipSnapshot) -> Self {
        Self { snapshot }
    }

    /// Registry serving the given instance addresses.
    pub fn from_addresses<I, S>(addresses: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(MembershipSnapshot::from_addresses(addresses)?))
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn watch(&self) -> Result<Box<dyn Watch>, RegistryError> {
        Ok(Box::new(StaticWatch {
            pending: Some(self.snapshot.clone()),
        }))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

struct StaticWatch {
    pending: Option<MembershipSnapshot>,
}

#[async_trait]
impl Watch for StaticWatch {
    async fn next_event(&mut self) -> Result<Option<MembershipEvent>, RegistryError> {
        match self.pending.take() {
            Some(snapshot) => Ok(Some(MembershipEvent::Snapshot(snapshot))),
            None => std::future::pending().await,
        }
    }
}
