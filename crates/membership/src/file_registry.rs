//! Membership read from a polled instance file.
//!
//! The file is TOML with a single list:
//!
//! ```toml
//! instances = ["http://talaria-0:6200", "http://talaria-1:6200"]
//! ```
//!
//! Deployment tooling rewrites the file; the registry notices on its next
//! poll and emits a full snapshot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use corelib::MembershipSnapshot;
use serde::Deserialize;
use tracing::trace;

use crate::error::RegistryError;
use crate::registry::{MembershipEvent, Registry, Watch};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InstanceFile {
    instances: Vec<String>,
}

/// Registry backed by a file that is re-read every `poll_interval`.
#[derive(Clone, Debug)]
pub struct FileRegistry {
    path: PathBuf,
    poll_interval: Duration,
}

impl FileRegistry {
    /// Watch `path`, polling every `poll_interval`.
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            poll_interval,
        }
    }

    /// The watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file once, outside of any watch.
    pub async fn snapshot(&self) -> Result<MembershipSnapshot, RegistryError> {
        load(&self.path).await
    }
}

/// Read and parse the instance file.
///
/// Every failure is transient: the file may be mid-rewrite or briefly absent.
async fn load(path: &Path) -> Result<MembershipSnapshot, RegistryError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RegistryError::Transient(format!("read {}: {e}", path.display())))?;
    let file: InstanceFile = toml::from_str(&content)
        .map_err(|e| RegistryError::Transient(format!("parse {}: {e}", path.display())))?;
    Ok(MembershipSnapshot::from_addresses(&file.instances)?)
}

#[async_trait]
impl Registry for FileRegistry {
    async fn watch(&self) -> Result<Box<dyn Watch>, RegistryError> {
        let initial = load(&self.path).await?;
        Ok(Box::new(FileWatch {
            path: self.path.clone(),
            poll_interval: self.poll_interval,
            last: initial.clone(),
            pending: Some(initial),
        }))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

struct FileWatch {
    path: PathBuf,
    poll_interval: Duration,
    last: MembershipSnapshot,
    pending: Option<MembershipSnapshot>,
}

#[async_trait]
impl Watch for FileWatch {
    async fn next_event(&mut self) -> Result<Option<MembershipEvent>, RegistryError> {
        if let Some(initial) = self.pending.take() {
            return Ok(Some(MembershipEvent::Snapshot(initial)));
        }

        loop {
            tokio::time::sleep(self.poll_interval).await;
            let current = load(&self.path).await?;
            if current != self.last {
                self.last = current.clone();
                return Ok(Some(MembershipEvent::Snapshot(current)));
            }
            trace!(path = %self.path.display(), "instance file unchanged");
        }
    }
}
