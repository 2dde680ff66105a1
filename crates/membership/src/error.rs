//! Registry and subscription errors.

/// Failure talking to the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Temporary failure; the subscription reconnects with backoff.
    #[error("registry unavailable: {0}")]
    Transient(String),
    /// The registry rejected our credentials.
    #[error("registry rejected credentials: {0}")]
    Unauthorized(String),
    /// The registry cannot serve this watch and retrying will not help.
    #[error("registry failure: {0}")]
    Permanent(String),
    /// The registry reported an instance that is not a valid node address.
    #[error("registry reported an invalid instance: {0}")]
    InvalidInstance(#[from] corelib::Error),
}

impl RegistryError {
    /// Whether the subscription must give up instead of reconnecting.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Permanent(_))
    }
}

/// Terminal subscription failure. The last installed ring keeps serving.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    /// Consecutive reconnect attempts ran out.
    #[error("registry watch failed {attempts} times in a row: {last}")]
    RetriesExhausted {
        /// Consecutive failures since a watch last delivered an event.
        attempts: u32,
        /// The error that ended the final attempt.
        #[source]
        last: RegistryError,
    },
    /// The registry returned a permanent or authorization error.
    #[error("registry watch failed permanently: {0}")]
    Permanent(#[source] RegistryError),
    /// A subscription task panicked or was aborted.
    #[error("subscription task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
