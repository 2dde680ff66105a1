//! Error types for the core library.

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The ring holds no vnodes, so no identifier has an owner.
    #[error("hash ring is empty: no nodes registered")]
    EmptyRing,
    /// A registry entry could not be turned into a node.
    #[error("invalid node address {address:?}: {reason}")]
    InvalidNode {
        /// The address as reported.
        address: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Ring configuration rejected.
    #[error("invalid ring configuration: {0}")]
    InvalidConfig(String),
}
