//! Node abstractions for the consistent hash ring.
//!
//! A node is a backend instance as reported by the service registry. Its
//! identity is its normalized base address, which is also the prefix of every
//! redirect that targets it.

use std::borrow::Borrow;
use std::fmt;

use crate::error::{Error, Result};

/// Scheme assumed for registry entries that omit one.
pub const DEFAULT_SCHEME: &str = "http";

/// Identifier for a node in the cluster.
///
/// Newtype over the normalized base address (`scheme://authority[/path]`).
/// Ordering is plain string ordering, which is what the ring uses to break
/// position ties.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(String);

impl NodeId {
    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Logical node participating in the ring.
///
/// Cheap to clone; the router only ever holds copies of registry state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    authority: String,
}

impl Node {
    /// Parse a registry instance string into a node.
    ///
    /// `host:port` gains an `http://` prefix and trailing slashes are dropped,
    /// so `"a:8080"`, `"http://a:8080"` and `"http://a:8080/"` are one node.
    pub fn parse(address: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidNode {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty address"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(invalid("address contains whitespace"));
        }
        if trimmed.contains(['?', '#']) {
            return Err(invalid("address must not carry a query or fragment"));
        }

        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => (DEFAULT_SCHEME.to_string(), trimmed),
        };
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
            return Err(invalid("malformed scheme"));
        }

        let (authority, path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        if authority.is_empty() {
            return Err(invalid("missing host"));
        }
        let path = path.trim_end_matches('/');

        Ok(Self {
            id: NodeId(format!("{scheme}://{authority}{path}")),
            authority: authority.to_string(),
        })
    }

    /// The node's identity.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Base address used as the redirect prefix, without a trailing slash.
    pub fn address(&self) -> &str {
        self.id.as_str()
    }

    /// `host[:port]` portion of the address.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Build the absolute URL for `path_and_query` on this node.
    ///
    /// `path_and_query` is expected to start with `/`; one is inserted if not.
    pub fn location(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.address(), path_and_query)
        } else {
            format!("{}/{}", self.address(), path_and_query)
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}
