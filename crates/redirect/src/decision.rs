//! Self-vs-remote ownership decisions.

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use corelib::{Node, NodeId, RingAccessor};
use tracing::debug;

use crate::error::{ConfigError, RouteError};

/// A temporary redirect status: 302, 303 or 307.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RedirectStatus(StatusCode);

impl RedirectStatus {
    /// `302 Found`.
    pub const FOUND: Self = Self(StatusCode::FOUND);
    /// `303 See Other`.
    pub const SEE_OTHER: Self = Self(StatusCode::SEE_OTHER);
    /// `307 Temporary Redirect`, the default. Keeps the request method.
    pub const TEMPORARY_REDIRECT: Self = Self(StatusCode::TEMPORARY_REDIRECT);

    /// The HTTP status code sent with redirects.
    pub fn status(&self) -> StatusCode {
        self.0
    }
}

impl Default for RedirectStatus {
    fn default() -> Self {
        Self::TEMPORARY_REDIRECT
    }
}

impl TryFrom<u16> for RedirectStatus {
    type Error = ConfigError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            302 => Ok(Self::FOUND),
            303 => Ok(Self::SEE_OTHER),
            307 => Ok(Self::TEMPORARY_REDIRECT),
            other => Err(ConfigError::RedirectStatus(other)),
        }
    }
}

impl fmt::Display for RedirectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_u16())
    }
}

/// Outcome of routing one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// This router owns the device; serve it here.
    Local(Node),
    /// Another node owns the device.
    Redirect {
        /// Owner of the device.
        node: Node,
        /// Owner address followed by the original path and query.
        location: String,
        status: RedirectStatus,
    },
}

/// Decides where a device's request belongs.
///
/// Reads whatever ring is installed in the accessor at call time and never
/// mutates it.
#[derive(Debug)]
pub struct Redirector {
    accessor: Arc<RingAccessor>,
    local: Option<NodeId>,
    status: RedirectStatus,
}

impl Redirector {
    /// Redirect everything with 307; no request is treated as local.
    pub fn new(accessor: Arc<RingAccessor>) -> Self {
        Self {
            accessor,
            local: None,
            status: RedirectStatus::default(),
        }
    }

    /// Treat devices owned by `id` as local.
    pub fn with_local(mut self, id: NodeId) -> Self {
        self.local = Some(id);
        self
    }

    /// Use `status` instead of 307 for redirects.
    pub fn with_status(mut self, status: RedirectStatus) -> Self {
        self.status = status;
        self
    }

    /// This router's own node id, if one was configured.
    pub fn local(&self) -> Option<&NodeId> {
        self.local.as_ref()
    }

    /// Status used for redirects.
    pub fn status(&self) -> RedirectStatus {
        self.status
    }

    /// The ring being routed against.
    pub fn accessor(&self) -> &Arc<RingAccessor> {
        &self.accessor
    }

    /// Resolve `identifier` against the current ring.
    ///
    /// `path_and_query` is appended to the owner's address for redirects.
    pub fn decide(&self, identifier: &str, path_and_query: &str) -> Result<Decision, RouteError> {
        let ring = self.accessor.current();
        let token = ring.token_for(identifier.as_bytes());
        let owner = ring
            .owner(token)
            .map_err(|_| RouteError::NoAvailableNodes)?;

        if self.local.as_ref() == Some(owner.id()) {
            debug!(identifier, %token, "device owned locally");
            return Ok(Decision::Local(owner.clone()));
        }

        let location = owner.location(path_and_query);
        debug!(identifier, %token, owner = %owner, "redirecting device");
        Ok(Decision::Redirect {
            node: owner.clone(),
            location,
            status: self.status,
        })
    }
}
