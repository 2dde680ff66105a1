//! Redirect errors and their HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Per-request failure. Becomes a plain-text error response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The request does not carry a usable device identifier.
    #[error("missing device identifier: {reason}")]
    MissingIdentifier {
        /// What was wrong with the request.
        reason: String,
    },

    /// The installed ring has no members.
    #[error("no available nodes")]
    NoAvailableNodes,
}

impl RouteError {
    pub(crate) fn missing(reason: impl Into<String>) -> Self {
        Self::MissingIdentifier {
            reason: reason.into(),
        }
    }

    /// Map to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingIdentifier { .. } => StatusCode::BAD_REQUEST,
            Self::NoAvailableNodes => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Label for the `router_rejected_total` counter.
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::MissingIdentifier { .. } => "missing_identifier",
            Self::NoAvailableNodes => "no_available_nodes",
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Invalid redirect settings, caught at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Only temporary redirect statuses are allowed.
    #[error("redirect status {0} is not allowed (use 302, 303 or 307)")]
    RedirectStatus(u16),

    /// The identifier header name is not a valid HTTP header name.
    #[error("invalid device header name {0:?}")]
    HeaderName(String),
}
