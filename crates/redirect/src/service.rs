//! axum integration.
//!
//! The redirect logic runs as middleware in front of the local handlers.
//! Requests for devices this router owns fall through to the wrapped
//! [`Router`]; everything else is answered with a redirect or an error
//! before any local handler runs.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tracing::debug;

use crate::decision::{Decision, Redirector};
use crate::error::RouteError;
use crate::extract::IdentifierExtractor;

/// Shared state for [`redirect_middleware`].
#[derive(Clone)]
pub struct RouterState {
    redirector: Arc<Redirector>,
    extractor: Arc<dyn IdentifierExtractor>,
}

impl RouterState {
    /// Pair a redirector with the extractor that feeds it.
    pub fn new(redirector: Redirector, extractor: impl IdentifierExtractor) -> Self {
        Self {
            redirector: Arc::new(redirector),
            extractor: Arc::new(extractor),
        }
    }

    /// The redirector behind the middleware.
    pub fn redirector(&self) -> &Redirector {
        &self.redirector
    }
}

/// Route one request: pass it on, redirect it, or reject it.
pub async fn redirect_middleware(
    State(state): State<RouterState>,
    request: Request,
    next: Next,
) -> Result<Response, RouteError> {
    let (parts, body) = request.into_parts();

    let decided = state.extractor.extract(&parts).and_then(|identifier| {
        let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
        state.redirector.decide(&identifier, path_and_query)
    });

    match decided {
        Ok(Decision::Local(_)) => {
            metrics::counter!("router_local_total").increment(1);
            Ok(next.run(Request::from_parts(parts, body)).await)
        }
        Ok(Decision::Redirect {
            location, status, ..
        }) => {
            metrics::counter!("router_redirects_total").increment(1);
            Ok((status.status(), [(header::LOCATION, location)]).into_response())
        }
        Err(err) => {
            metrics::counter!("router_rejected_total", "reason" => err.reason_label()).increment(1);
            debug!(error = %err, uri = %parts.uri, "request rejected");
            Err(err)
        }
    }
}

/// Put the redirect middleware in front of every route of `local`,
/// including its fallback.
pub fn wrap(local: Router, state: RouterState) -> Router {
    local.layer(middleware::from_fn_with_state(state, redirect_middleware))
}
