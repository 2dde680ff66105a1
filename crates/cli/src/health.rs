//! HTTP health server for orchestrator probes.
//!
//! - `/healthz` (liveness): 200 `ok` unless the membership subscription has
//!   failed for good.
//! - `/readyz` (readiness): 200 once a non-empty ring is installed.
//!
//! Everything else is 404. Served on its own listener so probes never pass
//! through the redirect middleware.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use corelib::RingAccessor;
use membership::SubscriptionState;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// What the probes look at.
#[derive(Clone)]
pub struct HealthState {
    accessor: Arc<RingAccessor>,
    subscription: watch::Receiver<SubscriptionState>,
}

impl HealthState {
    pub fn new(
        accessor: Arc<RingAccessor>,
        subscription: watch::Receiver<SubscriptionState>,
    ) -> Self {
        Self {
            accessor,
            subscription,
        }
    }
}

/// `/healthz` and `/readyz`; everything else is 404.
pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .fallback(|| async { (StatusCode::NOT_FOUND, "not found") })
        .with_state(state)
}

async fn healthz(State(state): State<HealthState>) -> (StatusCode, String) {
    match &*state.subscription.borrow() {
        SubscriptionState::Failed { reason } => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("membership subscription failed: {reason}"),
        ),
        _ => (StatusCode::OK, "ok".to_string()),
    }
}

async fn readyz(State(state): State<HealthState>) -> (StatusCode, &'static str) {
    if state.accessor.is_ready() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "no ring installed")
    }
}

/// Serve the health endpoints until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: HealthState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "health server listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
