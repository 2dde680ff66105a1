//! Router process wiring.
//!
//! Startup order: registry, subscription, then listeners. The subscription
//! must get past its first connect before the listeners open; a registry
//! that refuses us outright is a startup failure, while one that is merely
//! unreachable leaves the router up and answering 503 until members arrive.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use axum::extract::Request;
use axum::Json;
use axum::Router;
use corelib::{MembershipSnapshot, RingAccessor};
use membership::{
    FileRegistry, Registry, StaticRegistry, Subscription, SubscriptionHandle, SubscriptionState,
};
use redirect::{RouterState, Redirector};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::{Backend, DiscoverySection, RouterConfig};
use crate::error::Failure;
use crate::health::{self, HealthState};

/// Build the registry selected by `[discovery]`.
pub fn build_registry(discovery: &DiscoverySection) -> anyhow::Result<Arc<dyn Registry>> {
    match discovery.backend {
        Backend::Static => {
            if discovery.instances.is_empty() {
                bail!("static discovery needs at least one entry in discovery.instances");
            }
            let registry = StaticRegistry::from_addresses(&discovery.instances)
                .context("invalid static instance")?;
            Ok(Arc::new(registry))
        }
        Backend::File => {
            let path = discovery
                .file
                .as_ref()
                .ok_or_else(|| anyhow!("discovery backend \"file\" needs discovery.file"))?;
            Ok(Arc::new(FileRegistry::new(path, discovery.poll_interval())))
        }
    }
}

/// Read current membership once, for the offline commands.
pub async fn load_membership(discovery: &DiscoverySection) -> anyhow::Result<MembershipSnapshot> {
    match discovery.backend {
        Backend::Static => MembershipSnapshot::from_addresses(&discovery.instances)
            .context("invalid static instance"),
        Backend::File => {
            let path = discovery
                .file
                .as_ref()
                .ok_or_else(|| anyhow!("discovery backend \"file\" needs discovery.file"))?;
            Ok(FileRegistry::new(path, discovery.poll_interval())
                .snapshot()
                .await?)
        }
    }
}

/// Run the router until a shutdown signal arrives.
pub async fn run(config: RouterConfig) -> Result<(), Failure> {
    let status = config.redirect_status().map_err(Failure::Config)?;
    let extractor = config.device_extractor().map_err(Failure::Config)?;
    let me = config.self_node().map_err(Failure::Config)?;

    let registry = build_registry(&config.discovery).map_err(Failure::Discovery)?;
    let accessor = Arc::new(RingAccessor::new(config.ring));
    info!(
        registry = registry.name(),
        vnodes = config.ring.vnodes.get(),
        hash = %config.ring.hash,
        "starting device router"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let subscription = Subscription::new(registry, Arc::clone(&accessor))
        .with_backoff(config.discovery.backoff)
        .spawn(shutdown_rx.clone());
    await_first_connect(&subscription)
        .await
        .map_err(Failure::Subscription)?;

    let mut redirector = Redirector::new(Arc::clone(&accessor)).with_status(status);
    let local = match &me {
        Some(node) => {
            redirector = redirector.with_local(node.id().clone());
            node.address().to_string()
        }
        None => {
            warn!("server.self_address is unset; every request will be redirected");
            String::new()
        }
    };
    let app = redirect::wrap(local_router(local), RouterState::new(redirector, extractor));

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))
        .map_err(Failure::Server)?;
    let health_listener = TcpListener::bind(config.server.health_listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.health_listen_addr))
        .map_err(Failure::Server)?;
    info!(addr = %config.server.listen_addr, "redirect server listening");

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    let health_state = HealthState::new(Arc::clone(&accessor), subscription.status());
    let (served, health_served) = tokio::join!(
        async {
            axum::serve(listener, app)
                .with_graceful_shutdown(stopped(shutdown_rx.clone()))
                .await
        },
        health::serve(health_listener, health_state, stopped(shutdown_rx.clone())),
    );

    if let Err(err) = subscription.join().await {
        // Already logged and reported through /healthz when it happened.
        warn!(error = %err, "membership subscription had failed");
    }
    served
        .context("redirect server failed")
        .map_err(Failure::Server)?;
    health_served
        .context("health server failed")
        .map_err(Failure::Server)?;

    info!("device router stopped");
    Ok(())
}

/// Wait until the subscription has tried its first connect.
///
/// Transient trouble (`Reconnecting`) is not fatal; `Failed` is.
async fn await_first_connect(subscription: &SubscriptionHandle) -> anyhow::Result<()> {
    let mut status = subscription.status();
    let state = status
        .wait_for(|s| {
            !matches!(
                s,
                SubscriptionState::Disconnected | SubscriptionState::Connecting
            )
        })
        .await
        .map_err(|_| anyhow!("subscription stopped before connecting"))?
        .clone();

    match state {
        SubscriptionState::Failed { reason } => Err(anyhow!(reason)),
        SubscriptionState::Reconnecting { attempt, delay } => {
            warn!(attempt, ?delay, "registry not reachable yet; serving 503 until members arrive");
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Handler for devices this router owns.
///
/// The router has no device protocol of its own; it confirms ownership so
/// a fronting proxy or client can proceed.
fn local_router(self_address: String) -> Router {
    Router::new().fallback(move |request: Request| {
        let owner = self_address.clone();
        async move {
            Json(json!({
                "owner": owner,
                "path": request.uri().path(),
            }))
        }
    })
}

/// Resolves once the shutdown flag is set.
async fn stopped(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
