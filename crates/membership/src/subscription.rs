//! The long-lived registry watch.
//!
//! A subscription runs as two tokio tasks:
//!
//! - the **watcher** owns the registry connection. It folds events into the
//!   current [`MembershipSnapshot`] and publishes every change on a
//!   latest-value channel, reconnecting with [`Backoff`] on transient errors.
//! - the **applier** builds a [`HashRing`] from whatever snapshot is newest
//!   and installs it. Snapshots published while a build is running are
//!   coalesced, so only the most recent one is built next.
//!
//! Request handlers never touch either task; they only read the
//! [`RingAccessor`].

use std::sync::Arc;
use std::time::Duration;

use corelib::{HashRing, MembershipSnapshot, RingAccessor};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backoff::Backoff;
use crate::error::{RegistryError, SubscriptionError};
use crate::registry::{Registry, Watch};

/// Observable state of a subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Not started, or stopped by shutdown.
    Disconnected,
    /// Opening a watch.
    Connecting,
    /// Receiving events.
    Watching,
    /// Waiting `delay` before reconnect attempt `attempt`.
    Reconnecting {
        /// Consecutive failed attempts so far.
        attempt: u32,
        /// Delay before the next attempt.
        delay: Duration,
    },
    /// Gave up. Terminal until the process restarts.
    Failed {
        /// Why the subscription stopped.
        reason: String,
    },
}

impl SubscriptionState {
    /// True for the terminal failure state.
    pub fn is_failed(&self) -> bool {
        matches!(self, SubscriptionState::Failed { .. })
    }
}

/// Keeps a [`RingAccessor`] synchronized with a [`Registry`].
pub struct Subscription {
    registry: Arc<dyn Registry>,
    accessor: Arc<RingAccessor>,
    backoff: Backoff,
}

impl Subscription {
    /// Subscription with default backoff.
    pub fn new(registry: Arc<dyn Registry>, accessor: Arc<RingAccessor>) -> Self {
        Self {
            registry,
            accessor,
            backoff: Backoff::default(),
        }
    }

    /// Override the reconnect policy.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Start the watcher and applier tasks.
    ///
    /// Both stop once `shutdown` flips to `true` or its sender is dropped.
    /// Must be called from within a tokio runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> SubscriptionHandle {
        let (state_tx, state_rx) = watch::channel(SubscriptionState::Disconnected);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);

        let applier = tokio::spawn(run_applier(Arc::clone(&self.accessor), snapshot_rx));
        let watcher = tokio::spawn(
            Watcher {
                registry: self.registry,
                backoff: self.backoff,
                state: state_tx,
                snapshots: snapshot_tx,
                shutdown,
                membership: MembershipSnapshot::new(),
            }
            .run(),
        );

        SubscriptionHandle {
            state: state_rx,
            watcher,
            applier,
        }
    }
}

/// Handle to a running subscription.
pub struct SubscriptionHandle {
    state: watch::Receiver<SubscriptionState>,
    watcher: JoinHandle<Result<(), SubscriptionError>>,
    applier: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Current state.
    pub fn state(&self) -> SubscriptionState {
        self.state.borrow().clone()
    }

    /// A receiver for state changes, e.g. for health reporting.
    pub fn status(&self) -> watch::Receiver<SubscriptionState> {
        self.state.clone()
    }

    /// Wait for both tasks to finish.
    ///
    /// Returns `Ok(())` after a shutdown, or the terminal error if the
    /// subscription failed.
    pub async fn join(self) -> Result<(), SubscriptionError> {
        let result = self.watcher.await?;
        self.applier.await?;
        result
    }
}

enum PumpExit {
    Shutdown,
    /// The watch ended with `err`; `delivered` is set if it yielded at
    /// least one event first.
    Failed { err: RegistryError, delivered: bool },
}

struct Watcher {
    registry: Arc<dyn Registry>,
    backoff: Backoff,
    state: watch::Sender<SubscriptionState>,
    snapshots: watch::Sender<Option<MembershipSnapshot>>,
    shutdown: watch::Receiver<bool>,
    /// Last known membership; survives reconnects.
    membership: MembershipSnapshot,
}

impl Watcher {
    async fn run(mut self) -> Result<(), SubscriptionError> {
        let registry = self.registry.name();
        info!(registry, "membership subscription started");

        let mut attempt = 0u32;
        loop {
            self.state.send_replace(SubscriptionState::Connecting);

            let opened = tokio::select! {
                _ = shutdown_requested(&mut self.shutdown) => break,
                opened = self.registry.watch() => opened,
            };

            let err = match opened {
                Ok(mut stream) => {
                    self.state.send_replace(SubscriptionState::Watching);
                    info!(registry, "watching registry");
                    match self.pump(&mut *stream).await {
                        PumpExit::Shutdown => break,
                        PumpExit::Failed { err, delivered } => {
                            // A connection only counts as healthy once it
                            // has produced an event.
                            if delivered {
                                attempt = 0;
                            }
                            err
                        }
                    }
                }
                Err(err) => err,
            };

            if err.is_permanent() {
                return Err(self.fail(SubscriptionError::Permanent(err)));
            }

            attempt += 1;
            if !self.backoff.allows(attempt) {
                return Err(self.fail(SubscriptionError::RetriesExhausted {
                    attempts: attempt,
                    last: err,
                }));
            }

            let delay = self.backoff.delay(attempt);
            warn!(registry, error = %err, attempt, ?delay, "registry watch interrupted, reconnecting");
            metrics::counter!("registry_reconnects_total").increment(1);
            self.state
                .send_replace(SubscriptionState::Reconnecting { attempt, delay });

            tokio::select! {
                _ = shutdown_requested(&mut self.shutdown) => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.state.send_replace(SubscriptionState::Disconnected);
        info!(registry, "membership subscription stopped");
        Ok(())
    }

    /// Drain one watch until it ends, errors, or shutdown is requested.
    async fn pump(&mut self, stream: &mut dyn Watch) -> PumpExit {
        let mut delivered = false;
        loop {
            let next = tokio::select! {
                _ = shutdown_requested(&mut self.shutdown) => return PumpExit::Shutdown,
                next = stream.next_event() => next,
            };

            match next {
                Ok(Some(event)) => {
                    delivered = true;
                    debug!(?event, "membership event");
                    if event.apply(&mut self.membership) {
                        info!(members = self.membership.len(), "membership changed");
                        self.snapshots
                            .send_replace(Some(self.membership.clone()));
                    }
                }
                Ok(None) => {
                    return PumpExit::Failed {
                        err: RegistryError::Transient("watch stream closed".to_string()),
                        delivered,
                    }
                }
                Err(err) => return PumpExit::Failed { err, delivered },
            }
        }
    }

    fn fail(&self, err: SubscriptionError) -> SubscriptionError {
        error!(
            registry = self.registry.name(),
            error = %err,
            "membership subscription failed; serving the last known ring"
        );
        self.state.send_replace(SubscriptionState::Failed {
            reason: err.to_string(),
        });
        err
    }
}

/// Resolves once the flag is `true` or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn run_applier(
    accessor: Arc<RingAccessor>,
    mut snapshots: watch::Receiver<Option<MembershipSnapshot>>,
) {
    while snapshots.changed().await.is_ok() {
        let Some(snapshot) = snapshots.borrow_and_update().clone() else {
            continue;
        };

        let config = *accessor.config();
        let built =
            tokio::task::spawn_blocking(move || HashRing::from_snapshot(&snapshot, &config)).await;
        match built {
            Ok(ring) => {
                accessor.install(ring);
            }
            Err(err) => error!(error = %err, "hash ring build failed; keeping the current ring"),
        }
    }
    debug!("ring applier stopped");
}
