//! Shutdown coordination for the host.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Notify};

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct GateState {
    closing: AtomicBool,
    in_flight: AtomicUsize,
    drained: Notify,
}

/// Admission gate for invocations during teardown.
///
/// Once [`begin_teardown`](TeardownGate::begin_teardown) is called no new
/// invocation is admitted; those already admitted run to completion and
/// [`drain`](TeardownGate::drain) resolves when the last one finishes.
#[derive(Debug, Clone, Default)]
pub struct TeardownGate {
    state: Arc<GateState>,
}

impl TeardownGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit one invocation. `None` once teardown has begun.
    pub fn enter(&self) -> Option<InFlightGuard> {
        // Count first, then check: begin_teardown either sees this entry or
        // this entry sees the closing flag.
        self.state.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard {
            state: self.state.clone(),
        };
        if self.state.closing.load(Ordering::SeqCst) {
            drop(guard);
            return None;
        }
        Some(guard)
    }

    pub fn begin_teardown(&self) {
        if !self.state.closing.swap(true, Ordering::SeqCst) {
            tracing::info!(
                in_flight = self.in_flight(),
                "Teardown started, refusing new invocations"
            );
        }
        if self.in_flight() == 0 {
            self.state.drained.notify_waiters();
        }
    }

    pub fn is_closing(&self) -> bool {
        self.state.closing.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until every admitted invocation has finished.
    pub async fn drain(&self) {
        loop {
            let notified = self.state.drained.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Held for the duration of one admitted invocation.
#[derive(Debug)]
pub struct InFlightGuard {
    state: Arc<GateState>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.state.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.drained.notify_waiters();
        }
    }
}
