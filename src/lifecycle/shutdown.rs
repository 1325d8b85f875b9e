//! Shutdown gate for management requests.
//!
//! Tracks in-flight requests and holds process termination until they drain.
//!
//! ```text
//! Active ──begin_shutdown──▶ Draining ──last permit dropped──▶ Terminated
//!    └──────begin_shutdown with no requests in flight──────────────▲
//! ```
//!
//! The counter and the phase sit behind one mutex so admission and the start
//! of shutdown are linearizable: once `begin_shutdown` returns, every later
//! `enter_request` is rejected. Transitions are published on a watch channel.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;

/// Lifecycle phase of the gate. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Requests are admitted.
    Active,
    /// Shutdown requested; in-flight requests are finishing.
    Draining,
    /// Every admitted request has exited.
    Terminated,
}

#[derive(Debug)]
struct ShutdownState {
    active_requests: usize,
    phase: Phase,
}

#[derive(Debug)]
struct GateInner {
    state: Mutex<ShutdownState>,
    phase_tx: watch::Sender<Phase>,
}

/// Admission control and drain coordination for one endpoint.
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct ShutdownGate {
    inner: Arc<GateInner>,
}

/// Result of [`ShutdownGate::enter_request`].
#[derive(Debug)]
pub enum Admission {
    /// Serve the request; dropping the permit exits it.
    Permitted(RequestPermit),
    /// Shutdown has begun; answer with "service unavailable".
    Rejected,
}

impl Admission {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Admission::Permitted(_))
    }

    pub fn into_permit(self) -> Option<RequestPermit> {
        match self {
            Admission::Permitted(permit) => Some(permit),
            Admission::Rejected => None,
        }
    }
}

/// How a bounded drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every admitted request exited.
    Drained,
    /// The timeout elapsed with requests still in flight.
    Forced { outstanding: usize },
}

impl ShutdownGate {
    pub fn new() -> Self {
        let (phase_tx, _) = watch::channel(Phase::Active);
        Self {
            inner: Arc::new(GateInner {
                state: Mutex::new(ShutdownState {
                    active_requests: 0,
                    phase: Phase::Active,
                }),
                phase_tx,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ShutdownState> {
        // The state stays consistent across a panic in another holder.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Admit a request unless shutdown has begun.
    pub fn enter_request(&self) -> Admission {
        let mut state = self.lock();
        if state.phase != Phase::Active {
            return Admission::Rejected;
        }
        state.active_requests += 1;
        Admission::Permitted(RequestPermit {
            gate: self.clone(),
            released: false,
        })
    }

    fn exit_request(&self) {
        let mut state = self.lock();
        debug_assert!(state.active_requests > 0, "exit without matching enter");
        state.active_requests = state.active_requests.saturating_sub(1);

        if state.phase == Phase::Draining && state.active_requests == 0 {
            state.phase = Phase::Terminated;
            self.inner.phase_tx.send_replace(Phase::Terminated);
            tracing::info!("Management requests drained");
        }
    }

    /// Stop admitting requests and return a handle that resolves once the
    /// in-flight ones have exited. Calling it again changes nothing.
    pub fn begin_shutdown(&self) -> ShutdownHandle {
        let mut state = self.lock();
        if state.phase == Phase::Active {
            state.phase = if state.active_requests == 0 {
                Phase::Terminated
            } else {
                Phase::Draining
            };
            self.inner.phase_tx.send_replace(state.phase);
            tracing::info!(
                active_requests = state.active_requests,
                phase = ?state.phase,
                "Management shutdown requested"
            );
        } else {
            tracing::debug!(phase = ?state.phase, "Management shutdown already requested");
        }

        ShutdownHandle {
            rx: self.inner.phase_tx.subscribe(),
            gate: self.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn active_requests(&self) -> usize {
        self.lock().active_requests
    }

    /// Observe phase transitions. Only real transitions are published.
    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.inner.phase_tx.subscribe()
    }
}

impl Default for ShutdownGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard held for the duration of an admitted request.
/// Exits the request when dropped.
#[derive(Debug)]
pub struct RequestPermit {
    gate: ShutdownGate,
    released: bool,
}

impl RequestPermit {
    /// Exit the request now rather than at drop.
    pub fn release(mut self) {
        self.exit();
    }

    fn exit(&mut self) {
        if !self.released {
            self.released = true;
            self.gate.exit_request();
        }
    }
}

impl Drop for RequestPermit {
    fn drop(&mut self) {
        self.exit();
    }
}

/// Resolves once the gate reaches [`Phase::Terminated`]. Consumed on wait,
/// so it resolves at most once.
#[derive(Debug)]
pub struct ShutdownHandle {
    rx: watch::Receiver<Phase>,
    // Keeps the sender alive so waiting never observes a closed channel.
    gate: ShutdownGate,
}

impl ShutdownHandle {
    pub fn is_terminated(&self) -> bool {
        *self.rx.borrow() == Phase::Terminated
    }

    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|phase| *phase == Phase::Terminated).await;
    }

    /// Wait at most `timeout`; afterwards shutdown proceeds as a forced drain.
    pub async fn wait_timeout(self, timeout: Duration) -> DrainOutcome {
        let gate = self.gate.clone();
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(()) => DrainOutcome::Drained,
            Err(_) => {
                let outstanding = gate.active_requests();
                tracing::warn!(
                    outstanding,
                    timeout_secs = timeout.as_secs_f64(),
                    "Drain timeout reached, forcing shutdown with requests in flight"
                );
                DrainOutcome::Forced { outstanding }
            }
        }
    }
}
