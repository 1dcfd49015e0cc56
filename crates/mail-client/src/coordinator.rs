//! Single-flight refresh coordination
//!
//! When a request comes back 401, `admit` decides what happens to it while
//! holding the coordinator's guard:
//!
//! - `Lead`: no refresh is running and the session still holds the
//!   credentials the request was sent with. Phase moves to `Refreshing`, the
//!   request becomes the first waiter, and the caller must start the refresh.
//! - `Queued`: a refresh is already running; the request waits behind it.
//! - `Replay`: credentials rotated after the request was sent (a refresh
//!   finished in the meantime); resend immediately with the current token.
//! - `Expired`: nothing can recover the request. `invalidate` is set for the
//!   first request that discovered a session without a refresh token; that
//!   request owns the teardown and the hook call.
//!
//! The refresh owner calls `settle` exactly once, which returns the phase to
//! `Idle` and hands back every waiter in arrival order. A waiter whose caller
//! gave up (future dropped, deadline hit) is removed by its `WaiterTicket`.
//!
//! The guard is a `std::sync::Mutex` that is never held across an `.await`,
//! which is what lets `WaiterTicket::drop` take it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use common::Secret;
use mail_auth::SessionStore;
use tokio::sync::oneshot;
use tracing::debug;
use transport::RequestDescriptor;

use crate::client::Reply;
use crate::error::{Error, Result};

/// Refresh phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Refreshing,
}

/// A request parked until the in-flight refresh resolves.
#[derive(Debug)]
pub struct PendingWaiter {
    id: u64,
    pub descriptor: RequestDescriptor,
    resolve: oneshot::Sender<Result<Reply>>,
}

impl PendingWaiter {
    /// Deliver the final result to the waiting caller.
    ///
    /// A caller that already went away is not an error.
    pub fn resolve(self, result: Result<Reply>) {
        if self.resolve.send(result).is_err() {
            debug!(waiter = self.id, "waiter gone before resolution");
        }
    }
}

#[derive(Debug)]
struct CoordinatorState {
    phase: Phase,
    waiters: VecDeque<PendingWaiter>,
    next_id: u64,
}

impl Default for CoordinatorState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            waiters: VecDeque::new(),
            next_id: 1,
        }
    }
}

impl CoordinatorState {
    fn enqueue(
        &mut self,
        descriptor: RequestDescriptor,
        shared: &Arc<Mutex<CoordinatorState>>,
    ) -> WaiterTicket {
        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(PendingWaiter {
            id,
            descriptor,
            resolve: tx,
        });
        WaiterTicket {
            id,
            state: Arc::clone(shared),
            rx,
        }
    }
}

/// Decision for a request that came back 401.
#[derive(Debug)]
pub enum Admission {
    Lead {
        ticket: WaiterTicket,
        refresh_token: Secret<String>,
    },
    Queued {
        ticket: WaiterTicket,
    },
    Replay,
    Expired {
        invalidate: bool,
    },
}

/// Handle to a queued waiter.
///
/// Dropping it before the refresh settles removes the waiter from the queue.
#[derive(Debug)]
pub struct WaiterTicket {
    id: u64,
    state: Arc<Mutex<CoordinatorState>>,
    rx: oneshot::Receiver<Result<Reply>>,
}

impl WaiterTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the refresh to resolve this request.
    pub async fn wait(mut self) -> Result<Reply> {
        match (&mut self.rx).await {
            Ok(result) => result,
            // Sender dropped without an answer: the refresh task died.
            Err(_) => Err(Error::SessionExpired),
        }
    }
}

impl Drop for WaiterTicket {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let before = state.waiters.len();
        state.waiters.retain(|w| w.id != self.id);
        if state.waiters.len() != before {
            debug!(waiter = self.id, "queued request cancelled");
        }
    }
}

/// Owner of the refresh phase and waiter queue.
#[derive(Debug, Clone, Default)]
pub struct RefreshCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decide the fate of a request that was sent at `sent_generation` and
    /// came back 401.
    pub fn admit(
        &self,
        descriptor: RequestDescriptor,
        sent_generation: u64,
        session: &SessionStore,
    ) -> Admission {
        let mut state = self.lock();

        if state.phase == Phase::Refreshing {
            let ticket = state.enqueue(descriptor, &self.state);
            debug!(waiter = ticket.id, queued = state.waiters.len(), "queued behind refresh");
            return Admission::Queued { ticket };
        }

        let snapshot = session.snapshot();
        if snapshot.generation() != sent_generation {
            return if snapshot.is_authenticated() {
                Admission::Replay
            } else {
                Admission::Expired { invalidate: false }
            };
        }

        match snapshot.refresh_token() {
            Some(refresh_token) => {
                state.phase = Phase::Refreshing;
                let ticket = state.enqueue(descriptor, &self.state);
                debug!(waiter = ticket.id, "leading token refresh");
                Admission::Lead {
                    ticket,
                    refresh_token: refresh_token.clone(),
                }
            }
            None => {
                // Invalidating under the guard bumps the generation, so any
                // other 401 from the same session lands in the branch above.
                let was_authenticated = session.invalidate();
                debug!(was_authenticated, "no refresh token, session expired");
                Admission::Expired { invalidate: true }
            }
        }
    }

    /// End the refresh episode: phase back to `Idle`, waiters returned in
    /// arrival order.
    pub fn settle(&self) -> Vec<PendingWaiter> {
        let mut state = self.lock();
        state.phase = Phase::Idle;
        state.waiters.drain(..).collect()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Number of queued waiters.
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }
}
