use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use meshtest_primitives::identity::SequenceNumber;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::client::{SyncClient, SyncError};

/// In-process rendezvous service. All participants of a run share one
/// `LocalSync`; each obtains its own [`LocalSyncClient`] handle, which is
/// what enforces the exactly-once-per-state contract.
#[derive(Clone, Debug, Default)]
pub struct LocalSync {
    state: Arc<ServiceState>,
}

#[derive(Debug, Default)]
struct ServiceState {
    barriers: Mutex<HashMap<String, Barrier>>,
}

#[derive(Debug)]
struct Barrier {
    target: u64,
    arrivals: u64,
    waiters: Vec<oneshot::Sender<()>>,
}

impl LocalSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(&self) -> LocalSyncClient {
        LocalSyncClient {
            service: Arc::clone(&self.state),
            signalled: Mutex::new(HashSet::new()),
        }
    }

    /// Drops every pending waiter. Anyone still blocked observes
    /// [`SyncError::Closed`].
    pub fn close(&self) {
        let mut barriers = self.state.barriers.lock();
        for barrier in barriers.values_mut() {
            barrier.waiters.clear();
        }
    }
}

/// Per-participant handle onto a [`LocalSync`] service.
#[derive(Debug)]
pub struct LocalSyncClient {
    service: Arc<ServiceState>,
    signalled: Mutex<HashSet<String>>,
}

#[async_trait]
impl SyncClient for LocalSyncClient {
    async fn signal_and_wait(
        &self,
        state: &str,
        target: u64,
    ) -> Result<SequenceNumber, SyncError> {
        if !self.signalled.lock().insert(state.to_owned()) {
            return Err(SyncError::AlreadySignalled {
                state: state.to_owned(),
            });
        }

        let (seq, wait) = {
            let mut barriers = self.service.barriers.lock();
            let barrier = barriers.entry(state.to_owned()).or_insert(Barrier {
                target,
                arrivals: 0,
                waiters: Vec::new(),
            });

            if barrier.target != target {
                return Err(SyncError::TargetMismatch {
                    state: state.to_owned(),
                    existing: barrier.target,
                    requested: target,
                });
            }

            if barrier.arrivals >= barrier.target {
                return Err(SyncError::RoundOverflow {
                    state: state.to_owned(),
                });
            }

            barrier.arrivals += 1;
            let seq = barrier.arrivals;

            if seq == barrier.target {
                debug!(state, round = target, "barrier complete, releasing waiters");
                for waiter in barrier.waiters.drain(..) {
                    let _ignored = waiter.send(());
                }
                (seq, None)
            } else {
                let (tx, rx) = oneshot::channel();
                barrier.waiters.push(tx);
                (seq, Some(rx))
            }
        };

        if let Some(rx) = wait {
            rx.await.map_err(|_| SyncError::Closed {
                state: state.to_owned(),
            })?;
        }

        Ok(SequenceNumber::new(seq))
    }
}
