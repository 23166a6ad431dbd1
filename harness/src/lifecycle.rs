//! Node lifecycle: launches the managed node's long-running start routine as
//! a background task, blocks on a one-shot readiness signal, hands the live
//! node to a scenario, then shuts the node down within a bounded deadline.

use core::fmt;
use core::future::Future;
use core::time::Duration;
use std::sync::Arc;

use eyre::{bail, eyre, Report, Result as EyreResult};
use meshtest_primitives::report::Reporter;
use meshtest_store::{StoreError, StoreNode};
use serde::Serialize;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodePhase {
    Starting,
    Ready,
    InUse,
    ShuttingDown,
    Closed,
    Crashed,
}

impl fmt::Display for NodePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::InUse => "in-use",
            Self::ShuttingDown => "shutting-down",
            Self::Closed => "closed",
            Self::Crashed => "crashed",
        };
        write!(f, "{phase}")
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LifecycleConfig {
    /// Defensive readiness timeout. `None` preserves the base contract:
    /// block until the readiness signal (or the start task's failure) fires.
    pub ready_timeout: Option<Duration>,
    /// Deadline on the single shutdown attempt.
    pub shutdown_deadline: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            ready_timeout: None,
            shutdown_deadline: DEFAULT_SHUTDOWN_DEADLINE,
        }
    }
}

/// Drives one node through `Starting → Ready → InUse → ShuttingDown →
/// Closed`, exiting to `Crashed` if the node fails before readiness.
pub struct NodeLifecycle {
    node: Arc<dyn StoreNode>,
    reporter: Reporter,
    config: LifecycleConfig,
}

impl fmt::Debug for NodeLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeLifecycle")
            .field("config", &self.config)
            .finish()
    }
}

impl NodeLifecycle {
    pub fn new(node: Arc<dyn StoreNode>, reporter: Reporter, config: LifecycleConfig) -> Self {
        Self {
            node,
            reporter,
            config,
        }
    }

    /// Runs the full lifecycle around `scenario`. `Ok(Closed)` means the
    /// node was brought up, exercised and torn down (scenario failures live
    /// in the reporter); `Err` means a crash, already recorded on the crash
    /// channel.
    pub async fn run<F, Fut>(self, scenario: F) -> EyreResult<NodePhase>
    where
        F: FnOnce(Arc<dyn StoreNode>) -> Fut,
        Fut: Future<Output = EyreResult<()>> + Send,
    {
        let ready = CancellationToken::new();
        let mut phase = NodePhase::Starting;

        let mut start_task: JoinHandle<Result<(), StoreError>> = tokio::spawn({
            let node = Arc::clone(&self.node);
            let ready = ready.clone();
            async move { node.start(ready).await }
        });

        // The readiness signal and a failing start task race; whichever
        // fires first unblocks this flow. A failure never deadlocks it.
        let readiness = async {
            tokio::select! {
                () = ready.cancelled() => Ok(()),
                outcome = &mut start_task => Err(start_failure(outcome)),
            }
        };

        let ready_result = match self.config.ready_timeout {
            None => readiness.await,
            Some(limit) => match timeout(limit, readiness).await {
                Ok(result) => result,
                Err(_) => Err(eyre!("node did not become ready within {limit:?}")),
            },
        };

        if let Err(err) = ready_result {
            start_task.abort();
            self.transition(&mut phase, NodePhase::Crashed);
            self.reporter.record_crash(err);
            bail!("node crashed before reaching readiness");
        }

        self.transition(&mut phase, NodePhase::Ready);
        self.reporter
            .record_message("node is ready to accept connections");

        self.transition(&mut phase, NodePhase::InUse);
        if let Err(err) = scenario(Arc::clone(&self.node)).await {
            self.reporter.record_failure(err);
        }

        // A node that died mid-scenario is a crash, but shutdown still runs
        // so resources are released deterministically.
        let mut start_done = false;
        if start_task.is_finished() {
            start_done = true;
            self.reporter.record_crash(
                start_failure((&mut start_task).await)
                    .wrap_err("node exited while the scenario was running"),
            );
        }

        self.transition(&mut phase, NodePhase::ShuttingDown);
        match timeout(self.config.shutdown_deadline, self.node.shutdown()).await {
            Ok(Ok(())) => {
                if !start_done {
                    self.await_start_unwind(start_task).await;
                }
            }
            Ok(Err(err)) => {
                start_task.abort();
                self.reporter.record_failure(eyre!("shutdown failed: {err}"));
            }
            Err(_) => {
                start_task.abort();
                self.reporter.record_failure(eyre!(
                    "shutdown exceeded its {:?} deadline",
                    self.config.shutdown_deadline
                ));
            }
        }

        self.transition(&mut phase, NodePhase::Closed);
        Ok(phase)
    }

    /// After a successful shutdown request the start routine should return
    /// promptly; give it the same deadline before giving up on it.
    async fn await_start_unwind(&self, mut start_task: JoinHandle<Result<(), StoreError>>) {
        match timeout(self.config.shutdown_deadline, &mut start_task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(outcome) => self
                .reporter
                .record_crash(start_failure(outcome).wrap_err("node failed while stopping")),
            Err(_) => {
                start_task.abort();
                self.reporter
                    .record_failure(eyre!("node start routine did not unwind after shutdown"));
            }
        }
    }

    fn transition(&self, phase: &mut NodePhase, next: NodePhase) {
        debug!(from = %*phase, to = %next, "lifecycle transition");
        *phase = next;
    }
}

fn start_failure(outcome: Result<Result<(), StoreError>, JoinError>) -> Report {
    match outcome {
        Ok(Ok(())) => eyre!("node start returned without an error before shutdown was requested"),
        Ok(Err(err)) => eyre!("node start failed: {err}"),
        Err(join) => eyre!("node start task aborted: {join}"),
    }
}
