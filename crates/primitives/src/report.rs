//! Reporting surface shared by every harness component. A [`Reporter`] is a
//! cheap cloneable handle passed explicitly through component boundaries;
//! informational messages, non-fatal failures and the (single, terminal)
//! crash all land here.

use std::sync::Arc;

use eyre::Report;
use parking_lot::Mutex;
use thiserror::Error as ThisError;
use tracing::{error, info};

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum RunFailed {
    #[error("run crashed: {0}")]
    Crashed(String),
    #[error("{0} failure(s) recorded")]
    Failures(usize),
}

#[derive(Clone, Debug, Default)]
pub struct Reporter {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    messages: Mutex<Vec<String>>,
    failures: Mutex<Vec<Report>>,
    crash: Mutex<Option<Report>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an informational event.
    pub fn record_message(&self, message: &str) {
        info!("{message}");
        self.inner.messages.lock().push(message.to_owned());
    }

    /// Records a non-fatal failure. The run continues; failures accumulate
    /// and are summarized when the run ends.
    pub fn record_failure(&self, failure: Report) {
        error!("failure: {failure:#}");
        self.inner.failures.lock().push(failure);
    }

    /// Records a crash. Terminal: the first crash wins, later ones are
    /// demoted to failures so they still surface in the summary.
    pub fn record_crash(&self, crash: Report) {
        error!("crash: {crash:#}");
        let mut slot = self.inner.crash.lock();
        if slot.is_some() {
            drop(slot);
            self.inner.failures.lock().push(crash);
            return;
        }
        *slot = Some(crash);
    }

    pub fn messages(&self) -> Vec<String> {
        self.inner.messages.lock().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.inner
            .failures
            .lock()
            .iter()
            .map(|failure| format!("{failure:#}"))
            .collect()
    }

    pub fn failure_count(&self) -> usize {
        self.inner.failures.lock().len()
    }

    pub fn crash(&self) -> Option<String> {
        self.inner
            .crash
            .lock()
            .as_ref()
            .map(|crash| format!("{crash:#}"))
    }

    /// Collapses the run into a single outcome: crash beats failures beats Ok.
    pub fn outcome(&self) -> Result<(), RunFailed> {
        if let Some(crash) = self.crash() {
            return Err(RunFailed::Crashed(crash));
        }

        let failures = self.failure_count();
        if failures != 0 {
            return Err(RunFailed::Failures(failures));
        }

        Ok(())
    }
}
