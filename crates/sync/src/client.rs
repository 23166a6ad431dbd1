use async_trait::async_trait;
use meshtest_primitives::identity::SequenceNumber;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum SyncError {
    #[error("state `{state}` was already signalled by this participant")]
    AlreadySignalled { state: String },
    #[error("barrier `{state}` is already complete; round membership must be exact")]
    RoundOverflow { state: String },
    #[error("barrier `{state}` was opened for {existing} participants, then joined with {requested}")]
    TargetMismatch {
        state: String,
        existing: u64,
        requested: u64,
    },
    #[error("sync service closed while waiting on `{state}`")]
    Closed { state: String },
}

/// Pairwise rendezvous barrier.
///
/// `signal_and_wait` signals this participant's entry into `state`, blocks
/// until `target` participants have signalled, and returns a 1-based
/// [`SequenceNumber`] assigned in arrival order, unique within the round.
/// Exactly-once per state per participant; the wait is cancellable only by
/// its own completion (callers layer defensive timeouts on top if they
/// choose to).
#[async_trait]
pub trait SyncClient: Send + Sync {
    async fn signal_and_wait(
        &self,
        state: &str,
        target: u64,
    ) -> Result<SequenceNumber, SyncError>;
}
