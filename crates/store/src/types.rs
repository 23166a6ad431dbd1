use core::time::Duration;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error as ThisError;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PutCondition {
    /// Write only when the key is absent; an existing live key signals
    /// [`StoreError::KeyExists`] without mutating it.
    IfAbsent,
    /// Write only when the key is present; a missing or expired key signals
    /// [`StoreError::KeyNotFound`] without creating it.
    IfPresent,
}

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum StoreError {
    /// First-class "not found" outcome. Never conflated with other errors:
    /// scenarios match on it to verify deletes and expiries.
    #[error("key not found")]
    KeyNotFound,
    #[error("key already exists")]
    KeyExists,
    #[error("node is not running")]
    NotRunning,
    #[error("node failed to start: {0}")]
    Start(String),
    #[error("internal store error: {0}")]
    Internal(String),
}

/// A named keyspace inside one store node.
#[async_trait]
pub trait Region: Send + Sync {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    async fn put_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError>;

    async fn put_if(
        &self,
        key: &str,
        value: &[u8],
        condition: PutCondition,
    ) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Removes `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// One managed store instance bound to one network identity.
#[async_trait]
pub trait StoreNode: Send + Sync {
    /// Long-running: joins the cluster view, cancels `ready` exactly once
    /// when the node can accept operations, then blocks until shutdown.
    /// Returns `Err` if startup or the node's runtime fails.
    async fn start(&self, ready: CancellationToken) -> Result<(), StoreError>;

    /// Create-or-open handle to the named region.
    fn region(&self, name: &str) -> Result<Arc<dyn Region>, StoreError>;

    /// Requests shutdown, unblocking `start`. Callers bound this with their
    /// own deadline; the request itself is issued at most once.
    async fn shutdown(&self) -> Result<(), StoreError>;
}
