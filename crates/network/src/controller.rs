use core::time::Duration;
use std::net::IpAddr;

use async_trait::async_trait;
use meshtest_primitives::identity::IdentityError;
use meshtest_sync::SyncError;
use thiserror::Error as ThisError;

use crate::config::NetworkConfig;

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum NetworkError {
    #[error("round of {0} exceeds the 65536-identity space")]
    RoundTooLarge(u64),
    #[error("round size must be at least 1")]
    EmptyRound,
    #[error("local interfaces changed while the allocation barrier was held")]
    InterfacesChanged,
    #[error("network configuration rejected: {0}")]
    Configure(String),
    #[error("allocation barrier timed out after {0:?}")]
    BarrierTimeout(Duration),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Control-plane surface consumed by the allocator. Implementations apply
/// traffic shaping and address assignments, and expose a snapshot of the
/// instance's interface addresses so callers can detect external
/// reconfiguration racing the harness.
#[async_trait]
pub trait NetworkController: Send + Sync {
    /// Applies `config`. Idempotent per callback state.
    async fn configure(&self, config: &NetworkConfig) -> Result<(), NetworkError>;

    /// Snapshot of the instance's current interface addresses.
    async fn interface_addrs(&self) -> Result<Vec<IpAddr>, NetworkError>;
}
