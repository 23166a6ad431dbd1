use core::time::Duration;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use meshtest_primitives::identity::{NetworkIdentity, SequenceNumber, MAX_ROUND_SIZE};
use meshtest_primitives::report::Reporter;
use meshtest_sync::SyncClient;
use tokio::time::timeout;
use tracing::info;

use crate::config::{
    LinkShape, NetworkConfig, RoutingPolicy, STATE_IP_ALLOCATION, STATE_IP_CHANGED,
};
use crate::controller::{NetworkController, NetworkError};

#[derive(Clone, Copy, Debug)]
pub struct AllocatorConfig {
    /// `/16` base of the shared test subnet.
    pub subnet: Ipv4Addr,
    /// Number of cooperating instances in this round.
    pub round_size: u64,
    pub shape: LinkShape,
    /// Defensive barrier timeout. `None` preserves the base contract:
    /// block until the round is full.
    pub barrier_timeout: Option<Duration>,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            subnet: Ipv4Addr::new(10, 32, 0, 0),
            round_size: 1,
            shape: LinkShape::default(),
            barrier_timeout: None,
        }
    }
}

/// Derives a collision-free network identity for the calling instance from
/// the rendezvous barrier's sequence number.
pub struct AddressAllocator {
    sync: Arc<dyn SyncClient>,
    network: Arc<dyn NetworkController>,
    reporter: Reporter,
    config: AllocatorConfig,
}

impl core::fmt::Debug for AddressAllocator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AddressAllocator")
            .field("config", &self.config)
            .finish()
    }
}

impl AddressAllocator {
    pub fn new(
        sync: Arc<dyn SyncClient>,
        network: Arc<dyn NetworkController>,
        reporter: Reporter,
        config: AllocatorConfig,
    ) -> Self {
        Self {
            sync,
            network,
            reporter,
            config,
        }
    }

    /// Runs the allocation protocol: shape-and-deny, rendezvous, drift
    /// check, then address assignment. A barrier timeout is fatal and
    /// propagated, never retried, since correctness depends on round
    /// membership being exact.
    pub async fn allocate(&self) -> Result<NetworkIdentity, NetworkError> {
        if self.config.round_size == 0 {
            return Err(NetworkError::EmptyRound);
        }
        if self.config.round_size > MAX_ROUND_SIZE {
            return Err(NetworkError::RoundTooLarge(self.config.round_size));
        }

        let before = self.network.interface_addrs().await?;

        let mut config = NetworkConfig::shaped(self.config.shape);
        self.reporter.record_message("applying initial link shape");
        self.network.configure(&config).await?;

        let seq = self.barrier().await?;
        self.reporter
            .record_message(&format!("assigned sequence {seq}"));

        let after = self.network.interface_addrs().await?;
        if !same_addrs(&before, &after) {
            return Err(NetworkError::InterfacesChanged);
        }

        let identity = NetworkIdentity::from_sequence(self.config.subnet, seq)?;
        info!(%identity, "derived network identity");

        config.ipv4 = Some(identity);
        config.routing_policy = RoutingPolicy::AllowAll;
        config.callback_state = STATE_IP_CHANGED.to_owned();
        self.network.configure(&config).await?;

        Ok(identity)
    }

    async fn barrier(&self) -> Result<SequenceNumber, NetworkError> {
        let wait = self
            .sync
            .signal_and_wait(STATE_IP_ALLOCATION, self.config.round_size);

        match self.config.barrier_timeout {
            None => Ok(wait.await?),
            Some(limit) => match timeout(limit, wait).await {
                Ok(result) => Ok(result?),
                Err(_) => Err(NetworkError::BarrierTimeout(limit)),
            },
        }
    }
}

fn same_addrs(a: &[IpAddr], b: &[IpAddr]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let set: HashSet<&IpAddr> = a.iter().collect();
    b.iter().all(|addr| set.contains(addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_addrs_ignores_order() {
        let a = [
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
        ];
        let b = [a[1], a[0]];
        assert!(same_addrs(&a, &b), "order must not matter");
    }

    #[test]
    fn same_addrs_detects_growth() {
        let a = [IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))];
        let b = [a[0], IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))];
        assert!(!same_addrs(&a, &b), "added interface must be detected");
    }
}
