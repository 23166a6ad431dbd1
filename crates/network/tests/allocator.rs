use core::time::Duration;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use meshtest_network::{
    AddressAllocator, AllocatorConfig, LocalNetwork, NetworkConfig, NetworkController,
    NetworkError, RoutingPolicy, STATE_IP_CHANGED, STATE_NETWORK_CONFIGURED,
};
use meshtest_primitives::report::Reporter;
use meshtest_sync::{LocalSync, SyncClient};

const SUBNET: Ipv4Addr = Ipv4Addr::new(10, 32, 0, 0);

fn allocator(
    sync: Arc<dyn SyncClient>,
    network: Arc<dyn NetworkController>,
    round_size: u64,
) -> AddressAllocator {
    AddressAllocator::new(
        sync,
        network,
        Reporter::new(),
        AllocatorConfig {
            subnet: SUBNET,
            round_size,
            ..AllocatorConfig::default()
        },
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_rounds_yield_distinct_identities() {
    let sync = LocalSync::new();
    let round = 300_u64;

    let runs = (0..round).map(|_| {
        let client: Arc<dyn SyncClient> = Arc::new(sync.client());
        let network: Arc<dyn NetworkController> = Arc::new(LocalNetwork::new());
        tokio::spawn(async move { allocator(client, network, round).allocate().await })
    });

    let identities = try_join_all(runs).await.unwrap();

    let mut seen = HashSet::new();
    for identity in identities {
        let identity = identity.unwrap();
        assert!(
            seen.insert(identity.addr),
            "identity {identity} was assigned twice"
        );
        let [a, b, _, _] = identity.addr.octets();
        assert_eq!((a, b), (10, 32), "identity {identity} left the subnet");
    }
    assert_eq!(seen.len() as u64, round, "every instance must get an identity");
}

#[tokio::test]
async fn allocation_walks_the_callback_states() {
    let sync = LocalSync::new();
    let network = LocalNetwork::new();

    let client: Arc<dyn SyncClient> = Arc::new(sync.client());
    let controller: Arc<dyn NetworkController> = Arc::new(network.clone());

    let identity = allocator(client, controller, 1).allocate().await.unwrap();

    let initial = network
        .applied(STATE_NETWORK_CONFIGURED)
        .expect("initial shaping must be applied");
    assert_eq!(
        initial.routing_policy,
        RoutingPolicy::DenyAll,
        "routing must stay denied until the address is confirmed"
    );
    assert!(initial.ipv4.is_none(), "no address before the barrier");

    let updated = network
        .applied(STATE_IP_CHANGED)
        .expect("address assignment must be applied");
    assert_eq!(
        updated.routing_policy,
        RoutingPolicy::AllowAll,
        "routing opens with the address assignment"
    );
    assert_eq!(
        updated.ipv4.map(|id| id.addr),
        Some(identity.addr),
        "applied address must match the returned identity"
    );

    let addrs = network.interface_addrs().await.unwrap();
    assert!(
        addrs.contains(&IpAddr::V4(identity.addr)),
        "assigned address must surface on the interface set"
    );
}

#[tokio::test]
async fn degenerate_round_sizes_are_rejected() {
    let sync = LocalSync::new();

    let client: Arc<dyn SyncClient> = Arc::new(sync.client());
    let network: Arc<dyn NetworkController> = Arc::new(LocalNetwork::new());
    let empty = allocator(client, network, 0).allocate().await;
    assert!(
        matches!(empty, Err(NetworkError::EmptyRound)),
        "round of zero must be rejected"
    );

    let client: Arc<dyn SyncClient> = Arc::new(sync.client());
    let network: Arc<dyn NetworkController> = Arc::new(LocalNetwork::new());
    let oversized = allocator(client, network, (1 << 16) + 1).allocate().await;
    assert!(
        matches!(oversized, Err(NetworkError::RoundTooLarge(_))),
        "round beyond the identity space must be rejected, not wrapped"
    );
}

#[tokio::test]
async fn barrier_timeout_is_fatal() {
    let sync = LocalSync::new();
    let client: Arc<dyn SyncClient> = Arc::new(sync.client());
    let network: Arc<dyn NetworkController> = Arc::new(LocalNetwork::new());

    let allocator = AddressAllocator::new(
        client,
        network,
        Reporter::new(),
        AllocatorConfig {
            subnet: SUBNET,
            round_size: 2,
            barrier_timeout: Some(Duration::from_millis(50)),
            ..AllocatorConfig::default()
        },
    );

    let result = allocator.allocate().await;
    assert!(
        matches!(result, Err(NetworkError::BarrierTimeout(_))),
        "a never-completing round must surface the configured timeout"
    );
}

/// Controller whose interface set grows between snapshots, simulating an
/// external reconfiguration racing the harness.
struct DriftingNetwork {
    inner: LocalNetwork,
    snapshots: AtomicUsize,
}

#[async_trait]
impl NetworkController for DriftingNetwork {
    async fn configure(&self, config: &NetworkConfig) -> Result<(), NetworkError> {
        self.inner.configure(config).await
    }

    async fn interface_addrs(&self) -> Result<Vec<IpAddr>, NetworkError> {
        if self.snapshots.fetch_add(1, Ordering::SeqCst) == 1 {
            self.inner
                .add_interface(IpAddr::V4(Ipv4Addr::new(192, 168, 44, 7)));
        }
        self.inner.interface_addrs().await
    }
}

#[tokio::test]
async fn interface_drift_aborts_allocation() {
    let sync = LocalSync::new();
    let client: Arc<dyn SyncClient> = Arc::new(sync.client());
    let network: Arc<dyn NetworkController> = Arc::new(DriftingNetwork {
        inner: LocalNetwork::new(),
        snapshots: AtomicUsize::new(0),
    });

    let result = allocator(client, network, 1).allocate().await;
    assert!(
        matches!(result, Err(NetworkError::InterfacesChanged)),
        "drift between barrier phases must be fatal"
    );
}
