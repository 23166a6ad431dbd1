use core::time::Duration;

use meshtest_primitives::identity::NetworkIdentity;
use serde::{Deserialize, Serialize};

/// The data network every instance is attached to. At the moment this is the
/// only network.
pub const DEFAULT_NETWORK: &str = "default";

/// Barrier round for confirming the initial traffic shaping.
pub const STATE_NETWORK_CONFIGURED: &str = "network-configured";
/// Barrier round for the sequence-number handout.
pub const STATE_IP_ALLOCATION: &str = "ip-allocation";
/// Barrier round for confirming the address assignment.
pub const STATE_IP_CHANGED: &str = "ip-changed";

/// Induced latency and bandwidth ceiling applied to an instance's data path.
/// Immutable once applied for a round; reapplying under a new callback state
/// marks protocol progress, not a reshape.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkShape {
    pub latency_ms: u64,
    /// Bandwidth ceiling in bits per second.
    pub bandwidth: u64,
}

impl Default for LinkShape {
    fn default() -> Self {
        Self {
            latency_ms: 1,
            bandwidth: 1 << 20, // 1Mib
        }
    }
}

impl LinkShape {
    pub const fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoutingPolicy {
    AllowAll,
    /// Traffic is denied until the address assignment is confirmed.
    #[default]
    DenyAll,
}

/// One configuration request against the control plane, idempotent per
/// callback state.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub network: String,
    pub enable: bool,
    pub default_shape: LinkShape,
    pub routing_policy: RoutingPolicy,
    pub callback_state: String,
    pub ipv4: Option<NetworkIdentity>,
}

impl NetworkConfig {
    /// Initial configuration: shape applied, routing denied, no address yet.
    pub fn shaped(shape: LinkShape) -> Self {
        Self {
            network: DEFAULT_NETWORK.to_owned(),
            enable: true,
            default_shape: shape,
            routing_policy: RoutingPolicy::DenyAll,
            callback_state: STATE_NETWORK_CONFIGURED.to_owned(),
            ipv4: None,
        }
    }
}
