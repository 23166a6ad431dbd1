use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::config::NetworkConfig;
use crate::controller::{NetworkController, NetworkError};

/// In-process control plane for one instance. Records the configuration
/// applied under each callback state and maintains a simulated interface
/// set; tests mutate the set to exercise drift detection.
#[derive(Clone, Debug)]
pub struct LocalNetwork {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    interfaces: Mutex<Vec<IpAddr>>,
    applied: Mutex<HashMap<String, NetworkConfig>>,
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::with_interfaces(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
    }
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interfaces(interfaces: Vec<IpAddr>) -> Self {
        Self {
            inner: Arc::new(Inner {
                interfaces: Mutex::new(interfaces),
                applied: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Adds an interface address out from under the harness, simulating an
    /// external reconfiguration.
    pub fn add_interface(&self, addr: IpAddr) {
        self.inner.interfaces.lock().push(addr);
    }

    /// The configuration last applied under `callback_state`, if any.
    pub fn applied(&self, callback_state: &str) -> Option<NetworkConfig> {
        self.inner.applied.lock().get(callback_state).cloned()
    }
}

#[async_trait]
impl NetworkController for LocalNetwork {
    async fn configure(&self, config: &NetworkConfig) -> Result<(), NetworkError> {
        debug!(
            state = %config.callback_state,
            policy = ?config.routing_policy,
            latency = ?config.default_shape.latency(),
            "applying network configuration"
        );

        if let Some(identity) = config.ipv4 {
            let mut interfaces = self.inner.interfaces.lock();
            let addr = IpAddr::V4(identity.addr);
            if !interfaces.contains(&addr) {
                interfaces.push(addr);
            }
        }

        let _previous = self
            .inner
            .applied
            .lock()
            .insert(config.callback_state.clone(), config.clone());

        Ok(())
    }

    async fn interface_addrs(&self) -> Result<Vec<IpAddr>, NetworkError> {
        Ok(self.inner.interfaces.lock().clone())
    }
}
