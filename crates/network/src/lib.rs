//! Network identity allocation for concurrently starting test instances.
//!
//! The traffic-shaping control plane is an external collaborator consumed
//! through [`NetworkController`]; [`AddressAllocator`] drives it together
//! with the rendezvous barrier to hand every instance a collision-free
//! address in the shared test subnet.

mod allocator;
mod config;
mod controller;
mod local;

pub use allocator::{AddressAllocator, AllocatorConfig};
pub use config::{
    LinkShape, NetworkConfig, RoutingPolicy, DEFAULT_NETWORK, STATE_IP_ALLOCATION,
    STATE_IP_CHANGED, STATE_NETWORK_CONFIGURED,
};
pub use controller::{NetworkController, NetworkError};
pub use local::LocalNetwork;
