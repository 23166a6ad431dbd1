use core::fmt;
use core::time::Duration;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr};

/// Construction-time configuration for a store node.
pub struct StoreConfig {
    pub name: String,
    /// Address the node binds; the allocated network identity's address.
    pub bind_addr: IpAddr,
    /// Simulated cluster-join time before the node signals readiness.
    pub join_delay: Duration,
    /// Sink for the node's free-text diagnostic stream.
    pub log_sink: Option<Box<dyn Write + Send>>,
}

impl StoreConfig {
    pub fn new(name: &str, bind_addr: IpAddr) -> Self {
        Self {
            name: name.to_owned(),
            bind_addr,
            join_delay: Duration::ZERO,
            log_sink: None,
        }
    }

    #[must_use]
    pub fn with_join_delay(mut self, join_delay: Duration) -> Self {
        self.join_delay = join_delay;
        self
    }

    #[must_use]
    pub fn with_log_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.log_sink = Some(sink);
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("node", IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("name", &self.name)
            .field("bind_addr", &self.bind_addr)
            .field("join_delay", &self.join_delay)
            .field("log_sink", &self.log_sink.as_ref().map(|_| "<sink>"))
            .finish()
    }
}
