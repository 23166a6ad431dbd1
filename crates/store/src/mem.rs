use core::fmt;
use core::time::Duration;
use std::collections::HashMap;
use std::io::Write;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::StoreConfig;
use crate::types::{PutCondition, Region, StoreError, StoreNode};

/// In-memory single-process reference node. Implements the full control
/// surface — named regions, TTL entries, conditional writes — without any
/// replication, so the harness can be exercised end to end.
pub struct MemNode {
    name: String,
    bind_addr: IpAddr,
    join_delay: Duration,
    log_sink: Mutex<Option<Box<dyn Write + Send>>>,
    regions: Mutex<HashMap<String, Arc<MemRegion>>>,
    started: AtomicBool,
    running: AtomicBool,
    stop: CancellationToken,
}

impl MemNode {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            name: config.name,
            bind_addr: config.bind_addr,
            join_delay: config.join_delay,
            log_sink: Mutex::new(config.log_sink),
            regions: Mutex::new(HashMap::new()),
            started: AtomicBool::new(false),
            running: AtomicBool::new(false),
            stop: CancellationToken::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn log_line(&self, line: &str) {
        debug!(node = %self.name, "{line}");
        if let Some(sink) = self.log_sink.lock().as_mut() {
            let _ignored = writeln!(sink, "{line}");
        }
    }
}

impl fmt::Debug for MemNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemNode")
            .field("name", &self.name)
            .field("bind_addr", &self.bind_addr)
            .field("running", &self.is_running())
            .finish()
    }
}

#[async_trait]
impl StoreNode for MemNode {
    async fn start(&self, ready: CancellationToken) -> Result<(), StoreError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Start(format!(
                "node `{}` was already started",
                self.name
            )));
        }

        self.log_line(&format!(
            "[INFO] node {} binding {}",
            self.name, self.bind_addr
        ));

        if !self.join_delay.is_zero() {
            sleep(self.join_delay).await;
        }

        self.running.store(true, Ordering::SeqCst);
        self.log_line(&format!("[INFO] node {} joined the cluster view", self.name));
        ready.cancel();

        self.stop.cancelled().await;

        self.running.store(false, Ordering::SeqCst);
        self.log_line(&format!("[INFO] node {} stopped", self.name));

        Ok(())
    }

    fn region(&self, name: &str) -> Result<Arc<dyn Region>, StoreError> {
        if !self.is_running() {
            return Err(StoreError::NotRunning);
        }

        let mut regions = self.regions.lock();
        let region = regions
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(MemRegion::new(name)));

        Ok(Arc::clone(region) as Arc<dyn Region>)
    }

    async fn shutdown(&self) -> Result<(), StoreError> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(StoreError::NotRunning);
        }

        self.log_line(&format!("[INFO] node {} leaving the cluster", self.name));
        self.stop.cancel();

        Ok(())
    }
}

struct Entry {
    value: Vec<u8>,
    deadline: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }
}

struct MemRegion {
    name: String,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemRegion {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drops `key` if its TTL has lapsed. Expiry is lazy: entries are
    /// reaped on the next operation that touches them.
    fn purge_expired(entries: &mut HashMap<String, Entry>, key: &str) {
        let now = Instant::now();
        if entries.get(key).is_some_and(|entry| entry.expired(now)) {
            let _expired = entries.remove(key);
        }
    }
}

#[async_trait]
impl Region for MemRegion {
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let _previous = self.entries.lock().insert(
            key.to_owned(),
            Entry {
                value: value.to_vec(),
                deadline: None,
            },
        );
        Ok(())
    }

    async fn put_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let _previous = self.entries.lock().insert(
            key.to_owned(),
            Entry {
                value: value.to_vec(),
                deadline: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn put_if(
        &self,
        key: &str,
        value: &[u8],
        condition: PutCondition,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, key);

        match condition {
            PutCondition::IfAbsent if entries.contains_key(key) => Err(StoreError::KeyExists),
            PutCondition::IfPresent if !entries.contains_key(key) => Err(StoreError::KeyNotFound),
            _ => {
                let _previous = entries.insert(
                    key.to_owned(),
                    Entry {
                        value: value.to_vec(),
                        deadline: None,
                    },
                );
                Ok(())
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let mut entries = self.entries.lock();
        Self::purge_expired(&mut entries, key);

        entries
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or(StoreError::KeyNotFound)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _removed = self.entries.lock().remove(key);
        Ok(())
    }
}

impl fmt::Debug for MemRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemRegion").field("name", &self.name).finish()
    }
}
