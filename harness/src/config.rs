use core::time::Duration;
use std::net::Ipv4Addr;

use camino::{Utf8Path, Utf8PathBuf};
use eyre::Result as EyreResult;
use meshtest_network::LinkShape;
use tokio::fs::create_dir_all;

use crate::lifecycle::DEFAULT_SHUTDOWN_DEADLINE;
use crate::output::OutputWriter;

/// One run of one scenario across a fleet of cooperating instances.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub scenario: String,
    /// Rendezvous round size: the number of instances in this run.
    pub instances: u64,
    /// `/16` base of the shared test subnet.
    pub subnet: Ipv4Addr,
    pub shape: LinkShape,
    /// Entry count for bulk scenarios.
    pub entries: u64,
    /// Entry count for TTL and conditional scenarios.
    pub short_entries: u64,
    /// Simulated cluster-join time per node.
    pub join_delay: Duration,
    pub barrier_timeout: Option<Duration>,
    pub ready_timeout: Option<Duration>,
    pub shutdown_deadline: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scenario: "region-get-put".to_owned(),
            instances: 1,
            subnet: Ipv4Addr::new(10, 32, 0, 0),
            shape: LinkShape::default(),
            entries: 100_000,
            short_entries: 1_000,
            join_delay: Duration::ZERO,
            barrier_timeout: None,
            ready_timeout: None,
            shutdown_deadline: DEFAULT_SHUTDOWN_DEADLINE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TestEnvironment {
    pub test_id: String,
    pub output_dir: Utf8PathBuf,
    pub logs_dir: Utf8PathBuf,
    pub output_writer: OutputWriter,
}

impl TestEnvironment {
    pub fn new(home: &Utf8Path, test_id: &str, output_writer: OutputWriter) -> Self {
        let output_dir = home.join(test_id);
        let logs_dir = output_dir.join("logs");

        Self {
            test_id: test_id.to_owned(),
            output_dir,
            logs_dir,
            output_writer,
        }
    }

    pub async fn init(&self) -> EyreResult<()> {
        create_dir_all(&self.output_dir).await?;
        create_dir_all(&self.logs_dir).await?;
        Ok(())
    }
}
