use core::time::Duration;
use std::env::var;
use std::net::Ipv4Addr;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use eyre::Result as EyreResult;
use meshtest_network::LinkShape;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{registry, EnvFilter};

use crate::config::{RunConfig, TestEnvironment};
use crate::driver::Driver;
use crate::output::{OutputFormat, OutputWriter};
use crate::scenarios;

/// Process-wide logging and error-report installation. Called once from the
/// binary entry point before anything else runs.
pub fn setup() -> EyreResult<()> {
    let directives = match var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => "meshtest=info,meshtest_=info".to_owned(),
    };

    registry()
        .with(EnvFilter::builder().parse(directives)?)
        .with(layer())
        .init();

    color_eyre::install()?;

    Ok(())
}

pub const EXAMPLES: &str = r"
  # Run the bulk get/put scenario across four cooperating instances
  $ meshtest run --scenario region-get-put --instances 4

  # Exercise TTL semantics with defensive timeouts enabled
  $ meshtest run --scenario region-put-ttl --barrier-timeout-secs 30 --ready-timeout-secs 30

  # List the registered scenarios
  $ meshtest list
";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct RootCommand {
    #[command(flatten)]
    pub args: RootArgs,

    #[command(subcommand)]
    pub action: SubCommands,
}

#[derive(Debug, Subcommand)]
pub enum SubCommands {
    #[command(alias = "up")]
    Run(RunCommand),
    List(ListCommand),
}

#[derive(Debug, Parser)]
pub struct RootArgs {
    /// Directory run reports and node logs are written under
    #[arg(long, value_name = "PATH", default_value = ".meshtest")]
    #[arg(env = "MESHTEST_HOME", hide_env_values = true)]
    pub home: Utf8PathBuf,

    /// Output format for progress and reports
    #[arg(long, value_name = "FORMAT", default_value = "plain-text")]
    pub output_format: OutputFormat,
}

impl RootCommand {
    pub async fn run(self) -> EyreResult<()> {
        match self.action {
            SubCommands::Run(run) => run.run(&self.args).await,
            SubCommands::List(list) => list.run(&self.args),
        }
    }
}

/// Run a scenario across a fleet of in-process instances
#[derive(Debug, Parser)]
pub struct RunCommand {
    /// Scenario to run, by registry name
    #[arg(short, long, value_name = "NAME")]
    pub scenario: String,

    /// Number of cooperating instances in the rendezvous round
    #[arg(long, default_value_t = 1)]
    pub instances: u64,

    /// /16 base of the shared test subnet
    #[arg(long, default_value = "10.32.0.0")]
    pub subnet: Ipv4Addr,

    /// Identifier naming this run's output directory
    #[arg(long, default_value = "latest")]
    pub test_id: String,

    /// Entry count for bulk scenarios
    #[arg(long, default_value_t = 100_000)]
    pub entries: u64,

    /// Entry count for TTL and conditional scenarios
    #[arg(long, default_value_t = 1_000)]
    pub short_entries: u64,

    /// Simulated cluster-join delay per node, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub join_delay_ms: u64,

    /// Defensive rendezvous barrier timeout, in seconds (default: wait
    /// until the round is full)
    #[arg(long)]
    pub barrier_timeout_secs: Option<u64>,

    /// Defensive node readiness timeout, in seconds (default: wait until
    /// the readiness signal fires)
    #[arg(long)]
    pub ready_timeout_secs: Option<u64>,

    /// Deadline on the single shutdown attempt, in seconds
    #[arg(long, default_value_t = 10)]
    pub shutdown_deadline_secs: u64,
}

impl RunCommand {
    pub async fn run(self, root: &RootArgs) -> EyreResult<()> {
        let output_writer = OutputWriter::new(root.output_format);
        let environment = TestEnvironment::new(&root.home, &self.test_id, output_writer);

        let config = RunConfig {
            scenario: self.scenario,
            instances: self.instances,
            subnet: self.subnet,
            shape: LinkShape::default(),
            entries: self.entries,
            short_entries: self.short_entries,
            join_delay: Duration::from_millis(self.join_delay_ms),
            barrier_timeout: self.barrier_timeout_secs.map(Duration::from_secs),
            ready_timeout: self.ready_timeout_secs.map(Duration::from_secs),
            shutdown_deadline: Duration::from_secs(self.shutdown_deadline_secs),
        };

        Driver::new(environment, config).run().await
    }
}

/// List the registered scenarios
#[derive(Debug, Parser)]
pub struct ListCommand;

impl ListCommand {
    pub fn run(self, root: &RootArgs) -> EyreResult<()> {
        let out = OutputWriter::new(root.output_format);

        out.write_header("Registered scenarios", 1);
        for name in scenarios::names() {
            out.write_str(name);
        }

        Ok(())
    }
}
