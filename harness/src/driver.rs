use core::fmt::Write as _;
use std::net::IpAddr;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{bail, eyre, Result as EyreResult};
use futures_util::future::join_all;
use meshtest_network::{AddressAllocator, AllocatorConfig, LocalNetwork, NetworkController};
use meshtest_primitives::identity::NetworkIdentity;
use meshtest_primitives::report::Reporter;
use meshtest_store::{MemNode, StoreConfig, StoreNode};
use meshtest_sync::{LocalSync, SyncClient};
use serde::Serialize;
use tokio::fs::write;

use crate::config::{RunConfig, TestEnvironment};
use crate::lifecycle::{LifecycleConfig, NodeLifecycle, NodePhase};
use crate::logs::ClassifyingWriter;
use crate::scenarios::{self, ScenarioContext, ScenarioFn};

/// Orchestrates one run: spawns every instance's coordinating flow, gathers
/// their reports, persists the run report and collapses it into the process
/// outcome.
#[derive(Debug)]
pub struct Driver {
    environment: TestEnvironment,
    config: RunConfig,
}

impl Driver {
    pub const fn new(environment: TestEnvironment, config: RunConfig) -> Self {
        Self {
            environment,
            config,
        }
    }

    pub async fn run(&self) -> EyreResult<()> {
        self.environment.init().await?;

        let scenario = scenarios::lookup(&self.config.scenario)?;

        let out = self.environment.output_writer;
        out.write_header(&format!("Running scenario {}", self.config.scenario), 1);
        out.write_str(&format!("Instances: {}", self.config.instances));

        let sync = LocalSync::new();

        let mut runs = Vec::new();
        for instance in 0..self.config.instances {
            let name = format!("instance{}", instance + 1);
            let client: Arc<dyn SyncClient> = Arc::new(sync.client());
            runs.push(tokio::spawn(run_instance(
                name,
                self.config.clone(),
                client,
                scenario,
            )));
        }

        let mut instances = Vec::new();
        for outcome in join_all(runs).await {
            instances.push(outcome?);
        }

        let report = RunReport {
            scenario: self.config.scenario.clone(),
            instances,
        };

        self.write_instance_logs(&report).await?;

        if let Err(err) = report.result() {
            out.write_failure("Errors occurred during the run:");
            out.write_failure(&err.to_string());
        }

        let report_file = report.store_to_file(&self.environment.output_dir).await?;
        out.write_str(&format!("Report file: {report_file}"));

        report.result()
    }

    async fn write_instance_logs(&self, report: &RunReport) -> EyreResult<()> {
        for instance in &report.instances {
            let path = self
                .environment
                .logs_dir
                .join(format!("{}.log", instance.name));
            write(&path, instance.messages.join("\n")).await?;
        }
        Ok(())
    }
}

/// One instance's coordinating flow: allocate a network identity, bring up
/// a node bound to it, run the scenario, tear the node down.
async fn run_instance(
    name: String,
    config: RunConfig,
    sync: Arc<dyn SyncClient>,
    scenario: ScenarioFn,
) -> InstanceReport {
    let reporter = Reporter::new();
    let network: Arc<dyn NetworkController> = Arc::new(LocalNetwork::new());

    let allocator = AddressAllocator::new(
        sync,
        network,
        reporter.clone(),
        AllocatorConfig {
            subnet: config.subnet,
            round_size: config.instances,
            shape: config.shape,
            barrier_timeout: config.barrier_timeout,
        },
    );

    let identity = match allocator.allocate().await {
        Ok(identity) => identity,
        Err(err) => {
            reporter.record_crash(eyre!("address allocation failed: {err}"));
            return InstanceReport::collect(name, None, NodePhase::Crashed, &reporter);
        }
    };

    let store_config = StoreConfig::new(&name, IpAddr::V4(identity.addr))
        .with_join_delay(config.join_delay)
        .with_log_sink(Box::new(ClassifyingWriter::new(reporter.clone())));

    let node: Arc<dyn StoreNode> = Arc::new(MemNode::new(store_config));

    let lifecycle = NodeLifecycle::new(
        node,
        reporter.clone(),
        LifecycleConfig {
            ready_timeout: config.ready_timeout,
            shutdown_deadline: config.shutdown_deadline,
        },
    );

    let (entries, short_entries) = (config.entries, config.short_entries);
    let scenario_reporter = reporter.clone();
    let phase = match lifecycle
        .run(move |node| {
            scenario(ScenarioContext {
                node,
                reporter: scenario_reporter,
                entries,
                short_entries,
            })
        })
        .await
    {
        Ok(phase) => phase,
        Err(_) => NodePhase::Crashed,
    };

    InstanceReport::collect(name, Some(identity), phase, &reporter)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceReport {
    pub name: String,
    pub identity: Option<String>,
    pub phase: NodePhase,
    pub messages: Vec<String>,
    pub failures: Vec<String>,
    pub crash: Option<String>,
}

impl InstanceReport {
    fn collect(
        name: String,
        identity: Option<NetworkIdentity>,
        phase: NodePhase,
        reporter: &Reporter,
    ) -> Self {
        Self {
            name,
            identity: identity.map(|identity| identity.to_string()),
            phase,
            messages: reporter.messages(),
            failures: reporter.failures(),
            crash: reporter.crash(),
        }
    }

    pub fn passed(&self) -> bool {
        self.crash.is_none() && self.failures.is_empty()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub scenario: String,
    pub instances: Vec<InstanceReport>,
}

impl RunReport {
    /// Collapses the run into a single outcome for the top-level caller.
    pub fn result(&self) -> EyreResult<()> {
        let mut errors = Vec::new();

        for instance in &self.instances {
            if let Some(crash) = &instance.crash {
                errors.push(format!("{}: crash: {crash}", instance.name));
            }
            for failure in &instance.failures {
                errors.push(format!("{}: {failure}", instance.name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!("errors occurred during test run: {errors:?}")
        }
    }

    fn to_markdown(&self) -> EyreResult<String> {
        let mut markdown = String::new();

        writeln!(&mut markdown, "## Meshtest report")?;
        writeln!(&mut markdown, "### Scenario: {}", self.scenario)?;
        writeln!(
            &mut markdown,
            "| Instance | Identity | Phase | Failures | Result |"
        )?;
        writeln!(&mut markdown, "| :--- | :--- | :--- | ---: | :---: |")?;

        for instance in &self.instances {
            writeln!(
                &mut markdown,
                "| {} | {} | {} | {} | {} |",
                instance.name,
                instance.identity.as_deref().unwrap_or("-"),
                instance.phase,
                instance.failures.len(),
                if instance.passed() {
                    ":white_check_mark:"
                } else {
                    ":x:"
                },
            )?;
        }

        Ok(markdown)
    }

    pub async fn store_to_file(&self, folder: &Utf8Path) -> EyreResult<Utf8PathBuf> {
        let report_file = folder.join("report.md");
        write(&report_file, self.to_markdown()?).await?;

        let json_file = folder.join("report.json");
        write(&json_file, serde_json::to_string_pretty(self)?).await?;

        Ok(report_file)
    }
}
