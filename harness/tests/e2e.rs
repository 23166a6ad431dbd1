use core::time::Duration;

use camino::Utf8PathBuf;
use meshtest_harness::config::{RunConfig, TestEnvironment};
use meshtest_harness::driver::Driver;
use meshtest_harness::output::{OutputFormat, OutputWriter};
use meshtest_harness::scenarios::SCENARIOS;
use serde_json::Value;
use tokio::fs::read_to_string;

fn environment(test_id: &str) -> TestEnvironment {
    let home = Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .expect("temp dir must be utf-8")
        .join(format!("meshtest-e2e-{}", std::process::id()));

    TestEnvironment::new(&home, test_id, OutputWriter::new(OutputFormat::PlainText))
}

fn small_config(scenario: &str, instances: u64) -> RunConfig {
    RunConfig {
        scenario: scenario.to_owned(),
        instances,
        entries: 200,
        short_entries: 50,
        barrier_timeout: Some(Duration::from_secs(30)),
        ready_timeout: Some(Duration::from_secs(30)),
        ..RunConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn fleet_run_passes_and_persists_reports() {
    let environment = environment("fleet-get-put");
    let output_dir = environment.output_dir.clone();

    Driver::new(environment, small_config("region-get-put", 4))
        .run()
        .await
        .expect("a clean fleet run must pass");

    let markdown = read_to_string(output_dir.join("report.md"))
        .await
        .expect("markdown report must be written");
    assert!(
        markdown.contains("region-get-put"),
        "report must name the scenario"
    );

    let json = read_to_string(output_dir.join("report.json"))
        .await
        .expect("json report must be written");
    let report: Value = serde_json::from_str(&json).expect("json report must parse");

    let instances = report["instances"]
        .as_array()
        .expect("report must list instances");
    assert_eq!(instances.len(), 4, "every instance must report");

    for instance in instances {
        assert_eq!(
            instance["phase"], "closed",
            "instance {} must close",
            instance["name"]
        );
        assert!(
            instance["crash"].is_null(),
            "instance {} must not crash",
            instance["name"]
        );
        assert_eq!(
            instance["failures"].as_array().map(Vec::len),
            Some(0),
            "instance {} must not record failures",
            instance["name"]
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn identities_in_one_fleet_are_distinct() {
    let environment = environment("fleet-identities");
    let output_dir = environment.output_dir.clone();

    Driver::new(environment, small_config("region-put-delete", 5))
        .run()
        .await
        .expect("the fleet run must pass");

    let json = read_to_string(output_dir.join("report.json")).await.unwrap();
    let report: Value = serde_json::from_str(&json).unwrap();

    let mut identities: Vec<String> = report["instances"]
        .as_array()
        .unwrap()
        .iter()
        .map(|instance| instance["identity"].as_str().unwrap().to_owned())
        .collect();

    identities.sort();
    let before = identities.len();
    identities.dedup();
    assert_eq!(
        identities.len(),
        before,
        "no two instances may share an identity"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn bulk_volume_run_passes() {
    let environment = environment("bulk-volume");

    let config = RunConfig {
        entries: 100_000,
        ..small_config("region-get-put", 1)
    };

    Driver::new(environment, config)
        .run()
        .await
        .expect("100k sequential put/get pairs must all succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn every_registered_scenario_passes_end_to_end() {
    for (name, _) in SCENARIOS {
        let environment = environment(&format!("all-{name}"));

        Driver::new(environment, small_config(name, 2))
            .run()
            .await
            .unwrap_or_else(|err| panic!("scenario `{name}` failed: {err:?}"));
    }
}

#[tokio::test]
async fn unknown_scenarios_are_rejected_up_front() {
    let environment = environment("unknown-scenario");

    let err = Driver::new(environment, small_config("region-missing", 1))
        .run()
        .await
        .expect_err("an unregistered scenario must fail the run");

    assert!(
        err.to_string().contains("not found"),
        "the error must say the scenario is unknown, got: {err:#}"
    );
}
