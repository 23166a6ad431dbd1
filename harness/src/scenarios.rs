//! Scenario registry: an immutable mapping from scenario name to scenario
//! function, populated at process start. Each scenario receives a live node
//! handle and the run's reporter, and keeps exercising remaining assertions
//! after a mismatch so one run surfaces every defect.

use core::future::Future;
use core::pin::Pin;
use std::sync::Arc;

use eyre::Result as EyreResult;
use meshtest_primitives::report::Reporter;
use meshtest_store::StoreNode;
use thiserror::Error as ThisError;

pub mod get_put;
pub mod put_delete;
pub mod put_if;
pub mod put_ttl;

#[derive(Debug, ThisError)]
#[error("scenario `{name}` not found; known scenarios: {known:?}")]
pub struct ScenarioNotFound {
    pub name: String,
    pub known: Vec<&'static str>,
}

#[derive(Clone)]
pub struct ScenarioContext {
    pub node: Arc<dyn StoreNode>,
    pub reporter: Reporter,
    /// Entry count for bulk scenarios.
    pub entries: u64,
    /// Entry count for TTL and conditional scenarios.
    pub short_entries: u64,
}

impl core::fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("entries", &self.entries)
            .field("short_entries", &self.short_entries)
            .finish()
    }
}

pub type ScenarioFuture = Pin<Box<dyn Future<Output = EyreResult<()>> + Send>>;
pub type ScenarioFn = fn(ScenarioContext) -> ScenarioFuture;

fn region_get_put(ctx: ScenarioContext) -> ScenarioFuture {
    Box::pin(get_put::run(ctx))
}

fn region_put_delete(ctx: ScenarioContext) -> ScenarioFuture {
    Box::pin(put_delete::run(ctx))
}

fn region_put_ttl(ctx: ScenarioContext) -> ScenarioFuture {
    Box::pin(put_ttl::run(ctx))
}

fn region_put_if(ctx: ScenarioContext) -> ScenarioFuture {
    Box::pin(put_if::run(ctx))
}

pub const SCENARIOS: &[(&str, ScenarioFn)] = &[
    ("region-get-put", region_get_put),
    ("region-put-delete", region_put_delete),
    ("region-put-ttl", region_put_ttl),
    ("region-put-if", region_put_if),
];

pub fn lookup(name: &str) -> Result<ScenarioFn, ScenarioNotFound> {
    SCENARIOS
        .iter()
        .find(|(scenario, _)| *scenario == name)
        .map(|(_, run)| *run)
        .ok_or_else(|| ScenarioNotFound {
            name: name.to_owned(),
            known: names(),
        })
}

pub fn names() -> Vec<&'static str> {
    SCENARIOS.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_scenario_resolves() {
        for name in names() {
            assert!(lookup(name).is_ok(), "scenario `{name}` must resolve");
        }
    }

    #[test]
    fn unknown_scenarios_list_the_registry() {
        let missing = lookup("region-does-not-exist").unwrap_err();
        assert_eq!(missing.name, "region-does-not-exist");
        assert_eq!(
            missing.known.len(),
            SCENARIOS.len(),
            "the error must name every known scenario"
        );
    }
}
