//! Coordination-and-lifecycle harness for fleets of distributed store test
//! instances: rendezvous-based address allocation, node lifecycle with
//! readiness detection and bounded shutdown, and a registry of correctness
//! scenarios driven against live nodes.

pub mod cli;
pub mod config;
pub mod driver;
pub mod lifecycle;
pub mod logs;
pub mod output;
pub mod scenarios;
