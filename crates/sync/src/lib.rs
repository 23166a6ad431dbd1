//! Rendezvous barrier primitive consumed by the harness. The transport is an
//! external collaborator; this crate defines the client surface plus an
//! in-process reference service for exercising the harness end to end.

mod client;
mod local;

pub use client::{SyncClient, SyncError};
pub use local::{LocalSync, LocalSyncClient};
