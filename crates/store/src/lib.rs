//! Control surface of the managed distributed in-memory store. The store
//! itself is an external collaborator; the harness drives it exclusively
//! through [`StoreNode`] and [`Region`]. [`MemNode`] is the in-process
//! reference node used to exercise the harness end to end.

mod config;
mod mem;
mod types;

pub use config::StoreConfig;
pub use mem::MemNode;
pub use types::{PutCondition, Region, StoreError, StoreNode};
