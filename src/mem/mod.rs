//! Embedded in-process store.
//!
//! [`MemCluster`] implements the store capability entirely in memory, with
//! the rules of the real service: tables must be disabled before their
//! schema changes, each family keeps a bounded number of versions per
//! column, expired cells are hidden, and store-assigned timestamps strictly
//! increase. Durable mutations can be journaled to a file and replayed.
//!
//! ```text
//! MemCluster ──→ MemConnector ──→ MemAdmin
//!                            └──→ MemTable ──→ MemScanner
//! ```

mod cluster;
mod connector;
mod family;
pub mod journal;
mod scanner;
mod table;

pub use cluster::MemCluster;
pub use connector::{MemAdmin, MemConnector, MemTable};
pub use journal::{Journal, JournalRecord};
pub use scanner::MemScanner;
