//! Synchronization of warehouse master data to the external system.
//!
//! Multiple worker instances share one queue: the set of warehouses with
//! `warehouse_is_synchronized = FALSE`. A claim is a row lock taken with
//! `FOR UPDATE SKIP LOCKED` inside a transaction the claim owns, so at most
//! one worker holds a given row and a crashed worker's claim evaporates with
//! its transaction.

pub mod error;
pub mod gateway;
pub mod queue;
pub mod runner;

pub use error::SyncError;
pub use gateway::MasterDataGateway;
pub use queue::{SyncClaim, SyncQueue};
pub use runner::{SyncOutcome, SyncRunner, SyncRunnerConfig};
